//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::{like_pattern, Database, DbResult};
use crate::models::{now_timestamp, GenderRatio, NewPatient, Page, Patient, PatientChanges, PatientId};

const PATIENT_COLUMNS: &str = "id, phone, name, gender, age, address, created_at, updated_at";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        phone: row.get(1)?,
        name: row.get(2)?,
        gender: row.get(3)?,
        age: row.get(4)?,
        address: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    /// Insert a new patient and return the stored record.
    pub fn insert_patient(&self, patient: &NewPatient) -> DbResult<Patient> {
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO patients (phone, name, gender, age, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                patient.phone,
                patient.name,
                patient.gender,
                patient.age,
                patient.address,
                now,
            ],
        )?;

        Ok(Patient {
            id: self.conn.last_insert_rowid(),
            phone: patient.phone.clone(),
            name: patient.name.clone(),
            gender: patient.gender,
            age: patient.age,
            address: patient.address.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: PatientId) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient by exact phone number.
    pub fn find_patient_by_phone(&self, phone: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE phone = ?"),
                [phone],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search patients by name or phone (substring, case-insensitive).
    /// Newest first. `None` query lists everyone.
    pub fn search_patients(&self, query: Option<&str>, page: Option<Page>) -> DbResult<Vec<Patient>> {
        let mut sql = format!("SELECT {PATIENT_COLUMNS} FROM patients");
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            sql.push_str(r" WHERE name LIKE ?1 ESCAPE '\' OR phone LIKE ?1 ESCAPE '\'");
            args.push(Box::new(like_pattern(q)));
        }
        sql.push_str(" ORDER BY id DESC");
        if let Some(page) = page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page.size, page.offset()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Apply a validated partial update. Returns false if the patient is absent.
    pub fn update_patient(&self, id: PatientId, changes: &PatientChanges) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                phone = COALESCE(?2, phone),
                name = COALESCE(?3, name),
                gender = COALESCE(?4, gender),
                age = COALESCE(?5, age),
                address = COALESCE(?6, address),
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                id,
                changes.phone,
                changes.name,
                changes.gender,
                changes.age,
                changes.address,
                now_timestamp(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a patient.
    pub fn delete_patient(&self, id: PatientId) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Count patients per gender.
    pub fn patient_gender_ratio(&self) -> DbResult<GenderRatio> {
        self.conn
            .query_row(
                r#"
                SELECT COALESCE(SUM(gender = 'male'), 0), COALESCE(SUM(gender = 'female'), 0)
                FROM patients
                "#,
                [],
                |row| {
                    Ok(GenderRatio {
                        male: row.get::<_, i64>(0)? as u64,
                        female: row.get::<_, i64>(1)? as u64,
                    })
                },
            )
            .map_err(Into::into)
    }
}
