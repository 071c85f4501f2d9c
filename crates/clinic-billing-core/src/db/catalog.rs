//! Lab test catalog database operations.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension, Row};

use super::{like_pattern, money_column, money_to_sql, Database, DbResult};
use crate::models::{now_timestamp, LabTest, LabTestChanges, LabTestId, NewLabTest};

const TEST_COLUMNS: &str = "id, name, price, created_at, updated_at";

fn lab_test_from_row(row: &Row<'_>) -> rusqlite::Result<LabTest> {
    Ok(LabTest {
        id: row.get(0)?,
        name: row.get(1)?,
        price: money_column(row, 2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl Database {
    /// Insert a catalog entry and return the stored record.
    pub fn insert_lab_test(&self, test: &NewLabTest) -> DbResult<LabTest> {
        let now = now_timestamp();
        let price = money_to_sql(test.price);
        self.conn.execute(
            "INSERT INTO tests (name, price, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![test.name, price, now],
        )?;
        let id = self.conn.last_insert_rowid();

        self.get_lab_test(id)?
            .ok_or_else(|| super::DbError::NotFound(format!("Test {id}")))
    }

    /// Get a catalog entry by ID.
    pub fn get_lab_test(&self, id: LabTestId) -> DbResult<Option<LabTest>> {
        self.conn
            .query_row(
                &format!("SELECT {TEST_COLUMNS} FROM tests WHERE id = ?"),
                [id],
                lab_test_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Fetch every requested ID that exists, keyed by ID.
    pub fn get_lab_tests_by_ids(&self, ids: &[LabTestId]) -> DbResult<HashMap<LabTestId, LabTest>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TEST_COLUMNS} FROM tests WHERE id IN ({placeholders})"
        ))?;
        let rows = stmt.query_map(rusqlite::params_from_iter(ids.iter()), lab_test_from_row)?;

        let mut found = HashMap::with_capacity(ids.len());
        for row in rows {
            let test = row?;
            found.insert(test.id, test);
        }
        Ok(found)
    }

    /// List the whole catalog ordered by name.
    pub fn list_lab_tests(&self) -> DbResult<Vec<LabTest>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TEST_COLUMNS} FROM tests ORDER BY name, id"))?;
        let rows = stmt.query_map([], lab_test_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Case-insensitive substring search on the test name.
    pub fn search_lab_tests(&self, name: &str) -> DbResult<Vec<LabTest>> {
        let mut stmt = self.conn.prepare(&format!(
            r"SELECT {TEST_COLUMNS} FROM tests WHERE name LIKE ?1 ESCAPE '\' ORDER BY name, id"
        ))?;
        let rows = stmt.query_map([like_pattern(name.trim())], lab_test_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Apply a validated partial update. Returns false if the test is absent.
    pub fn update_lab_test(&self, id: LabTestId, changes: &LabTestChanges) -> DbResult<bool> {
        let price = changes.price.map(money_to_sql);
        let rows_affected = self.conn.execute(
            r#"
            UPDATE tests SET
                name = COALESCE(?2, name),
                price = COALESCE(?3, price),
                updated_at = ?4
            WHERE id = ?1
            "#,
            params![id, changes.name, price, now_timestamp()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a catalog entry.
    pub fn delete_lab_test(&self, id: LabTestId) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM tests WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
