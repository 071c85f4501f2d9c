//! Patient resolution.
//!
//! Two entry points share the same phone index:
//!
//! - [`PatientResolver::find_by_phone`] is read-only and backs the wizard's
//!   live prefill.
//! - [`PatientResolver::resolve_or_create`] is the submit-time path. An
//!   existing record is returned unchanged; the stored fields win over
//!   whatever the request carried.

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{BillingError, BillingResult};
use crate::models::{
    GenderRatio, NewPatient, Page, Patient, PatientChanges, PatientId, PatientInput,
    PatientUpdate,
};
use crate::validation::{self, Violations};

const PATIENT_NOT_FOUND: &str = "Patient not found";
const PHONE_TAKEN: &str = "A patient with this phone number already exists";

/// Outcome of [`PatientResolver::resolve_or_create`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Phone already registered; record returned as stored.
    Existing(Patient),
    /// No match; a new patient was written.
    Created(Patient),
}

impl Resolution {
    pub fn patient(&self) -> &Patient {
        match self {
            Resolution::Existing(p) | Resolution::Created(p) => p,
        }
    }

    pub fn into_patient(self) -> Patient {
        match self {
            Resolution::Existing(p) | Resolution::Created(p) => p,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// Patient lookup, lookup-or-create and administration.
pub struct PatientResolver<'a> {
    db: &'a Database,
}

impl<'a> PatientResolver<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Exact phone lookup. Never creates a record.
    pub fn find_by_phone(&self, phone: &str) -> BillingResult<Option<Patient>> {
        let phone = validation::phone(phone).map_err(BillingError::validation)?;
        Ok(self.db.find_patient_by_phone(&phone)?)
    }

    /// List patients. A complete phone number is an exact lookup (zero or one
    /// result); anything else is a substring match over name and phone.
    pub fn search(&self, query: Option<&str>, page: Option<Page>) -> BillingResult<Vec<Patient>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        if let Some(phone) = query.filter(|q| validation::is_valid_phone(q)) {
            return Ok(self.db.find_patient_by_phone(phone)?.into_iter().collect());
        }
        Ok(self.db.search_patients(query, page)?)
    }

    /// Return the patient owning `input.phone`, creating one when the phone
    /// is unseen.
    pub fn resolve_or_create(&self, input: &PatientInput) -> BillingResult<Resolution> {
        let phone = input
            .phone
            .as_deref()
            .ok_or_else(|| BillingError::validation("Phone number is required"))
            .and_then(|p| validation::phone(p).map_err(BillingError::validation))?;

        if let Some(existing) = self.db.find_patient_by_phone(&phone)? {
            debug!(patient_id = existing.id, "Phone already registered");
            return Ok(Resolution::Existing(existing));
        }

        let new_patient = validate_new_patient(phone, input)?;
        match self.db.insert_patient(&new_patient) {
            Ok(patient) => {
                info!(patient_id = patient.id, "Created patient");
                Ok(Resolution::Created(patient))
            }
            Err(e) if e.is_unique_violation() => {
                warn!("Concurrent create for the same phone number");
                Err(BillingError::Conflict(PHONE_TAKEN.into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, id: PatientId) -> BillingResult<Patient> {
        self.db
            .get_patient(id)?
            .ok_or_else(|| BillingError::NotFound(PATIENT_NOT_FOUND.into()))
    }

    /// Apply a partial update. Each supplied field is validated.
    pub fn update(&self, id: PatientId, update: &PatientUpdate) -> BillingResult<Patient> {
        let changes = validate_changes(update)?;
        let current = self.get(id)?;
        if changes.is_empty() {
            return Ok(current);
        }

        if let Some(phone) = &changes.phone {
            if let Some(owner) = self.db.find_patient_by_phone(phone)? {
                if owner.id != id {
                    return Err(BillingError::Conflict(PHONE_TAKEN.into()));
                }
            }
        }

        match self.db.update_patient(id, &changes) {
            Ok(true) => {}
            Ok(false) => return Err(BillingError::NotFound(PATIENT_NOT_FOUND.into())),
            Err(e) if e.is_unique_violation() => {
                return Err(BillingError::Conflict(PHONE_TAKEN.into()))
            }
            Err(e) => return Err(e.into()),
        }
        info!(patient_id = id, "Updated patient");
        self.get(id)
    }

    /// Delete a patient that no invoice references.
    pub fn delete(&self, id: PatientId) -> BillingResult<()> {
        match self.db.delete_patient(id) {
            Ok(true) => {
                info!(patient_id = id, "Deleted patient");
                Ok(())
            }
            Ok(false) => Err(BillingError::NotFound(PATIENT_NOT_FOUND.into())),
            Err(e) if e.is_foreign_key_violation() => Err(BillingError::Conflict(
                "Patient has invoices and cannot be deleted".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub fn gender_ratio(&self) -> BillingResult<GenderRatio> {
        Ok(self.db.patient_gender_ratio()?)
    }
}

/// All fields are required when creating.
fn validate_new_patient(phone: String, input: &PatientInput) -> BillingResult<NewPatient> {
    let mut v = Violations::new();

    let name = v.check(validation::patient_name(input.name.as_deref().unwrap_or_default()));
    let gender = match input.gender.as_deref() {
        Some(g) => v.check(validation::gender(g)),
        None => v.require(None, "Gender is required"),
    };
    let age = match input.age {
        Some(a) => v.check(validation::age(a)),
        None => v.require(None, "Age is required"),
    };
    let address = v.check(validation::address(input.address.as_deref().unwrap_or_default()));

    v.into_result()?;
    match (name, gender, age, address) {
        (Some(name), Some(gender), Some(age), Some(address)) => Ok(NewPatient {
            phone,
            name,
            gender,
            age,
            address,
        }),
        _ => Err(BillingError::Internal("Patient fields missing after validation".into())),
    }
}

fn validate_changes(update: &PatientUpdate) -> BillingResult<PatientChanges> {
    let mut v = Violations::new();
    let changes = PatientChanges {
        phone: update.phone.as_deref().and_then(|p| v.check(validation::phone(p))),
        name: update.name.as_deref().and_then(|n| v.check(validation::patient_name(n))),
        gender: update.gender.as_deref().and_then(|g| v.check(validation::gender(g))),
        age: update.age.and_then(|a| v.check(validation::age(a))),
        address: update.address.as_deref().and_then(|a| v.check(validation::address(a))),
    };
    v.into_result()?;
    Ok(changes)
}
