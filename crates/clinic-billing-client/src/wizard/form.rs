//! Patient step: form fields and the phone lookup lifecycle.

use clinic_billing_core::models::{Gender, Patient, PatientId, PatientInput};
use clinic_billing_core::validation::{self, Violations};

/// Patient fields as entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientForm {
    pub phone: String,
    pub name: String,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
    pub address: String,
}

impl PatientForm {
    /// Every violated constraint, in field order.
    pub fn errors(&self) -> Vec<String> {
        let mut v = Violations::new();
        v.check(validation::phone(&self.phone));
        v.check(validation::patient_name(&self.name));
        v.require(self.gender, "Gender is required");
        match self.age {
            Some(age) => {
                v.check(validation::age(age));
            }
            None => {
                v.push("Age is required");
            }
        }
        v.check(validation::address(&self.address));
        v.messages().to_vec()
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    pub fn to_input(&self) -> PatientInput {
        PatientInput {
            phone: Some(self.phone.trim().to_string()),
            name: Some(self.name.trim().to_string()),
            gender: self.gender.map(|g| g.as_str().to_string()),
            age: self.age,
            address: Some(self.address.trim().to_string()),
        }
    }

    /// Clear everything except the phone.
    pub(crate) fn clear_details(&mut self) {
        self.name.clear();
        self.gender = None;
        self.age = None;
        self.address.clear();
    }

    pub(crate) fn fill_from(&mut self, patient: &Patient) {
        self.name = patient.name.clone();
        self.gender = Some(patient.gender);
        self.age = Some(patient.age);
        self.address = patient.address.clone();
    }
}

/// Identifies one phone lookup. Only the newest ticket may apply a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub(crate) generation: u64,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LookupState {
    /// Phone incomplete or not yet checked
    #[default]
    Idle,
    Pending,
    /// Known patient; details are prefilled and read-only
    Found(PatientId),
    /// Unknown phone; details stay editable
    NotFound,
    /// Lookup failed; details stay editable
    Failed(String),
}
