//! Patient models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type PatientId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// A stored patient. The phone number identifies at most one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Database-assigned ID
    pub id: PatientId,
    /// Local mobile number, `01` + nine digits
    pub phone: String,
    pub name: String,
    pub gender: Gender,
    pub age: i64,
    pub address: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A validated patient ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub phone: String,
    pub name: String,
    pub gender: Gender,
    pub age: i64,
    pub address: String,
}

/// Raw create-or-fetch request. Only `phone` is needed when the patient
/// already exists; the other fields are validated only on creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub address: Option<String>,
}

/// Raw partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdate {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub address: Option<String>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientChanges {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
    pub address: Option<String>,
}

impl PatientChanges {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.name.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.address.is_none()
    }
}

/// Patient counts per gender.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenderRatio {
    pub male: u64,
    pub female: u64,
}
