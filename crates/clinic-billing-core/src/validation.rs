//! Field constraints for patients and lab tests.
//!
//! Each checker returns the normalized value or a human-readable message.
//! [`Violations`] collects messages so a request reports every problem at once.

use rust_decimal::Decimal;

use crate::error::BillingError;
use crate::models::Gender;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const AGE_MAX: i64 = 150;

/// Upper bound for a stored price (DECIMAL(10,2)).
pub fn price_limit() -> Decimal {
    Decimal::new(100_000_000, 0)
}

/// Local mobile format: `01` followed by nine digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 11 && phone.starts_with("01") && phone.bytes().all(|b| b.is_ascii_digit())
}

pub fn phone(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Phone number is required".into());
    }
    if !is_valid_phone(value) {
        return Err("Phone number must be exactly 11 digits starting with 01".into());
    }
    Ok(value.to_string())
}

pub fn patient_name(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Name is required".into());
    }
    let len = value.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err("Name must be 2 to 100 characters long".into());
    }
    Ok(value.to_string())
}

pub fn gender(value: &str) -> Result<Gender, String> {
    value
        .trim()
        .parse()
        .map_err(|_| "Gender must be either 'male' or 'female'".to_string())
}

pub fn age(value: i64) -> Result<i64, String> {
    if value < 0 {
        return Err("Age cannot be negative".into());
    }
    if value > AGE_MAX {
        return Err("Age seems too high".into());
    }
    Ok(value)
}

pub fn address(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Address cannot be empty".into());
    }
    Ok(value.to_string())
}

pub fn test_name(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Name must not be empty".into());
    }
    let len = value.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err("Name must be between 2 and 100 characters".into());
    }
    Ok(value.to_string())
}

pub fn price(value: Decimal) -> Result<Decimal, String> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err("Price must be a positive value".into());
    }
    if value >= price_limit() {
        return Err("Price is too large".into());
    }
    Ok(value)
}

/// Accumulates validation messages.
#[derive(Debug, Default)]
pub struct Violations {
    messages: Vec<String>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error of a checker, passing a valid value through.
    pub fn check<T>(&mut self, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.messages.push(message);
                None
            }
        }
    }

    /// Record `message` when a required value is absent.
    pub fn require<T>(&mut self, value: Option<T>, message: &str) -> Option<T> {
        if value.is_none() {
            self.messages.push(message.to_string());
        }
        value
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_result(self) -> Result<(), BillingError> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(BillingError::Validation(self.messages))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_phone_format() {
        assert!(is_valid_phone("01711111111"));
        assert!(!is_valid_phone("0171111111"));
        assert!(!is_valid_phone("02711111111"));
        assert!(!is_valid_phone("0171111111a"));
        assert!(!is_valid_phone("+8801711111"));
        assert_eq!(phone(" 01711111111 ").unwrap(), "01711111111");
        assert_eq!(phone("").unwrap_err(), "Phone number is required");
    }

    #[test]
    fn test_name_length_counts_chars() {
        assert!(patient_name("A").is_err());
        assert!(patient_name("Al").is_ok());
        assert!(patient_name(&"x".repeat(101)).is_err());
        // Multi-byte names are measured in characters, not bytes
        assert!(patient_name("রহিম").is_ok());
    }

    #[test]
    fn test_gender_and_age() {
        assert_eq!(gender("male").unwrap(), Gender::Male);
        assert_eq!(gender("FEMALE").unwrap(), Gender::Female);
        assert!(gender("other").is_err());
        assert!(age(0).is_ok());
        assert!(age(150).is_ok());
        assert!(age(-1).is_err());
        assert!(age(151).is_err());
    }

    #[test]
    fn test_price_bounds() {
        assert!(price(dec!(0)).is_ok());
        assert!(price(dec!(99.50)).is_ok());
        assert!(price(dec!(-0.01)).is_err());
        assert!(price(dec!(100000000)).is_err());
    }

    #[test]
    fn test_violations_collects_all() {
        let mut v = Violations::new();
        assert_eq!(v.check(phone("123")), None);
        assert_eq!(v.require::<i64>(None, "Age is required"), None);
        assert_eq!(v.check(address("Dhaka")), Some("Dhaka".to_string()));
        assert_eq!(v.messages().len(), 2);
        assert!(matches!(v.into_result(), Err(BillingError::Validation(m)) if m.len() == 2));
    }
}
