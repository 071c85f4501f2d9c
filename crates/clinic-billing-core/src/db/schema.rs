//! SQLite schema definition.

/// Complete database schema for clinic billing.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    phone TEXT NOT NULL UNIQUE,                   -- 01 + nine digits
    name TEXT NOT NULL,
    gender TEXT NOT NULL CHECK (gender IN ('male', 'female')),
    age INTEGER NOT NULL CHECK (age BETWEEN 0 AND 150),
    address TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Lab Test Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS tests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,                           -- not unique
    price TEXT NOT NULL,                          -- decimal, two places
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tests_name ON tests(name);

-- ============================================================================
-- Invoices (Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_number TEXT NOT NULL UNIQUE,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE RESTRICT,
    total_amount TEXT NOT NULL,
    discount_type TEXT NOT NULL CHECK (discount_type IN ('percent', 'amount')),
    discount_value TEXT NOT NULL,
    final_amount TEXT NOT NULL,
    request_key TEXT UNIQUE,                      -- Idempotency-Key, optional
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invoices_patient ON invoices(patient_id);
CREATE INDEX IF NOT EXISTS idx_invoices_created ON invoices(created_at);

-- Line items: owned by the invoice, reference the catalog
CREATE TABLE IF NOT EXISTS test_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_id INTEGER NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    test_id INTEGER NOT NULL REFERENCES tests(id) ON DELETE RESTRICT,
    price TEXT NOT NULL,                          -- price charged at creation
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_test_results_invoice ON test_results(invoice_id);
CREATE INDEX IF NOT EXISTS idx_test_results_test ON test_results(test_id);

-- Invoices are financial records: no updates
CREATE TRIGGER IF NOT EXISTS invoices_immutable BEFORE UPDATE ON invoices
BEGIN
    SELECT RAISE(ABORT, 'Invoices are immutable');
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = setup();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_patient_checks() {
        let conn = setup();

        // Unknown gender should fail
        let result = conn.execute(
            "INSERT INTO patients (phone, name, gender, age, address, created_at, updated_at)
             VALUES ('01711111111', 'Rahim', 'other', 30, 'Dhaka', 'x', 'x')",
            [],
        );
        assert!(result.is_err());

        // Age out of range should fail
        let result = conn.execute(
            "INSERT INTO patients (phone, name, gender, age, address, created_at, updated_at)
             VALUES ('01711111111', 'Rahim', 'male', 151, 'Dhaka', 'x', 'x')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invoice_requires_patient() {
        let conn = setup();

        let result = conn.execute(
            "INSERT INTO invoices (invoice_number, patient_id, total_amount, discount_type,
                                   discount_value, final_amount, created_at)
             VALUES ('INV-1', 99, '10.00', 'percent', '0.00', '10.00', 'x')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invoice_update_blocked() {
        let conn = setup();
        conn.execute(
            "INSERT INTO patients (phone, name, gender, age, address, created_at, updated_at)
             VALUES ('01711111111', 'Rahim', 'male', 30, 'Dhaka', 'x', 'x')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO invoices (invoice_number, patient_id, total_amount, discount_type,
                                   discount_value, final_amount, created_at)
             VALUES ('INV-1', 1, '10.00', 'percent', '0.00', '10.00', 'x')",
            [],
        )
        .unwrap();

        let result = conn.execute("UPDATE invoices SET final_amount = '0.00'", []);
        assert!(result.is_err());
    }
}
