//! End-to-end invoice creation against an in-memory database.

use clinic_billing_core::billing::{InvoiceLedger, InvoiceNumberGenerator, InvoiceQuery};
use clinic_billing_core::catalog::TestCatalog;
use clinic_billing_core::db::Database;
use clinic_billing_core::models::{
    DiscountType, InvoiceFilter, InvoiceRequest, LabTestInput, Page, PatientInput,
};
use clinic_billing_core::report::daily_invoice_report;
use clinic_billing_core::resolver::PatientResolver;
use clinic_billing_core::BillingError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn patient_input(phone: &str) -> PatientInput {
    PatientInput {
        phone: Some(phone.to_string()),
        name: Some("Karima Begum".to_string()),
        gender: Some("female".to_string()),
        age: Some(35),
        address: Some("Chattogram".to_string()),
    }
}

fn add_test(db: &Database, name: &str, price: Decimal) -> i64 {
    TestCatalog::new(db)
        .create(&LabTestInput {
            name: Some(name.to_string()),
            price: Some(price),
        })
        .unwrap()
        .id
}

#[test]
fn test_walk_in_patient_to_receipt() {
    let mut db = Database::open_in_memory().unwrap();
    let numbers = InvoiceNumberGenerator::for_database(&db).unwrap();

    let cbc = add_test(&db, "CBC", dec!(100));
    let sugar = add_test(&db, "Blood Sugar", dec!(50));

    // Live lookup finds nothing and creates nothing
    let resolver = PatientResolver::new(&db);
    assert!(resolver.find_by_phone("01711111111").unwrap().is_none());

    let patient = resolver
        .resolve_or_create(&patient_input("01711111111"))
        .unwrap()
        .into_patient();

    let request = InvoiceRequest {
        patient_id: Some(patient.id),
        test_ids: vec![cbc, sugar],
        discount_type: Some(DiscountType::Percent),
        discount_value: Some(dec!(10)),
    };
    let invoice = InvoiceLedger::new(&mut db, &numbers)
        .create(&request, Some("wizard-submit-1"))
        .unwrap()
        .into_invoice();

    assert_eq!(invoice.total_amount, dec!(150));
    assert_eq!(invoice.final_amount, dec!(135));

    let detail = InvoiceQuery::new(&db).detail(invoice.id).unwrap();
    assert_eq!(detail.patient.name, "Karima Begum");
    let names: Vec<_> = detail.lines.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["CBC", "Blood Sugar"]);

    let listing = InvoiceQuery::new(&db)
        .list(&InvoiceFilter::default(), Page::new(1, 10))
        .unwrap();
    assert_eq!(listing.total_items, 1);
    assert_eq!(listing.items[0].patient_phone, "01711111111");

    let report = daily_invoice_report(&db).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].invoice_count, 1);
    assert_eq!(report[0].collected_amount, dec!(135));
}

#[test]
fn test_returning_patient_is_not_duplicated() {
    let db = Database::open_in_memory().unwrap();
    let resolver = PatientResolver::new(&db);

    let first = resolver.resolve_or_create(&patient_input("01811111111")).unwrap();
    let second = resolver.resolve_or_create(&patient_input("01811111111")).unwrap();

    assert!(first.is_created());
    assert!(!second.is_created());
    assert_eq!(first.patient().id, second.patient().id);
    assert_eq!(resolver.search(None, None).unwrap().len(), 1);
}

#[test]
fn test_referenced_records_cannot_be_deleted() {
    let mut db = Database::open_in_memory().unwrap();
    let numbers = InvoiceNumberGenerator::new();
    let cbc = add_test(&db, "CBC", dec!(100));
    let patient = PatientResolver::new(&db)
        .resolve_or_create(&patient_input("01911111111"))
        .unwrap()
        .into_patient();

    let request = InvoiceRequest {
        patient_id: Some(patient.id),
        test_ids: vec![cbc],
        ..Default::default()
    };
    InvoiceLedger::new(&mut db, &numbers).create(&request, None).unwrap();

    assert!(matches!(
        PatientResolver::new(&db).delete(patient.id),
        Err(BillingError::Conflict(_))
    ));
    assert!(matches!(
        TestCatalog::new(&db).delete(cbc),
        Err(BillingError::Conflict(_))
    ));
}

#[test]
fn test_missing_test_writes_nothing() {
    let mut db = Database::open_in_memory().unwrap();
    let numbers = InvoiceNumberGenerator::new();
    let cbc = add_test(&db, "CBC", dec!(100));
    let patient = PatientResolver::new(&db)
        .resolve_or_create(&patient_input("01911111112"))
        .unwrap()
        .into_patient();

    let request = InvoiceRequest {
        patient_id: Some(patient.id),
        test_ids: vec![cbc, 404],
        ..Default::default()
    };
    let err = InvoiceLedger::new(&mut db, &numbers).create(&request, None).unwrap_err();

    assert!(matches!(err, BillingError::NotFound(ref m) if m.contains("404")));
    assert_eq!(db.count_invoices().unwrap(), 0);
}

#[test]
fn test_numbers_unique_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    let first_number = {
        let mut db = Database::open(&path).unwrap();
        let numbers = InvoiceNumberGenerator::seeded(9_000_000_000_000);
        let cbc = add_test(&db, "CBC", dec!(100));
        let patient = PatientResolver::new(&db)
            .resolve_or_create(&patient_input("01511111111"))
            .unwrap()
            .into_patient();
        let request = InvoiceRequest {
            patient_id: Some(patient.id),
            test_ids: vec![cbc],
            ..Default::default()
        };
        InvoiceLedger::new(&mut db, &numbers)
            .create(&request, None)
            .unwrap()
            .into_invoice()
            .invoice_number
    };

    let db = Database::open(&path).unwrap();
    let numbers = InvoiceNumberGenerator::for_database(&db).unwrap();
    assert_eq!(first_number, "INV-9000000000001");
    assert_eq!(numbers.next_number(), "INV-9000000000002");
}
