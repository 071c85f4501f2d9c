//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_billing_core::Database;
use clinic_billing_server::{api_router, app, AppState, ServerConfig};

fn test_app() -> Router {
    let state = AppState::new(Database::open_in_memory().unwrap()).unwrap();
    api_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

async fn send_with_headers(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn patient_body(phone: &str) -> Value {
    json!({
        "phone": phone,
        "name": "Rahim Uddin",
        "gender": "male",
        "age": 42,
        "address": "Mirpur, Dhaka"
    })
}

async fn create_test(app: &Router, name: &str, price: &str) -> i64 {
    let (status, body) = send(app, "POST", "/api/v1/create-test", Some(json!({ "name": name, "price": price }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_patient(app: &Router, phone: &str) -> i64 {
    let (status, body) = send(app, "POST", "/api/v1/patient", Some(patient_body(phone))).await;
    assert!(status == StatusCode::CREATED || status == StatusCode::OK);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn patient_create_is_idempotent_by_phone() {
    let app = test_app();

    let (status, first) = send(&app, "POST", "/api/v1/patient", Some(patient_body("01711111111"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["phone"], "01711111111");
    assert!(first["createdAt"].is_string());

    let mut changed = patient_body("01711111111");
    changed["name"] = json!("Different Name");
    let (status, second) = send(&app, "POST", "/api/v1/patient", Some(changed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["name"], "Rahim Uddin");

    let (_, all) = send(&app, "GET", "/api/v1/patient", None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn patient_validation_and_lookup() {
    let app = test_app();

    let (status, body) = send(&app, "POST", "/api/v1/patient", Some(json!({ "name": "No Phone" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
    assert_eq!(body["errors"][0], "Phone number is required");

    let mut bad = patient_body("01711111111");
    bad["age"] = json!(200);
    let (status, body) = send(&app, "POST", "/api/v1/patient", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);

    // Lookup never creates
    let (status, body) = send(&app, "GET", "/api/v1/patient?search=01999999999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    let (_, body) = send(&app, "GET", "/api/v1/patient", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/invoice")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patient_update_and_delete() {
    let app = test_app();
    let a = create_patient(&app, "01711111111").await;
    create_patient(&app, "01711111112").await;

    let (status, body) = send(&app, "PATCH", &format!("/api/v1/patient/{a}"), Some(json!({ "phone": "01711111112" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(&app, "PATCH", &format!("/api/v1/patient/{a}"), Some(json!({ "address": "Uttara" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "Uttara");

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/patient/{a}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "GET", &format!("/api/v1/patient/{a}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Patient not found");

    let (status, _) = send(&app, "GET", "/api/v1/patient/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_crud() {
    let app = test_app();
    let id = create_test(&app, "Lipid Profile", "800").await;
    create_test(&app, "CBC", "350.5").await;

    let (_, all) = send(&app, "GET", "/api/v1/get-all-test", None).await;
    assert_eq!(all[0]["name"], "CBC");
    assert_eq!(all[0]["price"], "350.50");

    let (status, body) = send(&app, "PATCH", &format!("/api/v1/update-test/{id}"), Some(json!({ "price": 850 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Test updated successfully");
    assert_eq!(body["test"]["price"], "850.00");

    let (_, found) = send(&app, "GET", "/api/v1/search/lipid", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/delete-test/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &format!("/api/v1/delete-test/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", "/api/v1/create-test", Some(json!({ "name": "X", "price": -5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invoice_uses_catalog_prices() {
    let app = test_app();
    let patient_id = create_patient(&app, "01711111111").await;
    let cbc = create_test(&app, "CBC", "100").await;
    let sugar = create_test(&app, "Blood Sugar", "50").await;

    let request = json!({
        "patientId": patient_id,
        "testIds": [cbc, sugar],
        "discountType": "percent",
        "discountValue": 10,
        // Ignored: totals are always recomputed
        "totalAmount": 1,
        "finalAmount": 1
    });
    let (status, body) = send(&app, "POST", "/api/v1/invoice", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Invoice created successfully");
    assert_eq!(body["invoice"]["totalAmount"], "150.00");
    assert_eq!(body["invoice"]["finalAmount"], "135.00");
    assert!(body["invoice"]["invoiceNumber"].as_str().unwrap().starts_with("INV-"));

    let id = body["invoice"]["id"].as_i64().unwrap();
    let (status, detail) = send(&app, "GET", &format!("/api/v1/invoice/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["patient"]["phone"], "01711111111");
    assert_eq!(detail["lines"].as_array().unwrap().len(), 2);

    let (_, listing) = send(&app, "GET", "/api/v1/invoices?page=1&limit=5", None).await;
    assert_eq!(listing["totalItems"], 1);
    assert_eq!(listing["currentPage"], 1);
    assert_eq!(listing["invoices"][0]["patientName"], "Rahim Uddin");

    let (_, report) = send(&app, "GET", "/api/v1/invoice-report", None).await;
    assert_eq!(report[0]["invoiceCount"], 1);
    assert_eq!(report[0]["totalAmount"], "150.00");
    assert_eq!(report[0]["collectedAmount"], "135.00");

    let (_, ratio) = send(&app, "GET", "/api/v1/patient-gender-ratio", None).await;
    assert_eq!(ratio, json!({ "male": 1, "female": 0 }));
}

#[tokio::test]
async fn invoice_amount_discount_is_capped() {
    let app = test_app();
    let patient_id = create_patient(&app, "01711111111").await;
    let cbc = create_test(&app, "CBC", "100").await;
    let sugar = create_test(&app, "Blood Sugar", "50").await;

    let request = json!({
        "patientId": patient_id,
        "testIds": [cbc, sugar],
        "discountType": "amount",
        "discountValue": 200
    });
    let (status, body) = send(&app, "POST", "/api/v1/invoice", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invoice"]["finalAmount"], "0.00");
}

#[tokio::test]
async fn invoice_rejections() {
    let app = test_app();
    let patient_id = create_patient(&app, "01711111111").await;
    let cbc = create_test(&app, "CBC", "100").await;

    let (status, _) = send(&app, "POST", "/api/v1/invoice", Some(json!({ "patientId": patient_id, "testIds": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/invoice",
        Some(json!({ "patientId": patient_id, "testIds": [cbc], "discountType": "percent", "discountValue": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0], "Percent discount cannot exceed 100");

    let (status, body) = send(&app, "POST", "/api/v1/invoice", Some(json!({ "patientId": 999, "testIds": [cbc] }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Patient not found");

    let (status, body) = send(&app, "POST", "/api/v1/invoice", Some(json!({ "patientId": patient_id, "testIds": [cbc, 41, 42] }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Test(s) not found: 41, 42");

    let (_, listing) = send(&app, "GET", "/api/v1/invoices", None).await;
    assert_eq!(listing["totalItems"], 0);

    let (status, _) = send(&app, "GET", "/api/v1/invoice/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn idempotency_key_replays_invoice() {
    let app = test_app();
    let patient_id = create_patient(&app, "01711111111").await;
    let cbc = create_test(&app, "CBC", "100").await;
    let request = json!({ "patientId": patient_id, "testIds": [cbc] });
    let key = [("Idempotency-Key", "submit-7f3a")];

    let (status, first) = send_with_headers(&app, "POST", "/api/v1/invoice", Some(request.clone()), &key).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = send_with_headers(&app, "POST", "/api/v1/invoice", Some(request), &key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["invoice"]["id"], second["invoice"]["id"]);

    let (_, listing) = send(&app, "GET", "/api/v1/invoices", None).await;
    assert_eq!(listing["totalItems"], 1);
}

#[tokio::test]
async fn referenced_patient_cannot_be_deleted() {
    let app = test_app();
    let patient_id = create_patient(&app, "01711111111").await;
    let cbc = create_test(&app, "CBC", "100").await;
    send(&app, "POST", "/api/v1/invoice", Some(json!({ "patientId": patient_id, "testIds": [cbc] }))).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/patient/{patient_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, "DELETE", &format!("/api/v1/delete-test/{cbc}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let state = AppState::new(Database::open_in_memory().unwrap()).unwrap();
    let config = ServerConfig::default();
    let app = app(state, &config);

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
}
