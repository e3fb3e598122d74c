mod common;

use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{booking_payload, expect_status, TestApp};
use serde_json::json;
use studio_booking::{
    domain::models::availability::SlotModality,
    domain::models::site_content::SiteContent,
    error::AppError,
};

#[tokio::test]
async fn test_demo_reads_return_snapshot() {
    let app = TestApp::demo().await;

    let body = expect_status(app.request("GET", "/health", None).await, StatusCode::OK).await;
    assert_eq!(body["status"], "ok");

    let body = expect_status(app.request("GET", "/api/v1/backend", None).await, StatusCode::OK).await;
    assert_eq!(body["mode"], "demo");
    assert_eq!(body["readOnly"], true);

    let body = expect_status(app.request("GET", "/api/v1/availability/2025-03-01", None).await, StatusCode::OK).await;
    assert_eq!(body["studioSlots"]["Mitte"], json!(["10:00", "12:00"]));

    let body = expect_status(app.request("GET", "/api/v1/availability/2025-03-03", None).await, StatusCode::OK).await;
    assert_eq!(body["onlineSlots"], json!(["16:00", "17:00"]));

    let body = expect_status(app.request("GET", "/api/v1/packages", None).await, StatusCode::OK).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let body = expect_status(app.admin_request("GET", "/api/v1/bookings", None).await, StatusCode::OK).await;
    assert_eq!(body[0]["id"], "demo-booking-2", "newest first");

    let body = expect_status(app.request("GET", "/api/v1/content", None).await, StatusCode::OK).await;
    assert_eq!(body["businessName"], "Atelier Demo");
}

#[tokio::test]
async fn test_demo_rejects_every_write_over_http() {
    let app = TestApp::demo().await;

    let writes = [
        ("POST", "/api/v1/bookings".to_string(), Some(booking_payload("2025-03-01", "09:00"))),
        ("PUT", "/api/v1/availability/2025-03-01".to_string(), Some(json!({ "onlineSlots": ["10:00"] }))),
        ("POST", "/api/v1/availability/2025-03-01/slots".to_string(), Some(json!({ "modality": "online", "slot": "13:00" }))),
        ("PUT", "/api/v1/bookings/demo-booking-2".to_string(), Some(json!({ "status": "confirmed" }))),
        ("DELETE", "/api/v1/bookings/demo-booking-1".to_string(), None),
        ("PUT", "/api/v1/packages/pkg-new".to_string(), Some(json!({ "title": "New", "price": "1 €" }))),
        ("DELETE", "/api/v1/clients/client-mara".to_string(), None),
        ("PUT", "/api/v1/content".to_string(), Some(json!({ "businessName": "Hijacked" }))),
    ];

    for (method, uri, body) in writes {
        let res = app.admin_request(method, &uri, body).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
    }

    let body = expect_status(app.request("GET", "/api/v1/availability/2025-03-01", None).await, StatusCode::OK).await;
    assert_eq!(body["onlineSlots"], json!(["09:00", "10:00", "11:00", "14:00"]));
}

#[tokio::test]
async fn test_demo_adapter_rejects_writes_directly() {
    let app = TestApp::demo().await;
    let backend = &app.state.backend;
    let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    let availability = backend.availability.find_by_date(date).await.unwrap().unwrap();
    assert!(matches!(backend.availability.upsert(&availability).await, Err(AppError::ReadOnlyMode(_))));
    assert!(matches!(
        backend.availability.compare_and_swap(&availability, availability.version).await,
        Err(AppError::ReadOnlyMode(_))
    ));
    assert!(matches!(backend.bookings.delete("demo-booking-1").await, Err(AppError::ReadOnlyMode(_))));
    assert!(matches!(backend.content.save(&SiteContent::default()).await, Err(AppError::ReadOnlyMode(_))));

    let err = app.state.inventory.remove_slot(date, &SlotModality::Online, "09:00").await.unwrap_err();
    assert!(matches!(err, AppError::ReadOnlyMode(_)));
}
