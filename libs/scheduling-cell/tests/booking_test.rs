// libs/scheduling-cell/tests/booking_test.rs
//
// Booking flow against a mock PostgREST server. The store's uniqueness
// constraint on confirmed start times is simulated with a 409 response.

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::models::{BookSlotRequest, ScheduleError};
use scheduling_cell::services::booking::BookingService;
use shared_utils::test_utils::TestConfig;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

struct TestSetup {
    service: BookingService,
    mock_server: MockServer,
    auth_token: String,
}

impl TestSetup {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();

        Self {
            service: BookingService::new(&config),
            mock_server,
            auth_token: "test_token".to_string(),
        }
    }

    /// Availability on 2025-07-10 at 09:00 and 10:00, no bookings yet.
    async fn mount_open_schedule(&self) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/availability_windows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
                "date": "2025-07-10",
                "times": ["09:00:00", "10:00:00"],
            })]))
            .mount(&self.mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()),
            )
            .mount(&self.mock_server)
            .await;
    }

    fn booking_request(&self) -> BookSlotRequest {
        BookSlotRequest {
            patient_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            patient_name: "Ana Silva".to_string(),
            patient_email: "ana@example.com".to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 7, 10, 9, 0, 0).unwrap(),
        }
    }

    fn created_appointment_body(&self) -> serde_json::Value {
        json!([{
            "id": "7f9c24e5-3011-45b8-b099-7c8b416df7a3",
            "patient_id": "550e8400-e29b-41d4-a716-446655440000",
            "patient_name": "Ana Silva",
            "patient_email": "ana@example.com",
            "start_time": "2025-07-10T09:00:00+00:00",
            "duration_minutes": 50,
            "status": "confirmed",
            "created_at": "2025-07-09T00:00:00+00:00",
        }])
    }
}

// ==============================================================================
// BOOKING TESTS
// ==============================================================================

#[tokio::test]
async fn booking_a_free_slot_succeeds() {
    let setup = TestSetup::new().await;
    setup.mount_open_schedule().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(setup.created_appointment_body()),
        )
        .mount(&setup.mock_server)
        .await;

    let now = Utc.with_ymd_and_hms(2025, 7, 9, 0, 0, 0).unwrap();
    let appointment = setup
        .service
        .confirm_booking(setup.booking_request(), now, &setup.auth_token)
        .await
        .expect("booking should succeed");

    assert_eq!(appointment.patient_name, "Ana Silva");
    assert_eq!(
        appointment.start_time,
        Utc.with_ymd_and_hms(2025, 7, 10, 9, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn lost_race_surfaces_as_slot_already_booked() {
    // Scenario F: the pre-check passes (slot still looks free) but another
    // patient's insert lands first, so the store rejects ours with 409.
    let setup = TestSetup::new().await;
    setup.mount_open_schedule().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_string(
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#,
        ))
        .mount(&setup.mock_server)
        .await;

    let now = Utc.with_ymd_and_hms(2025, 7, 9, 0, 0, 0).unwrap();
    let result = setup
        .service
        .confirm_booking(setup.booking_request(), now, &setup.auth_token)
        .await;

    assert_matches!(result, Err(ScheduleError::SlotAlreadyBooked));
}

#[tokio::test]
async fn stale_slot_selection_is_rejected_before_the_write() {
    // The slot is already booked in the latest fetched state, so the
    // optimistic pre-filter catches it and no insert is attempted.
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({
            "date": "2025-07-10",
            "times": ["09:00:00", "10:00:00"],
        })]))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(setup.created_appointment_body()))
        .mount(&setup.mock_server)
        .await;

    let now = Utc.with_ymd_and_hms(2025, 7, 9, 0, 0, 0).unwrap();
    let result = setup
        .service
        .confirm_booking(setup.booking_request(), now, &setup.auth_token)
        .await;

    assert_matches!(result, Err(ScheduleError::InvalidSlotSelection));
}

#[tokio::test]
async fn booking_into_the_past_is_rejected() {
    let setup = TestSetup::new().await;

    let now = Utc.with_ymd_and_hms(2025, 7, 10, 9, 0, 0).unwrap();
    let result = setup
        .service
        .confirm_booking(setup.booking_request(), now, &setup.auth_token)
        .await;

    assert_matches!(result, Err(ScheduleError::InvalidTime(_)));
}

#[tokio::test]
async fn undeclared_time_is_rejected() {
    let setup = TestSetup::new().await;
    setup.mount_open_schedule().await;

    let mut request = setup.booking_request();
    request.start_time = Utc.with_ymd_and_hms(2025, 7, 10, 11, 0, 0).unwrap();

    let now = Utc.with_ymd_and_hms(2025, 7, 9, 0, 0, 0).unwrap();
    let result = setup
        .service
        .confirm_booking(request, now, &setup.auth_token)
        .await;

    assert_matches!(result, Err(ScheduleError::InvalidSlotSelection));
}

#[tokio::test]
async fn unreachable_store_reports_fetch_failure() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_windows"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&setup.mock_server)
        .await;

    let now = Utc.with_ymd_and_hms(2025, 7, 9, 0, 0, 0).unwrap();
    let result = setup
        .service
        .confirm_booking(setup.booking_request(), now, &setup.auth_token)
        .await;

    assert_matches!(result, Err(ScheduleError::AvailabilityFetchFailed(_)));
}
