use axum_test::{TestServer, TestServerConfig};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use crate::config::SchedulingConfig;
use crate::handlers::api::AppState;
use crate::notifier::NoopNotifier;
use crate::routes::create_router;
use crate::services::booking::BookingCoordinator;
use crate::services::directory::ConsultantDirectory;
use crate::services::storage::CsvAppointmentStore;
use crate::tests::fixtures::{test_consultant, upcoming_monday};

/// Endpoint-level tests against the full router
#[cfg(test)]
mod api_tests {
    use super::*;

    // Set up a test server over a temporary store and a two-consultant
    // directory; notifications are dropped
    fn setup_test_server(is_production: bool) -> (TestServer, TempDir) {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("test_appointments.csv");
        let store = Arc::new(CsvAppointmentStore::new(csv_path.to_str().unwrap()));

        let mut second = test_consultant("consultant-2");
        second.specialty = "family-support".to_string();
        let directory = Arc::new(ConsultantDirectory::from_consultants(vec![
            test_consultant("consultant-1"),
            second,
        ]));

        let coordinator = BookingCoordinator::new(
            store,
            Arc::clone(&directory),
            Arc::new(NoopNotifier),
            SchedulingConfig::default(),
        );

        let app_state = Arc::new(AppState {
            coordinator,
            directory,
        });

        let app = create_router(app_state, is_production);
        let config = TestServerConfig::builder().mock_transport().build();
        let server = TestServer::new_with_config(app, config).unwrap();

        (server, dir)
    }

    fn booking_payload(client_id: &str, start_time: &str) -> Value {
        json!({
            "consultant_id": "consultant-1",
            "client_id": client_id,
            "start_time": start_time,
            "duration_minutes": 60,
            "modality": "ONLINE",
            "client_notes": "first session"
        })
    }

    fn bookable_start() -> String {
        format!("{}T09:00:00Z", upcoming_monday(Utc::now()))
    }

    #[tokio::test]
    async fn test_health_check() {
        let (server, _dir) = setup_test_server(false);

        let response = server.get("/health").await;
        assert_eq!(response.status_code().as_u16(), 200);
        assert_eq!(response.text(), "OK");
    }

    #[tokio::test]
    async fn test_list_consultants_with_specialty_filter() {
        let (server, _dir) = setup_test_server(false);

        let response = server.get("/consultants").await;
        assert_eq!(response.status_code().as_u16(), 200);
        let body: Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 2);

        let response = server.get("/consultants?specialty=family-support").await;
        let body: Value = response.json();
        let consultants = body.as_array().unwrap();
        assert_eq!(consultants.len(), 1);
        assert_eq!(consultants[0]["consultant_id"], "consultant-2");
    }

    #[tokio::test]
    async fn test_unknown_consultant_is_typed_not_found() {
        let (server, _dir) = setup_test_server(false);

        let response = server.get("/consultants/consultant-9").await;
        assert_eq!(response.status_code().as_u16(), 404);
        let body: Value = response.json();
        assert_eq!(body["kind"], "CONSULTANT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_slot_listing_returns_quantized_sequence() {
        let (server, _dir) = setup_test_server(false);
        let date = upcoming_monday(Utc::now());

        let response = server
            .get(&format!("/consultants/consultant-1/slots?date={}", date))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);

        let body: Value = response.json();
        assert_eq!(body["consultant_id"], "consultant-1");
        let slots = body["slots"].as_array().unwrap();
        assert_eq!(slots.len(), 32);
        assert!(slots.iter().all(|slot| slot["available"] == json!(true)));
    }

    #[tokio::test]
    async fn test_book_then_fetch_appointment() {
        let (server, _dir) = setup_test_server(false);
        let start = bookable_start();

        let response = server
            .post("/appointments")
            .json(&booking_payload("client-1", &start))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        let booked: Value = response.json();
        assert_eq!(booked["status"], "PENDING");
        assert_eq!(booked["client_notes"], "first session");

        let id = booked["appointment_id"].as_str().unwrap();
        let response = server.get(&format!("/appointments/{}", id)).await;
        assert_eq!(response.status_code().as_u16(), 200);
        let fetched: Value = response.json();
        assert_eq!(fetched["appointment_id"], booked["appointment_id"]);
    }

    #[tokio::test]
    async fn test_double_booking_is_conflict() {
        let (server, _dir) = setup_test_server(false);
        let start = bookable_start();

        let response = server
            .post("/appointments")
            .json(&booking_payload("client-1", &start))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);

        let response = server
            .post("/appointments")
            .json(&booking_payload("client-2", &start))
            .await;
        assert_eq!(response.status_code().as_u16(), 409);
        let body: Value = response.json();
        assert_eq!(body["kind"], "SLOT_NO_LONGER_AVAILABLE");
    }

    #[tokio::test]
    async fn test_completing_pending_appointment_is_unprocessable() {
        let (server, _dir) = setup_test_server(false);

        let response = server
            .post("/appointments")
            .json(&booking_payload("client-1", &bookable_start()))
            .await;
        let booked: Value = response.json();
        let id = booked["appointment_id"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/appointments/{}/complete", id))
            .json(&json!({ "consultant_id": "consultant-1", "notes": null }))
            .await;
        assert_eq!(response.status_code().as_u16(), 422);
        let body: Value = response.json();
        assert_eq!(body["kind"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_wrong_actor_is_forbidden() {
        let (server, _dir) = setup_test_server(false);

        let response = server
            .post("/appointments")
            .json(&booking_payload("client-1", &bookable_start()))
            .await;
        let booked: Value = response.json();
        let id = booked["appointment_id"].as_str().unwrap().to_string();

        // Clients may not confirm their own appointments
        let response = server
            .post(&format!("/appointments/{}/confirm", id))
            .json(&json!({ "consultant_id": "client-1" }))
            .await;
        assert_eq!(response.status_code().as_u16(), 403);
        let body: Value = response.json();
        assert_eq!(body["kind"], "ACTOR_NOT_PERMITTED");
    }

    #[tokio::test]
    async fn test_unknown_appointment_is_typed_not_found() {
        let (server, _dir) = setup_test_server(false);

        let response = server
            .post("/appointments/00000000-0000-0000-0000-000000000000/cancel")
            .json(&json!({ "actor_id": "client-1", "reason": "gone" }))
            .await;
        assert_eq!(response.status_code().as_u16(), 404);
        let body: Value = response.json();
        assert_eq!(body["kind"], "APPOINTMENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_production_mode_disables_ops_routes() {
        let (server, _dir) = setup_test_server(true);

        let response = server.get("/sample-requests").await;
        assert_eq!(response.status_code().as_u16(), 404);

        let date = upcoming_monday(Utc::now());
        let response = server
            .get(&format!(
                "/consultants/consultant-1/appointments?from={}&to={}",
                date, date
            ))
            .await;
        assert_eq!(response.status_code().as_u16(), 404);

        // Client-facing routes stay up
        let response = server.get("/health").await;
        assert_eq!(response.status_code().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_dev_mode_exposes_ops_routes() {
        let (server, _dir) = setup_test_server(false);

        let response = server.get("/sample-requests").await;
        assert_eq!(response.status_code().as_u16(), 200);

        let date = upcoming_monday(Utc::now());
        let response = server
            .get(&format!(
                "/consultants/consultant-1/appointments?from={}&to={}",
                date, date
            ))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        let body: Value = response.json();
        assert!(body.as_array().unwrap().is_empty());
    }
}
