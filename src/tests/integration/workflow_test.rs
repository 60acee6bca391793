use axum_test::{TestServer, TestServerConfig};
use chrono::Utc;
use serde_json::{json, Value};
use std::future::IntoFuture;
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

/// End-to-end workflow tests
#[cfg(test)]
mod workflow_tests {
    use super::*;

    // Helper function to set up a test environment with controlled dependencies
    fn setup_test_environment() -> (TestServer, TempDir) {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("test_appointments.csv");
        let store = Arc::new(CsvAppointmentStore::new(csv_path.to_str().unwrap()));

        let directory = Arc::new(ConsultantDirectory::from_consultants(vec![
            test_consultant("consultant-1"),
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

        // Always use development mode in tests
        let app = create_router(app_state, false);
        let config = TestServerConfig::builder().mock_transport().build();
        let server = TestServer::new_with_config(app, config).unwrap();

        (server, dir)
    }

    async fn book(server: &TestServer, client_id: &str, start_time: &str) -> Value {
        let response = server
            .post("/appointments")
            .json(&json!({
                "consultant_id": "consultant-1",
                "client_id": client_id,
                "start_time": start_time,
                "duration_minutes": 60,
                "modality": "ONLINE",
                "client_notes": "recurring cravings, wants coping strategies"
            }))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        response.json()
    }

    async fn slot_availability(server: &TestServer, date: &str) -> Vec<(String, bool)> {
        let response = server
            .get(&format!("/consultants/consultant-1/slots?date={}", date))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        let body: Value = response.json();
        body["slots"]
            .as_array()
            .unwrap()
            .iter()
            .map(|slot| {
                (
                    slot["start_time"].as_str().unwrap().to_string(),
                    slot["available"].as_bool().unwrap(),
                )
            })
            .collect()
    }

    // Test the full consultation lifecycle: slots, booking, confirmation,
    // completion and a one-shot review
    #[tokio::test]
    async fn test_complete_consultation_workflow() {
        let (server, _dir) = setup_test_environment();
        let date = upcoming_monday(Utc::now()).to_string();
        let start = format!("{}T09:00:00Z", date);

        // 1. All 32 template slots are open before any booking
        let slots = slot_availability(&server, &date).await;
        assert_eq!(slots.len(), 32);
        assert!(slots.iter().all(|(_, available)| *available));

        // 2. Book the 09:00 slot
        let booked = book(&server, "client-1", &start).await;
        assert_eq!(booked["status"], "PENDING");
        let id = booked["appointment_id"].as_str().unwrap().to_string();

        // 3. The booked hour is now masked, everything else stays open
        let slots = slot_availability(&server, &date).await;
        let unavailable: Vec<_> = slots
            .iter()
            .filter(|(_, available)| !available)
            .collect();
        assert_eq!(unavailable.len(), 4);
        assert!(unavailable
            .iter()
            .all(|(start_time, _)| start_time.contains("T09:")));

        // 4. Consultant confirms with a meeting link
        let response = server
            .post(&format!("/appointments/{}/confirm", id))
            .json(&json!({
                "consultant_id": "consultant-1",
                "meeting_link": "https://meet.example.org/session-1"
            }))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        let confirmed: Value = response.json();
        assert_eq!(confirmed["status"], "CONFIRMED");
        assert_eq!(
            confirmed["meeting_link"],
            "https://meet.example.org/session-1"
        );

        // 5. Consultant completes the session with notes
        let response = server
            .post(&format!("/appointments/{}/complete", id))
            .json(&json!({
                "consultant_id": "consultant-1",
                "notes": "agreed on weekly follow-ups"
            }))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        let completed: Value = response.json();
        assert_eq!(completed["status"], "COMPLETED");

        // 6. Client submits a review, exactly once
        let response = server
            .post(&format!("/appointments/{}/review", id))
            .json(&json!({
                "client_id": "client-1",
                "rating": 5,
                "comment": "felt heard and supported"
            }))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        let reviewed: Value = response.json();
        assert_eq!(reviewed["status"], "COMPLETED");
        assert_eq!(reviewed["review"]["rating"], 5);

        let response = server
            .post(&format!("/appointments/{}/review", id))
            .json(&json!({
                "client_id": "client-1",
                "rating": 4,
                "comment": null
            }))
            .await;
        assert_eq!(response.status_code().as_u16(), 422);
        let body: Value = response.json();
        assert_eq!(body["kind"], "REVIEW_ALREADY_EXISTS");
    }

    // Test that cancellation frees the interval for a new booking
    #[tokio::test]
    async fn test_cancellation_workflow() {
        let (server, _dir) = setup_test_environment();
        let date = upcoming_monday(Utc::now()).to_string();
        let start = format!("{}T14:00:00Z", date);

        let booked = book(&server, "client-1", &start).await;
        let id = booked["appointment_id"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/appointments/{}/cancel", id))
            .json(&json!({
                "actor_id": "client-1",
                "reason": "found support closer to home"
            }))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        let cancelled: Value = response.json();
        assert_eq!(cancelled["status"], "CANCELLED");
        assert_eq!(
            cancelled["cancellation_reason"],
            "found support closer to home"
        );

        // The interval is open again and a new client can take it
        let slots = slot_availability(&server, &date).await;
        assert!(slots.iter().all(|(_, available)| *available));

        let rebooked = book(&server, "client-2", &start).await;
        assert_eq!(rebooked["status"], "PENDING");
    }

    // Test that rescheduling retires the old appointment and creates a
    // replacement holding the new interval
    #[tokio::test]
    async fn test_reschedule_workflow() {
        let (server, _dir) = setup_test_environment();
        let date = upcoming_monday(Utc::now()).to_string();
        let old_start = format!("{}T09:00:00Z", date);
        let new_start = format!("{}T10:00:00Z", date);

        let booked = book(&server, "client-1", &old_start).await;
        let old_id = booked["appointment_id"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/appointments/{}/reschedule", old_id))
            .json(&json!({ "new_start": new_start }))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
        let replacement: Value = response.json();
        assert_eq!(replacement["status"], "PENDING");
        let new_id = replacement["appointment_id"].as_str().unwrap().to_string();
        assert_ne!(new_id, old_id);
        assert_eq!(replacement["client_id"], "client-1");

        // The superseded appointment carries the terminal marker
        let response = server.get(&format!("/appointments/{}", old_id)).await;
        let superseded: Value = response.json();
        assert_eq!(superseded["status"], "RESCHEDULED");

        // Availability reflects the swap: 09:00 freed, 10:00 held
        let slots = slot_availability(&server, &date).await;
        for (start_time, available) in &slots {
            if start_time.contains("T09:") {
                assert!(*available, "freed slot at {} should be open", start_time);
            }
            if start_time.contains("T10:") {
                assert!(!*available, "held slot at {} should be masked", start_time);
            }
        }
    }

    // Two clients race for the same slot; exactly one wins
    #[tokio::test]
    async fn test_concurrent_bookings_have_one_winner() {
        let (server, _dir) = setup_test_environment();
        let date = upcoming_monday(Utc::now()).to_string();
        let start = format!("{}T11:00:00Z", date);

        let payload = |client_id: &str| {
            json!({
                "consultant_id": "consultant-1",
                "client_id": client_id,
                "start_time": start,
                "duration_minutes": 60,
                "modality": "IN_PERSON",
                "client_notes": null
            })
        };

        let responses = futures::future::join_all(vec![
            server
                .post("/appointments")
                .json(&payload("client-1"))
                .into_future(),
            server
                .post("/appointments")
                .json(&payload("client-2"))
                .into_future(),
        ])
        .await;

        let mut statuses: Vec<u16> = responses
            .iter()
            .map(|response| response.status_code().as_u16())
            .collect();
        statuses.sort_unstable();
        assert_eq!(statuses, vec![200, 409]);

        let conflict = responses
            .iter()
            .find(|response| response.status_code().as_u16() == 409)
            .unwrap();
        let body: Value = conflict.json();
        assert_eq!(body["kind"], "SLOT_NO_LONGER_AVAILABLE");
    }
}
