use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::api::{
    book_appointment, cancel_appointment, complete_appointment, confirm_appointment,
    get_appointment, get_available_slots, get_consultant, list_consultant_appointments,
    list_consultants, reschedule_appointment, submit_review, AppState,
};
use crate::handlers::test::{health_check, sample_requests};

pub fn create_router(app_state: Arc<AppState>, is_production: bool) -> Router {
    let mut router = Router::new();

    // Health check is always available
    let health_route = Router::new().route("/health", get(health_check));
    router = router.merge(health_route);

    // Client-facing scheduling operations are always available
    let scheduling_routes = Router::new()
        .route("/consultants", get(list_consultants))
        .route("/consultants/:consultant_id", get(get_consultant))
        .route(
            "/consultants/:consultant_id/slots",
            get(get_available_slots),
        )
        .route("/appointments", post(book_appointment))
        .route("/appointments/:appointment_id", get(get_appointment))
        .route(
            "/appointments/:appointment_id/confirm",
            post(confirm_appointment),
        )
        .route(
            "/appointments/:appointment_id/cancel",
            post(cancel_appointment),
        )
        .route(
            "/appointments/:appointment_id/complete",
            post(complete_appointment),
        )
        .route(
            "/appointments/:appointment_id/reschedule",
            post(reschedule_appointment),
        )
        .route("/appointments/:appointment_id/review", post(submit_review));
    router = router.merge(scheduling_routes);

    // Only add operational routes if not in production mode
    if !is_production {
        let ops_routes = Router::new()
            .route(
                "/consultants/:consultant_id/appointments",
                get(list_consultant_appointments),
            )
            .route("/sample-requests", get(sample_requests));

        router = router.merge(ops_routes);

        info!("Operational routes enabled - server running in development mode");
    } else {
        info!("Running in production mode - operational routes disabled");
    }

    router.with_state(app_state)
}
