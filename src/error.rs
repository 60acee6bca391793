use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::models::appointment::AppointmentStatus;

/// Error taxonomy for the scheduling core.
///
/// Every failure a caller can branch on is a distinct variant with a stable
/// `kind()` tag; the HTTP layer serializes errors as `{kind, message}` so
/// clients never have to parse prose.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("slot starting at {start} is no longer available")]
    SlotNoLongerAvailable { start: DateTime<Utc> },

    #[error("cannot {event} an appointment in status {status}")]
    InvalidTransition {
        status: AppointmentStatus,
        event: &'static str,
    },

    #[error("the {required_notice_hours}h notice window for this appointment has passed")]
    CancellationWindowExpired { required_notice_hours: i64 },

    #[error("a review was already submitted for this appointment")]
    ReviewAlreadyExists,

    #[error("consultant {0} not found")]
    ConsultantNotFound(String),

    #[error("appointment {0} not found")]
    AppointmentNotFound(Uuid),

    #[error("actor {actor_id} may not {event} this appointment")]
    ActorNotPermitted {
        actor_id: String,
        event: &'static str,
    },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl SchedulingError {
    /// Stable machine-readable tag for callers that branch on error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulingError::SlotNoLongerAvailable { .. } => "SLOT_NO_LONGER_AVAILABLE",
            SchedulingError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SchedulingError::CancellationWindowExpired { .. } => "CANCELLATION_WINDOW_EXPIRED",
            SchedulingError::ReviewAlreadyExists => "REVIEW_ALREADY_EXISTS",
            SchedulingError::ConsultantNotFound(_) => "CONSULTANT_NOT_FOUND",
            SchedulingError::AppointmentNotFound(_) => "APPOINTMENT_NOT_FOUND",
            SchedulingError::ActorNotPermitted { .. } => "ACTOR_NOT_PERMITTED",
            SchedulingError::Validation(_) => "VALIDATION",
            SchedulingError::Storage(_) => "STORAGE",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            SchedulingError::SlotNoLongerAvailable { .. } => StatusCode::CONFLICT,
            SchedulingError::InvalidTransition { .. }
            | SchedulingError::CancellationWindowExpired { .. }
            | SchedulingError::ReviewAlreadyExists => StatusCode::UNPROCESSABLE_ENTITY,
            SchedulingError::ConsultantNotFound(_) | SchedulingError::AppointmentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SchedulingError::ActorNotPermitted { .. } => StatusCode::FORBIDDEN,
            SchedulingError::Validation(_) => StatusCode::BAD_REQUEST,
            SchedulingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        let body = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
