use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A booked consultation. Created only by the booking coordinator and
/// mutated only through state machine transitions; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: Uuid,
    pub consultant_id: String,
    pub client_id: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub modality: Modality,
    pub status: AppointmentStatus,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub client_notes: Option<String>,
    pub consultant_notes: Option<String>,
    pub review: Option<Review>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.duration_minutes)
    }

    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    /// Half-open interval overlap: [start, end) against this appointment.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Whether an appointment in this status keeps its interval out of the
    /// bookable set. CANCELLED and RESCHEDULED release the interval; the
    /// replacement created on reschedule blocks on its own.
    pub fn blocks_slot(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed | AppointmentStatus::Completed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "PENDING"),
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
            AppointmentStatus::Rescheduled => write!(f, "RESCHEDULED"),
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            "RESCHEDULED" => Ok(AppointmentStatus::Rescheduled),
            other => Err(format!("unknown appointment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    Online,
    InPerson,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Online => write!(f, "ONLINE"),
            Modality::InPerson => write!(f, "IN_PERSON"),
        }
    }
}

impl std::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(Modality::Online),
            "IN_PERSON" => Ok(Modality::InPerson),
            other => Err(format!("unknown modality: {}", other)),
        }
    }
}

/// Post-completion feedback; at most one per appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: u8,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Everything a booking needs, threaded explicitly through the coordinator
/// instead of living in ambient session state.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub consultant_id: String,
    pub client_id: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub modality: Modality,
    pub client_notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Request/response bodies for the HTTP surface
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub consultant_id: String,
    pub client_id: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
    pub modality: Modality,
    pub client_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub consultant_id: String,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub actor_id: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub consultant_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub new_start: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub client_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub consultant_id: String,
    pub date: NaiveDate,
    pub slots: Vec<crate::models::consultant::Slot>,
}
