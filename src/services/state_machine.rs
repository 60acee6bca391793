use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::appointment::{Appointment, AppointmentStatus, Review};
use crate::notifier::{NotificationEvent, NotificationKind};

/// An action taken against an existing appointment. Creation is not an
/// event; only the booking coordinator creates appointments.
#[derive(Debug, Clone)]
pub enum AppointmentEvent {
    Confirm {
        meeting_link: Option<String>,
        location: Option<String>,
    },
    Cancel {
        reason: String,
    },
    Complete {
        notes: Option<String>,
    },
    Reschedule,
    SubmitReview {
        rating: u8,
        comment: Option<String>,
    },
}

impl AppointmentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppointmentEvent::Confirm { .. } => "confirm",
            AppointmentEvent::Cancel { .. } => "cancel",
            AppointmentEvent::Complete { .. } => "complete",
            AppointmentEvent::Reschedule => "reschedule",
            AppointmentEvent::SubmitReview { .. } => "review",
        }
    }
}

/// Apply one lifecycle event to an appointment.
///
/// Pure: returns the updated appointment value and the notification the
/// caller should emit, or a typed error. Illegal transitions never no-op.
/// The actor is identified by id and must be a party to the appointment in
/// the role the transition table requires. Lead-time policy is deliberately
/// absent here; the booking coordinator checks the cancellation window
/// before invoking cancel/reschedule.
pub fn apply_event(
    appointment: &Appointment,
    event: AppointmentEvent,
    actor_id: &str,
    now: DateTime<Utc>,
) -> Result<(Appointment, Option<NotificationEvent>), SchedulingError> {
    debug!(
        "Applying {} to appointment {} in status {} (actor {})",
        event.name(),
        appointment.appointment_id,
        appointment.status,
        actor_id
    );

    match event {
        AppointmentEvent::Confirm {
            meeting_link,
            location,
        } => {
            require_consultant(appointment, actor_id, "confirm")?;
            require_status(appointment, &[AppointmentStatus::Pending], "confirm")?;

            let mut updated = appointment.clone();
            updated.status = AppointmentStatus::Confirmed;
            if meeting_link.is_some() {
                updated.meeting_link = meeting_link;
            }
            if location.is_some() {
                updated.location = location;
            }
            updated.updated_at = now;

            let notification = NotificationEvent {
                appointment_id: appointment.appointment_id,
                kind: NotificationKind::Confirmed,
                recipient_id: appointment.client_id.clone(),
            };
            Ok((updated, Some(notification)))
        }

        AppointmentEvent::Cancel { reason } => {
            require_party(appointment, actor_id, "cancel")?;
            require_status(
                appointment,
                &[AppointmentStatus::Pending, AppointmentStatus::Confirmed],
                "cancel",
            )?;

            let mut updated = appointment.clone();
            updated.status = AppointmentStatus::Cancelled;
            updated.cancellation_reason = Some(reason);
            updated.updated_at = now;

            // Notify whichever party did not trigger the cancellation.
            let recipient_id = if actor_id == appointment.client_id {
                appointment.consultant_id.clone()
            } else {
                appointment.client_id.clone()
            };
            let notification = NotificationEvent {
                appointment_id: appointment.appointment_id,
                kind: NotificationKind::Cancelled,
                recipient_id,
            };
            Ok((updated, Some(notification)))
        }

        AppointmentEvent::Complete { notes } => {
            require_consultant(appointment, actor_id, "complete")?;
            require_status(appointment, &[AppointmentStatus::Confirmed], "complete")?;

            let mut updated = appointment.clone();
            updated.status = AppointmentStatus::Completed;
            if notes.is_some() {
                updated.consultant_notes = notes;
            }
            updated.updated_at = now;

            let notification = NotificationEvent {
                appointment_id: appointment.appointment_id,
                kind: NotificationKind::Completed,
                recipient_id: appointment.client_id.clone(),
            };
            Ok((updated, Some(notification)))
        }

        AppointmentEvent::Reschedule => {
            require_client(appointment, actor_id, "reschedule")?;
            require_status(
                appointment,
                &[AppointmentStatus::Pending, AppointmentStatus::Confirmed],
                "reschedule",
            )?;

            // Terminal marker on the superseded appointment. The coordinator
            // creates the PENDING replacement and emits its CREATED event.
            let mut updated = appointment.clone();
            updated.status = AppointmentStatus::Rescheduled;
            updated.updated_at = now;
            Ok((updated, None))
        }

        AppointmentEvent::SubmitReview { rating, comment } => {
            require_client(appointment, actor_id, "review")?;
            require_status(appointment, &[AppointmentStatus::Completed], "review")?;
            if appointment.review.is_some() {
                warn!(
                    "Duplicate review submission for appointment {}",
                    appointment.appointment_id
                );
                return Err(SchedulingError::ReviewAlreadyExists);
            }
            if !(1..=5).contains(&rating) {
                return Err(SchedulingError::Validation(format!(
                    "rating must be between 1 and 5, got {}",
                    rating
                )));
            }

            // Status is unchanged; the review is attached exactly once.
            let mut updated = appointment.clone();
            updated.review = Some(Review {
                rating,
                comment,
                submitted_at: now,
            });
            updated.updated_at = now;
            Ok((updated, None))
        }
    }
}

fn require_status(
    appointment: &Appointment,
    allowed: &[AppointmentStatus],
    event: &'static str,
) -> Result<(), SchedulingError> {
    if allowed.contains(&appointment.status) {
        Ok(())
    } else {
        warn!(
            "Illegal transition: {} attempted on appointment {} in status {}",
            event, appointment.appointment_id, appointment.status
        );
        Err(SchedulingError::InvalidTransition {
            status: appointment.status,
            event,
        })
    }
}

fn require_consultant(
    appointment: &Appointment,
    actor_id: &str,
    event: &'static str,
) -> Result<(), SchedulingError> {
    if actor_id == appointment.consultant_id {
        Ok(())
    } else {
        Err(SchedulingError::ActorNotPermitted {
            actor_id: actor_id.to_string(),
            event,
        })
    }
}

fn require_client(
    appointment: &Appointment,
    actor_id: &str,
    event: &'static str,
) -> Result<(), SchedulingError> {
    if actor_id == appointment.client_id {
        Ok(())
    } else {
        Err(SchedulingError::ActorNotPermitted {
            actor_id: actor_id.to_string(),
            event,
        })
    }
}

fn require_party(
    appointment: &Appointment,
    actor_id: &str,
    event: &'static str,
) -> Result<(), SchedulingError> {
    if actor_id == appointment.client_id || actor_id == appointment.consultant_id {
        Ok(())
    } else {
        Err(SchedulingError::ActorNotPermitted {
            actor_id: actor_id.to_string(),
            event,
        })
    }
}
