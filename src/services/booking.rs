use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::error::SchedulingError;
use crate::models::appointment::{Appointment, AppointmentStatus, BookingDraft};
use crate::models::consultant::Slot;
use crate::notifier::{NotificationDispatcher, NotificationEvent, NotificationKind};
use crate::services::directory::ConsultantDirectory;
use crate::services::slots::{compute_available_slots, interval_is_bookable};
use crate::services::state_machine::{apply_event, AppointmentEvent};
use crate::services::storage::CsvAppointmentStore;

/// The only component that creates or mutates appointments.
///
/// All writes touching one consultant's appointment set are serialized
/// through a per-consultant mutex, so availability is always revalidated
/// against committed state and two concurrent bookings can never claim the
/// same interval. Slot reads run unsynchronized against a snapshot.
pub struct BookingCoordinator {
    store: Arc<CsvAppointmentStore>,
    directory: Arc<ConsultantDirectory>,
    notifier: Arc<dyn NotificationDispatcher>,
    config: SchedulingConfig,
    consultant_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BookingCoordinator {
    pub fn new(
        store: Arc<CsvAppointmentStore>,
        directory: Arc<ConsultantDirectory>,
        notifier: Arc<dyn NotificationDispatcher>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            config,
            consultant_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_duration_minutes(&self) -> i64 {
        self.config.default_duration_minutes
    }

    /// Advisory slot listing for a consultant and date. Always recomputed;
    /// `book` revalidates under the consultant lock before committing.
    pub fn available_slots(
        &self,
        consultant_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>, SchedulingError> {
        let consultant = self.directory.get(consultant_id)?;
        let existing = self.store.load_appointments(consultant_id, date, date)?;
        Ok(compute_available_slots(
            &consultant,
            date,
            &existing,
            &self.config,
            now,
        ))
    }

    /// Book a new appointment from a draft.
    ///
    /// Availability is recomputed from freshly loaded appointments under the
    /// consultant lock; a slot list rendered earlier in the session is never
    /// trusted. On success the appointment is saved in PENDING and the
    /// consultant is notified fire-and-forget.
    pub fn book(
        &self,
        draft: BookingDraft,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        if draft.duration_minutes <= 0 {
            return Err(SchedulingError::Validation(
                "duration must be a positive number of minutes".to_string(),
            ));
        }

        let consultant = self.directory.get(&draft.consultant_id)?;
        let lock = self.consultant_lock(&draft.consultant_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| SchedulingError::Storage(format!("consultant lock poisoned: {}", e)))?;

        let date = draft.start_time.date_naive();
        let existing = self
            .store
            .load_appointments(&draft.consultant_id, date, date)?;

        if !interval_is_bookable(
            &consultant,
            date,
            draft.start_time,
            draft.duration_minutes,
            &existing,
            &self.config,
            now,
        ) {
            warn!(
                "Rejected booking for consultant {} at {}: slot not available",
                draft.consultant_id, draft.start_time
            );
            return Err(SchedulingError::SlotNoLongerAvailable {
                start: draft.start_time,
            });
        }

        let appointment = Appointment {
            appointment_id: Uuid::new_v4(),
            consultant_id: draft.consultant_id,
            client_id: draft.client_id,
            start_time: draft.start_time,
            duration_minutes: draft.duration_minutes,
            modality: draft.modality,
            status: AppointmentStatus::Pending,
            meeting_link: None,
            location: None,
            client_notes: draft.client_notes,
            consultant_notes: None,
            review: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        let appointment = self.store.save_appointment(&appointment)?;
        info!(
            "Booked appointment {} for consultant {} at {}",
            appointment.appointment_id, appointment.consultant_id, appointment.start_time
        );

        self.notifier.dispatch(NotificationEvent {
            appointment_id: appointment.appointment_id,
            kind: NotificationKind::Created,
            recipient_id: appointment.consultant_id.clone(),
        });

        Ok(appointment)
    }

    pub fn confirm(
        &self,
        appointment_id: Uuid,
        consultant_id: &str,
        meeting_link: Option<String>,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        self.transition(
            appointment_id,
            AppointmentEvent::Confirm {
                meeting_link,
                location,
            },
            consultant_id,
            now,
        )
    }

    /// Cancel an appointment. The notice window is a precondition checked
    /// before the state machine runs.
    pub fn cancel(
        &self,
        appointment_id: Uuid,
        actor_id: &str,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.load_required(appointment_id)?;
        self.check_notice_window(&current, now)?;
        self.transition(appointment_id, AppointmentEvent::Cancel { reason }, actor_id, now)
    }

    pub fn complete(
        &self,
        appointment_id: Uuid,
        consultant_id: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        self.transition(
            appointment_id,
            AppointmentEvent::Complete { notes },
            consultant_id,
            now,
        )
    }

    pub fn submit_review(
        &self,
        appointment_id: Uuid,
        client_id: &str,
        rating: u8,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        self.transition(
            appointment_id,
            AppointmentEvent::SubmitReview { rating, comment },
            client_id,
            now,
        )
    }

    /// Move an appointment to a new start time.
    ///
    /// Checks the notice window on the current appointment and validates
    /// availability for the new interval exactly as `book` does (with the
    /// moved appointment excluded from the conflict set), then marks the old
    /// appointment RESCHEDULED and creates a PENDING replacement preserving
    /// consultant, client, duration, modality and client notes. Every
    /// validation runs before the first write.
    pub fn reschedule(
        &self,
        appointment_id: Uuid,
        new_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.load_required(appointment_id)?;
        self.check_notice_window(&current, now)?;

        let consultant = self.directory.get(&current.consultant_id)?;
        let lock = self.consultant_lock(&current.consultant_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| SchedulingError::Storage(format!("consultant lock poisoned: {}", e)))?;

        // Reload under the lock so the transition applies to committed state.
        let current = self.load_required(appointment_id)?;
        let (superseded, _) = apply_event(
            &current,
            AppointmentEvent::Reschedule,
            &current.client_id,
            now,
        )?;

        let date = new_start.date_naive();
        let existing: Vec<Appointment> = self
            .store
            .load_appointments(&current.consultant_id, date, date)?
            .into_iter()
            .filter(|appointment| appointment.appointment_id != current.appointment_id)
            .collect();

        if !interval_is_bookable(
            &consultant,
            date,
            new_start,
            current.duration_minutes,
            &existing,
            &self.config,
            now,
        ) {
            warn!(
                "Rejected reschedule of appointment {} to {}: slot not available",
                appointment_id, new_start
            );
            return Err(SchedulingError::SlotNoLongerAvailable { start: new_start });
        }

        let replacement = Appointment {
            appointment_id: Uuid::new_v4(),
            consultant_id: current.consultant_id.clone(),
            client_id: current.client_id.clone(),
            start_time: new_start,
            duration_minutes: current.duration_minutes,
            modality: current.modality,
            status: AppointmentStatus::Pending,
            meeting_link: None,
            location: None,
            client_notes: current.client_notes.clone(),
            consultant_notes: None,
            review: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.store.save_appointment(&superseded)?;
        let replacement = self.store.save_appointment(&replacement)?;

        info!(
            "Rescheduled appointment {} to {} as {}",
            appointment_id, new_start, replacement.appointment_id
        );

        self.notifier.dispatch(NotificationEvent {
            appointment_id: replacement.appointment_id,
            kind: NotificationKind::Created,
            recipient_id: replacement.consultant_id.clone(),
        });

        Ok(replacement)
    }

    /// Read-through lookup of a single appointment.
    pub fn appointment(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.load_required(appointment_id)
    }

    /// All of a consultant's appointments in a date range, for operational
    /// inspection.
    pub fn consultant_appointments(
        &self,
        consultant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.directory.get(consultant_id)?;
        self.store.load_appointments(consultant_id, from, to)
    }

    // Shared load → apply → save → notify path for plain transitions.
    fn transition(
        &self,
        appointment_id: Uuid,
        event: AppointmentEvent,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.load_required(appointment_id)?;
        let lock = self.consultant_lock(&current.consultant_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| SchedulingError::Storage(format!("consultant lock poisoned: {}", e)))?;

        // Reload under the lock so the transition applies to committed state.
        let current = self.load_required(appointment_id)?;
        let (updated, notification) = apply_event(&current, event, actor_id, now)?;
        let updated = self.store.save_appointment(&updated)?;

        if let Some(event) = notification {
            self.notifier.dispatch(event);
        }

        Ok(updated)
    }

    fn load_required(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.store
            .load_appointment(appointment_id)?
            .ok_or(SchedulingError::AppointmentNotFound(appointment_id))
    }

    fn check_notice_window(
        &self,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        let window = Duration::hours(self.config.cancellation_window_hours);
        if now + window > appointment.start_time {
            warn!(
                "Notice window expired for appointment {}: starts {}, required {}h lead",
                appointment.appointment_id,
                appointment.start_time,
                self.config.cancellation_window_hours
            );
            return Err(SchedulingError::CancellationWindowExpired {
                required_notice_hours: self.config.cancellation_window_hours,
            });
        }
        Ok(())
    }

    fn consultant_lock(&self, consultant_id: &str) -> Result<Arc<Mutex<()>>, SchedulingError> {
        let mut locks = self
            .consultant_locks
            .lock()
            .map_err(|e| SchedulingError::Storage(format!("lock table poisoned: {}", e)))?;
        Ok(locks
            .entry(consultant_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}
