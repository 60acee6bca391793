use axum::{
    extract::{Json as ExtractJson, Path, Query, State},
    response::Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::appointment::{
    Appointment, BookAppointmentRequest, BookingDraft, CancelRequest, CompleteRequest,
    ConfirmRequest, RescheduleRequest, SlotsResponse, SubmitReviewRequest,
};
use crate::models::common::{ConsultantFilter, DateRangeParams, SlotQuery};
use crate::models::consultant::Consultant;
use crate::services::booking::BookingCoordinator;
use crate::services::directory::ConsultantDirectory;

// AppState struct containing shared resources
pub struct AppState {
    pub coordinator: BookingCoordinator,
    pub directory: Arc<ConsultantDirectory>,
}

// List consultants endpoint
pub async fn list_consultants(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ConsultantFilter>,
) -> Json<Vec<Consultant>> {
    info!(
        "Received request to list consultants (specialty filter: {:?})",
        filter.specialty
    );
    Json(state.directory.list(filter.specialty.as_deref()))
}

// Get a single consultant endpoint
pub async fn get_consultant(
    State(state): State<Arc<AppState>>,
    Path(consultant_id): Path<String>,
) -> Result<Json<Consultant>, SchedulingError> {
    info!("Received request for consultant {}", consultant_id);
    state.directory.get(&consultant_id).map(Json)
}

// Available slots endpoint
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Path(consultant_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotsResponse>, SchedulingError> {
    info!(
        "Received slot query for consultant {} on {}",
        consultant_id, query.date
    );

    let slots = state
        .coordinator
        .available_slots(&consultant_id, query.date, Utc::now())?;

    Ok(Json(SlotsResponse {
        consultant_id,
        date: query.date,
        slots,
    }))
}

// Book appointment endpoint
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<BookAppointmentRequest>,
) -> Result<Json<Appointment>, SchedulingError> {
    info!(
        "Received booking request for consultant {} at {}",
        request.consultant_id, request.start_time
    );

    let draft = BookingDraft {
        consultant_id: request.consultant_id,
        client_id: request.client_id,
        start_time: request.start_time,
        duration_minutes: request
            .duration_minutes
            .unwrap_or(state.coordinator.default_duration_minutes()),
        modality: request.modality,
        client_notes: request.client_notes,
    };

    state.coordinator.book(draft, Utc::now()).map(Json)
}

// Get appointment endpoint
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, SchedulingError> {
    info!("Received request for appointment {}", appointment_id);
    state.coordinator.appointment(appointment_id).map(Json)
}

// Confirm appointment endpoint
pub async fn confirm_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    ExtractJson(request): ExtractJson<ConfirmRequest>,
) -> Result<Json<Appointment>, SchedulingError> {
    info!(
        "Received request to confirm appointment {} by consultant {}",
        appointment_id, request.consultant_id
    );

    state
        .coordinator
        .confirm(
            appointment_id,
            &request.consultant_id,
            request.meeting_link,
            request.location,
            Utc::now(),
        )
        .map(Json)
}

// Cancel appointment endpoint
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    ExtractJson(request): ExtractJson<CancelRequest>,
) -> Result<Json<Appointment>, SchedulingError> {
    info!(
        "Received request to cancel appointment {} by {}",
        appointment_id, request.actor_id
    );

    state
        .coordinator
        .cancel(appointment_id, &request.actor_id, request.reason, Utc::now())
        .map(Json)
}

// Complete appointment endpoint
pub async fn complete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    ExtractJson(request): ExtractJson<CompleteRequest>,
) -> Result<Json<Appointment>, SchedulingError> {
    info!(
        "Received request to complete appointment {} by consultant {}",
        appointment_id, request.consultant_id
    );

    state
        .coordinator
        .complete(
            appointment_id,
            &request.consultant_id,
            request.notes,
            Utc::now(),
        )
        .map(Json)
}

// Reschedule appointment endpoint
pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    ExtractJson(request): ExtractJson<RescheduleRequest>,
) -> Result<Json<Appointment>, SchedulingError> {
    info!(
        "Received request to reschedule appointment {} to {}",
        appointment_id, request.new_start
    );

    state
        .coordinator
        .reschedule(appointment_id, request.new_start, Utc::now())
        .map(Json)
}

// Submit review endpoint
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    ExtractJson(request): ExtractJson<SubmitReviewRequest>,
) -> Result<Json<Appointment>, SchedulingError> {
    info!(
        "Received review for appointment {} from client {}",
        appointment_id, request.client_id
    );

    state
        .coordinator
        .submit_review(
            appointment_id,
            &request.client_id,
            request.rating,
            request.comment,
            Utc::now(),
        )
        .map(Json)
}

// Development-only: list a consultant's appointments in a date range
pub async fn list_consultant_appointments(
    State(state): State<Arc<AppState>>,
    Path(consultant_id): Path<String>,
    Query(range): Query<DateRangeParams>,
) -> Result<Json<Vec<Appointment>>, SchedulingError> {
    info!(
        "Received appointment listing for consultant {} from {} to {}",
        consultant_id, range.from, range.to
    );

    state
        .coordinator
        .consultant_appointments(&consultant_id, range.from, range.to)
        .map(Json)
}
