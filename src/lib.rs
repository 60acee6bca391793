//! Consultation Scheduling Service
//!
//! The appointment-scheduling core for a prevention-support counselling
//! platform: consultant availability is turned into bookable slots, bookings
//! are created and advanced through a confirmation/cancellation/completion
//! lifecycle, and double-booking is prevented by revalidating availability
//! at write time under a per-consultant lock.
//!
//! # Modules
//!
//! - `services::slots`: pure slot calculation from templates and bookings
//! - `services::state_machine`: the appointment lifecycle transition table
//! - `services::booking`: the coordinator owning all appointment writes
//! - `services::storage` / `services::directory`: persistence and the
//!   read-only consultant directory
//! - `notifier`: fire-and-forget webhook notification dispatch, signed via
//!   the HMAC-SHA256 scheme in `auth`

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod routes;
pub mod services;


// Re-export the main types for ease of use
pub use config::SchedulingConfig;
pub use error::SchedulingError;
pub use handlers::api::AppState;
pub use routes::create_router;
#[cfg(test)] #[path = "zz_scratch_diag.rs"] mod zz_scratch_diag;
