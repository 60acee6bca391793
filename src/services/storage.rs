use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::appointment::{Appointment, Review};

// Flat row stored in CSV; empty string stands for an absent optional field.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct AppointmentRecord {
    appointment_id: String,
    consultant_id: String,
    client_id: String,
    start_time: String, // ISO format
    duration_minutes: i64,
    modality: String,
    status: String,
    meeting_link: String,
    location: String,
    client_notes: String,
    consultant_notes: String,
    review_rating: String,
    review_comment: String,
    review_submitted_at: String, // ISO format (empty if no review)
    cancellation_reason: String,
    created_at: String,  // ISO format
    updated_at: String,  // ISO format
}

const HEADERS: [&str; 17] = [
    "appointment_id",
    "consultant_id",
    "client_id",
    "start_time",
    "duration_minutes",
    "modality",
    "status",
    "meeting_link",
    "location",
    "client_notes",
    "consultant_notes",
    "review_rating",
    "review_comment",
    "review_submitted_at",
    "cancellation_reason",
    "created_at",
    "updated_at",
];

/// Appointment persistence backed by a CSV file.
///
/// One row per appointment, keyed by appointment id. Saves are
/// create-or-update: a new id is appended, an existing id replaces its row
/// in a full rewrite. All file access is serialized by the store mutex.
pub struct CsvAppointmentStore {
    csv_path: String,
    file_mutex: Mutex<()>,
}

impl CsvAppointmentStore {
    pub fn new(csv_path: &str) -> Self {
        // Create the CSV file if it doesn't exist with proper headers
        if !Path::new(csv_path).exists() {
            info!("Creating new appointments database file at {}", csv_path);

            let file = File::create(csv_path).unwrap_or_else(|e| {
                error!("Failed to create database file: {}", e);
                panic!("Failed to create database file: {}", e)
            });

            let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

            if let Err(e) = writer.write_record(HEADERS) {
                error!("Failed to write headers: {}", e);
                panic!("Failed to write headers: {}", e);
            }

            if let Err(e) = writer.flush() {
                error!("Failed to flush headers: {}", e);
                panic!("Failed to flush headers: {}", e);
            }
        }

        Self {
            csv_path: csv_path.to_string(),
            file_mutex: Mutex::new(()),
        }
    }

    /// Create or update an appointment, keyed by its id.
    pub fn save_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<Appointment, SchedulingError> {
        let _lock = self
            .file_mutex
            .lock()
            .map_err(|e| SchedulingError::Storage(format!("failed to acquire store mutex: {}", e)))?;

        let mut records = self.read_all_records()?;
        let id = appointment.appointment_id.to_string();
        let record = record_from_appointment(appointment);

        if let Some(existing) = records.iter_mut().find(|r| r.appointment_id == id) {
            *existing = record;
            self.rewrite_all(&records)?;
            info!("Updated appointment record {}", id);
        } else {
            self.append_record(&record)?;
            info!(
                "Stored appointment record {} for consultant {}",
                id, appointment.consultant_id
            );
        }

        Ok(appointment.clone())
    }

    /// Look up a single appointment by id.
    pub fn load_appointment(&self, id: Uuid) -> Result<Option<Appointment>, SchedulingError> {
        let _lock = self
            .file_mutex
            .lock()
            .map_err(|e| SchedulingError::Storage(format!("failed to acquire store mutex: {}", e)))?;

        let wanted = id.to_string();
        for record in self.read_all_records()? {
            if record.appointment_id == wanted {
                return appointment_from_record(&record).map(Some);
            }
        }
        Ok(None)
    }

    /// Load a consultant's appointments whose start date falls within the
    /// inclusive date range.
    pub fn load_appointments(
        &self,
        consultant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let _lock = self
            .file_mutex
            .lock()
            .map_err(|e| SchedulingError::Storage(format!("failed to acquire store mutex: {}", e)))?;

        let mut appointments = Vec::new();
        for record in self.read_all_records()? {
            if record.consultant_id != consultant_id {
                continue;
            }
            let appointment = appointment_from_record(&record)?;
            let date = appointment.date();
            if date >= from && date <= to {
                appointments.push(appointment);
            }
        }

        appointments.sort_by_key(|appointment| appointment.start_time);
        Ok(appointments)
    }

    // Must be called with the file mutex held.
    fn read_all_records(&self) -> Result<Vec<AppointmentRecord>, SchedulingError> {
        if !Path::new(&self.csv_path).exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.csv_path)
            .map_err(|e| SchedulingError::Storage(format!("failed to open database file: {}", e)))?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut records = Vec::new();
        for result in reader.deserialize::<AppointmentRecord>() {
            let record = result
                .map_err(|e| SchedulingError::Storage(format!("failed to read record: {}", e)))?;
            records.push(record);
        }
        Ok(records)
    }

    // Must be called with the file mutex held.
    fn append_record(&self, record: &AppointmentRecord) -> Result<(), SchedulingError> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| SchedulingError::Storage(format!("failed to open database file: {}", e)))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        writer
            .serialize(record)
            .map_err(|e| SchedulingError::Storage(format!("failed to serialize record: {}", e)))?;

        writer
            .flush()
            .map_err(|e| SchedulingError::Storage(format!("failed to flush writer: {}", e)))?;

        Ok(())
    }

    // Must be called with the file mutex held.
    fn rewrite_all(&self, records: &[AppointmentRecord]) -> Result<(), SchedulingError> {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.csv_path)
            .map_err(|e| {
                SchedulingError::Storage(format!("failed to open database file for writing: {}", e))
            })?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        writer
            .write_record(HEADERS)
            .map_err(|e| SchedulingError::Storage(format!("failed to write headers: {}", e)))?;

        for record in records {
            writer.serialize(record).map_err(|e| {
                SchedulingError::Storage(format!("failed to serialize record: {}", e))
            })?;
        }

        writer
            .flush()
            .map_err(|e| SchedulingError::Storage(format!("failed to flush writer: {}", e)))?;

        Ok(())
    }
}

fn record_from_appointment(appointment: &Appointment) -> AppointmentRecord {
    let (review_rating, review_comment, review_submitted_at) = match &appointment.review {
        Some(review) => (
            review.rating.to_string(),
            review.comment.clone().unwrap_or_default(),
            review.submitted_at.to_rfc3339(),
        ),
        None => (String::new(), String::new(), String::new()),
    };

    AppointmentRecord {
        appointment_id: appointment.appointment_id.to_string(),
        consultant_id: appointment.consultant_id.clone(),
        client_id: appointment.client_id.clone(),
        start_time: appointment.start_time.to_rfc3339(),
        duration_minutes: appointment.duration_minutes,
        modality: appointment.modality.to_string(),
        status: appointment.status.to_string(),
        meeting_link: appointment.meeting_link.clone().unwrap_or_default(),
        location: appointment.location.clone().unwrap_or_default(),
        client_notes: appointment.client_notes.clone().unwrap_or_default(),
        consultant_notes: appointment.consultant_notes.clone().unwrap_or_default(),
        review_rating,
        review_comment,
        review_submitted_at,
        cancellation_reason: appointment.cancellation_reason.clone().unwrap_or_default(),
        created_at: appointment.created_at.to_rfc3339(),
        updated_at: appointment.updated_at.to_rfc3339(),
    }
}

fn appointment_from_record(record: &AppointmentRecord) -> Result<Appointment, SchedulingError> {
    let parse_time = |field: &str, value: &str| -> Result<DateTime<Utc>, SchedulingError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| SchedulingError::Storage(format!("invalid {} in record: {}", field, e)))
    };

    let review = if record.review_rating.is_empty() {
        None
    } else {
        let rating = record.review_rating.parse::<u8>().map_err(|e| {
            SchedulingError::Storage(format!("invalid review_rating in record: {}", e))
        })?;
        Some(Review {
            rating,
            comment: optional(&record.review_comment),
            submitted_at: parse_time("review_submitted_at", &record.review_submitted_at)?,
        })
    };

    Ok(Appointment {
        appointment_id: record
            .appointment_id
            .parse::<Uuid>()
            .map_err(|e| SchedulingError::Storage(format!("invalid appointment_id: {}", e)))?,
        consultant_id: record.consultant_id.clone(),
        client_id: record.client_id.clone(),
        start_time: parse_time("start_time", &record.start_time)?,
        duration_minutes: record.duration_minutes,
        modality: record
            .modality
            .parse()
            .map_err(SchedulingError::Storage)?,
        status: record.status.parse().map_err(SchedulingError::Storage)?,
        meeting_link: optional(&record.meeting_link),
        location: optional(&record.location),
        client_notes: optional(&record.client_notes),
        consultant_notes: optional(&record.consultant_notes),
        review,
        cancellation_reason: optional(&record.cancellation_reason),
        created_at: parse_time("created_at", &record.created_at)?,
        updated_at: parse_time("updated_at", &record.updated_at)?,
    })
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// Create a singleton appointment store
pub fn create_appointment_store() -> Arc<CsvAppointmentStore> {
    // Default path with environment variable override
    let default_path = "/app/data/appointments.csv";
    let csv_path =
        std::env::var("APPOINTMENT_DATABASE_PATH").unwrap_or_else(|_| default_path.to_string());

    // Create the data directory if it doesn't exist and we're using the default path
    if csv_path == default_path {
        let dir = std::path::Path::new(default_path).parent().unwrap();
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!("Failed to create data directory: {}", e);
            panic!("Failed to create data directory: {}", e);
        }
    }

    Arc::new(CsvAppointmentStore::new(&csv_path))
}
