use std::collections::HashMap;
use std::fs;

use tracing::info;

use crate::error::SchedulingError;
use crate::models::consultant::Consultant;

/// Read-only view of the consultant directory service.
///
/// The directory owns consultant records, templates and blackouts; this
/// service loads a published snapshot at startup and only reads it.
pub struct ConsultantDirectory {
    consultants: HashMap<String, Consultant>,
}

impl ConsultantDirectory {
    /// Load the directory snapshot from a JSON file.
    pub fn load(path: &str) -> Result<Self, SchedulingError> {
        let data = fs::read_to_string(path).map_err(|e| {
            SchedulingError::Storage(format!("failed to read consultant directory {}: {}", path, e))
        })?;

        let consultants: Vec<Consultant> = serde_json::from_str(&data).map_err(|e| {
            SchedulingError::Storage(format!(
                "failed to parse consultant directory {}: {}",
                path, e
            ))
        })?;

        info!("Loaded {} consultants from {}", consultants.len(), path);
        Ok(Self::from_consultants(consultants))
    }

    pub fn from_consultants(consultants: Vec<Consultant>) -> Self {
        let consultants = consultants
            .into_iter()
            .map(|consultant| (consultant.consultant_id.clone(), consultant))
            .collect();
        Self { consultants }
    }

    pub fn get(&self, consultant_id: &str) -> Result<Consultant, SchedulingError> {
        self.consultants
            .get(consultant_id)
            .cloned()
            .ok_or_else(|| SchedulingError::ConsultantNotFound(consultant_id.to_string()))
    }

    /// List consultants, optionally filtered by specialty, ordered by
    /// display name for stable output.
    pub fn list(&self, specialty: Option<&str>) -> Vec<Consultant> {
        let mut consultants: Vec<Consultant> = self
            .consultants
            .values()
            .filter(|consultant| {
                specialty
                    .map(|wanted| consultant.specialty.eq_ignore_ascii_case(wanted))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        consultants.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        consultants
    }
}
