use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A consultant as published by the directory service. Referenced read-only
/// by the scheduling core; the directory owns this data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultant {
    pub consultant_id: String,
    pub display_name: String,
    pub specialty: String,
    pub weekly_template: WeeklyTemplate,
    #[serde(default)]
    pub blackouts: Vec<Blackout>,
}

/// An open working interval within a single day, template-local times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Per-weekday availability template. A day with no intervals is simply a
/// non-working day; there is no special-casing of weekends in code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyTemplate {
    #[serde(default)]
    pub monday: Vec<OpenInterval>,
    #[serde(default)]
    pub tuesday: Vec<OpenInterval>,
    #[serde(default)]
    pub wednesday: Vec<OpenInterval>,
    #[serde(default)]
    pub thursday: Vec<OpenInterval>,
    #[serde(default)]
    pub friday: Vec<OpenInterval>,
    #[serde(default)]
    pub saturday: Vec<OpenInterval>,
    #[serde(default)]
    pub sunday: Vec<OpenInterval>,
}

impl WeeklyTemplate {
    pub fn for_weekday(&self, weekday: Weekday) -> &[OpenInterval] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

/// A date-specific exclusion overriding the weekly template. With no times
/// set the whole date is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blackout {
    pub date: NaiveDate,
    #[serde(default)]
    pub start: Option<NaiveTime>,
    #[serde(default)]
    pub end: Option<NaiveTime>,
}

impl Blackout {
    pub fn covers_full_day(&self) -> bool {
        self.start.is_none() || self.end.is_none()
    }
}

/// A candidate bookable interval, derived from the template minus existing
/// bookings and blackouts. Never persisted; recomputed on every query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub available: bool,
}
