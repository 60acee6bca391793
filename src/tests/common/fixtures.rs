use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use crate::models::appointment::{Appointment, AppointmentStatus, Modality};
use crate::models::consultant::{Consultant, OpenInterval, WeeklyTemplate};

fn open(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> OpenInterval {
    OpenInterval {
        start: NaiveTime::from_hms_opt(start_h, start_m, 0).unwrap(),
        end: NaiveTime::from_hms_opt(end_h, end_m, 0).unwrap(),
    }
}

/// Weekday template used across the tests: 08:00-12:00 and 13:00-17:00,
/// Monday through Friday, weekends off.
pub fn weekday_template() -> WeeklyTemplate {
    let working_day = vec![open(8, 0, 12, 0), open(13, 0, 17, 0)];
    WeeklyTemplate {
        monday: working_day.clone(),
        tuesday: working_day.clone(),
        wednesday: working_day.clone(),
        thursday: working_day.clone(),
        friday: working_day,
        saturday: Vec::new(),
        sunday: Vec::new(),
    }
}

/// Generate a sample consultant for testing purposes
pub fn test_consultant(consultant_id: &str) -> Consultant {
    Consultant {
        consultant_id: consultant_id.to_string(),
        display_name: format!("Consultant {}", consultant_id),
        specialty: "addiction-recovery".to_string(),
        weekly_template: weekday_template(),
        blackouts: Vec::new(),
    }
}

/// Generate a sample appointment for testing purposes
pub fn test_appointment(
    consultant_id: &str,
    client_id: &str,
    start_time: DateTime<Utc>,
    duration_minutes: i64,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        appointment_id: Uuid::new_v4(),
        consultant_id: consultant_id.to_string(),
        client_id: client_id.to_string(),
        start_time,
        duration_minutes,
        modality: Modality::Online,
        status,
        meeting_link: None,
        location: None,
        client_notes: None,
        consultant_notes: None,
        review: None,
        cancellation_reason: None,
        created_at: start_time - Duration::days(1),
        updated_at: start_time - Duration::days(1),
    }
}

/// First occurrence of `weekday` strictly after `after`
pub fn next_weekday(after: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut date = after + Duration::days(1);
    while date.weekday() != weekday {
        date += Duration::days(1);
    }
    date
}

/// First Monday at least three days out: inside the booking horizon and
/// comfortably clear of the default 24h notice window.
pub fn upcoming_monday(now: DateTime<Utc>) -> NaiveDate {
    next_weekday(now.date_naive() + Duration::days(2), Weekday::Mon)
}
