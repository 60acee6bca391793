use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::debug;

use crate::config::SchedulingConfig;
use crate::models::appointment::Appointment;
use crate::models::consultant::{Consultant, Slot};

/// Compute the candidate slot sequence for a consultant on a date.
///
/// Pure function of its inputs: the weekly template for the weekday of
/// `date`, date-specific blackouts, and the consultant's slot-blocking
/// appointments. Callers must recompute rather than cache; the booking
/// coordinator re-runs this under the consultant lock immediately before
/// committing a booking.
///
/// Each open template interval is quantized into granularity-sized slots.
/// A slot is tagged unavailable when it intersects a blocking appointment,
/// a blackout interval, or has already started. A past date, a date beyond
/// the booking horizon, a fully blacked-out date, or a weekday with no open
/// intervals all yield an empty list.
pub fn compute_available_slots(
    consultant: &Consultant,
    date: NaiveDate,
    existing: &[Appointment],
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let today = now.date_naive();
    if date < today {
        debug!("Slot query for past date {} rejected as empty", date);
        return Vec::new();
    }
    if date > today + Duration::days(config.booking_horizon_days) {
        debug!(
            "Slot query for {} is beyond the {}-day booking horizon",
            date, config.booking_horizon_days
        );
        return Vec::new();
    }
    if consultant
        .blackouts
        .iter()
        .any(|blackout| blackout.date == date && blackout.covers_full_day())
    {
        debug!(
            "Date {} is fully blacked out for consultant {}",
            date, consultant.consultant_id
        );
        return Vec::new();
    }

    let open_intervals = consultant.weekly_template.for_weekday(date.weekday());
    if open_intervals.is_empty() {
        return Vec::new();
    }

    let granularity = Duration::minutes(config.slot_granularity_minutes);
    let removed = removed_intervals(consultant, date, existing);

    let mut slots = Vec::new();
    for interval in open_intervals {
        let window_start = date.and_time(interval.start).and_utc();
        let window_end = date.and_time(interval.end).and_utc();

        let mut slot_start = window_start;
        while slot_start + granularity <= window_end {
            let slot_end = slot_start + granularity;
            let intersects_removed = removed
                .iter()
                .any(|(start, end)| slot_start < *end && *start < slot_end);
            let available = !intersects_removed && slot_start >= now;

            slots.push(Slot {
                start_time: slot_start,
                end_time: slot_end,
                available,
            });
            slot_start = slot_end;
        }
    }

    slots.sort_by_key(|slot| slot.start_time);
    slots
}

/// Write-time availability check for a booking interval.
///
/// True only when every granularity quantum of `[start, start+duration)` is
/// an available slot for `date`. This is the "requested start is in the
/// available set" test generalized to the booked duration; it also forces
/// booking starts onto the quantization grid.
pub fn interval_is_bookable(
    consultant: &Consultant,
    date: NaiveDate,
    start: DateTime<Utc>,
    duration_minutes: i64,
    existing: &[Appointment],
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> bool {
    if duration_minutes <= 0 || start.date_naive() != date {
        return false;
    }

    let slots = compute_available_slots(consultant, date, existing, config, now);
    if slots.is_empty() {
        return false;
    }

    let granularity = Duration::minutes(config.slot_granularity_minutes);
    let end = start + Duration::minutes(duration_minutes);
    let mut cursor = start;
    while cursor < end {
        match slots.iter().find(|slot| slot.start_time == cursor) {
            Some(slot) if slot.available => cursor += granularity,
            _ => return false,
        }
    }
    true
}

// Intervals subtracted from the template: blocking appointments on the date
// plus partial-day blackouts. Full-day blackouts are handled before
// quantization.
fn removed_intervals(
    consultant: &Consultant,
    date: NaiveDate,
    existing: &[Appointment],
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut removed: Vec<(DateTime<Utc>, DateTime<Utc>)> = existing
        .iter()
        .filter(|appointment| appointment.status.blocks_slot() && appointment.date() == date)
        .map(|appointment| (appointment.start_time, appointment.end_time()))
        .collect();

    for blackout in consultant.blackouts.iter().filter(|b| b.date == date) {
        if let (Some(start), Some(end)) = (blackout.start, blackout.end) {
            removed.push((date.and_time(start).and_utc(), date.and_time(end).and_utc()));
        }
    }

    removed
}
