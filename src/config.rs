use std::env;

use tracing::info;

/// Scheduling policy values.
///
/// The cancellation window doubles as the reschedule window: one
/// authoritative lead time for both, applied to clients and consultants
/// alike.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    /// Quantization step for candidate slot starts, in minutes.
    pub slot_granularity_minutes: i64,
    /// Appointment duration used when a booking request omits one.
    pub default_duration_minutes: i64,
    /// How far ahead of today a date may be booked, in days.
    pub booking_horizon_days: i64,
    /// Minimum lead time before the scheduled start for cancel/reschedule.
    pub cancellation_window_hours: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: 15,
            default_duration_minutes: 60,
            booking_horizon_days: 30,
            cancellation_window_hours: 24,
        }
    }
}

impl SchedulingConfig {
    /// Build the config from environment variables, falling back to the
    /// defaults above for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            slot_granularity_minutes: env_i64(
                "SLOT_GRANULARITY_MINUTES",
                defaults.slot_granularity_minutes,
            ),
            default_duration_minutes: env_i64(
                "DEFAULT_DURATION_MINUTES",
                defaults.default_duration_minutes,
            ),
            booking_horizon_days: env_i64("BOOKING_HORIZON_DAYS", defaults.booking_horizon_days),
            cancellation_window_hours: env_i64(
                "CANCELLATION_WINDOW_HOURS",
                defaults.cancellation_window_hours,
            ),
        };

        info!(
            "Scheduling config: granularity={}min, default duration={}min, horizon={}d, cancellation window={}h",
            config.slot_granularity_minutes,
            config.default_duration_minutes,
            config.booking_horizon_days,
            config.cancellation_window_hours
        );

        config
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|val| val.parse::<i64>().ok())
        .filter(|val| *val > 0)
        .unwrap_or(default)
}
