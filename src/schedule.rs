use crate::db::sending_stats;
use crate::models::forwarding_log::LogStatus;
use crate::settings::CompiledSettings;
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};
use diesel::PgConnection;
use rand::Rng;
use std::time::Duration;

/// Outcome of the scheduling gate. Any block short-circuits processing with
/// its own log status.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GateVerdict {
    Allow,
    Block(LogStatus),
}

/// Evaluates day filter, working hours and sending limits, in that order.
pub fn check(
    conn: &mut PgConnection,
    settings: &CompiledSettings,
    now_utc: DateTime<Utc>,
) -> GateVerdict {
    let now = local_time(settings, now_utc);

    if settings.day_filter_enabled && !day_allowed(settings, now.weekday()) {
        return GateVerdict::Block(LogStatus::DayFilter);
    }

    if settings.working_hours_enabled
        && !hour_in_window(now.hour() as i32, settings.start_hour, settings.end_hour)
    {
        return GateVerdict::Block(LogStatus::WorkingHours);
    }

    if settings.sending_limit_enabled {
        match limits_allow(conn, settings, now) {
            Ok(true) => (),
            Ok(false) => return GateVerdict::Block(LogStatus::SendingLimit),
            Err(error) => {
                log::error!("Sending-limit check failed, allowing the message: {error}");
            }
        }
    }

    GateVerdict::Allow
}

/// Current time shifted into the task's configured UTC offset.
pub fn local_time(settings: &CompiledSettings, now_utc: DateTime<Utc>) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(settings.utc_offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());

    now_utc.with_timezone(&offset)
}

fn day_allowed(settings: &CompiledSettings, weekday: Weekday) -> bool {
    let filter = &settings.day_filter;

    let allowed = match weekday {
        Weekday::Mon => filter.monday,
        Weekday::Tue => filter.tuesday,
        Weekday::Wed => filter.wednesday,
        Weekday::Thu => filter.thursday,
        Weekday::Fri => filter.friday,
        Weekday::Sat => filter.saturday,
        Weekday::Sun => filter.sunday,
    };

    allowed.unwrap_or(true)
}

/// Inclusive on both ends; a window with `start > end` wraps overnight.
pub fn hour_in_window(hour: i32, start_hour: i32, end_hour: i32) -> bool {
    if start_hour <= end_hour {
        start_hour <= hour && hour <= end_hour
    } else {
        hour >= start_hour || hour <= end_hour
    }
}

fn limits_allow(
    conn: &mut PgConnection,
    settings: &CompiledSettings,
    now: DateTime<FixedOffset>,
) -> Result<bool, diesel::result::Error> {
    let limits = &settings.sending_limits;
    let task_id = settings.task_id;

    if sending_stats::count_for_minute(conn, task_id, now)? >= limits.per_minute {
        return Ok(false);
    }

    if sending_stats::count_for_hour(conn, task_id, now)? >= limits.per_hour {
        return Ok(false);
    }

    if sending_stats::count_for_day(conn, task_id, now)? >= limits.per_day {
        return Ok(false);
    }

    Ok(true)
}

/// Uniform random delay in `[delay_min, delay_max]` seconds, slept before
/// each individual target send to stagger deliveries.
pub async fn apply_delay(settings: &CompiledSettings) {
    let seconds = delay_seconds(settings.delay_min, settings.delay_max);

    if seconds > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
    }
}

fn delay_seconds(delay_min: i32, delay_max: i32) -> f64 {
    let min = delay_min.max(0) as f64;
    let max = delay_max.max(0) as f64;

    if max <= min {
        return min;
    }

    rand::thread_rng().gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CompiledSettings;

    #[test]
    fn working_hours_wrap_overnight() {
        assert!(hour_in_window(23, 22, 6));
        assert!(hour_in_window(3, 22, 6));
        assert!(!hour_in_window(12, 22, 6));
    }

    #[test]
    fn working_hours_are_inclusive_in_plain_windows() {
        assert!(hour_in_window(9, 9, 17));
        assert!(hour_in_window(17, 9, 17));
        assert!(!hour_in_window(8, 9, 17));
        assert!(!hour_in_window(18, 9, 17));
    }

    #[test]
    fn absent_weekday_defaults_to_allowed() {
        let settings = CompiledSettings::defaults(1);

        assert!(day_allowed(&settings, Weekday::Mon));
    }

    #[test]
    fn disabled_weekday_blocks() {
        let mut settings = CompiledSettings::defaults(1);
        settings.day_filter.sunday = Some(false);

        assert!(!day_allowed(&settings, Weekday::Sun));
        assert!(day_allowed(&settings, Weekday::Mon));
    }

    #[test]
    fn delay_stays_within_bounds() {
        for _ in 0..100 {
            let delay = delay_seconds(2, 5);
            assert!((2.0..=5.0).contains(&delay));
        }
    }

    #[test]
    fn degenerate_delay_range_is_the_minimum() {
        assert_eq!(delay_seconds(2, 2), 2.0);
        assert_eq!(delay_seconds(5, 2), 5.0);
    }

    #[test]
    fn local_time_applies_the_offset() {
        let mut settings = CompiledSettings::defaults(1);
        settings.utc_offset_minutes = 180;

        let utc = Utc::now();
        let local = local_time(&settings, utc);

        assert_eq!(local.timestamp(), utc.timestamp());
        assert_eq!(local.offset().local_minus_utc(), 180 * 60);
    }
}
