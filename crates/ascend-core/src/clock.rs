//! Calendar and countdown utilities.
//!
//! Every function takes the current instant explicitly; nothing here reads the
//! system clock. Instants are stored in UTC and interpreted in the player's
//! local offset for calendar-day questions.
//!
//! ## Periods
//!
//! ```text
//! daily period  : [D 00:01, D+1 00:01)   identified by D
//! weekly period : [Mon 00:01, next Mon 00:01)  identified by that Monday
//! ```

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

/// Window after completion during which a daily or side quest may be undone.
pub const UNDO_WINDOW: Duration = Duration::minutes(5);

/// Offset of the daily boundary past local midnight.
const BOUNDARY_OFFSET: Duration = Duration::minutes(1);

/// Interprets UTC instants in a fixed local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCalendar {
    offset_minutes: i32,
}

impl Default for DayCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayCalendar {
    pub fn utc() -> Self {
        Self { offset_minutes: 0 }
    }

    /// Create a calendar for the given offset east of UTC, in minutes.
    ///
    /// Offsets outside +/-18h are clamped.
    pub fn with_offset_minutes(offset_minutes: i32) -> Self {
        Self {
            offset_minutes: offset_minutes.clamp(-18 * 60, 18 * 60),
        }
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Local calendar date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset()).date_naive()
    }

    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.local_date(a) == self.local_date(b)
    }

    /// Identifier of the daily period containing `at` (boundary at 00:01).
    pub fn daily_period(&self, at: DateTime<Utc>) -> NaiveDate {
        self.local_date(at - BOUNDARY_OFFSET)
    }

    /// Identifier of the weekly period containing `at`: its Monday.
    pub fn weekly_period(&self, at: DateTime<Utc>) -> NaiveDate {
        let day = self.daily_period(at);
        day - Duration::days(day.weekday().num_days_from_monday() as i64)
    }

    /// The instant at which the daily period identified by `day` begins.
    pub fn period_start(&self, day: NaiveDate) -> DateTime<Utc> {
        let local = day.and_time(NaiveTime::MIN) + BOUNDARY_OFFSET;
        match self.offset().from_local_datetime(&local).single() {
            Some(dt) => dt.with_timezone(&Utc),
            // A fixed offset always maps uniquely.
            None => Utc.from_utc_datetime(&local),
        }
    }

    /// Next 00:01 local boundary strictly after `now`.
    pub fn next_daily_reset(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.period_start(self.daily_period(now) + Duration::days(1))
    }

    /// Next Monday 00:01 local boundary strictly after `now`.
    pub fn next_weekly_reset(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.period_start(self.weekly_period(now) + Duration::days(7))
    }

    pub fn time_until_daily_reset(&self, now: DateTime<Utc>) -> Duration {
        self.next_daily_reset(now) - now
    }

    pub fn time_until_weekly_reset(&self, now: DateTime<Utc>) -> Duration {
        self.next_weekly_reset(now) - now
    }

    /// Number of daily periods from `earlier` to `later`.
    pub fn daily_periods_between(&self, earlier: NaiveDate, later: NaiveDate) -> i64 {
        (later - earlier).num_days()
    }
}

/// Time elapsed since `since`, floored at zero.
pub fn elapsed_since(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).max(Duration::zero())
}

/// Whether an action taken at `completed_at` may still be undone.
pub fn can_undo(completed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match completed_at {
        Some(at) => now - at < UNDO_WINDOW,
        None => false,
    }
}

/// Remaining undo time, zero when the window has closed or nothing was completed.
pub fn undo_time_remaining(completed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    match completed_at {
        Some(at) => (UNDO_WINDOW - elapsed_since(at, now)).max(Duration::zero()),
        None => Duration::zero(),
    }
}

/// Remaining time until `until`, zero once it has passed.
pub fn cooldown_remaining(until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    match until {
        Some(until) => (until - now).max(Duration::zero()),
        None => Duration::zero(),
    }
}

/// Format a countdown for display: `1d 2h 3m`, `2h 5m`, `4m 10s`, `9s`.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn daily_period_rolls_at_one_past_midnight() {
        let cal = DayCalendar::utc();
        let before = at("2024-03-05T00:00:30Z");
        let after = at("2024-03-05T00:01:00Z");
        assert_eq!(cal.daily_period(before), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(cal.daily_period(after), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn next_daily_reset_is_tomorrow_at_0001() {
        let cal = DayCalendar::utc();
        let now = at("2024-03-05T15:00:00Z");
        assert_eq!(cal.next_daily_reset(now), at("2024-03-06T00:01:00Z"));
        assert_eq!(cal.time_until_daily_reset(now), Duration::minutes(9 * 60 + 1));
    }

    #[test]
    fn next_weekly_reset_is_following_monday() {
        let cal = DayCalendar::utc();
        // Tuesday
        let now = at("2024-03-05T10:00:00Z");
        assert_eq!(cal.weekly_period(now), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(cal.next_weekly_reset(now), at("2024-03-11T00:01:00Z"));

        // Monday 00:00:30 still belongs to the previous week
        let edge = at("2024-03-11T00:00:30Z");
        assert_eq!(cal.next_weekly_reset(edge), at("2024-03-11T00:01:00Z"));
    }

    #[test]
    fn local_offset_shifts_calendar_day() {
        let cal = DayCalendar::with_offset_minutes(-5 * 60);
        let now = at("2024-03-05T03:00:00Z"); // 22:00 on the 4th locally
        assert_eq!(cal.local_date(now), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(cal.next_daily_reset(now), at("2024-03-05T05:01:00Z"));
    }

    #[test]
    fn undo_window_is_half_open() {
        let done = at("2024-03-05T10:00:00Z");
        assert!(can_undo(Some(done), done + Duration::seconds(299)));
        assert!(!can_undo(Some(done), done + Duration::minutes(5)));
        assert!(!can_undo(None, done));
        assert_eq!(
            undo_time_remaining(Some(done), done + Duration::minutes(2)),
            Duration::minutes(3)
        );
        assert_eq!(
            undo_time_remaining(Some(done), done + Duration::minutes(9)),
            Duration::zero()
        );
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_countdown(Duration::seconds(9)), "9s");
        assert_eq!(format_countdown(Duration::seconds(250)), "4m 10s");
        assert_eq!(format_countdown(Duration::minutes(125)), "2h 5m");
        assert_eq!(
            format_countdown(Duration::days(1) + Duration::hours(2) + Duration::minutes(3)),
            "1d 2h 3m"
        );
        assert_eq!(format_countdown(Duration::seconds(-4)), "0s");
    }
}
