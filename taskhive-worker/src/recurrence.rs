/// Recurrence date arithmetic
///
/// Computes when a completed recurring task is due for its next cycle. The
/// next occurrence is always anchored to when the task was last completed,
/// never to when the sweep happens to run, so a sweep that fires late does
/// not drift the schedule.
///
/// Recognized patterns are `daily`, `weekly`, `monthly`, and `yearly`,
/// case-insensitively. Anything else falls back to weekly rather than
/// stalling the task forever.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use taskhive_worker::recurrence::next_occurrence;
///
/// let done = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
/// let next = next_occurrence(done, "weekly");
/// assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 8, 9, 0, 0).unwrap());
/// ```
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Computes the next occurrence after `anchor` for a recurrence pattern
///
/// Monthly and yearly keep the anchor's day of month, clamped to the target
/// month's length (Jan 31 -> Feb 28, Feb 29 -> Feb 28 in a non-leap year).
/// The time of day is preserved for every pattern.
pub fn next_occurrence(anchor: DateTime<Utc>, pattern: &str) -> DateTime<Utc> {
    match pattern.trim().to_ascii_lowercase().as_str() {
        "daily" => anchor + Duration::days(1),
        "weekly" => anchor + Duration::days(7),
        "monthly" => add_months(anchor, 1),
        "yearly" => add_months(anchor, 12),
        _ => anchor + Duration::days(7),
    }
}

/// The completion time a task's recurrence is anchored to
///
/// `last_completed` when recorded, otherwise the last update, which is when
/// the status flipped to done.
pub fn anchor_for(
    last_completed: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
) -> DateTime<Utc> {
    last_completed.unwrap_or(updated_at)
}

fn add_months(anchor: DateTime<Utc>, months: i32) -> DateTime<Utc> {
    let date = anchor.date_naive();
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));

    let next = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or(date)
        .and_time(anchor.time());

    Utc.from_utc_datetime(&next)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_daily_and_weekly() {
        assert_eq!(next_occurrence(at(2025, 6, 1, 9), "daily"), at(2025, 6, 2, 9));
        assert_eq!(next_occurrence(at(2025, 6, 1, 9), "weekly"), at(2025, 6, 8, 9));
    }

    #[test]
    fn test_weekly_crosses_month_boundary() {
        assert_eq!(
            next_occurrence(at(2025, 6, 28, 9), "weekly"),
            at(2025, 7, 5, 9)
        );
    }

    #[test]
    fn test_monthly_keeps_day_of_month() {
        assert_eq!(
            next_occurrence(at(2025, 3, 15, 12), "monthly"),
            at(2025, 4, 15, 12)
        );
    }

    #[test]
    fn test_monthly_clamps_to_short_month() {
        assert_eq!(
            next_occurrence(at(2025, 1, 31, 8), "monthly"),
            at(2025, 2, 28, 8)
        );
        assert_eq!(
            next_occurrence(at(2024, 1, 31, 8), "monthly"),
            at(2024, 2, 29, 8)
        );
    }

    #[test]
    fn test_monthly_crosses_year_boundary() {
        assert_eq!(
            next_occurrence(at(2025, 12, 10, 0), "monthly"),
            at(2026, 1, 10, 0)
        );
    }

    #[test]
    fn test_yearly() {
        assert_eq!(
            next_occurrence(at(2025, 5, 20, 6), "yearly"),
            at(2026, 5, 20, 6)
        );
    }

    #[test]
    fn test_yearly_clamps_leap_day() {
        assert_eq!(
            next_occurrence(at(2024, 2, 29, 10), "yearly"),
            at(2025, 2, 28, 10)
        );
    }

    #[test]
    fn test_unknown_pattern_falls_back_to_weekly() {
        assert_eq!(
            next_occurrence(at(2025, 6, 1, 9), "fortnightly"),
            at(2025, 6, 8, 9)
        );
        assert_eq!(next_occurrence(at(2025, 6, 1, 9), ""), at(2025, 6, 8, 9));
    }

    #[test]
    fn test_pattern_is_case_insensitive() {
        assert_eq!(
            next_occurrence(at(2025, 6, 1, 9), " Daily "),
            at(2025, 6, 2, 9)
        );
    }

    #[test]
    fn test_anchor_prefers_last_completed() {
        let completed = at(2025, 6, 1, 9);
        let updated = at(2025, 6, 3, 9);

        assert_eq!(anchor_for(Some(completed), updated), completed);
        assert_eq!(anchor_for(None, updated), updated);
    }
}
