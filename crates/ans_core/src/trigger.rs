//! Next-trigger computation for the three reminder kinds.
//!
//! All instants are local wall-clock times. Callers supply `now` so the
//! computations stay deterministic.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub const DAYS_PER_WEEK: u8 = 7;
pub const MONTHS_PER_YEAR: u8 = 12;
pub const MAX_DAYS_OF_MONTH: u8 = 31;
/// Shortest snooze interval; smaller non-zero intervals are raised to this.
pub const MIN_TIME_INTERVAL_SECS: u64 = 5 * 60;

pub fn timer_trigger(now: NaiveDateTime, seconds: u64) -> Option<NaiveDateTime> {
    let seconds = i64::try_from(seconds).ok()?;
    now.checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Bit `day - 1` for each `day` in 1..=7 (Monday = 1). Other values are ignored.
pub fn days_of_week_mask(days: &[u8]) -> u8 {
    days.iter()
        .filter(|day| (1..=DAYS_PER_WEEK).contains(*day))
        .fold(0, |mask, day| mask | 1 << (day - 1))
}

pub fn months_mask(months: &[u8]) -> u16 {
    months
        .iter()
        .filter(|month| (1..=MONTHS_PER_YEAR).contains(*month))
        .fold(0, |mask, month| mask | 1 << (month - 1))
}

pub fn days_of_month_mask(days: &[u8]) -> u32 {
    days.iter()
        .filter(|day| (1..=MAX_DAYS_OF_MONTH).contains(*day))
        .fold(0, |mask, day| mask | 1 << (day - 1))
}

/// Next ring of a daily alarm at `hour:minute`.
///
/// With repeat days the earliest matching weekday is chosen (today only if the
/// time is still ahead). Without repeat days the alarm rings today if the time
/// is ahead, tomorrow if `force_next`, and never otherwise.
pub fn alarm_next_trigger(
    hour: u8,
    minute: u8,
    days_mask: u8,
    now: NaiveDateTime,
    force_next: bool,
) -> Option<NaiveDateTime> {
    let time = NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), 0)?;
    let target = now.date().and_time(time);

    if days_mask == 0 {
        if now < target {
            return Some(target);
        }
        return force_next.then(|| target + Duration::days(1));
    }

    let today = now.weekday().number_from_monday() as u8;
    let start = if now >= target { 1 } else { 0 };
    (start..=DAYS_PER_WEEK)
        .find(|offset| {
            let day = (today - 1 + offset) % DAYS_PER_WEEK + 1;
            days_mask & (1 << (day - 1)) != 0
        })
        .map(|offset| target + Duration::days(i64::from(offset)))
}

/// Next occurrence of a calendar reminder.
///
/// Without both repeat masks the reminder fires once at `first`. With them it
/// fires on every (month, day) pair of the masks at `first`'s time of day.
pub fn calendar_next_trigger(
    first: NaiveDateTime,
    months_mask: u16,
    days_mask: u32,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    if months_mask == 0 || days_mask == 0 {
        return (first > now).then_some(first);
    }

    let time = NaiveTime::from_hms_opt(first.hour(), first.minute(), 0)?;
    let mut year = now.year();
    let mut month = now.month();
    for _ in 0..=MONTHS_PER_YEAR {
        if months_mask & (1 << (month - 1)) != 0 {
            for day in 1..=u32::from(MAX_DAYS_OF_MONTH) {
                if days_mask & (1 << (day - 1)) == 0 {
                    continue;
                }
                let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                    continue;
                };
                let candidate = date.and_time(time);
                if candidate > now {
                    return Some(candidate);
                }
            }
        }
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }
    None
}
