use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use chime_core::{ClockTime, SchedulePattern};

use crate::error::{Result, SchedulerError};

/// Upper bound on the day-by-day walk for weekday/weekend patterns; any
/// 8 consecutive days contain both a weekday and a weekend day.
const MAX_DAY_WALK: u64 = 8;

/// Compute the next wall-clock occurrence of `pattern` at `time`, strictly
/// after `now`.
///
/// Pure: `now` is supplied by the caller, so this never reads a clock. An
/// occurrence exactly equal to `now` counts as already passed.
pub fn next_occurrence(
    pattern: &SchedulePattern,
    time: ClockTime,
    now: NaiveDateTime,
) -> Result<NaiveDateTime> {
    let naive_time = time
        .to_naive_time()
        .ok_or_else(|| SchedulerError::Calculation(format!("invalid clock time {time}")))?;
    let today = now.date().and_time(naive_time);

    match pattern {
        SchedulePattern::Daily => {
            if today > now {
                Ok(today)
            } else {
                add_days(today, 1)
            }
        }

        SchedulePattern::Weekdays => walk_until(today, now, |weekday| weekday < 5),

        SchedulePattern::Weekends => walk_until(today, now, |weekday| weekday >= 5),

        SchedulePattern::Weekly { weekday } => {
            if *weekday > 6 {
                return Err(SchedulerError::Calculation(format!(
                    "weekday index {weekday} out of range"
                )));
            }
            // Both sides use 0 = Monday, matching `num_days_from_monday`.
            let current = now.weekday().num_days_from_monday();
            let mut days_ahead = (*weekday as u32 + 7 - current) % 7;
            if days_ahead == 0 && today <= now {
                days_ahead = 7;
            }
            add_days(today, days_ahead as u64)
        }

        SchedulePattern::Monthly { day } => {
            let day = *day as u32;
            if !(1..=31).contains(&day) {
                return Err(SchedulerError::Calculation(format!(
                    "day of month {day} out of range"
                )));
            }

            if let Some(date) = NaiveDate::from_ymd_opt(now.year(), now.month(), day) {
                let candidate = date.and_time(naive_time);
                if candidate > now {
                    return Ok(candidate);
                }
            }

            // Start from the 1st so a short next month never fails outright.
            let (year, month) = following_month(now.year(), now.month());
            let date = match NaiveDate::from_ymd_opt(year, month, day) {
                Some(date) => date,
                None => last_day_of_month(year, month)?,
            };
            Ok(date.and_time(naive_time))
        }
    }
}

/// UTC fire instant for `pattern` at `time`, evaluated in the wall-clock
/// `offset`. Always strictly after `now`.
pub fn next_fire_instant(
    pattern: &SchedulePattern,
    time: ClockTime,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<DateTime<Utc>> {
    let local_now = now.with_timezone(&offset).naive_local();
    let local_next = next_occurrence(pattern, time, local_now)?;
    offset
        .from_local_datetime(&local_next)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            SchedulerError::Calculation(format!("{local_next} is not representable at {offset}"))
        })
}

/// Step forward one day at a time from `start` until the candidate falls on
/// an accepted weekday and is strictly after `now`.
fn walk_until(
    start: NaiveDateTime,
    now: NaiveDateTime,
    accept: impl Fn(u32) -> bool,
) -> Result<NaiveDateTime> {
    let mut candidate = start;
    for _ in 0..MAX_DAY_WALK {
        if accept(candidate.weekday().num_days_from_monday()) && candidate > now {
            return Ok(candidate);
        }
        candidate = add_days(candidate, 1)?;
    }
    Err(SchedulerError::Calculation(format!(
        "no matching day within {MAX_DAY_WALK} days of {start}"
    )))
}

fn add_days(dt: NaiveDateTime, days: u64) -> Result<NaiveDateTime> {
    dt.checked_add_days(Days::new(days))
        .ok_or_else(|| SchedulerError::Calculation(format!("date overflow adding {days} days to {dt}")))
}

fn following_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Day 1 of the month after, minus one day; handles leap Februaries.
fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = following_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(|| SchedulerError::Calculation(format!("no last day for {year}-{month:02}")))
}
