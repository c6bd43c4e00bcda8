//! Worked-time reconstruction from punch streams.
//!
//! Punches are scanned in ascending timestamp order with a single open
//! clock-in slot. A CLOCK_IN fills the slot (overwriting any previous open
//! clock-in), a CLOCK_OUT closes it and contributes an interval, and break
//! punches do not affect worked time. A shift still open at the end of the
//! scan contributes time up to "now".

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use rust_decimal::Decimal;

use super::punch_state::{chronological_order, sort_chronologically};
use crate::models::{PunchRecord, PunchType, local_midnight};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// One contiguous span of worked time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkInterval {
    /// Clock-in timestamp.
    pub start: DateTime<Utc>,
    /// Clock-out timestamp, or "now" for an open shift.
    pub end: DateTime<Utc>,
    /// True when the interval is still open.
    pub open: bool,
}

impl WorkInterval {
    /// Returns the length of the interval, never negative.
    pub fn duration(&self) -> TimeDelta {
        (self.end - self.start).max(TimeDelta::zero())
    }
}

/// Worked time of one organization-local calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWork {
    /// The local calendar day.
    pub date: NaiveDate,
    /// Hours worked that day, unrounded.
    pub hours: Decimal,
    /// First CLOCK_IN of the day.
    pub first_clock_in: Option<DateTime<Utc>>,
    /// Last CLOCK_OUT of the day.
    pub last_clock_out: Option<DateTime<Utc>>,
}

/// Reconstructs work intervals from punches in any order.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::work_intervals;
/// use attendance_engine::models::{PunchRecord, PunchType};
/// use chrono::{TimeZone, Utc};
///
/// let nine = Utc.with_ymd_and_hms(2026, 1, 13, 9, 0, 0).unwrap();
/// let five = Utc.with_ymd_and_hms(2026, 1, 13, 17, 0, 0).unwrap();
/// let punches = vec![
///     PunchRecord::new("emp_001", PunchType::ClockIn, nine, nine),
///     PunchRecord::new("emp_001", PunchType::ClockOut, five, five),
/// ];
///
/// let intervals = work_intervals(&punches, five);
/// assert_eq!(intervals.len(), 1);
/// assert_eq!(intervals[0].duration().num_hours(), 8);
/// ```
pub fn work_intervals(punches: &[PunchRecord], now: DateTime<Utc>) -> Vec<WorkInterval> {
    let mut ordered: Vec<&PunchRecord> = punches.iter().collect();
    ordered.sort_by(|a, b| chronological_order(a, b));

    let mut intervals = Vec::new();
    let mut open_clock_in: Option<DateTime<Utc>> = None;

    for punch in ordered {
        match punch.punch_type {
            PunchType::ClockIn => open_clock_in = Some(punch.timestamp),
            PunchType::ClockOut => {
                if let Some(start) = open_clock_in.take() {
                    intervals.push(WorkInterval {
                        start,
                        end: punch.timestamp,
                        open: false,
                    });
                }
            }
            PunchType::BreakStart | PunchType::BreakEnd => {}
        }
    }

    if let Some(start) = open_clock_in {
        intervals.push(WorkInterval {
            start,
            end: now.max(start),
            open: true,
        });
    }

    intervals
}

/// Returns the total worked duration of a punch stream.
pub fn worked_duration(punches: &[PunchRecord], now: DateTime<Utc>) -> TimeDelta {
    work_intervals(punches, now)
        .iter()
        .map(WorkInterval::duration)
        .fold(TimeDelta::zero(), |total, d| total + d)
}

/// Converts a duration into fractional hours at millisecond precision.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::duration_hours;
/// use chrono::TimeDelta;
/// use rust_decimal::Decimal;
///
/// assert_eq!(duration_hours(TimeDelta::minutes(90)), Decimal::new(15, 1));
/// ```
pub fn duration_hours(duration: TimeDelta) -> Decimal {
    Decimal::from(duration.num_milliseconds()) / Decimal::from(MILLIS_PER_HOUR)
}

/// Returns the total worked hours of a punch stream, unrounded.
pub fn aggregate_hours(punches: &[PunchRecord], now: DateTime<Utc>) -> Decimal {
    duration_hours(worked_duration(punches, now))
}

/// Partitions punches by organization-local day and aggregates each day on its own.
///
/// Each day is scanned independently with "now" capped at the end of that
/// day, so a shift crossing midnight only counts on the day it started up to
/// midnight and its clock-out day gets nothing for it. Day totals therefore
/// need not add up to [`aggregate_hours`] over the same punches.
pub fn daily_work(
    punches: &[PunchRecord],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<DayWork> {
    let mut by_day: BTreeMap<NaiveDate, Vec<PunchRecord>> = BTreeMap::new();
    for punch in punches {
        let date = punch.timestamp.with_timezone(&offset).date_naive();
        by_day.entry(date).or_default().push(punch.clone());
    }

    by_day
        .into_iter()
        .map(|(date, mut day_punches)| {
            sort_chronologically(&mut day_punches);
            let end_of_day = date
                .succ_opt()
                .map(|next| local_midnight(next, offset))
                .unwrap_or(now);
            let day_now = now.min(end_of_day);

            DayWork {
                date,
                hours: aggregate_hours(&day_punches, day_now),
                first_clock_in: day_punches
                    .iter()
                    .find(|p| p.punch_type == PunchType::ClockIn)
                    .map(|p| p.timestamp),
                last_clock_out: day_punches
                    .iter()
                    .rev()
                    .find(|p| p.punch_type == PunchType::ClockOut)
                    .map(|p| p.timestamp),
            }
        })
        .collect()
}

/// Returns the break time taken since `since`, counting an open break up to `now`.
///
/// Only BREAK_START/BREAK_END pairs at or after `since` are considered.
pub fn break_duration_since(
    punches: &[PunchRecord],
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> TimeDelta {
    let mut ordered: Vec<&PunchRecord> = punches
        .iter()
        .filter(|p| p.timestamp >= since && p.punch_type.is_break())
        .collect();
    ordered.sort_by(|a, b| chronological_order(a, b));

    let mut total = TimeDelta::zero();
    let mut open_break: Option<DateTime<Utc>> = None;
    for punch in ordered {
        match punch.punch_type {
            PunchType::BreakStart => {
                open_break.get_or_insert(punch.timestamp);
            }
            PunchType::BreakEnd => {
                if let Some(start) = open_break.take() {
                    total += (punch.timestamp - start).max(TimeDelta::zero());
                }
            }
            _ => {}
        }
    }
    if let Some(start) = open_break {
        total += (now - start).max(TimeDelta::zero());
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, minute, 0).unwrap()
    }

    fn punch(punch_type: PunchType, timestamp: DateTime<Utc>) -> PunchRecord {
        PunchRecord::new("emp_001", punch_type, timestamp, timestamp)
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_closed_shifts_with_trailing_open_shift() {
        // 09:00-17:00 on two days plus an open shift 08:00 with now = 10:30
        let punches = vec![
            punch(PunchType::ClockIn, at(12, 9, 0)),
            punch(PunchType::ClockOut, at(12, 17, 0)),
            punch(PunchType::ClockIn, at(13, 9, 0)),
            punch(PunchType::ClockOut, at(13, 17, 0)),
            punch(PunchType::ClockIn, at(14, 8, 0)),
        ];
        assert_eq!(aggregate_hours(&punches, at(14, 10, 30)), dec("18.5"));
    }

    #[test]
    fn test_breaks_do_not_reduce_worked_time() {
        let punches = vec![
            punch(PunchType::ClockIn, at(13, 9, 0)),
            punch(PunchType::BreakStart, at(13, 12, 0)),
            punch(PunchType::BreakEnd, at(13, 12, 30)),
            punch(PunchType::ClockOut, at(13, 17, 0)),
        ];
        assert_eq!(aggregate_hours(&punches, at(13, 18, 0)), dec("8"));
    }

    #[test]
    fn test_second_clock_in_overwrites_open_one() {
        let punches = vec![
            punch(PunchType::ClockIn, at(13, 8, 0)),
            punch(PunchType::ClockIn, at(13, 9, 0)),
            punch(PunchType::ClockOut, at(13, 10, 0)),
        ];
        assert_eq!(aggregate_hours(&punches, at(13, 18, 0)), dec("1"));
    }

    #[test]
    fn test_orphan_clock_out_is_ignored() {
        let punches = vec![
            punch(PunchType::ClockOut, at(13, 8, 0)),
            punch(PunchType::ClockIn, at(13, 9, 0)),
            punch(PunchType::ClockOut, at(13, 10, 0)),
        ];
        assert_eq!(aggregate_hours(&punches, at(13, 18, 0)), dec("1"));
    }

    #[test]
    fn test_open_shift_in_future_is_never_negative() {
        let punches = vec![punch(PunchType::ClockIn, at(13, 12, 0))];
        assert_eq!(aggregate_hours(&punches, at(13, 9, 0)), Decimal::ZERO);
        assert!(work_intervals(&punches, at(13, 9, 0))[0].open);
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let punches = vec![
            punch(PunchType::ClockOut, at(13, 17, 0)),
            punch(PunchType::ClockIn, at(13, 9, 0)),
        ];
        assert_eq!(aggregate_hours(&punches, at(13, 18, 0)), dec("8"));
    }

    #[test]
    fn test_duration_hours_millisecond_precision() {
        assert_eq!(duration_hours(TimeDelta::milliseconds(1_800_000)), dec("0.5"));
        assert_eq!(duration_hours(TimeDelta::zero()), Decimal::ZERO);
    }

    #[test]
    fn test_daily_work_splits_by_local_day() {
        let punches = vec![
            punch(PunchType::ClockIn, at(12, 9, 0)),
            punch(PunchType::ClockOut, at(12, 19, 0)),
            punch(PunchType::ClockIn, at(13, 9, 0)),
            punch(PunchType::ClockOut, at(13, 15, 0)),
        ];
        let days = daily_work(&punches, at(14, 12, 0), utc());

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!(days[0].hours, dec("10"));
        assert_eq!(days[0].first_clock_in, Some(at(12, 9, 0)));
        assert_eq!(days[0].last_clock_out, Some(at(12, 19, 0)));
        assert_eq!(days[1].hours, dec("6"));
    }

    #[test]
    fn test_daily_work_caps_past_open_shift_at_midnight() {
        // Open since 20:00 two days ago; that day only counts until midnight
        let punches = vec![punch(PunchType::ClockIn, at(12, 20, 0))];
        let days = daily_work(&punches, at(14, 12, 0), utc());
        assert_eq!(days[0].hours, dec("4"));
        assert_eq!(days[0].last_clock_out, None);
    }

    #[test]
    fn test_daily_work_overnight_shift_does_not_reconcile() {
        let punches = vec![
            punch(PunchType::ClockIn, at(12, 22, 0)),
            punch(PunchType::ClockOut, at(13, 6, 0)),
        ];
        let days = daily_work(&punches, at(14, 12, 0), utc());
        let daily_total: Decimal = days.iter().map(|d| d.hours).sum();

        assert_eq!(aggregate_hours(&punches, at(14, 12, 0)), dec("8"));
        assert_eq!(daily_total, dec("2"));
    }

    #[test]
    fn test_daily_work_uses_organization_offset() {
        // 03:00 UTC on the 13th is still the 12th at UTC-5
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        let punches = vec![
            punch(PunchType::ClockIn, at(13, 1, 0)),
            punch(PunchType::ClockOut, at(13, 3, 0)),
        ];
        let days = daily_work(&punches, at(14, 12, 0), eastern);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!(days[0].hours, dec("2"));
    }

    #[test]
    fn test_daily_work_today_uses_real_now() {
        let punches = vec![punch(PunchType::ClockIn, at(14, 9, 0))];
        let days = daily_work(&punches, at(14, 11, 15), utc());
        assert_eq!(days[0].hours, dec("2.25"));
    }

    #[test]
    fn test_break_duration_with_open_break() {
        let punches = vec![
            punch(PunchType::ClockIn, at(13, 9, 0)),
            punch(PunchType::BreakStart, at(13, 10, 0)),
            punch(PunchType::BreakEnd, at(13, 10, 15)),
            punch(PunchType::BreakStart, at(13, 12, 0)),
        ];
        let total = break_duration_since(&punches, at(13, 9, 0), at(13, 12, 20));
        assert_eq!(total, TimeDelta::minutes(35));
    }

    #[test]
    fn test_break_duration_ignores_earlier_shifts() {
        let punches = vec![
            punch(PunchType::BreakStart, at(12, 10, 0)),
            punch(PunchType::BreakEnd, at(12, 11, 0)),
        ];
        assert_eq!(
            break_duration_since(&punches, at(13, 9, 0), at(13, 12, 0)),
            TimeDelta::zero()
        );
    }

    proptest! {
        #[test]
        fn prop_closed_shifts_sum_their_lengths(
            lengths in proptest::collection::vec(1i64..600, 1..10),
        ) {
            let mut punches = Vec::new();
            let mut cursor = at(1, 0, 0);
            for minutes in &lengths {
                punches.push(punch(PunchType::ClockIn, cursor));
                cursor += TimeDelta::minutes(*minutes);
                punches.push(punch(PunchType::ClockOut, cursor));
                cursor += TimeDelta::minutes(30);
            }
            let expected: i64 = lengths.iter().sum();
            prop_assert_eq!(
                worked_duration(&punches, cursor + TimeDelta::hours(5)),
                TimeDelta::minutes(expected)
            );
        }

        #[test]
        fn prop_total_is_never_negative(
            offsets in proptest::collection::vec((0i64..10_000, 0u8..4), 0..20),
            now_offset in 0i64..10_000,
        ) {
            let base = at(1, 0, 0);
            let punches: Vec<PunchRecord> = offsets
                .iter()
                .map(|(minutes, kind)| {
                    let punch_type = match kind {
                        0 => PunchType::ClockIn,
                        1 => PunchType::ClockOut,
                        2 => PunchType::BreakStart,
                        _ => PunchType::BreakEnd,
                    };
                    punch(punch_type, base + TimeDelta::minutes(*minutes))
                })
                .collect();
            let hours = aggregate_hours(&punches, base + TimeDelta::minutes(now_offset));
            prop_assert!(hours >= Decimal::ZERO);
        }
    }
}
