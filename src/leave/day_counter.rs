use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::leave::error::LeaveError;
use crate::model::leave_entry::{LeaveDateEntry, Portion};
use crate::model::leave_type::CountingPolicy;

/// Longest span, first and last day included, one range may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Rejects reversed ranges and ranges longer than [`MAX_RANGE_DAYS`].
pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), LeaveError> {
    if end < start || (end - start).num_days() >= MAX_RANGE_DAYS {
        return Err(LeaveError::InvalidRange { start, end });
    }
    Ok(())
}

/// A run of consecutive leave days with its boundary portions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBlock {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_portion: Portion,
    pub end_portion: Portion,
}

impl LeaveBlock {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        start_portion: Portion,
        end_portion: Portion,
    ) -> Result<Self, LeaveError> {
        if end < start {
            return Err(LeaveError::InvalidRange { start, end });
        }
        Ok(Self {
            start,
            end,
            start_portion,
            end_portion,
        })
    }

    /// Builds a block from entries on consecutive dates, sorted ascending.
    ///
    /// Only the first and last entry may be half days.
    pub fn from_run(run: &[LeaveDateEntry]) -> Result<Self, LeaveError> {
        let (first, last) = match (run.first(), run.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(LeaveError::NoWorkingDays),
        };
        debug_assert!(
            run.windows(2)
                .all(|w| w[0].date.checked_add_days(Days::new(1)) == Some(w[1].date))
        );

        if run.len() > 2 {
            if let Some(e) = run[1..run.len() - 1].iter().find(|e| e.portion.is_half()) {
                return Err(LeaveError::AmbiguousPortion { date: e.date });
            }
        }
        Self::new(first.date, last.date, first.portion, last.portion)
    }

    pub fn calendar_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    pub fn count(
        &self,
        policy: CountingPolicy,
        is_non_working_day: impl Fn(NaiveDate) -> bool,
    ) -> Result<f64, LeaveError> {
        compute(
            self.start,
            self.end,
            self.start_portion,
            self.end_portion,
            policy,
            is_non_working_day,
        )
    }
}

/// Number of leave days in `[start, end]` under `policy`.
///
/// `WorkingDaysOnly` skips every date for which `is_non_working_day` holds
/// and applies the portions to the first and last remaining working day.
/// A range without working days yields `0.0`; rejecting it is up to the
/// caller.
pub fn compute(
    start: NaiveDate,
    end: NaiveDate,
    start_portion: Portion,
    end_portion: Portion,
    policy: CountingPolicy,
    is_non_working_day: impl Fn(NaiveDate) -> bool,
) -> Result<f64, LeaveError> {
    check_range(start, end)?;

    let dates = start.iter_days().take_while(|d| *d <= end);

    match policy {
        CountingPolicy::LiteralCalendarDays => Ok(dates.count() as f64),
        CountingPolicy::WorkingDaysOnly => {
            let mut working = dates.filter(|d| !is_non_working_day(*d));
            let Some(_first) = working.next() else {
                return Ok(0.0);
            };
            let rest = working.count();
            let days = if rest == 0 {
                start_portion.multiplier().min(end_portion.multiplier())
            } else {
                start_portion.multiplier() + end_portion.multiplier() + (rest - 1) as f64
            };
            Ok(days)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::calendar::{HolidayCalendar, is_weekend};
    use crate::model::holiday::Holiday;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    fn weekends_only(date: NaiveDate) -> bool {
        is_weekend(date)
    }

    #[test]
    fn single_full_working_day() {
        let days = compute(
            d(6),
            d(6),
            Portion::Full,
            Portion::Full,
            CountingPolicy::WorkingDaysOnly,
            weekends_only,
        )
        .unwrap();
        assert_eq!(days, 1.0);
    }

    #[test]
    fn half_day_start_with_interior_full_days() {
        let days = compute(
            d(6),
            d(8),
            Portion::FirstHalf,
            Portion::Full,
            CountingPolicy::WorkingDaysOnly,
            weekends_only,
        )
        .unwrap();
        assert_eq!(days, 2.5);
    }

    #[test]
    fn literal_policy_counts_weekends() {
        let days = compute(
            d(4),
            d(5),
            Portion::Full,
            Portion::Full,
            CountingPolicy::LiteralCalendarDays,
            weekends_only,
        )
        .unwrap();
        assert_eq!(days, 2.0);
    }

    #[test]
    fn literal_policy_ignores_portions() {
        let days = compute(
            d(6),
            d(7),
            Portion::SecondHalf,
            Portion::FirstHalf,
            CountingPolicy::LiteralCalendarDays,
            weekends_only,
        )
        .unwrap();
        assert_eq!(days, 2.0);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = compute(
            d(8),
            d(6),
            Portion::Full,
            Portion::Full,
            CountingPolicy::WorkingDaysOnly,
            weekends_only,
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidRange { .. }));
    }

    #[test]
    fn oversized_range_is_rejected() {
        let start = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        let err = compute(
            start,
            end,
            Portion::Full,
            Portion::Full,
            CountingPolicy::LiteralCalendarDays,
            |_| false,
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidRange { .. }));

        // a full leap year still fits
        let start = NaiveDate::from_ymd_opt(2028, 1, 1).unwrap();
        assert!(check_range(start, start + Days::new(365)).is_ok());
        assert!(check_range(start, start + Days::new(366)).is_err());
    }

    #[test]
    fn portions_move_to_first_and_last_working_day() {
        // Fri 3 .. Mon 13 with Mon 13 a holiday: working days are
        // Fri 3, Mon 6 - Fri 10; the end half lands on Fri 10.
        let cal = HolidayCalendar::new([Holiday::new(d(13), "วันนวมินทรมหาราช")]);
        let days = compute(
            d(3),
            d(13),
            Portion::SecondHalf,
            Portion::FirstHalf,
            CountingPolicy::WorkingDaysOnly,
            |date| cal.is_non_working_day(date),
        )
        .unwrap();
        assert_eq!(days, 0.5 + 4.0 + 0.5);
    }

    #[test]
    fn holiday_only_range_counts_zero() {
        let cal = HolidayCalendar::new([Holiday::new(d(13), "วันนวมินทรมหาราช")]);
        let days = compute(
            d(13),
            d(13),
            Portion::Full,
            Portion::Full,
            CountingPolicy::WorkingDaysOnly,
            |date| cal.is_non_working_day(date),
        )
        .unwrap();
        assert_eq!(days, 0.0);
    }

    #[test]
    fn single_half_day_uses_smaller_portion() {
        let days = compute(
            d(6),
            d(6),
            Portion::Full,
            Portion::SecondHalf,
            CountingPolicy::WorkingDaysOnly,
            weekends_only,
        )
        .unwrap();
        assert_eq!(days, 0.5);
    }

    #[test]
    fn working_day_count_stays_within_range_length() {
        let portions = [Portion::Full, Portion::FirstHalf, Portion::SecondHalf];
        for start_day in 1..=20 {
            for len in 0..=10u64 {
                let start = d(start_day);
                let end = start + Days::new(len);
                for sp in portions {
                    for ep in portions {
                        let days = compute(
                            start,
                            end,
                            sp,
                            ep,
                            CountingPolicy::WorkingDaysOnly,
                            weekends_only,
                        )
                        .unwrap();
                        assert!(days >= 0.0 && days <= (len + 1) as f64);
                    }
                }
            }
        }
    }

    #[test]
    fn all_full_working_days_equal_range_length() {
        // Mon 6 .. Fri 10
        for end_day in 6..=10 {
            let days = compute(
                d(6),
                d(end_day),
                Portion::Full,
                Portion::Full,
                CountingPolicy::WorkingDaysOnly,
                |_| false,
            )
            .unwrap();
            assert_eq!(days, (end_day - 6 + 1) as f64);
        }
    }

    #[test]
    fn block_rejects_interior_half_day() {
        let run = [
            LeaveDateEntry::full(d(6), 1),
            LeaveDateEntry::new(d(7), 1, Portion::FirstHalf),
            LeaveDateEntry::full(d(8), 1),
        ];
        let err = LeaveBlock::from_run(&run).unwrap_err();
        assert!(matches!(err, LeaveError::AmbiguousPortion { date } if date == d(7)));
    }

    #[test]
    fn block_takes_portions_from_its_edges() {
        let run = [
            LeaveDateEntry::new(d(6), 1, Portion::SecondHalf),
            LeaveDateEntry::full(d(7), 1),
            LeaveDateEntry::new(d(8), 1, Portion::FirstHalf),
        ];
        let block = LeaveBlock::from_run(&run).unwrap();
        assert_eq!(block.calendar_days(), 3);
        assert_eq!(
            block.count(CountingPolicy::WorkingDaysOnly, weekends_only).unwrap(),
            2.0
        );
    }
}
