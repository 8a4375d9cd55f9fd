use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::leave::day_counter::LeaveBlock;
use crate::leave::error::LeaveError;
use crate::model::leave_credit::LeaveCredit;
use crate::model::leave_entry::LeaveDateEntry;
use crate::model::leave_type::LeaveTypeConfig;

/// Consumption of one leave type within a selection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveSummaryLine {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = json!(["2025-10-06", "2025-10-07"]), value_type = Vec<String>)]
    pub dates: Vec<NaiveDate>,
    #[schema(example = 2.0)]
    pub total_days: f64,
    /// Projected balance after this selection; `None` when the employee has
    /// no credit record for the leave type.
    #[schema(example = 8.0, nullable = true)]
    pub remaining: Option<f64>,
}

impl LeaveSummaryLine {
    /// Unavailable balances inform, they never block.
    pub fn blocks_submission(&self) -> bool {
        self.remaining.is_some_and(|r| r < 0.0)
    }
}

fn continues(prev: &LeaveDateEntry, next: &LeaveDateEntry) -> bool {
    prev.date.checked_add_days(Days::new(1)) == Some(next.date)
        && prev.portion.runs_to_day_end()
        && next.portion.runs_from_day_start()
}

/// Splits date-sorted entries of one leave type into maximal blocks.
///
/// Two neighbours join only when they are one calendar day apart and the
/// leave runs through the night between them, so a morning-only day ends a
/// block and an afternoon-only day starts one.
pub fn contiguous_blocks(sorted: &[LeaveDateEntry]) -> Result<Vec<LeaveBlock>, LeaveError> {
    let mut blocks = Vec::new();
    let mut run_start = 0;
    for i in 1..=sorted.len() {
        if i == sorted.len() || !continues(&sorted[i - 1], &sorted[i]) {
            if run_start < i {
                blocks.push(LeaveBlock::from_run(&sorted[run_start..i])?);
            }
            run_start = i;
        }
    }
    Ok(blocks)
}

/// Day count of entries belonging to one leave type.
pub fn count_entries(
    entries: &[LeaveDateEntry],
    config: &LeaveTypeConfig,
    is_non_working_day: impl Fn(NaiveDate) -> bool,
) -> Result<f64, LeaveError> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|e| e.date);
    count_sorted(&sorted, config, is_non_working_day)
}

fn count_sorted(
    sorted: &[LeaveDateEntry],
    config: &LeaveTypeConfig,
    is_non_working_day: impl Fn(NaiveDate) -> bool,
) -> Result<f64, LeaveError> {
    if let Some(w) = sorted.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(LeaveError::DuplicateDate {
            date: w[0].date,
            leave_type_id: config.id,
        });
    }

    let mut total_days = 0.0;
    for block in contiguous_blocks(sorted)? {
        total_days += block.count(config.counting_policy, &is_non_working_day)?;
    }
    Ok(total_days)
}

/// Per-leave-type consumption and projected balance of a date selection,
/// ordered by leave type id.
pub fn summarize(
    entries: &[LeaveDateEntry],
    configs: &HashMap<u64, LeaveTypeConfig>,
    credits: &HashMap<u64, LeaveCredit>,
    is_non_working_day: impl Fn(NaiveDate) -> bool,
) -> Result<Vec<LeaveSummaryLine>, LeaveError> {
    let mut groups: BTreeMap<u64, Vec<LeaveDateEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.leave_type_id).or_default().push(*entry);
    }

    let mut lines = Vec::with_capacity(groups.len());
    for (leave_type_id, mut group) in groups {
        let config = configs
            .get(&leave_type_id)
            .ok_or(LeaveError::UnknownLeaveType(leave_type_id))?;

        group.sort_by_key(|e| e.date);
        let total_days = count_sorted(&group, config, &is_non_working_day)?;

        let remaining = credits
            .get(&leave_type_id)
            .map(|credit| credit.remaining() - total_days);

        lines.push(LeaveSummaryLine {
            leave_type_id,
            dates: group.iter().map(|e| e.date).collect(),
            total_days,
            remaining,
        });
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::calendar::is_weekend;
    use crate::model::leave_entry::Portion;
    use crate::model::leave_type::{ApproverStep, CountingPolicy};

    const VACATION: u64 = 1;
    const SICK: u64 = 2;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    fn configs() -> HashMap<u64, LeaveTypeConfig> {
        let step = || vec![ApproverStep::positions(["Head of Department"])];
        [
            LeaveTypeConfig::new(
                VACATION,
                "ลาพักผ่อน",
                10,
                CountingPolicy::LiteralCalendarDays,
                step(),
                vec![],
            )
            .unwrap(),
            LeaveTypeConfig::new(
                SICK,
                "ลาป่วย",
                60,
                CountingPolicy::WorkingDaysOnly,
                step(),
                vec![],
            )
            .unwrap(),
        ]
        .into_iter()
        .map(|c| (c.id, c))
        .collect()
    }

    #[test]
    fn groups_sorts_and_orders_by_leave_type() {
        let entries = [
            LeaveDateEntry::full(d(7), SICK),
            LeaveDateEntry::full(d(5), VACATION),
            LeaveDateEntry::full(d(6), SICK),
            LeaveDateEntry::full(d(4), VACATION),
        ];
        let credits = HashMap::from([(VACATION, LeaveCredit::new(1000, VACATION, 10.0, 3.0))]);
        let lines = summarize(&entries, &configs(), &credits, is_weekend).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].leave_type_id, VACATION);
        assert_eq!(lines[0].dates, vec![d(4), d(5)]);
        // weekend days count under the literal policy
        assert_eq!(lines[0].total_days, 2.0);
        assert_eq!(lines[0].remaining, Some(5.0));

        assert_eq!(lines[1].leave_type_id, SICK);
        assert_eq!(lines[1].total_days, 2.0);
        assert_eq!(lines[1].remaining, None);
        assert!(!lines[1].blocks_submission());
    }

    #[test]
    fn gaps_split_blocks_so_portions_apply_per_block() {
        // Mon 6 afternoon-only, Tue 7, then Thu 9 morning-only
        let entries = [
            LeaveDateEntry::new(d(6), SICK, Portion::SecondHalf),
            LeaveDateEntry::full(d(7), SICK),
            LeaveDateEntry::new(d(9), SICK, Portion::FirstHalf),
        ];
        let group: Vec<_> = entries.to_vec();
        let blocks = contiguous_blocks(&group).unwrap();
        assert_eq!(blocks.len(), 2);

        let lines = summarize(&entries, &configs(), &HashMap::new(), is_weekend).unwrap();
        assert_eq!(lines[0].total_days, 2.0);
    }

    #[test]
    fn consecutive_mornings_are_separate_blocks() {
        let entries: Vec<_> = (6..=8)
            .map(|day| LeaveDateEntry::new(d(day), SICK, Portion::FirstHalf))
            .collect();
        assert_eq!(contiguous_blocks(&entries).unwrap().len(), 3);

        let lines = summarize(&entries, &configs(), &HashMap::new(), is_weekend).unwrap();
        assert_eq!(lines[0].total_days, 1.5);
    }

    #[test]
    fn weekend_gap_breaks_contiguity() {
        // Fri 3 and Mon 6 are not neighbours in the calendar
        let entries = [
            LeaveDateEntry::full(d(3), SICK),
            LeaveDateEntry::full(d(6), SICK),
        ];
        assert_eq!(contiguous_blocks(&entries).unwrap().len(), 2);
    }

    #[test]
    fn negative_projection_blocks_submission() {
        let entries: Vec<_> = (6..=10).map(|day| LeaveDateEntry::full(d(day), SICK)).collect();
        let credits = HashMap::from([(SICK, LeaveCredit::new(1000, SICK, 4.0, 1.0))]);
        let lines = summarize(&entries, &configs(), &credits, is_weekend).unwrap();
        assert_eq!(lines[0].total_days, 5.0);
        assert_eq!(lines[0].remaining, Some(-2.0));
        assert!(lines[0].blocks_submission());
    }

    #[test]
    fn unknown_leave_type_is_rejected() {
        let entries = [LeaveDateEntry::full(d(6), 99)];
        let err = summarize(&entries, &configs(), &HashMap::new(), is_weekend).unwrap_err();
        assert!(matches!(err, LeaveError::UnknownLeaveType(99)));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let entries = [
            LeaveDateEntry::full(d(6), SICK),
            LeaveDateEntry::new(d(6), SICK, Portion::FirstHalf),
        ];
        let err = summarize(&entries, &configs(), &HashMap::new(), is_weekend).unwrap_err();
        assert!(matches!(err, LeaveError::DuplicateDate { .. }));
    }

    #[test]
    fn empty_selection_summarizes_to_nothing() {
        let lines = summarize(&[], &configs(), &HashMap::new(), is_weekend).unwrap();
        assert!(lines.is_empty());
    }
}
