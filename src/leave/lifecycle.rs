//! Status transitions of a leave request.
//!
//! ```text
//! Draft ──submit──▶ Pending ──▶ InApproval(0) ──approve──▶ … ──approve──▶ Approved
//!   │                  │              │ reject
//!   └──────cancel──────┴──────────────┴──────▶ Cancelled        Rejected
//! ```
//!
//! These methods only move the request between states. Charging the credit
//! store on the final approval is done by the caller between
//! [`LeaveRequest::next_status`] and [`LeaveRequest::apply_decision`].

use chrono::{DateTime, NaiveDate, Utc};

use crate::leave::approval;
use crate::leave::balance;
use crate::leave::error::LeaveError;
use crate::model::leave_request::{
    ApprovalRecord, Approver, Decision, LeaveRequest, LeaveStatus,
};
use crate::model::leave_type::LeaveTypeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced { step: usize },
    Approved,
    Rejected,
}

impl LeaveRequest {
    /// Draft → Pending → InApproval(0). Freezes the day count and the
    /// approver chain.
    pub fn submit(
        &mut self,
        config: &LeaveTypeConfig,
        is_non_working_day: impl Fn(NaiveDate) -> bool,
        at: DateTime<Utc>,
    ) -> Result<(), LeaveError> {
        if self.status != LeaveStatus::Draft {
            return Err(LeaveError::InvalidTransition {
                from: self.status,
                action: "submit",
            });
        }
        if config.id != self.leave_type_id {
            return Err(LeaveError::UnknownLeaveType(self.leave_type_id));
        }
        if let Some(stray) = self
            .entries
            .iter()
            .find(|e| e.leave_type_id != self.leave_type_id)
        {
            return Err(LeaveError::UnknownLeaveType(stray.leave_type_id));
        }

        let days = balance::count_entries(&self.entries, config, is_non_working_day)?;
        if days <= 0.0 {
            return Err(LeaveError::NoWorkingDays);
        }
        if config.max_days > 0 && days > f64::from(config.max_days) {
            return Err(LeaveError::ExceedsMaxDays {
                requested: days,
                max: config.max_days,
            });
        }
        let chain = approval::resolve(config, days)?;

        self.computed_days = days;
        self.resolved_chain = chain;
        self.submitted_at = Some(at);
        self.status = LeaveStatus::Pending;
        // validated configs never resolve to an empty chain
        if !self.resolved_chain.is_empty() {
            self.status = LeaveStatus::InApproval { step: 0 };
        }
        Ok(())
    }

    /// The status `decision` by `approver` would lead to, without applying it.
    pub fn next_status(
        &self,
        approver: &Approver,
        decision: Decision,
    ) -> Result<LeaveStatus, LeaveError> {
        let step = match self.status {
            LeaveStatus::InApproval { step } => step,
            from => {
                return Err(LeaveError::InvalidTransition {
                    from,
                    action: decision_action(decision),
                });
            }
        };

        if approver.employee_id == self.employee_id {
            return Err(LeaveError::NotAuthorized(
                "requesters cannot decide on their own leave".into(),
            ));
        }
        let required = self.resolved_chain.get(step).ok_or_else(|| {
            LeaveError::Conflict(format!("{} (step {step} beyond chain)", self.id))
        })?;
        if !required.is_satisfied_by(approver.employee_id, approver.position.as_deref()) {
            return Err(LeaveError::NotAuthorized(format!(
                "employee {} does not hold approval step {}",
                approver.employee_id, step
            )));
        }

        Ok(match decision {
            Decision::Reject => LeaveStatus::Rejected,
            Decision::Approve if step + 1 < self.resolved_chain.len() => {
                LeaveStatus::InApproval { step: step + 1 }
            }
            Decision::Approve => LeaveStatus::Approved,
        })
    }

    /// Records the decision and moves the request on.
    pub fn apply_decision(
        &mut self,
        approver: &Approver,
        decision: Decision,
        at: DateTime<Utc>,
    ) -> Result<Transition, LeaveError> {
        let next = self.next_status(approver, decision)?;
        let step_index = self.status.step().unwrap_or_default();

        self.approvals_received.push(ApprovalRecord {
            step_index,
            approver_id: approver.employee_id,
            decision,
            timestamp: at,
        });
        self.status = next;

        Ok(match next {
            LeaveStatus::InApproval { step } => Transition::Advanced { step },
            LeaveStatus::Approved => Transition::Approved,
            _ => Transition::Rejected,
        })
    }

    /// Withdraws the request. Only its requester may, and only before a
    /// final decision.
    pub fn cancel(&mut self, employee_id: u64) -> Result<(), LeaveError> {
        if employee_id != self.employee_id {
            return Err(LeaveError::NotAuthorized(
                "only the requester can cancel a leave request".into(),
            ));
        }
        if self.status.is_terminal() {
            return Err(LeaveError::InvalidTransition {
                from: self.status,
                action: "cancel",
            });
        }
        self.status = LeaveStatus::Cancelled;
        Ok(())
    }
}

fn decision_action(decision: Decision) -> &'static str {
    match decision {
        Decision::Approve => "approve",
        Decision::Reject => "reject",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::calendar::is_weekend;
    use crate::model::leave_entry::{LeaveDateEntry, Portion};
    use crate::model::leave_type::{ApprovalRule, ApproverStep, CountingPolicy};

    const REQUESTER: u64 = 1000;
    const HEAD: u64 = 2001;
    const DIRECTOR: u64 = 3001;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    fn config() -> LeaveTypeConfig {
        LeaveTypeConfig::new(
            2,
            "ลาป่วย",
            30,
            CountingPolicy::WorkingDaysOnly,
            vec![
                ApproverStep::positions(["Head of Department"]),
                ApproverStep::positions(["Director"]),
            ],
            vec![ApprovalRule::new(3, vec![0]), ApprovalRule::new(30, vec![0, 1])],
        )
        .unwrap()
    }

    fn head() -> Approver {
        Approver::new(HEAD, Some("Head of Department"))
    }

    fn director() -> Approver {
        Approver::new(DIRECTOR, Some("Director"))
    }

    fn submitted(days: std::ops::RangeInclusive<u32>) -> LeaveRequest {
        let entries = days.map(|day| LeaveDateEntry::full(d(day), 2)).collect();
        let mut req = LeaveRequest::draft("LV-2569-00042", REQUESTER, 2, entries, Utc::now());
        req.submit(&config(), is_weekend, Utc::now()).unwrap();
        req
    }

    #[test]
    fn submit_freezes_days_and_chain() {
        let req = submitted(6..=10);
        assert_eq!(req.computed_days, 5.0);
        assert_eq!(req.resolved_chain.len(), 2);
        assert_eq!(req.status, LeaveStatus::InApproval { step: 0 });
        assert!(req.submitted_at.is_some());
    }

    #[test]
    fn submit_twice_is_rejected() {
        let mut req = submitted(6..=6);
        let err = req.submit(&config(), is_weekend, Utc::now()).unwrap_err();
        assert!(matches!(err, LeaveError::InvalidTransition { action: "submit", .. }));
    }

    #[test]
    fn weekend_only_request_is_invalid() {
        let entries = vec![LeaveDateEntry::full(d(4), 2), LeaveDateEntry::full(d(5), 2)];
        let mut req = LeaveRequest::draft("LV-2569-00043", REQUESTER, 2, entries, Utc::now());
        let err = req.submit(&config(), is_weekend, Utc::now()).unwrap_err();
        assert!(matches!(err, LeaveError::NoWorkingDays));
        assert_eq!(req.status, LeaveStatus::Draft);
    }

    #[test]
    fn max_days_caps_a_request() {
        let entries = (1..=31)
            .map(|day| LeaveDateEntry::full(NaiveDate::from_ymd_opt(2025, 12, day).unwrap(), 2))
            .chain((1..=31).map(|day| {
                LeaveDateEntry::full(NaiveDate::from_ymd_opt(2026, 1, day).unwrap(), 2)
            }))
            .collect();
        let mut req = LeaveRequest::draft("LV-2569-00044", REQUESTER, 2, entries, Utc::now());
        let err = req.submit(&config(), is_weekend, Utc::now()).unwrap_err();
        assert!(matches!(err, LeaveError::ExceedsMaxDays { max: 30, .. }));
    }

    #[test]
    fn mixed_leave_types_cannot_be_submitted_together() {
        let entries = vec![LeaveDateEntry::full(d(6), 2), LeaveDateEntry::full(d(7), 1)];
        let mut req = LeaveRequest::draft("LV-2569-00045", REQUESTER, 2, entries, Utc::now());
        let err = req.submit(&config(), is_weekend, Utc::now()).unwrap_err();
        assert!(matches!(err, LeaveError::UnknownLeaveType(1)));
    }

    #[test]
    fn chain_advances_step_by_step() {
        let mut req = submitted(6..=10);
        assert_eq!(
            req.apply_decision(&head(), Decision::Approve, Utc::now()).unwrap(),
            Transition::Advanced { step: 1 }
        );
        assert_eq!(
            req.apply_decision(&director(), Decision::Approve, Utc::now()).unwrap(),
            Transition::Approved
        );
        assert_eq!(req.status, LeaveStatus::Approved);
        let steps: Vec<_> = req.approvals_received.iter().map(|r| r.step_index).collect();
        assert_eq!(steps, vec![0, 1]);
    }

    #[test]
    fn short_request_needs_one_step() {
        let mut req = submitted(6..=6);
        assert_eq!(req.resolved_chain.len(), 1);
        assert_eq!(req.next_status(&head(), Decision::Approve).unwrap(), LeaveStatus::Approved);
    }

    #[test]
    fn wrong_position_cannot_decide() {
        let req = submitted(6..=10);
        let err = req.next_status(&director(), Decision::Approve).unwrap_err();
        assert!(matches!(err, LeaveError::NotAuthorized(_)));
    }

    #[test]
    fn requester_cannot_approve_themselves() {
        let req = submitted(6..=6);
        let me = Approver::new(REQUESTER, Some("Head of Department"));
        assert!(matches!(
            req.next_status(&me, Decision::Approve),
            Err(LeaveError::NotAuthorized(_))
        ));
    }

    #[test]
    fn reject_is_terminal() {
        let mut req = submitted(6..=10);
        assert_eq!(
            req.apply_decision(&head(), Decision::Reject, Utc::now()).unwrap(),
            Transition::Rejected
        );
        let err = req.apply_decision(&director(), Decision::Approve, Utc::now()).unwrap_err();
        assert!(matches!(err, LeaveError::InvalidTransition { .. }));
        assert!(matches!(req.cancel(REQUESTER), Err(LeaveError::InvalidTransition { .. })));
    }

    #[test]
    fn only_requester_cancels() {
        let mut req = submitted(6..=10);
        assert!(matches!(req.cancel(HEAD), Err(LeaveError::NotAuthorized(_))));
        req.apply_decision(&head(), Decision::Approve, Utc::now()).unwrap();
        req.cancel(REQUESTER).unwrap();
        assert_eq!(req.status, LeaveStatus::Cancelled);
    }

    #[test]
    fn drafts_can_be_cancelled() {
        let mut req = LeaveRequest::draft(
            "LV-2569-00046",
            REQUESTER,
            2,
            vec![LeaveDateEntry::new(d(6), 2, Portion::FirstHalf)],
            Utc::now(),
        );
        req.cancel(REQUESTER).unwrap();
        assert_eq!(req.status, LeaveStatus::Cancelled);
    }
}
