use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, instrument, warn};

use crate::leave::balance::{self, LeaveSummaryLine};
use crate::leave::day_counter::{self, check_range};
use crate::leave::error::LeaveError;
use crate::model::leave_credit::DeductOutcome;
use crate::model::leave_entry::{LeaveDateEntry, Portion};
use crate::model::leave_request::{Approver, Decision, LeaveRequest, LeaveStatus};
use crate::store::snapshot::{RequestSnapshot, SnapshotWriter};
use crate::store::{HolidayProvider, LeaveCreditStore, LeaveRequestStore, LeaveTypeConfigStore};
use crate::utils::request_id::{fiscal_year, generate_request_id};

/// Fresh ids drawn before giving up on a crowded fiscal year.
const MAX_ID_ATTEMPTS: usize = 8;

/// Who is submitting, as known to the transport layer.
#[derive(Debug, Clone)]
pub struct Requester {
    pub employee_id: u64,
    pub name: String,
}

/// Runs the leave engine against the external stores.
pub struct LeaveService {
    configs: Arc<dyn LeaveTypeConfigStore>,
    credits: Arc<dyn LeaveCreditStore>,
    holidays: Arc<dyn HolidayProvider>,
    requests: Arc<dyn LeaveRequestStore>,
    snapshots: SnapshotWriter,
}

impl LeaveService {
    pub fn new(
        configs: Arc<dyn LeaveTypeConfigStore>,
        credits: Arc<dyn LeaveCreditStore>,
        holidays: Arc<dyn HolidayProvider>,
        requests: Arc<dyn LeaveRequestStore>,
        snapshots: SnapshotWriter,
    ) -> Self {
        Self {
            configs,
            credits,
            holidays,
            requests,
            snapshots,
        }
    }

    /// Leave days in `[start, end]` for the given leave type.
    pub async fn day_count(
        &self,
        leave_type_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        start_portion: Portion,
        end_portion: Portion,
    ) -> Result<f64, LeaveError> {
        check_range(start, end)?;
        let config = self
            .configs
            .get(leave_type_id)
            .await?
            .ok_or(LeaveError::UnknownLeaveType(leave_type_id))?;
        let calendar = self.holidays.calendar_between(start, end).await?;

        day_counter::compute(
            start,
            end,
            start_portion,
            end_portion,
            config.counting_policy,
            |d| calendar.is_non_working_day(d),
        )
    }

    /// Projected consumption of a selection against the employee's credits.
    #[instrument(name = "leave_summary", skip(self, entries), fields(entries = entries.len()))]
    pub async fn summarize(
        &self,
        employee_id: u64,
        entries: &[LeaveDateEntry],
    ) -> Result<Vec<LeaveSummaryLine>, LeaveError> {
        let Some((start, end)) = span(entries) else {
            return Ok(Vec::new());
        };
        check_range(start, end)?;
        let configs = self.configs.all().await?;
        let credits = self.credits.credits_for(employee_id).await?;
        let calendar = self.holidays.calendar_between(start, end).await?;

        balance::summarize(entries, &configs, &credits, |d| {
            calendar.is_non_working_day(d)
        })
    }

    /// Creates, submits and stores a new request.
    #[instrument(
        name = "leave_submit",
        skip(self, requester, entries),
        fields(employee_id = requester.employee_id)
    )]
    pub async fn submit(
        &self,
        requester: &Requester,
        leave_type_id: u64,
        entries: Vec<LeaveDateEntry>,
    ) -> Result<LeaveRequest, LeaveError> {
        let (start, end) = span(&entries).ok_or(LeaveError::NoWorkingDays)?;
        check_range(start, end)?;
        let config = self
            .configs
            .get(leave_type_id)
            .await?
            .ok_or(LeaveError::UnknownLeaveType(leave_type_id))?;
        let calendar = self.holidays.calendar_between(start, end).await?;

        let now = Utc::now();
        let mut request =
            LeaveRequest::draft(String::new(), requester.employee_id, leave_type_id, entries, now);
        request.submit(&config, |d| calendar.is_non_working_day(d), now)?;

        match self
            .credits
            .get_credit(requester.employee_id, leave_type_id)
            .await?
        {
            Some(credit) if credit.remaining() < request.computed_days => {
                return Err(LeaveError::InsufficientCredit {
                    remaining: credit.remaining(),
                    requested: request.computed_days,
                });
            }
            Some(_) => {}
            None => info!(leave_type_id, "No leave credit on record, submitting anyway"),
        }

        let year = fiscal_year(start);
        let mut stored = false;
        for _ in 0..MAX_ID_ATTEMPTS {
            request.id = generate_request_id(year);
            match self.requests.insert(&request).await {
                Ok(()) => {
                    stored = true;
                    break;
                }
                Err(LeaveError::Conflict(id)) => warn!(request_id = %id, "Request id taken"),
                Err(e) => return Err(e),
            }
        }
        if !stored {
            return Err(LeaveError::Conflict(format!("LV-{year}-*")));
        }

        // the stored request is authoritative; a failed snapshot is not fatal
        let written = match RequestSnapshot::of(&request, &requester.name, &config.name) {
            Ok(snapshot) => self.snapshots.persist(snapshot).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(path) => info!(request_id = %request.id, path = %path.display(), "Snapshot written"),
            Err(e) => error!(error = %e, request_id = %request.id, "Failed to write snapshot"),
        }

        info!(
            request_id = %request.id,
            days = request.computed_days,
            steps = request.resolved_chain.len(),
            "Leave request submitted"
        );
        Ok(request)
    }

    pub async fn get(&self, request_id: &str) -> Result<LeaveRequest, LeaveError> {
        self.requests
            .get(request_id)
            .await?
            .ok_or_else(|| LeaveError::RequestNotFound(request_id.to_string()))
    }

    /// Records an approver's decision. The final approval charges the
    /// credit store before the new status is stored, so a replay after a
    /// crash finds the charge already made. A charge whose status update
    /// loses to a concurrent transition is refunded.
    #[instrument(
        name = "leave_decide",
        skip(self, approver),
        fields(approver_id = approver.employee_id)
    )]
    pub async fn decide(
        &self,
        request_id: &str,
        approver: &Approver,
        decision: Decision,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut request = self.get(request_id).await?;
        let previous = request.status;

        let mut charged = false;
        if request.next_status(approver, decision)? == LeaveStatus::Approved {
            match self
                .credits
                .deduct_once(
                    &request.id,
                    request.employee_id,
                    request.leave_type_id,
                    request.computed_days,
                )
                .await
            {
                Ok(DeductOutcome::Deducted { remaining }) => {
                    charged = true;
                    info!(request_id, remaining, "Leave credit deducted")
                }
                Ok(DeductOutcome::AlreadyDeducted) => {
                    warn!(request_id, "Leave credit already deducted for this request")
                }
                Err(LeaveError::CreditUnavailable { .. }) => {
                    warn!(request_id, "No leave credit on record, approving without deduction")
                }
                Err(e) => return Err(e),
            }
        }

        let stored = match request.apply_decision(approver, decision, Utc::now()) {
            Ok(transition) => self
                .store_transition(&request, previous)
                .await
                .map(|()| transition),
            Err(e) => Err(e),
        };
        let transition = match stored {
            Ok(transition) => transition,
            Err(e) => {
                if charged {
                    self.refund(request_id).await;
                }
                return Err(e);
            }
        };

        info!(request_id, ?transition, status = %request.status, "Leave decision recorded");
        Ok(request)
    }

    /// Gives the charge back unless a concurrent approval of the same
    /// request, which found the charge already made, got the request stored
    /// as approved.
    async fn refund(&self, request_id: &str) {
        match self.requests.get(request_id).await {
            Ok(Some(stored)) if stored.status == LeaveStatus::Approved => {
                info!(request_id, "Request approved concurrently, keeping leave credit charge");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, request_id, "Approval not stored, leave credit left charged");
                return;
            }
        }
        match self.credits.refund_once(request_id).await {
            Ok(Some(days)) => warn!(request_id, days, "Approval not stored, leave credit refunded"),
            Ok(None) => {}
            Err(e) => error!(
                error = %e,
                request_id,
                "Approval not stored and leave credit refund failed"
            ),
        }
    }

    /// Withdraws a request on behalf of its requester.
    #[instrument(name = "leave_cancel", skip(self))]
    pub async fn cancel(
        &self,
        request_id: &str,
        employee_id: u64,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut request = self.get(request_id).await?;
        let previous = request.status;
        request.cancel(employee_id)?;
        self.store_transition(&request, previous).await?;
        info!(request_id, "Leave request cancelled");
        Ok(request)
    }

    async fn store_transition(
        &self,
        request: &LeaveRequest,
        previous: LeaveStatus,
    ) -> Result<(), LeaveError> {
        if self.requests.update_if(request, previous).await? {
            Ok(())
        } else {
            error!(
                request_id = %request.id,
                from = %previous,
                to = %request.status,
                "Leave request changed underneath this transition"
            );
            Err(LeaveError::Conflict(request.id.clone()))
        }
    }
}

fn span(entries: &[LeaveDateEntry]) -> Option<(NaiveDate, NaiveDate)> {
    let start = entries.iter().map(|e| e.date).min()?;
    let end = entries.iter().map(|e| e.date).max()?;
    Some((start, end))
}
