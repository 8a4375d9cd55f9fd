use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::leave_entry::LeaveDateEntry;
use crate::model::leave_type::ApproverStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LeaveStatus {
    Draft,
    Pending,
    InApproval { step: usize },
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LeaveStatus::Draft => "draft",
            LeaveStatus::Pending => "pending",
            LeaveStatus::InApproval { .. } => "in_approval",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }

    /// Step index for `InApproval`, the shape stored in the `current_step` column.
    pub fn step(&self) -> Option<usize> {
        match self {
            LeaveStatus::InApproval { step } => Some(*step),
            _ => None,
        }
    }

    pub fn from_parts(status: &str, step: Option<usize>) -> Option<Self> {
        match (status, step) {
            ("draft", _) => Some(LeaveStatus::Draft),
            ("pending", _) => Some(LeaveStatus::Pending),
            ("in_approval", Some(step)) => Some(LeaveStatus::InApproval { step }),
            ("approved", _) => Some(LeaveStatus::Approved),
            ("rejected", _) => Some(LeaveStatus::Rejected),
            ("cancelled", _) => Some(LeaveStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled
        )
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaveStatus::InApproval { step } => write!(f, "in_approval({step})"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// One accepted decision in the approval log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApprovalRecord {
    #[schema(example = 0)]
    pub step_index: usize,
    #[schema(example = 2001)]
    pub approver_id: u64,
    pub decision: Decision,
    #[schema(example = "2025-10-01T09:30:00Z", format = "date-time", value_type = String)]
    pub timestamp: DateTime<Utc>,
}

/// The acting approver, as identified by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approver {
    pub employee_id: u64,
    pub position: Option<String>,
}

impl Approver {
    pub fn new(employee_id: u64, position: Option<&str>) -> Self {
        Self {
            employee_id,
            position: position.map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = "LV-2569-04217")]
    pub id: String,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    pub entries: Vec<LeaveDateEntry>,
    #[schema(example = 2.5)]
    pub computed_days: f64,
    #[schema(value_type = Object, example = json!({ "state": "in_approval", "step": 0 }))]
    pub status: LeaveStatus,
    pub resolved_chain: Vec<ApproverStep>,
    pub approvals_received: Vec<ApprovalRecord>,
    #[schema(example = "2025-10-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// A fresh draft; nothing is computed until submission.
    pub fn draft(
        id: impl Into<String>,
        employee_id: u64,
        leave_type_id: u64,
        entries: Vec<LeaveDateEntry>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            employee_id,
            leave_type_id,
            entries,
            computed_days: 0.0,
            status: LeaveStatus::Draft,
            resolved_chain: Vec::new(),
            approvals_received: Vec::new(),
            created_at,
            submitted_at: None,
        }
    }

    /// First and last selected date.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.entries.iter().map(|e| e.date).min()?;
        let end = self.entries.iter().map(|e| e.date).max()?;
        Some((start, end))
    }
}
