use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde_json::json;

use crate::model::leave_request::LeaveStatus;

#[derive(Debug, Display)]
pub enum LeaveError {
    #[display(fmt = "invalid date range {} to {}", start, end)]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[display(fmt = "half-day portion on {} is not at the edge of its leave block", date)]
    AmbiguousPortion { date: NaiveDate },

    #[display(fmt = "date {} selected more than once for leave type {}", date, leave_type_id)]
    DuplicateDate { date: NaiveDate, leave_type_id: u64 },

    #[display(fmt = "the selected dates contain no working day")]
    NoWorkingDays,

    #[display(fmt = "{} days requested, leave type allows at most {}", requested, max)]
    ExceedsMaxDays { requested: f64, max: u32 },

    #[display(fmt = "insufficient leave credit: {} remaining, {} requested", remaining, requested)]
    InsufficientCredit { remaining: f64, requested: f64 },

    #[display(fmt = "leave type {} has no approver steps and no approval rules", leave_type_id)]
    NoApplicableRule { leave_type_id: u64 },

    #[display(fmt = "invalid leave type configuration: {}", _0)]
    InvalidConfig(String),

    #[display(fmt = "unknown leave type {}", _0)]
    UnknownLeaveType(u64),

    #[display(
        fmt = "no leave credit for employee {} and leave type {}",
        employee_id,
        leave_type_id
    )]
    CreditUnavailable { employee_id: u64, leave_type_id: u64 },

    #[display(fmt = "leave request {} not found", _0)]
    RequestNotFound(String),

    #[display(fmt = "cannot {} a request that is {}", action, from)]
    InvalidTransition {
        from: LeaveStatus,
        action: &'static str,
    },

    #[display(fmt = "not authorized: {}", _0)]
    NotAuthorized(String),

    #[display(fmt = "leave request {} was modified concurrently", _0)]
    Conflict(String),

    #[display(fmt = "storage error: {}", _0)]
    Storage(String),
}

impl std::error::Error for LeaveError {}

impl From<sqlx::Error> for LeaveError {
    fn from(e: sqlx::Error) -> Self {
        LeaveError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for LeaveError {
    fn from(e: std::io::Error) -> Self {
        LeaveError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for LeaveError {
    fn from(e: serde_json::Error) -> Self {
        LeaveError::Storage(e.to_string())
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::InvalidRange { .. }
            | LeaveError::AmbiguousPortion { .. }
            | LeaveError::DuplicateDate { .. }
            | LeaveError::NoWorkingDays
            | LeaveError::ExceedsMaxDays { .. } => StatusCode::BAD_REQUEST,
            LeaveError::InsufficientCredit { .. }
            | LeaveError::CreditUnavailable { .. }
            | LeaveError::InvalidTransition { .. }
            | LeaveError::Conflict(_) => StatusCode::CONFLICT,
            LeaveError::UnknownLeaveType(_) | LeaveError::RequestNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LeaveError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            LeaveError::NoApplicableRule { .. }
            | LeaveError::InvalidConfig(_)
            | LeaveError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // storage details stay in the logs
        let message = match self {
            LeaveError::Storage(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
