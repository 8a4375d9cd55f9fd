//! Seams to the systems the engine reads from and writes to.

pub mod holiday_cache;
pub mod memory;
pub mod mysql;
pub mod snapshot;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::leave::calendar::HolidayCalendar;
use crate::leave::day_counter::check_range;
use crate::leave::error::LeaveError;
use crate::model::holiday::Holiday;
use crate::model::leave_credit::{DeductOutcome, LeaveCredit};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::leave_type::LeaveTypeConfig;

#[async_trait]
pub trait HolidayProvider: Send + Sync {
    async fn holidays_in_year(&self, year: i32) -> Result<Vec<Holiday>, LeaveError>;

    /// Calendar covering every year touched by `[start, end]`.
    async fn calendar_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HolidayCalendar, LeaveError> {
        check_range(start, end)?;
        let mut holidays = Vec::new();
        for year in start.year()..=end.year() {
            holidays.extend(self.holidays_in_year(year).await?);
        }
        Ok(HolidayCalendar::new(holidays))
    }
}

#[async_trait]
pub trait LeaveCreditStore: Send + Sync {
    async fn get_credit(
        &self,
        employee_id: u64,
        leave_type_id: u64,
    ) -> Result<Option<LeaveCredit>, LeaveError>;

    /// All credits of one employee, keyed by leave type.
    async fn credits_for(&self, employee_id: u64) -> Result<HashMap<u64, LeaveCredit>, LeaveError>;

    /// Charges `days` once per `request_id`. Never lets the balance go
    /// below zero.
    async fn deduct_once(
        &self,
        request_id: &str,
        employee_id: u64,
        leave_type_id: u64,
        days: f64,
    ) -> Result<DeductOutcome, LeaveError>;

    /// Gives back the charge made for `request_id`, if any. Returns the
    /// days refunded; a second call refunds nothing.
    async fn refund_once(&self, request_id: &str) -> Result<Option<f64>, LeaveError>;
}

#[async_trait]
pub trait LeaveTypeConfigStore: Send + Sync {
    async fn get(&self, leave_type_id: u64) -> Result<Option<LeaveTypeConfig>, LeaveError>;

    async fn all(&self) -> Result<HashMap<u64, LeaveTypeConfig>, LeaveError>;
}

#[async_trait]
pub trait LeaveRequestStore: Send + Sync {
    /// Fails with `Conflict` when the id is taken.
    async fn insert(&self, request: &LeaveRequest) -> Result<(), LeaveError>;

    async fn get(&self, request_id: &str) -> Result<Option<LeaveRequest>, LeaveError>;

    /// Overwrites the stored request only if it is still in `expected`.
    async fn update_if(
        &self,
        request: &LeaveRequest,
        expected: LeaveStatus,
    ) -> Result<bool, LeaveError>;
}
