//! Process-local stores, used by tests and single-node setups.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Datelike;

use crate::leave::error::LeaveError;
use crate::model::holiday::Holiday;
use crate::model::leave_credit::{DeductOutcome, LeaveCredit};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::leave_type::LeaveTypeConfig;
use crate::store::{HolidayProvider, LeaveCreditStore, LeaveRequestStore, LeaveTypeConfigStore};

fn poisoned(what: &str) -> LeaveError {
    LeaveError::Storage(format!("{what} lock poisoned"))
}

#[derive(Debug, Default)]
pub struct InMemoryHolidays {
    holidays: Vec<Holiday>,
}

impl InMemoryHolidays {
    pub fn new(holidays: Vec<Holiday>) -> Self {
        Self { holidays }
    }
}

#[async_trait]
impl HolidayProvider for InMemoryHolidays {
    async fn holidays_in_year(&self, year: i32) -> Result<Vec<Holiday>, LeaveError> {
        Ok(self
            .holidays
            .iter()
            .filter(|h| h.date.year() == year)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    configs: HashMap<u64, LeaveTypeConfig>,
}

impl InMemoryConfigStore {
    pub fn new<I: IntoIterator<Item = LeaveTypeConfig>>(configs: I) -> Self {
        Self {
            configs: configs.into_iter().map(|c| (c.id, c)).collect(),
        }
    }
}

#[async_trait]
impl LeaveTypeConfigStore for InMemoryConfigStore {
    async fn get(&self, leave_type_id: u64) -> Result<Option<LeaveTypeConfig>, LeaveError> {
        Ok(self.configs.get(&leave_type_id).cloned())
    }

    async fn all(&self) -> Result<HashMap<u64, LeaveTypeConfig>, LeaveError> {
        Ok(self.configs.clone())
    }
}

#[derive(Debug, Clone, Copy)]
struct Charge {
    employee_id: u64,
    leave_type_id: u64,
    days: f64,
}

#[derive(Debug, Default)]
struct CreditLedger {
    credits: HashMap<(u64, u64), LeaveCredit>,
    charged: HashMap<String, Charge>,
}

/// Credit balances behind one mutex, so check and charge happen together.
#[derive(Debug, Default)]
pub struct InMemoryCreditStore {
    ledger: Mutex<CreditLedger>,
}

impl InMemoryCreditStore {
    pub fn new<I: IntoIterator<Item = LeaveCredit>>(credits: I) -> Self {
        let credits = credits
            .into_iter()
            .map(|c| ((c.employee_id, c.leave_type_id), c))
            .collect();
        Self {
            ledger: Mutex::new(CreditLedger {
                credits,
                charged: HashMap::new(),
            }),
        }
    }
}

#[async_trait]
impl LeaveCreditStore for InMemoryCreditStore {
    async fn get_credit(
        &self,
        employee_id: u64,
        leave_type_id: u64,
    ) -> Result<Option<LeaveCredit>, LeaveError> {
        let ledger = self.ledger.lock().map_err(|_| poisoned("credit ledger"))?;
        Ok(ledger.credits.get(&(employee_id, leave_type_id)).cloned())
    }

    async fn credits_for(&self, employee_id: u64) -> Result<HashMap<u64, LeaveCredit>, LeaveError> {
        let ledger = self.ledger.lock().map_err(|_| poisoned("credit ledger"))?;
        Ok(ledger
            .credits
            .values()
            .filter(|c| c.employee_id == employee_id)
            .map(|c| (c.leave_type_id, c.clone()))
            .collect())
    }

    async fn deduct_once(
        &self,
        request_id: &str,
        employee_id: u64,
        leave_type_id: u64,
        days: f64,
    ) -> Result<DeductOutcome, LeaveError> {
        let mut ledger = self.ledger.lock().map_err(|_| poisoned("credit ledger"))?;
        if ledger.charged.contains_key(request_id) {
            return Ok(DeductOutcome::AlreadyDeducted);
        }
        let credit = ledger
            .credits
            .get_mut(&(employee_id, leave_type_id))
            .ok_or(LeaveError::CreditUnavailable {
                employee_id,
                leave_type_id,
            })?;
        if credit.remaining() < days {
            return Err(LeaveError::InsufficientCredit {
                remaining: credit.remaining(),
                requested: days,
            });
        }
        credit.used += days;
        let remaining = credit.remaining();
        ledger.charged.insert(
            request_id.to_string(),
            Charge {
                employee_id,
                leave_type_id,
                days,
            },
        );
        Ok(DeductOutcome::Deducted { remaining })
    }

    async fn refund_once(&self, request_id: &str) -> Result<Option<f64>, LeaveError> {
        let mut ledger = self.ledger.lock().map_err(|_| poisoned("credit ledger"))?;
        let Some(charge) = ledger.charged.remove(request_id) else {
            return Ok(None);
        };
        if let Some(credit) = ledger
            .credits
            .get_mut(&(charge.employee_id, charge.leave_type_id))
        {
            credit.used -= charge.days;
        }
        Ok(Some(charge.days))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    requests: Mutex<HashMap<String, LeaveRequest>>,
}

#[async_trait]
impl LeaveRequestStore for InMemoryRequestStore {
    async fn insert(&self, request: &LeaveRequest) -> Result<(), LeaveError> {
        let mut requests = self.requests.lock().map_err(|_| poisoned("request map"))?;
        if requests.contains_key(&request.id) {
            return Err(LeaveError::Conflict(request.id.clone()));
        }
        requests.insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn get(&self, request_id: &str) -> Result<Option<LeaveRequest>, LeaveError> {
        let requests = self.requests.lock().map_err(|_| poisoned("request map"))?;
        Ok(requests.get(request_id).cloned())
    }

    async fn update_if(
        &self,
        request: &LeaveRequest,
        expected: LeaveStatus,
    ) -> Result<bool, LeaveError> {
        let mut requests = self.requests.lock().map_err(|_| poisoned("request map"))?;
        match requests.get_mut(&request.id) {
            Some(stored) if stored.status == expected => {
                *stored = request.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
