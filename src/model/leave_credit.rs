use serde::{Deserialize, Serialize};

/// Granted/used balance of one employee within one leave type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveCredit {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub total_granted: f64,
    pub used: f64,
}

impl LeaveCredit {
    pub fn new(employee_id: u64, leave_type_id: u64, total_granted: f64, used: f64) -> Self {
        Self {
            employee_id,
            leave_type_id,
            total_granted,
            used,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.total_granted - self.used
    }
}

/// Result of a deduction attempt against the credit store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeductOutcome {
    Deducted { remaining: f64 },
    /// The request id was already charged; nothing changed.
    AlreadyDeducted,
}
