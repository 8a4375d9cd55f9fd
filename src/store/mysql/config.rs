use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};

use crate::leave::error::LeaveError;
use crate::model::leave_type::{ApprovalRule, ApproverStep, CountingPolicy, LeaveTypeConfig};
use crate::store::LeaveTypeConfigStore;

/// `approver_steps` and `approval_rules` are JSON text columns.
#[derive(FromRow)]
struct LeaveTypeRow {
    id: u64,
    name: String,
    max_days: u32,
    counting_policy: String,
    approver_steps: String,
    approval_rules: String,
}

impl TryFrom<LeaveTypeRow> for LeaveTypeConfig {
    type Error = LeaveError;

    fn try_from(row: LeaveTypeRow) -> Result<Self, Self::Error> {
        let invalid = |what: &str, e: &dyn std::fmt::Display| {
            LeaveError::InvalidConfig(format!("leave type {}: bad {}: {}", row.id, what, e))
        };
        let policy = CountingPolicy::from_str(&row.counting_policy)
            .map_err(|e| invalid("counting_policy", &e))?;
        let steps: Vec<ApproverStep> = serde_json::from_str(&row.approver_steps)
            .map_err(|e| invalid("approver_steps", &e))?;
        let rules: Vec<ApprovalRule> = serde_json::from_str(&row.approval_rules)
            .map_err(|e| invalid("approval_rules", &e))?;
        LeaveTypeConfig::new(row.id, row.name, row.max_days, policy, steps, rules)
    }
}

pub struct MySqlConfigStore {
    pool: MySqlPool,
}

impl MySqlConfigStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_LEAVE_TYPES: &str = r#"
    SELECT id, name, max_days, counting_policy, approver_steps, approval_rules
    FROM leave_types
"#;

#[async_trait]
impl LeaveTypeConfigStore for MySqlConfigStore {
    async fn get(&self, leave_type_id: u64) -> Result<Option<LeaveTypeConfig>, LeaveError> {
        let sql = format!("{SELECT_LEAVE_TYPES} WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveTypeRow>(&sql)
            .bind(leave_type_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveTypeConfig::try_from).transpose()
    }

    async fn all(&self) -> Result<HashMap<u64, LeaveTypeConfig>, LeaveError> {
        let rows = sqlx::query_as::<_, LeaveTypeRow>(SELECT_LEAVE_TYPES)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| LeaveTypeConfig::try_from(row).map(|c| (c.id, c)))
            .collect()
    }
}
