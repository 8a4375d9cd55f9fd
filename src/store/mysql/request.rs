use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::error;

use super::is_duplicate_key;
use crate::leave::error::LeaveError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::store::LeaveRequestStore;

/// Requests are kept whole as JSON in `body`; the status columns exist for
/// filtering and for the compare-and-swap in `update_if`.
pub struct MySqlRequestStore {
    pool: MySqlPool,
}

impl MySqlRequestStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn step_column(status: &LeaveStatus) -> Option<u32> {
    status.step().map(|s| s as u32)
}

#[async_trait]
impl LeaveRequestStore for MySqlRequestStore {
    async fn insert(&self, request: &LeaveRequest) -> Result<(), LeaveError> {
        let body = serde_json::to_string(request)?;
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (id, employee_id, leave_type_id, status, current_step, computed_days, body)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(request.employee_id)
        .bind(request.leave_type_id)
        .bind(request.status.as_str())
        .bind(step_column(&request.status))
        .bind(request.computed_days)
        .bind(body)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(LeaveError::Conflict(request.id.clone())),
            Err(e) => {
                error!(error = %e, request_id = %request.id, "Failed to insert leave request");
                Err(e.into())
            }
        }
    }

    async fn get(&self, request_id: &str) -> Result<Option<LeaveRequest>, LeaveError> {
        let body = sqlx::query_scalar::<_, String>("SELECT body FROM leave_requests WHERE id = ?")
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
    }

    async fn update_if(
        &self,
        request: &LeaveRequest,
        expected: LeaveStatus,
    ) -> Result<bool, LeaveError> {
        let body = serde_json::to_string(request)?;
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, current_step = ?, body = ?
            WHERE id = ?
            AND status = ?
            AND current_step <=> ?
            "#,
        )
        .bind(request.status.as_str())
        .bind(step_column(&request.status))
        .bind(body)
        .bind(&request.id)
        .bind(expected.as_str())
        .bind(step_column(&expected))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
