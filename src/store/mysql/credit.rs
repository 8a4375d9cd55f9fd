use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, info, warn};

use crate::leave::error::LeaveError;
use crate::model::leave_credit::{DeductOutcome, LeaveCredit};
use crate::store::LeaveCreditStore;

/// Attempts at the optimistic `used` swap before giving up.
const MAX_CAS_ATTEMPTS: usize = 5;

#[derive(FromRow)]
struct CreditRow {
    employee_id: u64,
    leave_type_id: u64,
    total_granted: f64,
    used: f64,
}

impl From<CreditRow> for LeaveCredit {
    fn from(row: CreditRow) -> Self {
        LeaveCredit::new(row.employee_id, row.leave_type_id, row.total_granted, row.used)
    }
}

pub struct MySqlCreditStore {
    pool: MySqlPool,
}

impl MySqlCreditStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveCreditStore for MySqlCreditStore {
    async fn get_credit(
        &self,
        employee_id: u64,
        leave_type_id: u64,
    ) -> Result<Option<LeaveCredit>, LeaveError> {
        let row = sqlx::query_as::<_, CreditRow>(
            r#"
            SELECT employee_id, leave_type_id, total_granted, used
            FROM leave_credits
            WHERE employee_id = ? AND leave_type_id = ?
            "#,
        )
        .bind(employee_id)
        .bind(leave_type_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LeaveCredit::from))
    }

    async fn credits_for(&self, employee_id: u64) -> Result<HashMap<u64, LeaveCredit>, LeaveError> {
        let rows = sqlx::query_as::<_, CreditRow>(
            r#"
            SELECT employee_id, leave_type_id, total_granted, used
            FROM leave_credits
            WHERE employee_id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.leave_type_id, LeaveCredit::from(row)))
            .collect())
    }

    /// The idempotency row and the balance change commit together; the
    /// balance change only lands if `used` still holds the value read.
    async fn deduct_once(
        &self,
        request_id: &str,
        employee_id: u64,
        leave_type_id: u64,
        days: f64,
    ) -> Result<DeductOutcome, LeaveError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            let marked = sqlx::query(
                r#"
                INSERT IGNORE INTO leave_deductions
                    (request_id, employee_id, leave_type_id, days)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(request_id)
            .bind(employee_id)
            .bind(leave_type_id)
            .bind(days)
            .execute(&mut *tx)
            .await?;

            if marked.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(DeductOutcome::AlreadyDeducted);
            }

            let credit = sqlx::query_as::<_, CreditRow>(
                r#"
                SELECT employee_id, leave_type_id, total_granted, used
                FROM leave_credits
                WHERE employee_id = ? AND leave_type_id = ?
                "#,
            )
            .bind(employee_id)
            .bind(leave_type_id)
            .fetch_optional(&mut *tx)
            .await?
            .map(LeaveCredit::from);

            let Some(credit) = credit else {
                tx.rollback().await?;
                return Err(LeaveError::CreditUnavailable {
                    employee_id,
                    leave_type_id,
                });
            };

            if credit.remaining() < days {
                tx.rollback().await?;
                return Err(LeaveError::InsufficientCredit {
                    remaining: credit.remaining(),
                    requested: days,
                });
            }

            let swapped = sqlx::query(
                r#"
                UPDATE leave_credits
                SET used = used + ?
                WHERE employee_id = ? AND leave_type_id = ? AND used = ?
                "#,
            )
            .bind(days)
            .bind(employee_id)
            .bind(leave_type_id)
            .bind(credit.used)
            .execute(&mut *tx)
            .await?;

            if swapped.rows_affected() == 1 {
                tx.commit().await?;
                debug!(request_id, employee_id, leave_type_id, days, "Leave credit deducted");
                return Ok(DeductOutcome::Deducted {
                    remaining: credit.remaining() - days,
                });
            }

            tx.rollback().await?;
            warn!(request_id, attempt, "Leave credit changed concurrently, retrying");
        }

        Err(LeaveError::Conflict(request_id.to_string()))
    }

    /// Removing the `leave_deductions` row and restoring `used` commit together.
    async fn refund_once(&self, request_id: &str) -> Result<Option<f64>, LeaveError> {
        let mut tx = self.pool.begin().await?;

        let charge = sqlx::query_as::<_, (u64, u64, f64)>(
            r#"
            SELECT employee_id, leave_type_id, days
            FROM leave_deductions
            WHERE request_id = ?
            FOR UPDATE
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((employee_id, leave_type_id, days)) = charge else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM leave_deductions WHERE request_id = ?")
            .bind(request_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE leave_credits
            SET used = used - ?
            WHERE employee_id = ? AND leave_type_id = ?
            "#,
        )
        .bind(days)
        .bind(employee_id)
        .bind(leave_type_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(request_id, employee_id, leave_type_id, days, "Leave credit refunded");
        Ok(Some(days))
    }
}
