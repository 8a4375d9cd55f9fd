use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::leave::error::LeaveError;
use crate::model::holiday::Holiday;
use crate::store::HolidayProvider;

/// Keeps each year's holiday list in memory for `ttl`.
pub struct CachedHolidays<P> {
    inner: P,
    years: Cache<i32, Arc<Vec<Holiday>>>,
}

impl<P: HolidayProvider> CachedHolidays<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            years: Cache::builder()
                .max_capacity(32) // a handful of fiscal years at most
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Drops a year after the holiday table was edited.
    pub async fn invalidate(&self, year: i32) {
        self.years.invalidate(&year).await;
    }
}

#[async_trait]
impl<P: HolidayProvider> HolidayProvider for CachedHolidays<P> {
    async fn holidays_in_year(&self, year: i32) -> Result<Vec<Holiday>, LeaveError> {
        let list = self
            .years
            .try_get_with(year, async {
                tracing::debug!(year, "Loading holiday calendar");
                self.inner.holidays_in_year(year).await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<LeaveError>| LeaveError::Storage(e.to_string()))?;
        Ok(list.as_ref().clone())
    }
}
