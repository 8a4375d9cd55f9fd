use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::StreamExt;
use sqlx::{FromRow, MySqlPool};

use crate::leave::error::LeaveError;
use crate::model::holiday::{Holiday, HolidayCategory};
use crate::store::HolidayProvider;

#[derive(FromRow)]
struct HolidayRow {
    holiday_date: NaiveDate,
    title: String,
    is_holiday: bool,
    category: String,
}

pub struct MySqlHolidays {
    pool: MySqlPool,
}

impl MySqlHolidays {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HolidayProvider for MySqlHolidays {
    async fn holidays_in_year(&self, year: i32) -> Result<Vec<Holiday>, LeaveError> {
        let mut stream = sqlx::query_as::<_, HolidayRow>(
            r#"
            SELECT holiday_date, title, is_holiday, category
            FROM holidays
            WHERE YEAR(holiday_date) = ?
            ORDER BY holiday_date
            "#,
        )
        .bind(year)
        .fetch(&self.pool);

        let mut holidays = Vec::new();
        while let Some(row) = stream.next().await {
            let row = row?;
            // unknown categories only affect presentation
            let category =
                HolidayCategory::from_str(&row.category).unwrap_or(HolidayCategory::NonContiguous);
            holidays.push(Holiday {
                date: row.holiday_date,
                title: row.title,
                is_holiday: row.is_holiday,
                category,
            });
        }

        tracing::info!(year, count = holidays.len(), "Holiday calendar loaded");
        Ok(holidays)
    }
}
