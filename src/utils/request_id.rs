use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

/// Offset between the Gregorian and the Buddhist Era year.
const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Thai government fiscal year (1 Oct - 30 Sep) of `date`, in the Buddhist Era.
///
/// 2025-10-01 opens fiscal year 2569.
pub fn fiscal_year(date: NaiveDate) -> i32 {
    let gregorian = if date.month() >= 10 {
        date.year() + 1
    } else {
        date.year()
    };
    gregorian + BUDDHIST_ERA_OFFSET
}

/// `LV-<fiscalYear>-<5 random digits>`
pub fn generate_request_id(fiscal_year: i32) -> String {
    let digits = Uuid::new_v4().as_u128() % 100_000;
    format!("LV-{}-{:05}", fiscal_year, digits)
}
