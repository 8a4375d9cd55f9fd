use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Presentation grouping of public holidays. Has no effect on day counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HolidayCategory {
    /// Attached to a weekend, forming a long weekend.
    Contiguous,
    NonContiguous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub title: String,
    /// `false` marks an observance that is still a working day.
    pub is_holiday: bool,
    pub category: HolidayCategory,
}

impl Holiday {
    pub fn new(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            date,
            title: title.into(),
            is_holiday: true,
            category: HolidayCategory::NonContiguous,
        }
    }

    pub fn contiguous_with_weekend(&self) -> bool {
        self.category == HolidayCategory::Contiguous
    }
}
