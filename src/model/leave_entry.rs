use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// How much of a boundary day a leave entry covers.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Portion {
    #[default]
    Full,
    /// Morning only.
    FirstHalf,
    /// Afternoon only.
    SecondHalf,
}

impl Portion {
    pub fn multiplier(self) -> f64 {
        match self {
            Portion::Full => 1.0,
            Portion::FirstHalf | Portion::SecondHalf => 0.5,
        }
    }

    pub fn is_half(self) -> bool {
        !matches!(self, Portion::Full)
    }

    /// Leave keeps going until the end of the day.
    pub fn runs_to_day_end(self) -> bool {
        matches!(self, Portion::Full | Portion::SecondHalf)
    }

    /// Leave is already running at the start of the day.
    pub fn runs_from_day_start(self) -> bool {
        matches!(self, Portion::Full | Portion::FirstHalf)
    }
}

/// One selected day of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveDateEntry {
    #[schema(example = "2025-10-06", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[serde(default)]
    pub portion: Portion,
}

impl LeaveDateEntry {
    pub fn new(date: NaiveDate, leave_type_id: u64, portion: Portion) -> Self {
        Self {
            date,
            leave_type_id,
            portion,
        }
    }

    pub fn full(date: NaiveDate, leave_type_id: u64) -> Self {
        Self::new(date, leave_type_id, Portion::Full)
    }
}
