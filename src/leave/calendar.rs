use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::holiday::Holiday;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Working,
    Weekend,
    Holiday,
}

/// Returns true for Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekend + designated-holiday lookup over a loaded set of holidays.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: HashMap<NaiveDate, Holiday>,
}

impl HolidayCalendar {
    pub fn new<I: IntoIterator<Item = Holiday>>(holidays: I) -> Self {
        Self {
            holidays: holidays.into_iter().map(|h| (h.date, h)).collect(),
        }
    }

    pub fn classify(&self, date: NaiveDate) -> DayKind {
        if is_weekend(date) {
            DayKind::Weekend
        } else if self.holiday(date).is_some() {
            DayKind::Holiday
        } else {
            DayKind::Working
        }
    }

    pub fn is_non_working_day(&self, date: NaiveDate) -> bool {
        self.classify(date) != DayKind::Working
    }

    /// The day-off entry on `date`, ignoring observances.
    pub fn holiday(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays.get(&date).filter(|h| h.is_holiday)
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}
