//! Capacity Settings Model

use super::slot::CapacityClass;
use serde::{Deserialize, Serialize};

/// Upper bound accepted for any single capacity value
pub const MAX_SLOT_CAPACITY: i32 = 100;

/// Per-class slot capacities (singleton)
///
/// Read on every admission. Changes apply to the next admission and never
/// touch counters already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CapacitySettings {
    pub weekday_morning: i32,
    pub weekday_afternoon: i32,
    pub holiday_morning: i32,
    pub holiday_afternoon: i32,
    /// Last update (millis), 0 for built-in defaults
    #[serde(default)]
    pub updated_at: i64,
    pub updated_by: Option<String>,
}

impl Default for CapacitySettings {
    fn default() -> Self {
        Self {
            weekday_morning: 2,
            weekday_afternoon: 2,
            holiday_morning: 3,
            holiday_afternoon: 3,
            updated_at: 0,
            updated_by: None,
        }
    }
}

impl CapacitySettings {
    /// Capacity number for a class
    pub fn capacity_for(&self, class: CapacityClass) -> i32 {
        match class {
            CapacityClass::WeekdayMorning => self.weekday_morning,
            CapacityClass::WeekdayAfternoon => self.weekday_afternoon,
            CapacityClass::HolidayMorning => self.holiday_morning,
            CapacityClass::HolidayAfternoon => self.holiday_afternoon,
        }
    }
}

/// Update settings payload (admin backstage)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySettingsUpdate {
    pub weekday_morning: i32,
    pub weekday_afternoon: i32,
    pub holiday_morning: i32,
    pub holiday_afternoon: i32,
}

impl CapacitySettingsUpdate {
    /// First field outside `0..=MAX_SLOT_CAPACITY`, if any
    pub fn out_of_range_field(&self) -> Option<&'static str> {
        [
            ("weekday_morning", self.weekday_morning),
            ("weekday_afternoon", self.weekday_afternoon),
            ("holiday_morning", self.holiday_morning),
            ("holiday_afternoon", self.holiday_afternoon),
        ]
        .into_iter()
        .find(|(_, v)| !(0..=MAX_SLOT_CAPACITY).contains(v))
        .map(|(name, _)| name)
    }

    pub fn into_settings(self, updated_at: i64, updated_by: Option<String>) -> CapacitySettings {
        CapacitySettings {
            weekday_morning: self.weekday_morning,
            weekday_afternoon: self.weekday_afternoon,
            holiday_morning: self.holiday_morning,
            holiday_afternoon: self.holiday_afternoon,
            updated_at,
            updated_by,
        }
    }
}
