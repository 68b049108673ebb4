//! Slot Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day type of a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Weekday,
    /// Saturday, Sunday or a calendar holiday
    Holiday,
}

impl DayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekday => "weekday",
            Self::Holiday => "holiday",
        }
    }
}

/// Capacity class shared by a group of slots
///
/// Each class has one capacity number in [`super::CapacitySettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityClass {
    WeekdayMorning,
    WeekdayAfternoon,
    HolidayMorning,
    HolidayAfternoon,
}

impl CapacityClass {
    pub const ALL: [CapacityClass; 4] = [
        Self::WeekdayMorning,
        Self::WeekdayAfternoon,
        Self::HolidayMorning,
        Self::HolidayAfternoon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeekdayMorning => "weekday_morning",
            Self::WeekdayAfternoon => "weekday_afternoon",
            Self::HolidayMorning => "holiday_morning",
            Self::HolidayAfternoon => "holiday_afternoon",
        }
    }

    /// Day type this class belongs to
    pub fn day_type(&self) -> DayType {
        match self {
            Self::WeekdayMorning | Self::WeekdayAfternoon => DayType::Weekday,
            Self::HolidayMorning | Self::HolidayAfternoon => DayType::Holiday,
        }
    }
}

impl fmt::Display for CapacityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown capacity class name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capacity class: {0}")]
pub struct UnknownCapacityClass(pub String);

impl FromStr for CapacityClass {
    type Err = UnknownCapacityClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCapacityClass(s.to_string()))
    }
}

/// One slot's occupancy for a date (availability query)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub slot_id: String,
    pub class: CapacityClass,
    pub start_hour: u32,
    pub end_hour: u32,
    pub booked: i32,
    pub capacity: i32,
    /// Hint only; admission re-checks atomically
    pub full: bool,
}

/// Availability of every slot for a date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub date: String,
    pub day_type: DayType,
    pub slots: Vec<SlotAvailability>,
}
