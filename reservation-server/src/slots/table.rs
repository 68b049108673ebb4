//! Slot table: which hours map to which slot on each day type
//!
//! The table is data. It is loaded from JSON at startup (or taken from the
//! built-in default) and validated once; admission never sees an invalid
//! table.
//!
//! ```json
//! {
//!   "weekday": [{ "start_hour": 11, "end_hour": 11, "slot_id": "wm1", "class": "weekday_morning" }],
//!   "holiday": [{ "start_hour": 11, "end_hour": 11, "slot_id": "hm1", "class": "holiday_morning" }],
//!   "holidays": ["2099-02-10"]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::models::{CapacityClass, DayType};
use thiserror::Error;

/// One bookable slot: an inclusive hour range sharing a counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub start_hour: u32,
    /// Inclusive
    pub end_hour: u32,
    pub slot_id: String,
    pub class: CapacityClass,
}

impl SlotEntry {
    fn new(start_hour: u32, end_hour: u32, slot_id: &str, class: CapacityClass) -> Self {
        Self {
            start_hour,
            end_hour,
            slot_id: slot_id.to_string(),
            class,
        }
    }

    pub fn covers(&self, hour: u32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }
}

#[derive(Debug, Error)]
pub enum SlotTableError {
    #[error("Failed to read slot table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse slot table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{day_type} table is empty")]
    Empty { day_type: &'static str },

    #[error("slot {slot_id}: invalid hour range {start_hour}..={end_hour}")]
    BadRange {
        slot_id: String,
        start_hour: u32,
        end_hour: u32,
    },

    #[error("{day_type} slots {first} and {second} overlap")]
    Overlap {
        day_type: &'static str,
        first: String,
        second: String,
    },

    #[error("duplicate slot id: {0}")]
    DuplicateId(String),

    #[error("slot {slot_id} has class {class} which does not belong to {day_type}")]
    ClassMismatch {
        slot_id: String,
        class: CapacityClass,
        day_type: &'static str,
    },
}

/// Ordered slot tables per day type plus the holiday calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTable {
    pub weekday: Vec<SlotEntry>,
    pub holiday: Vec<SlotEntry>,
    /// Dates treated as holidays even when they fall on a weekday
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SlotTable {
    /// Built-in table: 3+3 weekday slots, 4+3 holiday slots
    pub fn builtin() -> Self {
        use CapacityClass::*;
        Self {
            weekday: vec![
                SlotEntry::new(11, 11, "wm1", WeekdayMorning),
                SlotEntry::new(12, 12, "wm2", WeekdayMorning),
                SlotEntry::new(13, 13, "wm3", WeekdayMorning),
                SlotEntry::new(17, 17, "wa1", WeekdayAfternoon),
                SlotEntry::new(18, 18, "wa2", WeekdayAfternoon),
                SlotEntry::new(19, 20, "wa3", WeekdayAfternoon),
            ],
            holiday: vec![
                SlotEntry::new(11, 11, "hm1", HolidayMorning),
                SlotEntry::new(12, 12, "hm2", HolidayMorning),
                SlotEntry::new(13, 13, "hm3", HolidayMorning),
                SlotEntry::new(14, 14, "hm4", HolidayMorning),
                SlotEntry::new(17, 17, "ha1", HolidayAfternoon),
                SlotEntry::new(18, 18, "ha2", HolidayAfternoon),
                SlotEntry::new(19, 20, "ha3", HolidayAfternoon),
            ],
            holidays: Vec::new(),
        }
    }

    /// Parse and validate a JSON table
    pub fn from_json(json: &str) -> Result<Self, SlotTableError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load from `path`, or the built-in table when no path is configured
    pub fn load(path: Option<&Path>) -> Result<Self, SlotTableError> {
        match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                let table = Self::from_json(&json)?;
                tracing::info!(
                    path = %path.display(),
                    weekday_slots = table.weekday.len(),
                    holiday_slots = table.holiday.len(),
                    holidays = table.holidays.len(),
                    "Slot table loaded"
                );
                Ok(table)
            }
            None => {
                let table = Self::builtin();
                table.validate()?;
                Ok(table)
            }
        }
    }

    pub fn entries(&self, day_type: DayType) -> &[SlotEntry] {
        match day_type {
            DayType::Weekday => &self.weekday,
            DayType::Holiday => &self.holiday,
        }
    }

    /// Check ranges, overlaps, id uniqueness and class/day-type agreement
    pub fn validate(&self) -> Result<(), SlotTableError> {
        let mut ids = HashSet::new();
        for day_type in [DayType::Weekday, DayType::Holiday] {
            let entries = self.entries(day_type);
            if entries.is_empty() {
                return Err(SlotTableError::Empty {
                    day_type: day_type.as_str(),
                });
            }

            for entry in entries {
                if entry.start_hour > entry.end_hour || entry.end_hour > 23 {
                    return Err(SlotTableError::BadRange {
                        slot_id: entry.slot_id.clone(),
                        start_hour: entry.start_hour,
                        end_hour: entry.end_hour,
                    });
                }
                if entry.class.day_type() != day_type {
                    return Err(SlotTableError::ClassMismatch {
                        slot_id: entry.slot_id.clone(),
                        class: entry.class,
                        day_type: day_type.as_str(),
                    });
                }
                if !ids.insert(entry.slot_id.as_str()) {
                    return Err(SlotTableError::DuplicateId(entry.slot_id.clone()));
                }
            }

            let mut sorted: Vec<&SlotEntry> = entries.iter().collect();
            sorted.sort_by_key(|e| e.start_hour);
            for pair in sorted.windows(2) {
                if pair[1].start_hour <= pair[0].end_hour {
                    return Err(SlotTableError::Overlap {
                        day_type: day_type.as_str(),
                        first: pair[0].slot_id.clone(),
                        second: pair[1].slot_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let table = SlotTable::builtin();
        table.validate().unwrap();
        assert_eq!(table.weekday.len(), 6);
        assert_eq!(table.holiday.len(), 7);
    }

    #[test]
    fn test_load_without_path_is_builtin() {
        assert_eq!(SlotTable::load(None).unwrap(), SlotTable::builtin());
    }

    #[test]
    fn test_from_json_roundtrip_builtin() {
        let json = serde_json::to_string(&SlotTable::builtin()).unwrap();
        assert_eq!(SlotTable::from_json(&json).unwrap(), SlotTable::builtin());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slots.json");
        std::fs::write(
            &path,
            r#"{
                "weekday": [{"start_hour": 12, "end_hour": 14, "slot_id": "lunch", "class": "weekday_morning"}],
                "holiday": [{"start_hour": 10, "end_hour": 15, "slot_id": "brunch", "class": "holiday_morning"}],
                "holidays": ["2099-02-10"]
            }"#,
        )
        .unwrap();

        let table = SlotTable::load(Some(&path)).unwrap();
        assert_eq!(table.weekday[0].slot_id, "lunch");
        assert_eq!(
            table.holidays,
            vec![NaiveDate::from_ymd_opt(2099, 2, 10).unwrap()]
        );
    }

    #[test]
    fn test_rejects_overlap() {
        let mut table = SlotTable::builtin();
        table.weekday[1].start_hour = 11;
        assert!(matches!(
            table.validate(),
            Err(SlotTableError::Overlap { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_range() {
        let mut table = SlotTable::builtin();
        table.holiday[6].end_hour = 24;
        assert!(matches!(
            table.validate(),
            Err(SlotTableError::BadRange { .. })
        ));

        let mut table = SlotTable::builtin();
        table.weekday[0].start_hour = 12;
        table.weekday[0].end_hour = 11;
        assert!(matches!(
            table.validate(),
            Err(SlotTableError::BadRange { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_id_across_day_types() {
        let mut table = SlotTable::builtin();
        table.holiday[0].slot_id = "wm1".into();
        assert!(matches!(
            table.validate(),
            Err(SlotTableError::DuplicateId(id)) if id == "wm1"
        ));
    }

    #[test]
    fn test_rejects_class_mismatch() {
        let mut table = SlotTable::builtin();
        table.weekday[0].class = CapacityClass::HolidayMorning;
        assert!(matches!(
            table.validate(),
            Err(SlotTableError::ClassMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_day_type() {
        let mut table = SlotTable::builtin();
        table.holiday.clear();
        assert!(matches!(
            table.validate(),
            Err(SlotTableError::Empty { day_type: "holiday" })
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            SlotTable::from_json("{\"weekday\": 3}"),
            Err(SlotTableError::Parse(_))
        ));
    }
}
