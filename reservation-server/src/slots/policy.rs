//! Capacity policy: (date, wall-clock time) → slot

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use shared::models::{CapacityClass, DayType};
use thiserror::Error;

use super::table::{SlotEntry, SlotTable};

/// The slot a reservation counts against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlot {
    pub slot_id: String,
    pub class: CapacityClass,
    pub day_type: DayType,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no slot covers {time} on {date} ({day_type:?})")]
pub struct InvalidTimeSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub day_type: DayType,
}

/// Pure mapping from a calendar date and hour to a slot
///
/// Weekends and dates in the table's holiday calendar use the holiday
/// table; every other date uses the weekday table.
#[derive(Debug, Clone)]
pub struct CapacityPolicy {
    table: SlotTable,
    holidays: HashSet<NaiveDate>,
}

impl CapacityPolicy {
    pub fn new(table: SlotTable) -> Self {
        let holidays = table.holidays.iter().copied().collect();
        Self { table, holidays }
    }

    pub fn day_type(&self, date: NaiveDate) -> DayType {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || self.holidays.contains(&date) {
            DayType::Holiday
        } else {
            DayType::Weekday
        }
    }

    /// Map a date and wall-clock time to its slot
    pub fn resolve_slot(
        &self,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<ResolvedSlot, InvalidTimeSlot> {
        let day_type = self.day_type(date);
        self.table
            .entries(day_type)
            .iter()
            .find(|entry| entry.covers(time.hour()))
            .map(|entry| ResolvedSlot {
                slot_id: entry.slot_id.clone(),
                class: entry.class,
                day_type,
            })
            .ok_or(InvalidTimeSlot {
                date,
                time,
                day_type,
            })
    }

    /// Slot entries bookable on `date`
    pub fn slots_for(&self, date: NaiveDate) -> &[SlotEntry] {
        self.table.entries(self.day_type(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    // 2099-01-06 is a Tuesday, 2099-01-03 a Saturday, 2099-01-04 a Sunday
    const TUESDAY: &str = "2099-01-06";
    const SATURDAY: &str = "2099-01-03";
    const SUNDAY: &str = "2099-01-04";

    #[test]
    fn test_day_type() {
        let policy = CapacityPolicy::new(SlotTable::builtin());
        assert_eq!(policy.day_type(date(TUESDAY)), DayType::Weekday);
        assert_eq!(policy.day_type(date(SATURDAY)), DayType::Holiday);
        assert_eq!(policy.day_type(date(SUNDAY)), DayType::Holiday);
    }

    #[test]
    fn test_calendar_holiday_on_weekday() {
        let mut table = SlotTable::builtin();
        table.holidays.push(date(TUESDAY));
        let policy = CapacityPolicy::new(table);
        assert_eq!(policy.day_type(date(TUESDAY)), DayType::Holiday);

        let slot = policy.resolve_slot(date(TUESDAY), time("14:00")).unwrap();
        assert_eq!(slot.slot_id, "hm4");
    }

    #[test]
    fn test_weekday_resolution() {
        let policy = CapacityPolicy::new(SlotTable::builtin());
        let cases = [
            ("11:00", "wm1", CapacityClass::WeekdayMorning),
            ("11:30", "wm1", CapacityClass::WeekdayMorning),
            ("12:00", "wm2", CapacityClass::WeekdayMorning),
            ("13:30", "wm3", CapacityClass::WeekdayMorning),
            ("17:00", "wa1", CapacityClass::WeekdayAfternoon),
            ("18:30", "wa2", CapacityClass::WeekdayAfternoon),
            ("19:00", "wa3", CapacityClass::WeekdayAfternoon),
            ("20:30", "wa3", CapacityClass::WeekdayAfternoon),
        ];
        for (t, slot_id, class) in cases {
            let slot = policy.resolve_slot(date(TUESDAY), time(t)).unwrap();
            assert_eq!(slot.slot_id, slot_id, "time {t}");
            assert_eq!(slot.class, class, "time {t}");
            assert_eq!(slot.day_type, DayType::Weekday);
        }
    }

    #[test]
    fn test_holiday_resolution() {
        let policy = CapacityPolicy::new(SlotTable::builtin());
        let cases = [
            ("11:00", "hm1"),
            ("12:00", "hm2"),
            ("13:00", "hm3"),
            ("14:30", "hm4"),
            ("17:00", "ha1"),
            ("18:00", "ha2"),
            ("20:00", "ha3"),
        ];
        for (t, slot_id) in cases {
            let slot = policy.resolve_slot(date(SATURDAY), time(t)).unwrap();
            assert_eq!(slot.slot_id, slot_id, "time {t}");
        }
    }

    #[test]
    fn test_out_of_range_hours() {
        let policy = CapacityPolicy::new(SlotTable::builtin());
        for t in ["09:00", "10:59", "15:00", "16:30", "21:00", "23:59"] {
            let err = policy.resolve_slot(date(TUESDAY), time(t)).unwrap_err();
            assert_eq!(err.day_type, DayType::Weekday);
        }
        // 14:00 exists only on holidays
        assert!(policy.resolve_slot(date(TUESDAY), time("14:00")).is_err());
        assert!(policy.resolve_slot(date(SUNDAY), time("14:00")).is_ok());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let policy = CapacityPolicy::new(SlotTable::builtin());
        let first = policy.resolve_slot(date(TUESDAY), time("12:15"));
        for _ in 0..100 {
            assert_eq!(policy.resolve_slot(date(TUESDAY), time("12:15")), first);
        }
    }

    #[test]
    fn test_slots_for() {
        let policy = CapacityPolicy::new(SlotTable::builtin());
        assert_eq!(policy.slots_for(date(TUESDAY)).len(), 6);
        assert_eq!(policy.slots_for(date(SATURDAY)).len(), 7);
    }
}
