//! Time-slot topology and slot resolution
//!
//! - [`SlotTable`] - data-driven hour → slot tables per day type
//! - [`CapacityPolicy`] - resolves a submitted date/time to a slot and class

pub mod policy;
pub mod table;

pub use policy::{CapacityPolicy, InvalidTimeSlot, ResolvedSlot};
pub use table::{SlotEntry, SlotTable, SlotTableError};
