//! `maintrack` - Local maintenance tracking
//!
//! This library provides a small persistent record store for equipment,
//! scheduled tasks, work orders and per-equipment checklists, plus JSON
//! backup and restore of the whole store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod records;
pub mod storage;
pub mod store;

pub use backup::{read_backup, write_backup, BackupDocument};
pub use config::{BackupVariant, Config, CorruptPolicy};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use records::{Checklists, Equipment, NewTask, NewWorkOrder, Task, WorkOrder};
pub use storage::{Storage, StorageStats};
pub use store::{MaintenanceStore, Summary};
