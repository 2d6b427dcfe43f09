//! Card storage management
//!
//! Persists captured frames, keeps the directory layout in place and reports
//! capacity.

pub mod filesystem;
pub mod manager;
pub mod naming;
pub mod results;

pub use manager::{StorageLayout, StorageManager};
pub use naming::{FixedClock, SystemUptime, UptimeClock};
pub use results::StorageStats;
