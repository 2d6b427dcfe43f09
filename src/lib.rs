//! On-device image storage for a wildlife camera.

pub mod config;
pub mod device;
pub mod error;
pub mod storage;
pub mod utils;

pub use crate::config::StorageConfig;
pub use crate::device::{HostDirectoryDevice, MemoryDevice, StorageDevice};
pub use crate::error::{StorageError, WildcamError};
pub use crate::storage::{StorageLayout, StorageManager, StorageStats};
