//! Wildcam Storage - Entry Point
//!
//! Mounts the card described by the configuration, stores each frame file
//! given on the command line as a captured image, then reports capacity.

use log::{info, warn};
use std::fs;

use wildcam_storage::error::handlers::{exit_code, handle_error};
use wildcam_storage::utils::logging::setup_logging;
use wildcam_storage::{HostDirectoryDevice, StorageConfig, StorageManager, WildcamError};

fn main() {
    setup_logging();

    if let Err(e) = run() {
        handle_error(&e);
        std::process::exit(exit_code(&e));
    }
}

fn run() -> Result<(), WildcamError> {
    let config = StorageConfig::load()?;
    info!(
        "Launching wildcam storage on {} ({}MB card)",
        config.mount_point, config.capacity_mb
    );

    let device = HostDirectoryDevice::new(config.mount_point_path(), config.capacity_bytes());
    let mut storage = StorageManager::new(device, config.layout());
    storage.initialize()?;

    for frame_path in std::env::args().skip(1) {
        let frame = fs::read(&frame_path)?;
        match storage.save_image(&frame, None) {
            Ok(path) => info!("{} -> {}", frame_path, path),
            Err(e) => warn!("Skipping {}: {}", frame_path, e),
        }
    }

    let stats = storage.get_storage_stats()?;
    info!(
        "Card usage: {}MB used of {}MB, {}MB free ({:.1}%)",
        stats.used_mb(),
        stats.total_mb(),
        stats.free_mb(),
        stats.usage_percent()
    );
    if storage.is_warning_threshold_exceeded()? {
        warn!("Card is nearly full, rotation needed");
    }

    info!("Saved {} images this session", storage.image_counter());
    storage.shutdown();
    Ok(())
}
