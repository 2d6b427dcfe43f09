//! Storage manager
//!
//! Owns the card for the lifetime of the camera: mounts it, keeps the
//! required directories in place, persists captured frames under generated
//! or caller-chosen names, and reports capacity.

use log::{debug, error, info, warn};
use std::io;

use crate::device::{CardType, StorageDevice, TransferMode};
use crate::error::StorageError;
use crate::storage::filesystem::{ensure_directory, remove_partial, write_counted};
use crate::storage::naming::{SystemUptime, UptimeClock, generate_filename};
use crate::storage::results::StorageStats;

/// How many counter values a generated name may probe past an existing file.
const MAX_NAME_ATTEMPTS: u32 = 16;

const HEALTH_PROBE_NAME: &str = ".health_probe";

/// Directory layout, naming and capacity policy for a card.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub images_dir: String,
    pub logs_dir: String,
    pub transfer_mode: TransferMode,
    pub filename_prefix: String,
    pub filename_extension: String,
    pub warning_threshold_percent: u8,
    pub reserve_bytes: u64,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self {
            images_dir: "/images".to_string(),
            logs_dir: "/logs".to_string(),
            transfer_mode: TransferMode::OneBit,
            filename_prefix: "IMG_".to_string(),
            filename_extension: "jpg".to_string(),
            warning_threshold_percent: 85,
            reserve_bytes: 1024,
        }
    }
}

/// Unmounts the device on drop unless the mount is kept.
struct MountGuard<'a, D: StorageDevice> {
    device: &'a mut D,
    armed: bool,
}

impl<'a, D: StorageDevice> MountGuard<'a, D> {
    fn mount(device: &'a mut D, mode: TransferMode) -> io::Result<Self> {
        device.mount(mode)?;
        Ok(Self {
            device,
            armed: true,
        })
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl<D: StorageDevice> Drop for MountGuard<'_, D> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Releasing device after failed initialization");
            self.device.unmount();
        }
    }
}

/// Persists captured frames to a removable card.
///
/// Not synchronized: one capture loop drives it. The device is mounted only
/// between a successful [`initialize`](Self::initialize) and
/// [`shutdown`](Self::shutdown) or drop.
pub struct StorageManager<D: StorageDevice, C: UptimeClock = SystemUptime> {
    device: D,
    clock: C,
    layout: StorageLayout,
    initialized: bool,
    image_counter: u32,
}

impl<D: StorageDevice> StorageManager<D> {
    pub fn new(device: D, layout: StorageLayout) -> Self {
        Self::with_clock(device, layout, SystemUptime::new())
    }
}

impl<D: StorageDevice, C: UptimeClock> StorageManager<D, C> {
    pub fn with_clock(device: D, layout: StorageLayout, clock: C) -> Self {
        Self {
            device,
            clock,
            layout,
            initialized: false,
            image_counter: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.initialized
    }

    /// Images saved this session. Never reset; wraps at `u32::MAX`.
    pub fn image_counter(&self) -> u32 {
        self.image_counter
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Mount the card and ensure the required directories.
    ///
    /// All-or-nothing: on any failure the card is unmounted again and the
    /// manager stays uninitialized. Calling it when already initialized is a
    /// no-op.
    pub fn initialize(&mut self) -> Result<(), StorageError> {
        if self.initialized {
            debug!("Storage already initialized");
            return Ok(());
        }

        let mode = self.layout.transfer_mode;
        info!("Initializing card storage ({} mode)...", mode);

        let mut mount = MountGuard::mount(&mut self.device, mode).map_err(|e| {
            error!("Card mount failed: {}", e);
            StorageError::DeviceUnavailable(e.to_string())
        })?;

        let card_type = mount.device.card_type();
        if card_type == CardType::None {
            error!("No card attached");
            return Err(StorageError::DeviceUnavailable("no media present".into()));
        }

        // Only reachable for devices that classify media yet report zero capacity.
        let card_size = mount.device.card_size();
        if card_size == 0 {
            error!("Card reports 0 bytes - it may not be seated properly");
            return Err(StorageError::DeviceUnavailable("card reports zero capacity".into()));
        }
        info!("Card type: {}, size: {}MB", card_type, card_size / (1024 * 1024));

        for dir in [&self.layout.images_dir, &self.layout.logs_dir] {
            ensure_directory(&mut *mount.device, dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir, e);
                StorageError::DirectorySetupFailed {
                    path: dir.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        mount.keep();
        self.initialized = true;
        info!("Card storage initialized");
        Ok(())
    }

    /// Ensure the required directories on an initialized card.
    pub fn create_directories(&mut self) -> Result<(), StorageError> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        for dir in [&self.layout.images_dir, &self.layout.logs_dir] {
            ensure_directory(&mut self.device, dir).map_err(|e| {
                StorageError::DirectorySetupFailed {
                    path: dir.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    /// Persist `frame` into the images directory and return its full path.
    ///
    /// With no `filename` (or an empty one) a name is generated from the
    /// uptime clock and the image counter; generated names never replace an
    /// existing file. A caller-supplied name is used verbatim and overwrites.
    /// The counter advances only when every byte was written.
    pub fn save_image(&mut self, frame: &[u8], filename: Option<&str>) -> Result<String, StorageError> {
        if !self.initialized {
            error!("Storage not ready, dropping frame of {} bytes", frame.len());
            return Err(StorageError::NotInitialized);
        }
        if frame.is_empty() {
            error!("Refusing to save empty frame buffer");
            return Err(StorageError::EmptyFrame);
        }

        let opened = match filename.filter(|name| !name.is_empty()) {
            Some(name) => {
                let path = self.image_path(name);
                self.device
                    .create_file(&path, true)
                    .map(|file| (path.clone(), file))
                    .map_err(|e| (path, e))
            }
            None => self.create_generated_file(),
        };

        let (path, mut file) = match opened {
            Ok(opened) => opened,
            Err((path, e)) => {
                error!("Failed to create file {}: {}", path, e);
                return Err(StorageError::WriteIncomplete {
                    path,
                    expected: frame.len(),
                    written: 0,
                });
            }
        };

        debug!("Saving image: {} ({} bytes)", path, frame.len());
        let (written, write_err) = write_counted(&mut file, frame);
        drop(file);

        if written != frame.len() || write_err.is_some() {
            error!(
                "Failed to write complete image data to {}. Expected: {}, Written: {}{}",
                path,
                frame.len(),
                written,
                write_err.map(|e| format!(" ({})", e)).unwrap_or_default()
            );
            remove_partial(&mut self.device, &path);
            return Err(StorageError::WriteIncomplete {
                path,
                expected: frame.len(),
                written,
            });
        }

        self.image_counter = self.image_counter.wrapping_add(1);
        info!("Image saved: {} ({} bytes)", path, written);
        Ok(path)
    }

    /// Total, used and free capacity as reported by the card.
    pub fn get_storage_stats(&self) -> Result<StorageStats, StorageError> {
        if !self.initialized {
            return Err(StorageError::StatsUnavailable);
        }

        let total_bytes = self.device.card_size();
        let used_bytes = self.device.used_bytes()?.min(total_bytes);
        let stats = StorageStats {
            total_bytes,
            used_bytes,
        };
        debug!(
            "Storage stats: total {}MB, used {}MB, free {}MB",
            stats.total_mb(),
            stats.used_mb(),
            stats.free_mb()
        );
        Ok(stats)
    }

    /// Whether `required_bytes` plus the configured reserve fit on the card.
    pub fn has_adequate_space(&self, required_bytes: u64) -> Result<bool, StorageError> {
        let stats = self.get_storage_stats()?;
        Ok(stats.free_bytes() >= required_bytes.saturating_add(self.layout.reserve_bytes))
    }

    pub fn is_warning_threshold_exceeded(&self) -> Result<bool, StorageError> {
        let stats = self.get_storage_stats()?;
        let exceeded = stats.usage_percent() >= f32::from(self.layout.warning_threshold_percent);
        if exceeded {
            warn!(
                "Storage usage {:.1}% exceeds warning threshold {}%",
                stats.usage_percent(),
                self.layout.warning_threshold_percent
            );
        }
        Ok(exceeded)
    }

    /// Write, read back and remove a probe file in the logs directory.
    pub fn health_check(&mut self) -> Result<(), StorageError> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = format!("{}/{}", self.layout.logs_dir, HEALTH_PROBE_NAME);
        let probe = format!("health_check_{}", self.clock.millis());

        let mut file = self.device.create_file(&path, true).map_err(|e| {
            warn!("Cannot create {} - card may be write-protected or full", path);
            StorageError::HealthCheckFailed(e.to_string())
        })?;
        let (written, write_err) = write_counted(&mut file, probe.as_bytes());
        drop(file);

        let outcome = match write_err {
            Some(e) => Err(format!("probe write failed after {} bytes: {}", written, e)),
            None => match self.device.read_file(&path) {
                Ok(data) if data == probe.as_bytes() => Ok(()),
                Ok(_) => Err("data corruption detected in probe file".to_string()),
                Err(e) => Err(format!("probe read failed: {}", e)),
            },
        };
        remove_partial(&mut self.device, &path);

        match outcome {
            Ok(()) => {
                debug!("Card health check passed");
                Ok(())
            }
            Err(msg) => {
                warn!("Card health check failed: {}", msg);
                Err(StorageError::HealthCheckFailed(msg))
            }
        }
    }

    /// Unmount the card. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if self.initialized {
            self.device.unmount();
            self.initialized = false;
            info!("Card storage shut down");
        }
    }

    fn image_path(&self, filename: &str) -> String {
        format!("{}/{}", self.layout.images_dir, filename)
    }

    fn create_generated_file(&mut self) -> Result<(String, D::File), (String, io::Error)> {
        let mut last_path = String::new();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = generate_filename(
                &self.layout.filename_prefix,
                self.clock.millis(),
                self.image_counter.wrapping_add(attempt),
                &self.layout.filename_extension,
            );
            let path = self.image_path(&name);
            match self.device.create_file(&path, false) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    warn!("{} already exists from an earlier session, trying next name", path);
                    last_path = path;
                }
                Err(e) => return Err((path, e)),
            }
        }

        Err((
            last_path,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free generated filename"),
        ))
    }
}

impl<D: StorageDevice, C: UptimeClock> Drop for StorageManager<D, C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
