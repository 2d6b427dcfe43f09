//! Host directory device
//!
//! Treats a directory on the host filesystem as the root of the card, which
//! is how a mounted SD card appears under Linux (`/mnt/sdcard`, `/sdcard`).

use log::{debug, info};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use super::{CardType, EntryKind, StorageDevice, TransferMode, not_mounted};

pub struct HostDirectoryDevice {
    root: PathBuf,
    capacity_bytes: u64,
    mounted: bool,
}

impl HostDirectoryDevice {
    /// Create a device rooted at `root` that reports `capacity_bytes` of space.
    pub fn new(root: impl Into<PathBuf>, capacity_bytes: u64) -> Self {
        Self {
            root: root.into(),
            capacity_bytes,
            mounted: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Map a device-absolute path onto the host, refusing anything that
    /// would escape the root.
    fn host_path(&self, device_path: &str) -> io::Result<PathBuf> {
        if !self.mounted {
            return Err(not_mounted());
        }

        let relative = Path::new(device_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path escapes device root: {}", device_path),
            ));
        }

        Ok(self.root.join(relative))
    }
}

fn directory_size(path: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            total += directory_size(&entry.path())?;
        } else {
            total += metadata.len();
        }
    }
    Ok(total)
}

impl StorageDevice for HostDirectoryDevice {
    type File = File;

    fn mount(&mut self, mode: TransferMode) -> io::Result<()> {
        let metadata = fs::metadata(&self.root).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("mount point {} unavailable: {}", self.root.display(), e),
            )
        })?;

        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mount point {} is not a directory", self.root.display()),
            ));
        }

        self.mounted = true;
        info!("Mounted {} ({} mode)", self.root.display(), mode);
        Ok(())
    }

    fn unmount(&mut self) {
        if self.mounted {
            self.mounted = false;
            debug!("Unmounted {}", self.root.display());
        }
    }

    fn card_type(&self) -> CardType {
        CardType::from_capacity(self.capacity_bytes)
    }

    fn card_size(&self) -> u64 {
        self.capacity_bytes
    }

    fn used_bytes(&self) -> io::Result<u64> {
        if !self.mounted {
            return Err(not_mounted());
        }
        Ok(directory_size(&self.root)?.min(self.capacity_bytes))
    }

    fn entry_kind(&self, path: &str) -> io::Result<Option<EntryKind>> {
        let host_path = self.host_path(path)?;
        match fs::metadata(&host_path) {
            Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_dir(&mut self, path: &str) -> io::Result<()> {
        fs::create_dir(self.host_path(path)?)
    }

    fn create_file(&mut self, path: &str, overwrite: bool) -> io::Result<File> {
        let host_path = self.host_path(path)?;
        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        options.open(host_path)
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.host_path(path)?)
    }

    fn remove_file(&mut self, path: &str) -> io::Result<()> {
        fs::remove_file(self.host_path(path)?)
    }
}
