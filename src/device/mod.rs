//! Storage devices
//!
//! The seam between the storage manager and the removable card. A device
//! exposes mount/unmount, media diagnostics and a small path-based file API.
//! Paths are device-absolute, e.g. `/images/IMG_0000A1F3_0001.jpg`.

pub mod host;
pub mod memory;

use serde::Deserialize;
use std::fmt;
use std::io::{self, Write};

pub use host::HostDirectoryDevice;
pub use memory::MemoryDevice;

/// Bus width used when mounting the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Single data line. Slower, but tolerant of marginal wiring.
    #[default]
    OneBit,
    FourBit,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMode::OneBit => write!(f, "1-bit"),
            TransferMode::FourBit => write!(f, "4-bit"),
        }
    }
}

/// Media classification reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    /// No media present.
    None,
    Mmc,
    Sdsc,
    Sdhc,
    Sdxc,
    Unknown,
}

impl CardType {
    /// Classify a card by capacity using the SD capacity classes.
    pub fn from_capacity(bytes: u64) -> Self {
        const GIB: u64 = 1024 * 1024 * 1024;
        match bytes {
            0 => CardType::None,
            b if b <= 2 * GIB => CardType::Sdsc,
            b if b <= 32 * GIB => CardType::Sdhc,
            _ => CardType::Sdxc,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardType::None => "NONE",
            CardType::Mmc => "MMC",
            CardType::Sdsc => "SDSC",
            CardType::Sdhc => "SDHC",
            CardType::Sdxc => "SDXC",
            CardType::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A removable storage device holding a single filesystem.
///
/// Implementations are used from one thread at a time; the manager owns the
/// device exclusively for as long as it is mounted.
pub trait StorageDevice {
    /// Write handle returned by [`StorageDevice::create_file`]. Dropping it closes the file.
    type File: Write;

    /// Attach the filesystem for read/write access.
    fn mount(&mut self, mode: TransferMode) -> io::Result<()>;

    /// Detach the filesystem. Calling it on an unmounted device is a no-op.
    fn unmount(&mut self);

    fn card_type(&self) -> CardType;

    /// Raw card capacity in bytes.
    fn card_size(&self) -> u64;

    fn used_bytes(&self) -> io::Result<u64>;

    /// `Ok(None)` when nothing exists at `path`.
    fn entry_kind(&self, path: &str) -> io::Result<Option<EntryKind>>;

    fn create_dir(&mut self, path: &str) -> io::Result<()>;

    /// Open `path` for writing. With `overwrite == false` an existing entry
    /// fails with [`io::ErrorKind::AlreadyExists`].
    fn create_file(&mut self, path: &str, overwrite: bool) -> io::Result<Self::File>;

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;

    fn remove_file(&mut self, path: &str) -> io::Result<()>;
}

pub(crate) fn not_mounted() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "device not mounted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_type_from_capacity() {
        const MIB: u64 = 1024 * 1024;
        assert_eq!(CardType::from_capacity(0), CardType::None);
        assert_eq!(CardType::from_capacity(512 * MIB), CardType::Sdsc);
        assert_eq!(CardType::from_capacity(2048 * MIB), CardType::Sdsc);
        assert_eq!(CardType::from_capacity(16 * 1024 * MIB), CardType::Sdhc);
        assert_eq!(CardType::from_capacity(64 * 1024 * MIB), CardType::Sdxc);
    }

    #[test]
    fn test_transfer_mode_display() {
        assert_eq!(TransferMode::default(), TransferMode::OneBit);
        assert_eq!(TransferMode::OneBit.to_string(), "1-bit");
        assert_eq!(TransferMode::FourBit.to_string(), "4-bit");
    }
}
