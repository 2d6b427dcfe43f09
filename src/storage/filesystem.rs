//! File system operations
//!
//! Device-level helpers used by the storage manager: ensuring directories,
//! writing a whole buffer while counting what actually landed, and removing
//! partial files.

use log::{debug, info, warn};
use std::io::{self, Write};

use crate::device::{EntryKind, StorageDevice};

/// Make sure `path` exists as a directory, creating it if absent.
///
/// An existing directory is accepted as-is. A file occupying the path is a
/// configuration fault and fails with `NotADirectory`.
pub fn ensure_directory<D: StorageDevice>(device: &mut D, path: &str) -> io::Result<()> {
    match device.entry_kind(path)? {
        Some(EntryKind::Directory) => {
            debug!("Directory {} already exists", path);
            Ok(())
        }
        Some(EntryKind::File) => Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("{} exists but is not a directory", path),
        )),
        None => {
            device.create_dir(path)?;
            info!("Created directory {}", path);
            Ok(())
        }
    }
}

/// Write all of `data`, stopping at the first error or zero-length write.
///
/// Returns the number of bytes the sink accepted and the error that stopped
/// it, if any. Interrupted writes are retried.
pub fn write_counted<W: Write>(writer: &mut W, data: &[u8]) -> (usize, Option<io::Error>) {
    let mut written = 0;
    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => {
                return (
                    written,
                    Some(io::Error::new(io::ErrorKind::WriteZero, "device accepted no more data")),
                );
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (written, Some(e)),
        }
    }

    match writer.flush() {
        Ok(()) => (written, None),
        Err(e) => (written, Some(e)),
    }
}

/// Best-effort removal of a partially written file. Failures are logged only.
pub fn remove_partial<D: StorageDevice>(device: &mut D, path: &str) {
    match device.remove_file(path) {
        Ok(()) => info!("Removed partial file {}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial file {}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MemoryDevice, TransferMode};

    fn mounted(capacity: u64) -> MemoryDevice {
        let mut device = MemoryDevice::new(capacity);
        device.mount(TransferMode::OneBit).unwrap();
        device
    }

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let mut device = mounted(1024);
        ensure_directory(&mut device, "/images").unwrap();
        ensure_directory(&mut device, "/images").unwrap();
        assert!(device.has_dir("/images"));
        assert_eq!(device.dirs_created(), 1);
    }

    #[test]
    fn test_ensure_directory_rejects_file_in_the_way() {
        let mut device = mounted(1024);
        device.insert_file("/logs", b"not a dir");
        let err = ensure_directory(&mut device, "/logs").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotADirectory);
        assert_eq!(device.dirs_created(), 0);
    }

    #[test]
    fn test_ensure_directory_propagates_create_failure() {
        let mut device = MemoryDevice::new(1024).failing_create_dir("/images");
        device.mount(TransferMode::OneBit).unwrap();
        assert!(ensure_directory(&mut device, "/images").is_err());
    }

    #[test]
    fn test_write_counted_reports_short_write() {
        let mut device = mounted(10);
        let mut file = device.create_file("/x.bin", true).unwrap();
        let (written, err) = write_counted(&mut file, &[7u8; 25]);
        assert_eq!(written, 10);
        assert_eq!(err.unwrap().kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn test_write_counted_full_buffer() {
        let mut sink = Vec::new();
        let (written, err) = write_counted(&mut sink, b"abcdef");
        assert_eq!(written, 6);
        assert!(err.is_none());
        assert_eq!(sink, b"abcdef");
    }

    #[test]
    fn test_remove_partial_tolerates_failure() {
        let mut device = MemoryDevice::new(1024).failing_removals();
        device.mount(TransferMode::OneBit).unwrap();
        device.insert_file("/x.bin", b"partial");
        remove_partial(&mut device, "/x.bin");
        assert!(device.file("/x.bin").is_some());
    }
}
