//! In-memory card
//!
//! A capacity-limited card held in RAM, with switches for the faults a real
//! card produces: refusing to mount, missing media, failing directory
//! creation or removal, and short writes once the card fills up. Clones share
//! the same card, so a test can keep a handle while a manager owns another.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::rc::Rc;

use super::{CardType, EntryKind, StorageDevice, TransferMode, not_mounted};

#[derive(Debug)]
struct CardState {
    card_type: CardType,
    capacity: u64,
    mounted: bool,
    last_mode: Option<TransferMode>,
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    fail_mount: bool,
    fail_dirs: BTreeSet<String>,
    fail_removals: bool,
    mounts: usize,
    unmounts: usize,
    dirs_created: usize,
    operations: usize,
}

impl CardState {
    fn used(&self) -> u64 {
        self.files.values().map(|data| data.len() as u64).sum()
    }

    fn kind(&self, path: &str) -> Option<EntryKind> {
        if path == "/" || self.dirs.contains(path) {
            Some(EntryKind::Directory)
        } else if self.files.contains_key(path) {
            Some(EntryKind::File)
        } else {
            None
        }
    }

    fn ensure_parent(&self, path: &str) -> io::Result<()> {
        let parent = match path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &path[..idx],
        };
        match self.kind(parent) {
            Some(EntryKind::Directory) => Ok(()),
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent directory missing: {}", parent),
            )),
        }
    }

    fn mounted_op(&mut self) -> io::Result<()> {
        self.operations += 1;
        if self.mounted { Ok(()) } else { Err(not_mounted()) }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDevice {
    state: Rc<RefCell<CardState>>,
}

impl MemoryDevice {
    /// A blank card of `capacity` bytes, classified by its capacity.
    pub fn new(capacity: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(CardState {
                card_type: CardType::from_capacity(capacity),
                capacity,
                mounted: false,
                last_mode: None,
                dirs: BTreeSet::new(),
                files: BTreeMap::new(),
                fail_mount: false,
                fail_dirs: BTreeSet::new(),
                fail_removals: false,
                mounts: 0,
                unmounts: 0,
                dirs_created: 0,
                operations: 0,
            })),
        }
    }

    /// The slot is empty: mounting succeeds but the card type reads `None`.
    pub fn without_media(self) -> Self {
        self.state.borrow_mut().card_type = CardType::None;
        self
    }

    pub fn failing_mount(self) -> Self {
        self.state.borrow_mut().fail_mount = true;
        self
    }

    pub fn failing_create_dir(self, path: &str) -> Self {
        self.state.borrow_mut().fail_dirs.insert(path.to_string());
        self
    }

    pub fn failing_removals(self) -> Self {
        self.state.borrow_mut().fail_removals = true;
        self
    }

    /// Place a file on the card without going through the device API.
    pub fn insert_file(&self, path: &str, data: &[u8]) {
        self.state
            .borrow_mut()
            .files
            .insert(path.to_string(), data.to_vec());
    }

    /// Place a directory on the card without going through the device API.
    pub fn insert_dir(&self, path: &str) {
        self.state.borrow_mut().dirs.insert(path.to_string());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.borrow().files.get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.borrow().dirs.contains(path)
    }

    pub fn file_count(&self) -> usize {
        self.state.borrow().files.len()
    }

    pub fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    pub fn last_mode(&self) -> Option<TransferMode> {
        self.state.borrow().last_mode
    }

    pub fn mount_count(&self) -> usize {
        self.state.borrow().mounts
    }

    pub fn unmount_count(&self) -> usize {
        self.state.borrow().unmounts
    }

    pub fn dirs_created(&self) -> usize {
        self.state.borrow().dirs_created
    }

    /// Every call made through the device API, successful or not.
    pub fn operations(&self) -> usize {
        self.state.borrow().operations
    }
}

/// Write handle into a [`MemoryDevice`] file.
pub struct MemoryFile {
    state: Rc<RefCell<CardState>>,
    path: String,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.mounted_op()?;

        let room = state.capacity.saturating_sub(state.used());
        let n = buf.len().min(usize::try_from(room).unwrap_or(usize::MAX));
        state
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StorageDevice for MemoryDevice {
    type File = MemoryFile;

    fn mount(&mut self, mode: TransferMode) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.operations += 1;
        if state.fail_mount {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "card did not respond"));
        }
        state.mounted = true;
        state.last_mode = Some(mode);
        state.mounts += 1;
        Ok(())
    }

    fn unmount(&mut self) {
        let mut state = self.state.borrow_mut();
        state.operations += 1;
        if state.mounted {
            state.mounted = false;
            state.unmounts += 1;
        }
    }

    fn card_type(&self) -> CardType {
        self.state.borrow().card_type
    }

    fn card_size(&self) -> u64 {
        self.state.borrow().capacity
    }

    fn used_bytes(&self) -> io::Result<u64> {
        let mut state = self.state.borrow_mut();
        state.mounted_op()?;
        Ok(state.used())
    }

    fn entry_kind(&self, path: &str) -> io::Result<Option<EntryKind>> {
        let mut state = self.state.borrow_mut();
        state.mounted_op()?;
        Ok(state.kind(path))
    }

    fn create_dir(&mut self, path: &str) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.mounted_op()?;
        if state.fail_dirs.contains(path) {
            return Err(io::Error::other("mkdir rejected by card"));
        }
        if state.kind(path).is_some() {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, path.to_string()));
        }
        state.ensure_parent(path)?;
        state.dirs.insert(path.to_string());
        state.dirs_created += 1;
        Ok(())
    }

    fn create_file(&mut self, path: &str, overwrite: bool) -> io::Result<MemoryFile> {
        let mut state = self.state.borrow_mut();
        state.mounted_op()?;
        match state.kind(path) {
            Some(EntryKind::Directory) => {
                return Err(io::Error::other(format!("is a directory: {}", path)));
            }
            Some(EntryKind::File) if !overwrite => {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, path.to_string()));
            }
            _ => {}
        }
        state.ensure_parent(path)?;
        state.files.insert(path.to_string(), Vec::new());
        Ok(MemoryFile {
            state: Rc::clone(&self.state),
            path: path.to_string(),
        })
    }

    fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut state = self.state.borrow_mut();
        state.mounted_op()?;
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn remove_file(&mut self, path: &str) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.mounted_op()?;
        if state.fail_removals {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "card is write-protected"));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_card() {
        let mut device = MemoryDevice::new(4096);
        let probe = device.clone();
        device.mount(TransferMode::OneBit).unwrap();
        device.create_dir("/images").unwrap();
        assert!(probe.is_mounted());
        assert!(probe.has_dir("/images"));
        assert_eq!(probe.last_mode(), Some(TransferMode::OneBit));
    }

    #[test]
    fn test_write_is_short_when_card_fills() {
        let mut device = MemoryDevice::new(100);
        device.mount(TransferMode::OneBit).unwrap();
        let mut file = device.create_file("/big.bin", true).unwrap();
        assert_eq!(file.write(&[1u8; 80]).unwrap(), 80);
        assert_eq!(file.write(&[2u8; 80]).unwrap(), 20);
        assert_eq!(file.write(&[3u8; 80]).unwrap(), 0);
        assert_eq!(device.file("/big.bin").unwrap().len(), 100);
    }

    #[test]
    fn test_create_file_needs_parent() {
        let mut device = MemoryDevice::new(100);
        device.mount(TransferMode::OneBit).unwrap();
        let err = device.create_file("/images/a.jpg", true).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_unmounted_card_rejects_access() {
        let device = MemoryDevice::new(100);
        assert_eq!(
            device.entry_kind("/").unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
        assert_eq!(device.operations(), 1);
    }
}
