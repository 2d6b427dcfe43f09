use regex::Regex;
use std::fs;
use tempfile::TempDir;

use wildcam_storage::{
    HostDirectoryDevice, StorageConfig, StorageError, StorageLayout, StorageManager,
};

const CARD_BYTES: u64 = 256 * 1024 * 1024;

// Helper to build a manager over a fresh host directory
fn setup_card() -> (TempDir, StorageManager<HostDirectoryDevice>) {
    let dir = tempfile::tempdir().unwrap();
    let device = HostDirectoryDevice::new(dir.path(), CARD_BYTES);
    let storage = StorageManager::new(device, StorageLayout::default());
    (dir, storage)
}

#[test]
fn test_capture_session_on_empty_card() {
    let (dir, mut storage) = setup_card();

    storage.initialize().unwrap();
    assert!(dir.path().join("images").is_dir());
    assert!(dir.path().join("logs").is_dir());

    let pattern = Regex::new(r"^/images/IMG_[0-9A-F]{8}_\d{4}\.jpg$").unwrap();
    let path = storage.save_image(&[0x5A; 1024], None).unwrap();
    assert!(pattern.is_match(&path), "unexpected path {path}");
    assert_eq!(storage.image_counter(), 1);
    let on_disk = dir.path().join(path.trim_start_matches('/'));
    assert_eq!(fs::metadata(on_disk).unwrap().len(), 1024);

    let path = storage.save_image(&[0xA5; 2048], Some("test.jpg")).unwrap();
    assert_eq!(path, "/images/test.jpg");
    assert_eq!(storage.image_counter(), 2);
    assert_eq!(
        fs::metadata(dir.path().join("images/test.jpg")).unwrap().len(),
        2048
    );

    let stats = storage.get_storage_stats().unwrap();
    assert!(stats.total_bytes >= stats.used_bytes);
    assert_eq!(stats.used_bytes, 1024 + 2048);
    assert_eq!(stats.free_mb(), stats.total_mb() - stats.used_mb());
}

#[test]
fn test_save_before_initialize_creates_nothing() {
    let (dir, mut storage) = setup_card();

    let err = storage.save_image(&[1u8; 1024], None).unwrap_err();
    assert!(matches!(err, StorageError::NotInitialized));
    assert_eq!(storage.image_counter(), 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(matches!(
        storage.get_storage_stats(),
        Err(StorageError::StatsUnavailable)
    ));
}

#[test]
fn test_missing_mount_point_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let device = HostDirectoryDevice::new(dir.path().join("no-card"), CARD_BYTES);
    let mut storage = StorageManager::new(device, StorageLayout::default());

    assert!(matches!(
        storage.initialize(),
        Err(StorageError::DeviceUnavailable(_))
    ));
    assert!(!storage.is_ready());
}

#[test]
fn test_file_in_place_of_logs_dir_fails_initialize() {
    let (dir, mut storage) = setup_card();
    fs::write(dir.path().join("logs"), b"stray file").unwrap();

    match storage.initialize() {
        Err(StorageError::DirectorySetupFailed { path, .. }) => assert_eq!(path, "/logs"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!storage.is_ready());
}

#[test]
fn test_reinitialize_keeps_existing_images() {
    let (dir, mut storage) = setup_card();
    storage.initialize().unwrap();
    storage.save_image(b"frame", Some("keep.jpg")).unwrap();
    storage.shutdown();
    assert!(!storage.is_ready());

    storage.initialize().unwrap();
    storage.initialize().unwrap();
    assert!(dir.path().join("images/keep.jpg").is_file());
    assert_eq!(storage.image_counter(), 1);
}

#[test]
fn test_health_check_on_host_card() {
    let (dir, mut storage) = setup_card();
    storage.initialize().unwrap();
    storage.health_check().unwrap();
    assert_eq!(fs::read_dir(dir.path().join("logs")).unwrap().count(), 0);
}

#[test]
fn test_manager_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("storage.toml");
    let card = dir.path().join("card");
    fs::create_dir(&card).unwrap();
    fs::write(
        &config_path,
        format!(
            "mount_point = {:?}\ncapacity_mb = 64\nimages_dir = \"/DCIM\"\nfilename_prefix = \"CAM_\"\n",
            card.to_str().unwrap()
        ),
    )
    .unwrap();

    let config = StorageConfig::load_from(config_path.to_str()).unwrap();
    let device = HostDirectoryDevice::new(config.mount_point_path(), config.capacity_bytes());
    let mut storage = StorageManager::new(device, config.layout());
    storage.initialize().unwrap();

    let path = storage.save_image(b"\xFF\xD8jpeg", None).unwrap();
    assert!(path.starts_with("/DCIM/CAM_"));
    assert!(card.join("DCIM").is_dir());

    let stats = storage.get_storage_stats().unwrap();
    assert_eq!(stats.total_mb(), 64);
}
