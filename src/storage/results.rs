//! Storage result types
//!
//! Defines result structures returned by storage operations.

const MB: u64 = 1024 * 1024;

/// Capacity snapshot of the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl StorageStats {
    pub fn total_mb(&self) -> u64 {
        self.total_bytes / MB
    }

    pub fn used_mb(&self) -> u64 {
        self.used_bytes / MB
    }

    /// Free space in MB, always `total_mb() - used_mb()`.
    pub fn free_mb(&self) -> u64 {
        self.total_mb().saturating_sub(self.used_mb())
    }

    pub fn free_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }

    pub fn usage_percent(&self) -> f32 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.total_bytes as f64 * 100.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_megabytes() {
        let stats = StorageStats {
            total_bytes: 100 * MB,
            used_bytes: 25 * MB + 512,
        };
        assert_eq!(stats.total_mb(), 100);
        assert_eq!(stats.used_mb(), 25);
        assert_eq!(stats.free_mb(), 75);
        assert_eq!(stats.free_bytes(), 75 * MB - 512);
        assert!((stats.usage_percent() - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_card_usage() {
        let stats = StorageStats {
            total_bytes: 0,
            used_bytes: 0,
        };
        assert_eq!(stats.usage_percent(), 0.0);
        assert_eq!(stats.free_mb(), 0);
    }
}
