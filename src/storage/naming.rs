//! Image filename generation
//!
//! Without a real-time clock the camera names images from its uptime counter
//! and the session image counter: `IMG_<8 hex digits>_<4 digits>.jpg`.

use std::time::Instant;

/// Source of the uptime used in generated filenames.
pub trait UptimeClock {
    /// Milliseconds of uptime, wrapping at 32 bits like an MCU tick counter.
    fn millis(&self) -> u32;
}

/// Uptime measured from the moment the clock was created.
#[derive(Debug, Clone)]
pub struct SystemUptime {
    started: Instant,
}

impl SystemUptime {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemUptime {
    fn default() -> Self {
        Self::new()
    }
}

impl UptimeClock for SystemUptime {
    fn millis(&self) -> u32 {
        // Truncation is the wrap.
        self.started.elapsed().as_millis() as u32
    }
}

/// A clock stuck at one reading.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u32);

impl UptimeClock for FixedClock {
    fn millis(&self) -> u32 {
        self.0
    }
}

pub fn generate_filename(prefix: &str, millis: u32, counter: u32, extension: &str) -> String {
    format!("{}{:08X}_{:04}.{}", prefix, millis, counter, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_filename_format() {
        assert_eq!(generate_filename("IMG_", 0xA1F3, 7, "jpg"), "IMG_0000A1F3_0007.jpg");
        assert_eq!(
            generate_filename("IMG_", u32::MAX, 0, "jpg"),
            "IMG_FFFFFFFF_0000.jpg"
        );
    }

    #[test]
    fn test_counter_widens_past_four_digits() {
        assert_eq!(generate_filename("IMG_", 1, 12345, "jpg"), "IMG_00000001_12345.jpg");
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(42).millis(), 42);
        assert!(SystemUptime::new().millis() < 60_000);
    }
}
