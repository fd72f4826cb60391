//! Host1x syncpoint state.
//!
//! Syncpoints are the SoC wide fences the host1x block uses to order work
//! between engines. The DMA engine holds a handle to them for syncpoint
//! based releases; the basic semaphore path writes through the guest address
//! space instead and never touches these counters.
use std::sync::atomic::{AtomicU32, Ordering};

/// The number of host1x syncpoints on the Tegra X1.
pub const SYNCPOINT_COUNT: usize = 192;

/// The monotonically increasing syncpoint counters of the SoC.
pub struct Syncpoints {
    counters: [AtomicU32; SYNCPOINT_COUNT],
}

impl Syncpoints {
    pub fn new() -> Self {
        Self {
            counters: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    /// The current value of syncpoint `id`.
    pub fn read(&self, id: usize) -> u32 {
        self.counters[id].load(Ordering::Acquire)
    }

    /// Increments syncpoint `id` and returns the new value.
    pub fn increment(&self, id: usize) -> u32 {
        self.counters[id].fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Whether `threshold` has been reached by syncpoint `id`.
    pub fn is_expired(&self, id: usize, threshold: u32) -> bool {
        // Thresholds compare with wrapping arithmetic, the counters never
        // reset.
        self.read(id).wrapping_sub(threshold) < i32::MAX as u32
    }
}

impl Default for Syncpoints {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_and_read() {
        let syncpoints = Syncpoints::new();
        assert_eq!(0, syncpoints.read(10));
        assert_eq!(1, syncpoints.increment(10));
        assert_eq!(2, syncpoints.increment(10));
        assert_eq!(2, syncpoints.read(10));
        assert_eq!(0, syncpoints.read(11));
    }

    #[test]
    fn expiry_is_wrapping() {
        let syncpoints = Syncpoints::new();
        syncpoints.increment(0);
        assert!(syncpoints.is_expired(0, 1));
        assert!(!syncpoints.is_expired(0, 2));
    }
}
