//! Latest-value slot.
//!
//! A single-item holding cell that decouples producer cadence from
//! consumer cadence: the producer always overwrites, the consumer
//! reads-and-clears. Exactly one value (the freshest) is ever pending;
//! nothing is buffered beyond it.

use parking_lot::Mutex;

/// Capacity-1 overwrite-on-write cell.
///
/// `publish` is O(1), never blocks, and never fails; a pending unread
/// value is simply replaced. Intended for a single logical writer and
/// a single logical reader, though the cell itself is safe for any
/// number of either.
#[derive(Debug)]
pub struct LatestSlot<T> {
    cell: Mutex<Option<T>>,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestSlot<T> {
    /// Create an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }

    /// Store a value, replacing any pending unread value.
    ///
    /// Returns `true` when an unread value was overwritten.
    pub fn publish(&self, value: T) -> bool {
        self.cell.lock().replace(value).is_some()
    }

    /// Remove and return the pending value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.cell.lock().take()
    }

    /// Whether no value is pending.
    pub fn is_empty(&self) -> bool {
        self.cell.lock().is_none()
    }
}
