//! # Shared Slot
//!
//! Single-value "latest wins" mailbox shared between a background loop and
//! its readers.
//!
//! Publishing never blocks and replaces whatever was there; reading returns
//! the most recent value or `None` before the first publish. Values are
//! stored behind an [`Arc`], so a reader holds an immutable handle that a
//! later publish cannot touch.
//!
//! Built on [`tokio::sync::watch`], whose send/borrow pair swaps the stored
//! value under a short internal lock, so a reader never observes a partially
//! written value.
//!
//! ```
//! use drone_hud::slot::SharedSlot;
//!
//! let slot = SharedSlot::new();
//! assert!(slot.latest().is_none());
//!
//! slot.publish(42u32);
//! slot.publish(43u32);
//! assert_eq!(*slot.latest().unwrap(), 43);
//! ```

use std::sync::Arc;
use tokio::sync::watch;

/// Latest-value mailbox. Cloning yields another handle to the same slot.
#[derive(Debug)]
pub struct SharedSlot<T> {
    tx: Arc<watch::Sender<Option<Arc<T>>>>,
}

impl<T> Clone for SharedSlot<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Default for SharedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedSlot<T> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the stored value. Never blocks on readers.
    pub fn publish(&self, value: T) {
        // send_replace succeeds even with no live receivers
        self.tx.send_replace(Some(Arc::new(value)));
    }

    /// Returns the most recently published value, or `None` if nothing has
    /// been published yet.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<T>> {
        self.tx.borrow().clone()
    }
}
