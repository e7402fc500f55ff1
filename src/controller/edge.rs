//! # Button Edge Detection
//!
//! Turns polled button levels into one "pressed" event per physical press.
//!
//! [`EdgeDetector`] lives inside the sampler and remembers the previous
//! level of every button. Each released-to-held transition increments a
//! counter in [`ButtonEdges`], which is shared with the dispatch side;
//! [`ButtonEdges::take`] consumes one pending press.
//!
//! ```
//! use drone_hud::controller::edge::{ButtonEdges, EdgeDetector};
//! use drone_hud::controller::mapper::ButtonId;
//!
//! let edges = ButtonEdges::new();
//! let mut detector = EdgeDetector::new(edges.clone());
//!
//! // Held for three polls, then released
//! for held in [true, true, true, false] {
//!     detector.observe(ButtonId::Start, held);
//! }
//!
//! assert!(edges.take(ButtonId::Start));
//! assert!(!edges.take(ButtonId::Start));
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::mapper::{ButtonId, ControllerState};

/// Pending press counters, one per button. Cloning shares the counters.
#[derive(Debug, Clone, Default)]
pub struct ButtonEdges {
    pending: Arc<[AtomicU32; ButtonId::COUNT]>,
}

impl ButtonEdges {
    /// Creates counters with no pending presses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one press.
    pub fn record(&self, button: ButtonId) {
        self.pending[button.index()].fetch_add(1, Ordering::AcqRel);
    }

    /// Consumes one pending press. Returns `true` exactly once per press
    /// recorded since earlier calls.
    pub fn take(&self, button: ButtonId) -> bool {
        self.pending[button.index()]
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Rising-edge detector over polled button levels.
#[derive(Debug)]
pub struct EdgeDetector {
    previous: [bool; ButtonId::COUNT],
    edges: ButtonEdges,
}

impl EdgeDetector {
    /// Creates a detector that assumes every button starts released.
    #[must_use]
    pub fn new(edges: ButtonEdges) -> Self {
        Self {
            previous: [false; ButtonId::COUNT],
            edges,
        }
    }

    /// Feeds one polled level. Returns `true` on a released-to-held
    /// transition, which is also recorded in the shared counters.
    pub fn observe(&mut self, button: ButtonId, held: bool) -> bool {
        let was_held = std::mem::replace(&mut self.previous[button.index()], held);
        let pressed = held && !was_held;
        if pressed {
            self.edges.record(button);
        }
        pressed
    }

    /// Adopts a snapshot's levels as the baseline without recording presses.
    /// Used on the first read of a freshly reopened device, whose levels
    /// say nothing about what happened during the outage.
    pub fn resync(&mut self, state: &ControllerState) {
        for button in ButtonId::ALL {
            self.previous[button.index()] = state.button(button);
        }
    }

    /// Feeds every button of a snapshot; returns how many new presses it saw.
    pub fn observe_state(&mut self, state: &ControllerState) -> usize {
        ButtonId::ALL
            .iter()
            .filter(|&&button| self.observe(button, state.button(button)))
            .count()
    }
}
