//! Caller-owned session state
//!
//! The engine itself is pure; the only cross-call state the system needs is
//! a one-slot "last known region" display memo. It lives here as an explicit
//! value the session layer owns and threads through its own updates, never as
//! hidden state inside the engine.

/// Sticky last-known-good region name for display purposes
///
/// `observe` updates the slot only when the current locate produced a name,
/// so brief gaps in coverage keep showing the last region instead of
/// flickering to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastKnownRegion {
    name: Option<String>,
}

impl LastKnownRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current locate result; returns the value to display
    pub fn observe(&mut self, current: Option<&str>) -> Option<&str> {
        if let Some(name) = current {
            if self.name.as_deref() != Some(name) {
                self.name = Some(name.to_string());
            }
        }
        self.name.as_deref()
    }

    /// Current display value without observing anything
    #[inline]
    pub fn get(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Drop the memo, e.g. when the session restarts
    pub fn clear(&mut self) {
        self.name = None;
    }
}
