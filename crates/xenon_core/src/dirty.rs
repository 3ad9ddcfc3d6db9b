//! Shared dirty flag
//!
//! A UI tree raises its flag whenever layout or paint state changes; the
//! render binding observes it once per frame tick and clears it after the
//! frame has been flushed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "needs repaint" flag
///
/// Clones share the same underlying state.
#[derive(Clone, Debug)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    /// Create a flag in the given state
    pub fn new(dirty: bool) -> Self {
        Self(Arc::new(AtomicBool::new(dirty)))
    }

    /// Mark the tree as needing a repaint
    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Check without clearing
    pub fn is_dirty(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag
    ///
    /// Only the owner of the paint pipeline calls this, after a flush.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// True when both handles observe the same flag
    pub fn same_as(&self, other: &DirtyFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for DirtyFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = DirtyFlag::new(false);
        let other = flag.clone();
        other.mark();
        assert!(flag.is_dirty());
        flag.clear();
        assert!(!other.is_dirty());
        assert!(flag.same_as(&other));
        assert!(!flag.same_as(&DirtyFlag::default()));
    }
}
