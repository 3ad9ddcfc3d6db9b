//! Frame callback registry shared by both drivers

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::{PlatformError, Result};

/// Timing information handed to every callback of a tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTime {
    /// Milliseconds, monotonically non-decreasing across ticks
    pub timestamp_ms: f64,
    /// Tick counter, starting at 1
    pub frame: u64,
}

/// Per-frame callback
///
/// Errors are collected by the driver and reported to whoever ticked it.
pub type FrameCallback = Box<dyn FnMut(FrameTime) -> anyhow::Result<()>>;

type SharedCallback = Rc<RefCell<FrameCallback>>;

/// Identifies a registered callback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

pub(crate) struct CallbackRegistry {
    callbacks: IndexMap<CallbackId, SharedCallback>,
    next_id: u64,
    last_timestamp: Option<f64>,
    frame: u64,
}

pub(crate) type SharedRegistry = Rc<RefCell<CallbackRegistry>>;

impl CallbackRegistry {
    pub(crate) fn new_shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self {
            callbacks: IndexMap::new(),
            next_id: 0,
            last_timestamp: None,
            frame: 0,
        }))
    }

    fn insert(&mut self, callback: FrameCallback) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.insert(id, Rc::new(RefCell::new(callback)));
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }

    fn advance(&mut self, timestamp_ms: f64) -> FrameTime {
        let timestamp_ms = match self.last_timestamp {
            Some(last) if timestamp_ms < last => {
                tracing::trace!(timestamp_ms, last, "clamping backwards frame timestamp");
                last
            }
            _ => timestamp_ms,
        };
        self.last_timestamp = Some(timestamp_ms);
        self.frame += 1;
        FrameTime {
            timestamp_ms,
            frame: self.frame,
        }
    }
}

pub(crate) fn subscribe(registry: &SharedRegistry, callback: FrameCallback) -> FrameSubscription {
    let id = registry.borrow_mut().insert(callback);
    tracing::debug!(?id, total = registry.borrow().len(), "frame callback registered");
    FrameSubscription {
        registry: Rc::downgrade(registry),
        id,
        active: true,
    }
}

/// Run one tick against a snapshot of the registry
///
/// Callbacks added or removed while the tick runs take effect next tick.
pub(crate) fn run_tick(registry: &SharedRegistry, timestamp_ms: f64) -> Result<FrameTime> {
    if !timestamp_ms.is_finite() {
        return Err(PlatformError::InvalidTimestamp(timestamp_ms));
    }

    let (time, snapshot) = {
        let mut reg = registry.borrow_mut();
        let time = reg.advance(timestamp_ms);
        let snapshot: SmallVec<[SharedCallback; 8]> = reg.callbacks.values().cloned().collect();
        (time, snapshot)
    };

    let mut failures = 0;
    let mut first = None;
    for callback in snapshot {
        let result = {
            let mut f = callback.borrow_mut();
            (&mut **f)(time)
        };
        if let Err(err) = result {
            tracing::debug!(frame = time.frame, "frame callback failed: {err:#}");
            failures += 1;
            first.get_or_insert(err);
        }
    }

    match first {
        Some(first) => Err(PlatformError::Callback { failures, first }),
        None => Ok(time),
    }
}

/// Handle to a registered frame callback
///
/// Dropping the handle unsubscribes. Removal never interrupts a tick that
/// is already running; it applies from the next tick on.
#[must_use = "dropping a FrameSubscription unsubscribes its callback"]
pub struct FrameSubscription {
    registry: Weak<RefCell<CallbackRegistry>>,
    id: CallbackId,
    active: bool,
}

impl FrameSubscription {
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// True while the callback is still registered with a live driver
    pub fn is_active(&self) -> bool {
        self.active
            && self
                .registry
                .upgrade()
                .is_some_and(|reg| reg.borrow().callbacks.contains_key(&self.id))
    }

    /// Remove the callback from its driver
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    /// Keep the callback registered for the lifetime of the driver
    pub fn detach(mut self) {
        self.active = false;
    }

    fn remove(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().callbacks.shift_remove(&self.id);
            tracing::debug!(id = ?self.id, "frame callback unregistered");
        }
    }
}

impl Drop for FrameSubscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for FrameSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSubscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_timestamps_never_go_backwards() {
        let registry = CallbackRegistry::new_shared();
        assert_eq!(run_tick(&registry, 10.0).unwrap().timestamp_ms, 10.0);
        let t = run_tick(&registry, 5.0).unwrap();
        assert_eq!(t.timestamp_ms, 10.0);
        assert_eq!(t.frame, 2);
        assert!(matches!(
            run_tick(&registry, f64::NAN),
            Err(PlatformError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_failure_does_not_stop_later_callbacks() {
        let registry = CallbackRegistry::new_shared();
        let ran = Rc::new(Cell::new(0));

        let _a = subscribe(&registry, Box::new(|_| anyhow::bail!("paint exploded")));
        let r = ran.clone();
        let _b = subscribe(
            &registry,
            Box::new(move |_| {
                r.set(r.get() + 1);
                Ok(())
            }),
        );

        let err = run_tick(&registry, 0.0).unwrap_err();
        assert!(matches!(err, PlatformError::Callback { failures: 1, .. }));
        assert!(err.to_string().contains("paint exploded"));
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn test_detach_keeps_callback() {
        let registry = CallbackRegistry::new_shared();
        let sub = subscribe(&registry, Box::new(|_| Ok(())));
        sub.detach();
        assert_eq!(registry.borrow().len(), 1);
    }
}
