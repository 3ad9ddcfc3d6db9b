//! Frame drivers
//!
//! A [`FrameDriver`] decides when registered callbacks run. The UI tree only
//! ever talks to the trait, so the same tree can be driven by the host
//! display or by an XR session's render loop.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{PlatformError, Result};
use crate::frame::{self, CallbackRegistry, FrameCallback, FrameSubscription, FrameTime, SharedRegistry};

/// Which scheduling model a driver follows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Ticks come from the host display refresh callback
    FreeRunning,
    /// Ticks come from an external XR render loop
    XrTicked,
}

/// Scheduling contract shared by all drivers
pub trait FrameDriver {
    /// Register a callback invoked once per tick
    fn on_frame(&self, callback: FrameCallback) -> FrameSubscription;

    /// Ask for a tick soon
    ///
    /// Drivers ticked from outside are free to ignore this.
    fn schedule_frame(&self);

    fn kind(&self) -> DriverKind;

    /// Number of currently registered callbacks
    fn callback_count(&self) -> usize;

    /// Closure-friendly [`FrameDriver::on_frame`]
    fn subscribe<F>(&self, callback: F) -> FrameSubscription
    where
        Self: Sized,
        F: FnMut(FrameTime) -> anyhow::Result<()> + 'static,
    {
        self.on_frame(Box::new(callback))
    }
}

/// Host hook that requests one display refresh callback
pub trait DisplayLink {
    fn request_frame(&self);
}

impl<F: Fn()> DisplayLink for F {
    fn request_frame(&self) {
        self()
    }
}

struct FreeRunningInner {
    registry: SharedRegistry,
    link: Box<dyn DisplayLink>,
    pending: Cell<bool>,
    in_frame: Cell<bool>,
}

/// Driver tied to the host display refresh
///
/// `schedule_frame` forwards to the [`DisplayLink`] at most once until the
/// host answers with [`FreeRunningDriver::on_display_frame`].
#[derive(Clone)]
pub struct FreeRunningDriver {
    inner: Rc<FreeRunningInner>,
}

impl FreeRunningDriver {
    pub fn new(link: impl DisplayLink + 'static) -> Self {
        Self {
            inner: Rc::new(FreeRunningInner {
                registry: CallbackRegistry::new_shared(),
                link: Box::new(link),
                pending: Cell::new(false),
                in_frame: Cell::new(false),
            }),
        }
    }

    /// Entry point for the host's display refresh callback
    ///
    /// Fails with [`PlatformError::Reentrant`] when called from inside one
    /// of this driver's callbacks.
    pub fn on_display_frame(&self, timestamp_ms: f64) -> Result<FrameTime> {
        if self.inner.in_frame.replace(true) {
            tracing::warn!("on_display_frame called from inside a frame callback");
            return Err(PlatformError::Reentrant);
        }
        // Cleared first so callbacks may schedule the next frame
        self.inner.pending.set(false);
        let result = frame::run_tick(&self.inner.registry, timestamp_ms);
        self.inner.in_frame.set(false);
        result
    }

    /// A frame was requested and the host has not delivered it yet
    pub fn is_frame_pending(&self) -> bool {
        self.inner.pending.get()
    }
}

impl FrameDriver for FreeRunningDriver {
    fn on_frame(&self, callback: FrameCallback) -> FrameSubscription {
        frame::subscribe(&self.inner.registry, callback)
    }

    fn schedule_frame(&self) {
        if !self.inner.pending.replace(true) {
            tracing::trace!("requesting display frame");
            self.inner.link.request_frame();
        }
    }

    fn kind(&self) -> DriverKind {
        DriverKind::FreeRunning
    }

    fn callback_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }
}

impl std::fmt::Debug for FreeRunningDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreeRunningDriver")
            .field("callbacks", &self.callback_count())
            .field("pending", &self.is_frame_pending())
            .finish()
    }
}

struct XrInner {
    registry: SharedRegistry,
    in_frame: Cell<bool>,
    frames: Cell<u64>,
}

/// Driver ticked by an XR session's render loop
///
/// Never schedules itself. The embedding 3D loop calls
/// [`XrFrameDriver::execute_frame`] exactly once per XR frame.
#[derive(Clone)]
pub struct XrFrameDriver {
    inner: Rc<XrInner>,
}

impl XrFrameDriver {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(XrInner {
                registry: CallbackRegistry::new_shared(),
                in_frame: Cell::new(false),
                frames: Cell::new(0),
            }),
        }
    }

    /// Run every registered callback once, in registration order
    ///
    /// All callbacks run even if some fail; failures are reported together
    /// as [`PlatformError::Callback`].
    pub fn execute_frame(&self, timestamp_ms: f64) -> Result<FrameTime> {
        if self.inner.in_frame.replace(true) {
            tracing::warn!("execute_frame called from inside a frame callback");
            return Err(PlatformError::Reentrant);
        }
        let result = frame::run_tick(&self.inner.registry, timestamp_ms);
        self.inner.in_frame.set(false);

        if let Ok(time) = &result {
            self.inner.frames.set(self.inner.frames.get() + 1);
            tracing::trace!(frame = time.frame, timestamp_ms = time.timestamp_ms, "xr frame executed");
        }
        result
    }

    /// Ticks that completed without callback failures
    pub fn frames_executed(&self) -> u64 {
        self.inner.frames.get()
    }
}

impl Default for XrFrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver for XrFrameDriver {
    fn on_frame(&self, callback: FrameCallback) -> FrameSubscription {
        frame::subscribe(&self.inner.registry, callback)
    }

    fn schedule_frame(&self) {
        // The XR loop ticks unconditionally
    }

    fn kind(&self) -> DriverKind {
        DriverKind::XrTicked
    }

    fn callback_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }
}

impl std::fmt::Debug for XrFrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrFrameDriver")
            .field("callbacks", &self.callback_count())
            .field("frames", &self.frames_executed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let driver = XrFrameDriver::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let subs: Vec<_> = (0..3)
            .map(|i| {
                let log = log.clone();
                driver.subscribe(move |_| {
                    log.borrow_mut().push(i);
                    Ok(())
                })
            })
            .collect();

        driver.execute_frame(0.0).unwrap();
        driver.execute_frame(16.0).unwrap();
        assert_eq!(*log.borrow(), vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(driver.frames_executed(), 2);
        drop(subs);
        assert_eq!(driver.callback_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_tick_applies_next_tick() {
        let driver = XrFrameDriver::new();
        let count = Arc::new(AtomicU32::new(0));
        let victim: Rc<RefCell<Option<FrameSubscription>>> = Rc::new(RefCell::new(None));

        let v = victim.clone();
        let _killer = driver.subscribe(move |_| {
            if let Some(sub) = v.borrow_mut().take() {
                sub.unsubscribe();
            }
            Ok(())
        });
        let c = count.clone();
        *victim.borrow_mut() = Some(driver.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        driver.execute_frame(0.0).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        driver.execute_frame(1.0).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(driver.callback_count(), 1);
    }

    #[test]
    fn test_subscribe_during_tick_applies_next_tick() {
        let driver = XrFrameDriver::new();
        let count = Arc::new(AtomicU32::new(0));
        let added: Rc<RefCell<Vec<FrameSubscription>>> = Rc::new(RefCell::new(Vec::new()));

        let d = driver.clone();
        let a = added.clone();
        let c = count.clone();
        let _adder = driver.subscribe(move |time| {
            if time.frame == 1 {
                let c = c.clone();
                a.borrow_mut().push(d.subscribe(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }));
            }
            Ok(())
        });

        driver.execute_frame(0.0).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        driver.execute_frame(1.0).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_execute_is_rejected() {
        let driver = XrFrameDriver::new();
        let inner_result = Rc::new(RefCell::new(None));

        let d = driver.clone();
        let r = inner_result.clone();
        let _sub = driver.subscribe(move |_| {
            *r.borrow_mut() = Some(d.execute_frame(5.0).is_err());
            Ok(())
        });

        driver.execute_frame(0.0).unwrap();
        assert_eq!(*inner_result.borrow(), Some(true));
        // Guard released after the outer tick
        driver.execute_frame(1.0).unwrap();
    }

    #[test]
    fn test_xr_schedule_frame_is_noop() {
        let driver = XrFrameDriver::new();
        driver.schedule_frame();
        assert_eq!(driver.kind(), DriverKind::XrTicked);
        assert_eq!(driver.frames_executed(), 0);
    }

    #[test]
    fn test_free_running_coalesces_requests() {
        let requests = Arc::new(AtomicU32::new(0));
        let r = requests.clone();
        let driver = FreeRunningDriver::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });

        driver.schedule_frame();
        driver.schedule_frame();
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert!(driver.is_frame_pending());

        driver.on_display_frame(16.0).unwrap();
        assert!(!driver.is_frame_pending());
        driver.schedule_frame();
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reentrant_display_frame_is_rejected() {
        let driver = FreeRunningDriver::new(|| {});
        let inner_result = Rc::new(RefCell::new(None));

        let d = driver.clone();
        let r = inner_result.clone();
        let _sub = driver.subscribe(move |time| {
            if time.frame == 1 {
                *r.borrow_mut() = Some(matches!(d.on_display_frame(5.0), Err(PlatformError::Reentrant)));
            }
            Ok(())
        });

        driver.on_display_frame(0.0).unwrap();
        assert_eq!(*inner_result.borrow(), Some(true));
        // Guard released after the outer tick
        assert!(driver.on_display_frame(16.0).is_ok());
    }

    #[test]
    fn test_free_running_callback_can_reschedule() {
        let requests = Arc::new(AtomicU32::new(0));
        let r = requests.clone();
        let driver = FreeRunningDriver::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });

        let d = driver.clone();
        let _sub = driver.subscribe(move |_| {
            d.schedule_frame();
            Ok(())
        });

        driver.on_display_frame(0.0).unwrap();
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert!(driver.is_frame_pending());
    }
}
