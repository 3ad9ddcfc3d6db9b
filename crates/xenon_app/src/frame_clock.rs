//! Per-frame callbacks for application code
//!
//! Animations and other per-frame work subscribe to the same driver that
//! paints the UI, so they advance in lockstep with it.

use xenon_platform::{FrameDriver, FrameSubscription};

/// Subscription delivering `(delta_secs, time_ms)` every frame
///
/// `delta_secs` is 0 on the first tick. On a free-running driver the clock
/// keeps requesting frames for as long as it lives.
#[derive(Debug)]
pub struct FrameClock {
    subscription: FrameSubscription,
}

impl FrameClock {
    pub fn subscribe<D, F>(driver: &D, mut tick: F) -> Self
    where
        D: FrameDriver + Clone + 'static,
        F: FnMut(f32, f64) + 'static,
    {
        let scheduler = driver.clone();
        let mut last: Option<f64> = None;
        let subscription = driver.subscribe(move |time| {
            let delta = last.map_or(0.0, |prev| ((time.timestamp_ms - prev) / 1000.0) as f32);
            last = Some(time.timestamp_ms);
            tick(delta, time.timestamp_ms);
            scheduler.schedule_frame();
            Ok(())
        });
        driver.schedule_frame();
        Self { subscription }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop receiving ticks
    pub fn stop(self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use xenon_platform::{FreeRunningDriver, XrFrameDriver};

    #[test]
    fn test_delta_starts_at_zero() {
        let driver = XrFrameDriver::new();
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ticks);
        let clock = FrameClock::subscribe(&driver, move |delta, time| sink.borrow_mut().push((delta, time)));

        driver.execute_frame(1000.0).unwrap();
        driver.execute_frame(1500.0).unwrap();
        assert_eq!(*ticks.borrow(), vec![(0.0, 1000.0), (0.5, 1500.0)]);

        clock.stop();
        driver.execute_frame(2000.0).unwrap();
        assert_eq!(ticks.borrow().len(), 2);
    }

    #[test]
    fn test_keeps_free_running_driver_awake() {
        let requests = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&requests);
        let driver = FreeRunningDriver::new(move || counter.set(counter.get() + 1));

        let clock = FrameClock::subscribe(&driver, |_, _| {});
        assert_eq!(requests.get(), 1);
        driver.on_display_frame(16.0).unwrap();
        assert_eq!(requests.get(), 2);
        assert!(driver.is_frame_pending());

        drop(clock);
        driver.on_display_frame(32.0).unwrap();
        assert_eq!(requests.get(), 2);
        assert_eq!(driver.callback_count(), 0);
    }
}
