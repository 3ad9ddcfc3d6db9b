//! Render binding and pipeline trigger
//!
//! A [`RenderBinding`] ties one mounted UI root to its off-screen surface.
//! Once per frame tick the owner calls [`RenderBinding::run_pipeline`]:
//! when the root's dirty flag is raised the root is flushed into the
//! surface, the flag is cleared, and `frame_end` listeners are notified.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use xenon_core::{
    DirtyFlag, Dispatch, DispatchOutcome, FrameStats, PixelBuffer, PointerInput, SceneRoot, SceneSnapshot,
    Viewport, WheelInput,
};
use xenon_platform::FrameTime;

use crate::error::Result;
use crate::registry::{Inspect, Inspection};
use crate::surface::OffscreenSurface;

new_key_type! {
    /// Handle for a registered frame-end listener
    pub struct FrameEndKey;
}

/// Emitted after a frame has been flushed into the surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameEnd {
    /// Frames flushed by this binding so far, this one included
    pub frame: u64,
    pub timestamp_ms: f64,
    pub stats: FrameStats,
    /// Physical buffer size
    pub width: u32,
    pub height: u32,
}

type FrameEndListener = Rc<RefCell<dyn FnMut(&FrameEnd)>>;

struct BindingInner<R> {
    root: Option<R>,
    surface: OffscreenSurface,
    dirty: DirtyFlag,
    listeners: SlotMap<FrameEndKey, FrameEndListener>,
    frames: u64,
    requester: Option<Rc<dyn Fn()>>,
}

/// Association of a UI root with its off-screen surface
///
/// Cheap to clone; clones share the same binding.
pub struct RenderBinding<R> {
    inner: Rc<RefCell<BindingInner<R>>>,
}

impl<R> Clone for RenderBinding<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Non-owning [`RenderBinding`] handle, for listeners stored in the binding
pub struct WeakBinding<R> {
    inner: Weak<RefCell<BindingInner<R>>>,
}

impl<R> WeakBinding<R> {
    pub fn upgrade(&self) -> Option<RenderBinding<R>> {
        self.inner.upgrade().map(|inner| RenderBinding { inner })
    }
}

impl<R> Clone for WeakBinding<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<R: SceneRoot + 'static> RenderBinding<R> {
    pub fn new(surface: OffscreenSurface) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BindingInner {
                root: None,
                surface,
                dirty: DirtyFlag::new(true),
                listeners: SlotMap::with_key(),
                frames: 0,
                requester: None,
            })),
        }
    }

    pub fn downgrade(&self) -> WeakBinding<R> {
        WeakBinding {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn inspector(&self) -> Weak<dyn Inspect> {
        let weak: Weak<RefCell<BindingInner<R>>> = Rc::downgrade(&self.inner);
        weak
    }

    /// Hook invoked whenever the binding wants another frame
    pub fn set_frame_requester(&self, requester: impl Fn() + 'static) {
        self.inner.borrow_mut().requester = Some(Rc::new(requester));
    }

    fn request_frame(&self) {
        let requester = self.inner.borrow().requester.clone();
        if let Some(request) = requester {
            request();
        }
    }

    /// Mount `root`, replacing any previous root
    ///
    /// The first tick after mounting always paints.
    pub fn mount(&self, mut root: R) -> Option<R> {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            root.set_viewport(inner.surface.viewport());
            inner.dirty = root.dirty_flag();
            inner.dirty.mark();
            inner.root.replace(root)
        };
        tracing::debug!("ui root mounted");
        self.request_frame();
        previous
    }

    /// Release the mounted root
    pub fn unmount(&self) -> Option<R> {
        let root = self.inner.borrow_mut().root.take();
        if root.is_some() {
            tracing::debug!("ui root unmounted");
        }
        root
    }

    /// A root is mounted and can receive input
    pub fn is_ready(&self) -> bool {
        self.inner.borrow().root.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty.is_dirty()
    }

    pub fn dirty_flag(&self) -> DirtyFlag {
        self.inner.borrow().dirty.clone()
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.borrow().surface.viewport()
    }

    /// Frames flushed since creation
    pub fn frames_flushed(&self) -> u64 {
        self.inner.borrow().frames
    }

    /// Run `f` against the mounted root
    ///
    /// Requests a frame afterwards if `f` dirtied the tree. Returns `None`
    /// when nothing is mounted or when called from inside another
    /// `with_root` on the same binding.
    pub fn with_root<T>(&self, f: impl FnOnce(&mut R) -> T) -> Option<T> {
        let (result, dirty) = {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                tracing::warn!("ui root is already in use, nested access ignored");
                return None;
            };
            let result = f(inner.root.as_mut()?);
            (result, inner.dirty.is_dirty())
        };
        if dirty {
            self.request_frame();
        }
        Some(result)
    }

    /// Read access to the current pixels
    pub fn with_buffer<T>(&self, f: impl FnOnce(&PixelBuffer) -> T) -> T {
        f(self.inner.borrow().surface.buffer())
    }

    /// Resize the surface and re-layout the root against it
    pub fn resize(&self, width: u32, height: u32, dpr: f32) -> Result<bool> {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let changed = inner.surface.resize(width, height, dpr)?;
            if changed {
                let viewport = inner.surface.viewport();
                if let Some(root) = inner.root.as_mut() {
                    root.set_viewport(viewport);
                }
                inner.dirty.mark();
            }
            changed
        };
        if changed {
            self.request_frame();
        }
        Ok(changed)
    }

    /// Dispatch a pointer event, then run its element handlers
    ///
    /// Handlers run after the root is released, so they may use this
    /// binding (or the component owning it) to update the tree.
    pub fn dispatch_pointer(&self, input: PointerInput) -> Option<DispatchOutcome> {
        self.with_root(|root| root.dispatch_pointer(input))
            .map(Dispatch::run)
    }

    pub fn dispatch_wheel(&self, input: WheelInput) -> Option<DispatchOutcome> {
        self.with_root(|root| root.dispatch_wheel(input))
            .map(Dispatch::run)
    }

    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        self.inner.borrow().root.as_ref().map(|root| root.snapshot())
    }

    pub fn on_frame_end(&self, listener: impl FnMut(&FrameEnd) + 'static) -> FrameEndKey {
        let listener: FrameEndListener = Rc::new(RefCell::new(listener));
        self.inner.borrow_mut().listeners.insert(listener)
    }

    pub fn remove_frame_end(&self, key: FrameEndKey) -> bool {
        self.inner.borrow_mut().listeners.remove(key).is_some()
    }

    /// Flush the root if it is dirty
    ///
    /// Returns `Ok(true)` when a frame was produced. The dirty flag is
    /// cleared after the flush whether or not it succeeded; listeners only
    /// hear about successful frames.
    pub fn run_pipeline(&self, time: FrameTime) -> Result<bool> {
        let (frame_end, listeners) = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            let Some(root) = inner.root.as_mut() else {
                return Ok(false);
            };
            if !inner.dirty.is_dirty() {
                return Ok(false);
            }

            let result = root.flush_frame(inner.surface.buffer_mut());
            inner.dirty.clear();
            let stats = result?;

            inner.frames += 1;
            let buffer = inner.surface.buffer();
            let frame_end = FrameEnd {
                frame: inner.frames,
                timestamp_ms: time.timestamp_ms,
                stats,
                width: buffer.width(),
                height: buffer.height(),
            };
            let listeners: SmallVec<[FrameEndListener; 4]> =
                inner.listeners.values().cloned().collect();
            (frame_end, listeners)
        };

        tracing::trace!(frame = frame_end.frame, draw_commands = frame_end.stats.draw_commands, "frame end");
        for listener in listeners {
            (&mut *listener.borrow_mut())(&frame_end);
        }
        Ok(true)
    }
}

impl<R: SceneRoot> Inspect for RefCell<BindingInner<R>> {
    fn inspect(&self) -> Option<Inspection> {
        let inner = self.try_borrow().ok()?;
        Some(Inspection {
            ready: inner.root.is_some(),
            dirty: inner.dirty.is_dirty(),
            viewport: inner.surface.viewport(),
            frames: inner.frames,
            snapshot: inner.root.as_ref().map(|root| root.snapshot()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use xenon_core::{Color, FlushError, PointerKind};
    use xenon_layout::{div, RenderTree};

    fn time(frame: u64) -> FrameTime {
        FrameTime {
            timestamp_ms: frame as f64 * 16.0,
            frame,
        }
    }

    fn binding() -> RenderBinding<RenderTree> {
        RenderBinding::new(OffscreenSurface::new(32, 32, 1.0).unwrap())
    }

    #[test]
    fn test_first_tick_after_mount_paints() {
        let binding = binding();
        assert!(!binding.run_pipeline(time(1)).unwrap());

        binding.mount(RenderTree::from_element(div().bg(Color::RED), Viewport::default()).unwrap());
        assert!(binding.is_ready());
        assert!(binding.run_pipeline(time(2)).unwrap());
        assert!(!binding.is_dirty());
        assert!(!binding.run_pipeline(time(3)).unwrap());
        assert!(binding.with_buffer(|b| !b.is_blank()));
    }

    #[test]
    fn test_mount_applies_surface_viewport() {
        let binding = binding();
        binding.mount(RenderTree::from_element(div(), Viewport::default()).unwrap());
        assert_eq!(binding.with_root(|root| root.viewport()), Some(Viewport::new(32.0, 32.0, 1.0)));
    }

    #[test]
    fn test_frame_end_listeners() {
        let binding = binding();
        let seen = Rc::new(Cell::new(0u64));
        let s = seen.clone();
        let key = binding.on_frame_end(move |end| s.set(end.frame));

        binding.mount(RenderTree::from_element(div(), Viewport::default()).unwrap());
        binding.run_pipeline(time(1)).unwrap();
        assert_eq!(seen.get(), 1);

        assert!(binding.remove_frame_end(key));
        binding.dirty_flag().mark();
        binding.run_pipeline(time(2)).unwrap();
        assert_eq!(seen.get(), 1);
        assert_eq!(binding.frames_flushed(), 2);
    }

    #[test]
    fn test_dirtying_input_requests_frame() {
        let binding = binding();
        let requests = Rc::new(Cell::new(0));
        let r = requests.clone();
        binding.set_frame_requester(move || r.set(r.get() + 1));

        binding.mount(
            RenderTree::from_element(
                div().child(div().size(10.0, 10.0).hover_bg(Color::RED)),
                Viewport::default(),
            )
            .unwrap(),
        );
        assert_eq!(requests.get(), 1);
        binding.run_pipeline(time(1)).unwrap();

        binding.dispatch_pointer(PointerInput::new(PointerKind::Move, 5.0, 5.0));
        assert_eq!(requests.get(), 2);
        // Clean input does not ask for a frame
        binding.run_pipeline(time(2)).unwrap();
        binding.dispatch_pointer(PointerInput::new(PointerKind::Move, 6.0, 6.0));
        assert_eq!(requests.get(), 2);
    }

    #[test]
    fn test_handler_can_update_its_own_root() {
        let binding = binding();
        let weak = binding.downgrade();
        binding.mount(
            RenderTree::from_element(
                div().child(div().id("play").size(10.0, 10.0).bg(Color::BLUE).on_click(move |_| {
                    if let Some(binding) = weak.upgrade() {
                        assert!(binding.is_ready());
                        binding.with_root(|tree| tree.set_background("play", Color::RED));
                    }
                })),
                Viewport::default(),
            )
            .unwrap(),
        );
        binding.run_pipeline(time(1)).unwrap();

        binding.dispatch_pointer(PointerInput::new(PointerKind::Down, 5.0, 5.0));
        let outcome = binding.dispatch_pointer(PointerInput::new(PointerKind::Up, 5.0, 5.0));
        assert_eq!(outcome.map(|o| o.handled), Some(1));
        assert_eq!(binding.with_root(|tree| tree.background("play")), Some(Some(Color::RED)));
        assert!(binding.is_dirty());
    }

    #[test]
    fn test_nested_with_root_is_ignored() {
        let binding = binding();
        binding.mount(RenderTree::from_element(div(), Viewport::default()).unwrap());
        let nested = binding.with_root(|_| binding.with_root(|_| ()));
        assert_eq!(nested, Some(None));
        assert_eq!(binding.with_root(|_| 1), Some(1));
    }

    #[test]
    fn test_resize_reallocates_and_dirties() {
        let binding = binding();
        binding.mount(RenderTree::from_element(div(), Viewport::default()).unwrap());
        binding.run_pipeline(time(1)).unwrap();

        assert!(binding.resize(16, 8, 2.0).unwrap());
        assert!(binding.is_dirty());
        assert_eq!(binding.with_buffer(|b| (b.width(), b.height())), (32, 16));
        assert!(binding.run_pipeline(time(2)).is_ok());
        assert!(matches!(
            binding.resize(0, 8, 1.0),
            Err(crate::XenonError::Surface(_))
        ));
    }

    struct BrokenRoot(DirtyFlag);

    impl SceneRoot for BrokenRoot {
        fn set_viewport(&mut self, _viewport: Viewport) {}
        fn dirty_flag(&self) -> DirtyFlag {
            self.0.clone()
        }
        fn flush_frame(&mut self, _target: &mut PixelBuffer) -> std::result::Result<FrameStats, FlushError> {
            Err(FlushError::Paint("boom".into()))
        }
        fn dispatch_pointer(&mut self, _input: PointerInput) -> Dispatch {
            Dispatch::default()
        }
        fn dispatch_wheel(&mut self, _input: WheelInput) -> Dispatch {
            Dispatch::default()
        }
        fn snapshot(&self) -> SceneSnapshot {
            SceneSnapshot {
                viewport: Viewport::default(),
                root: None,
            }
        }
    }

    #[test]
    fn test_failed_flush_clears_dirty_and_skips_listeners() {
        let binding = RenderBinding::new(OffscreenSurface::new(8, 8, 1.0).unwrap());
        let heard = Rc::new(Cell::new(false));
        let h = heard.clone();
        binding.on_frame_end(move |_| h.set(true));
        binding.mount(BrokenRoot(DirtyFlag::new(false)));

        assert!(binding.run_pipeline(time(1)).is_err());
        assert!(!binding.is_dirty());
        assert!(!heard.get());
        assert!(!binding.run_pipeline(time(2)).unwrap());
    }
}
