//! Flat image fallback
//!
//! Outside an XR session the same UI can be shown as an ordinary image.
//! [`XenonImage`] paints on display refresh ticks, only when the tree is
//! dirty, and publishes every finished frame as a PNG. Pointer events on
//! the displayed image are scaled from its on-screen rect back to UI
//! pixels.

use std::cell::{Cell, RefCell};
use std::io::Cursor;
use std::rc::Rc;

use image::{ImageFormat, RgbaImage};
use xenon_core::{PixelBuffer, PointerKind, Rect, SceneRoot, SceneSnapshot, Viewport};
use xenon_layout::{Div, RenderTree};
use xenon_platform::{DomPointerEvent, FrameDriver, FrameSubscription, FreeRunningDriver};

use crate::binding::{FrameEnd, RenderBinding};
use crate::error::{Result, XenonError};
use crate::pointer::PointerBridge;
use crate::surface::OffscreenSurface;

/// One published frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedFrame {
    pub png: Vec<u8>,
    /// Increments with every published frame
    pub version: u64,
    /// Pixel size of the encoded image
    pub width: u32,
    pub height: u32,
}

/// Encode a pixel buffer as PNG
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let image = RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.as_bytes().to_vec())
        .ok_or_else(|| XenonError::Other("pixel buffer does not match its dimensions".into()))?;
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// A UI root shown as a flat image
pub struct XenonImage<R: SceneRoot + 'static = RenderTree> {
    binding: RenderBinding<R>,
    pointer: PointerBridge<R>,
    latest: Rc<RefCell<Option<Rc<EncodedFrame>>>>,
    display: Cell<Option<Rect>>,
    _frame: FrameSubscription,
}

impl XenonImage<RenderTree> {
    pub fn new(width: u32, height: u32, dpr: f32, driver: &FreeRunningDriver) -> Result<Self> {
        Self::for_root(width, height, dpr, driver)
    }

    /// Build `element` into a tree and mount it
    pub fn mount(&self, element: Div) -> Result<()> {
        let tree = RenderTree::from_element(element, self.binding.viewport())?;
        self.binding.mount(tree);
        Ok(())
    }
}

impl<R: SceneRoot + 'static> XenonImage<R> {
    pub fn for_root(width: u32, height: u32, dpr: f32, driver: &FreeRunningDriver) -> Result<Self> {
        let binding = RenderBinding::new(OffscreenSurface::new(width, height, dpr)?);
        let pointer = PointerBridge::new(binding.clone());
        let latest: Rc<RefCell<Option<Rc<EncodedFrame>>>> = Rc::default();

        {
            let driver = driver.clone();
            binding.set_frame_requester(move || driver.schedule_frame());
        }

        {
            let weak = binding.downgrade();
            let latest = Rc::clone(&latest);
            let mut version = 0;
            binding.on_frame_end(move |end: &FrameEnd| {
                let Some(binding) = weak.upgrade() else {
                    return;
                };
                match binding.with_buffer(encode_png) {
                    Ok(png) => {
                        version += 1;
                        tracing::trace!(version, bytes = png.len(), "frame published");
                        // Replacing the previous frame releases it
                        *latest.borrow_mut() = Some(Rc::new(EncodedFrame {
                            png,
                            version,
                            width: end.width,
                            height: end.height,
                        }));
                    }
                    Err(err) => tracing::error!(%err, frame = end.frame, "failed to encode frame"),
                }
            });
        }

        let frame = {
            let binding = binding.clone();
            driver.subscribe(move |time| {
                binding.run_pipeline(time)?;
                Ok(())
            })
        };

        Ok(Self {
            binding,
            pointer,
            latest,
            display: Cell::new(None),
            _frame: frame,
        })
    }

    pub fn binding(&self) -> &RenderBinding<R> {
        &self.binding
    }

    pub fn viewport(&self) -> Viewport {
        self.binding.viewport()
    }

    pub fn mount_root(&self, root: R) -> Option<R> {
        self.binding.mount(root)
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut R) -> T) -> Option<T> {
        self.binding.with_root(f)
    }

    pub fn unmount(&self) -> Option<R> {
        self.binding.unmount()
    }

    pub fn resize(&self, width: u32, height: u32, dpr: f32) -> Result<bool> {
        self.binding.resize(width, height, dpr)
    }

    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        self.binding.snapshot()
    }

    /// Most recently published frame
    pub fn latest_frame(&self) -> Option<Rc<EncodedFrame>> {
        self.latest.borrow().clone()
    }

    /// Where the image is shown on screen
    ///
    /// Until set, the image is assumed to be displayed at its logical size
    /// at the origin.
    pub fn set_display_rect(&self, rect: Rect) {
        self.display.set(Some(rect));
    }

    pub fn display_rect(&self) -> Rect {
        self.display.get().unwrap_or_else(|| {
            let size = self.binding.viewport().size();
            Rect::new(0.0, 0.0, size.width, size.height)
        })
    }

    pub fn on_pointer_down(&self, event: &DomPointerEvent) -> bool {
        self.pointer.inject_client(PointerKind::Down, event, self.display_rect())
    }

    pub fn on_pointer_up(&self, event: &DomPointerEvent) -> bool {
        self.pointer.inject_client(PointerKind::Up, event, self.display_rect())
    }

    pub fn on_pointer_move(&self, event: &DomPointerEvent) -> bool {
        self.pointer.inject_client(PointerKind::Move, event, self.display_rect())
    }

    pub fn on_pointer_leave(&self, event: &DomPointerEvent) -> bool {
        self.pointer.inject_client(PointerKind::Leave, event, self.display_rect())
    }
}

impl<R: SceneRoot + 'static> Drop for XenonImage<R> {
    fn drop(&mut self) {
        self.binding.unmount();
        self.latest.borrow_mut().take();
    }
}
