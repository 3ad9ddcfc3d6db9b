//! XR-hosted UI surface
//!
//! [`Xenon`] owns one UI root, paints it off-screen on the XR session's
//! frame ticks and hands the pixels to the 3D renderer as a texture.
//! Controller ray hits on the textured quad come back in as pointer
//! events; thumbsticks scroll.
//!
//! Per XR frame the host does, in order:
//!
//! 1. `driver.execute_frame(now)`: runs the paint pipeline if the tree is
//!    dirty, then polls thumbsticks
//! 2. `xenon.render_layer(&mut uploader)` from the quad's render hook:
//!    uploads the newest pixels if a frame finished since the last upload

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use xenon_core::{PointerKind, SceneRoot, SceneSnapshot, UvConvention, Vec2, Viewport};
use xenon_gpu::{TextureBridge, TextureUploader};
use xenon_layout::{Div, RenderTree};
use xenon_platform::{
    FrameDriver, FrameSubscription, InputSourceProvider, InputSources, XrFrameDriver,
    XrPointerEvent,
};

use crate::binding::{FrameEnd, FrameEndKey, RenderBinding};
use crate::config::XenonConfig;
use crate::error::Result;
use crate::joystick::JoystickScroll;
use crate::pointer::PointerBridge;
use crate::surface::OffscreenSurface;

type SharedProvider = Rc<RefCell<Option<Box<dyn InputSourceProvider>>>>;

/// A UI root rendered into an XR scene
pub struct Xenon<R: SceneRoot + 'static = RenderTree> {
    config: XenonConfig,
    binding: RenderBinding<R>,
    pointer: PointerBridge<R>,
    texture: Rc<RefCell<TextureBridge>>,
    joystick: Rc<Cell<JoystickScroll>>,
    input: SharedProvider,
    _frame: FrameSubscription,
}

impl Xenon<RenderTree> {
    /// Create a surface for the built-in element tree
    pub fn new(config: XenonConfig, driver: &XrFrameDriver) -> Result<Self> {
        Self::for_root(config, driver)
    }

    /// Build `element` into a tree and mount it
    pub fn mount(&self, element: Div) -> Result<()> {
        let tree = RenderTree::from_element(element, self.binding.viewport())?;
        self.binding.mount(tree);
        Ok(())
    }
}

impl<R: SceneRoot + 'static> Xenon<R> {
    /// Create a surface for any [`SceneRoot`]
    pub fn for_root(config: XenonConfig, driver: &XrFrameDriver) -> Result<Self> {
        config.validate()?;
        let surface = OffscreenSurface::new(config.pixel_width, config.pixel_height, config.dpr)?;
        let binding = RenderBinding::new(surface);
        let pointer = PointerBridge::new(binding.clone());
        let texture = Rc::new(RefCell::new(TextureBridge::new(config.uv_convention)));
        let joystick = Rc::new(Cell::new(JoystickScroll::new(
            config.enable_joystick_scroll,
            config.scroll_sensitivity,
        )));
        let input: SharedProvider = Rc::default();

        {
            let texture = Rc::clone(&texture);
            binding.on_frame_end(move |_| texture.borrow_mut().mark_needs_update());
        }

        let frame = {
            let binding = binding.clone();
            let pointer = pointer.clone();
            let joystick = Rc::clone(&joystick);
            let input = Rc::clone(&input);
            driver.subscribe(move |time| {
                let painted = binding.run_pipeline(time);

                let sources: InputSources = input
                    .borrow()
                    .as_ref()
                    .map(|provider| provider.input_sources())
                    .unwrap_or_default();
                joystick.get().poll(&sources, &pointer);

                painted?;
                Ok(())
            })
        };

        tracing::info!(
            width = config.pixel_width,
            height = config.pixel_height,
            dpr = config.dpr,
            convention = ?config.uv_convention,
            "xenon surface created"
        );

        Ok(Self {
            config,
            binding,
            pointer,
            texture,
            joystick,
            input,
            _frame: frame,
        })
    }

    pub fn config(&self) -> &XenonConfig {
        &self.config
    }

    pub fn binding(&self) -> &RenderBinding<R> {
        &self.binding
    }

    pub fn pointer(&self) -> &PointerBridge<R> {
        &self.pointer
    }

    pub fn viewport(&self) -> Viewport {
        self.binding.viewport()
    }

    pub fn is_ready(&self) -> bool {
        self.binding.is_ready()
    }

    /// Mount a prebuilt root, returning the one it replaces
    pub fn mount_root(&self, root: R) -> Option<R> {
        self.binding.mount(root)
    }

    /// Mutate the mounted root
    ///
    /// Returns `None` when nothing is mounted.
    pub fn update<T>(&self, f: impl FnOnce(&mut R) -> T) -> Option<T> {
        self.binding.with_root(f)
    }

    pub fn unmount(&self) -> Option<R> {
        self.binding.unmount()
    }

    /// Change the logical size and pixel ratio of the surface
    pub fn resize(&mut self, width: u32, height: u32, dpr: f32) -> Result<bool> {
        let changed = self.binding.resize(width, height, dpr)?;
        if changed {
            self.config.pixel_width = width;
            self.config.pixel_height = height;
            self.config.dpr = dpr;
        }
        Ok(changed)
    }

    /// Source of controller gamepads for thumbstick scrolling
    pub fn set_input_sources(&self, provider: impl InputSourceProvider + 'static) {
        *self.input.borrow_mut() = Some(Box::new(provider));
    }

    pub fn set_joystick_scroll(&mut self, enabled: bool) {
        self.config.enable_joystick_scroll = enabled;
        self.joystick.set(JoystickScroll::new(enabled, self.config.scroll_sensitivity));
    }

    /// Wheel pixels per unit of stick deflection, applied from the next tick
    pub fn set_scroll_sensitivity(&mut self, sensitivity: f32) -> Result<()> {
        let config = self.config.clone().with_scroll_sensitivity(sensitivity);
        config.validate()?;
        self.config = config;
        self.joystick.set(JoystickScroll::new(self.config.enable_joystick_scroll, sensitivity));
        Ok(())
    }

    // =========================================================================
    // Controller ray hits on the quad
    // =========================================================================

    pub fn on_pointer_down(&self, event: &XrPointerEvent) -> bool {
        self.pointer.inject_uv(PointerKind::Down, event, self.config.uv_convention)
    }

    pub fn on_pointer_up(&self, event: &XrPointerEvent) -> bool {
        self.pointer.inject_uv(PointerKind::Up, event, self.config.uv_convention)
    }

    pub fn on_pointer_move(&self, event: &XrPointerEvent) -> bool {
        self.pointer.inject_uv(PointerKind::Move, event, self.config.uv_convention)
    }

    /// Ray entered the quad; hover state follows from the move
    pub fn on_pointer_over(&self, event: &XrPointerEvent) -> bool {
        self.on_pointer_move(event)
    }

    pub fn on_pointer_leave(&self, event: &XrPointerEvent) -> bool {
        self.pointer.inject_uv(PointerKind::Leave, event, self.config.uv_convention)
    }

    // =========================================================================
    // Texture output
    // =========================================================================

    /// Upload the latest frame if one finished since the last upload
    ///
    /// Call from the quad's render hook, once per rendered frame.
    pub fn render_layer(&self, uploader: &mut dyn TextureUploader) -> Result<bool> {
        let mut texture = self.texture.borrow_mut();
        let uploaded = self.binding.with_buffer(|buffer| texture.render(buffer, uploader))?;
        Ok(uploaded)
    }

    pub fn texture_needs_update(&self) -> bool {
        self.texture.borrow().needs_update()
    }

    pub fn uv_convention(&self) -> UvConvention {
        self.config.uv_convention
    }

    /// Scale to apply to the displayed quad for the configured convention
    pub fn quad_scale(&self) -> Vec2 {
        self.config.uv_convention.quad_scale()
    }

    pub fn on_frame_end(&self, listener: impl FnMut(&FrameEnd) + 'static) -> FrameEndKey {
        self.binding.on_frame_end(listener)
    }

    pub fn remove_frame_end(&self, key: FrameEndKey) -> bool {
        self.binding.remove_frame_end(key)
    }

    pub fn frames_flushed(&self) -> u64 {
        self.binding.frames_flushed()
    }

    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        self.binding.snapshot()
    }
}

impl<R: SceneRoot + 'static> Drop for Xenon<R> {
    fn drop(&mut self) {
        self.binding.unmount();
        tracing::debug!("xenon surface disposed");
    }
}
