//! XR Panel Demo
//!
//! Simulates an XR session driving a Xenon panel: a few frames of
//! controller input, thumbstick scrolling and texture uploads. Uploads go
//! to a wgpu texture when an adapter is available and to a CPU texture
//! otherwise. The final frame is also written out through the flat image
//! fallback.
//!
//! Run with:
//!   cargo run -p xenon_app --example xr_panel [config.toml] [out.png]

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use xenon_app::prelude::*;
use xenon_app::FrameEnd;
use xenon_core::Color;
use xenon_gpu::{request_headless_device, CpuTexture, WgpuTextureTarget};
use xenon_platform::{Gamepad, Handedness, XrInputSource};

fn panel(clicks: Rc<Cell<u32>>) -> Div {
    let rows = (0..12).map(|i| {
        let shade = if i % 2 == 0 { 0x2a2a3a } else { 0x22222e };
        div()
            .h(56.0)
            .flex_shrink_0()
            .bg(Color::from_hex(shade))
            .hover_bg(Color::from_hex(0x3a3a5a))
    });

    div()
        .flex_col()
        .p(4.0)
        .gap(3.0)
        .bg(Color::from_hex(0x101018))
        .child(
            div()
                .id("play")
                .h(64.0)
                .bg(Color::from_hex(0x3060f0))
                .hover_bg(Color::from_hex(0x5080ff))
                .border(2.0, Color::WHITE)
                .on_click(move |_| {
                    clicks.set(clicks.get() + 1);
                    tracing::info!(clicks = clicks.get(), "play pressed");
                }),
        )
        .child(div().id("list").scroll().flex_col().flex_grow().children(rows))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => XenonConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => XenonConfig::default().with_size(512, 512),
    };
    let out_path = args.next().unwrap_or_else(|| "xr_panel.png".to_string());

    let driver = XrFrameDriver::new();
    let xenon = Xenon::new(config.clone(), &driver)?;
    let clicks = Rc::new(Cell::new(0));
    xenon.mount(panel(Rc::clone(&clicks)))?;
    xenon.on_frame_end(|end: &FrameEnd| {
        tracing::debug!(frame = end.frame, commands = end.stats.draw_commands, "frame painted");
    });

    let mut registry = XenonRegistry::new();
    registry.register("xr-panel", xenon.binding());

    let clock = FrameClock::subscribe(&driver, |delta, time| {
        tracing::trace!(delta, time, "clock tick");
    });

    let controllers = SharedInputSources::new();
    xenon.set_input_sources(controllers.clone());

    let (width, height) = xenon.viewport().physical_size();
    let gpu = pollster::block_on(request_headless_device()).ok();
    let gpu_target = gpu
        .as_ref()
        .map(|(device, _)| WgpuTextureTarget::new(device, width, height, Some("xr panel")));
    let mut cpu_target = CpuTexture::new();
    if gpu.is_none() {
        tracing::warn!("no GPU adapter, uploading to a CPU texture");
    }

    // Ray sweeps down onto the play button, presses it, then moves onto
    // the list and the stick scrolls it
    let hits = [
        XrPointerEvent::at(0.5, 0.95),
        XrPointerEvent::at(0.5, 0.9),
        XrPointerEvent::at(0.5, 0.5),
    ];
    let mut uploads = 0;
    for frame in 0..90u32 {
        let now = frame as f64 * (1000.0 / 90.0);
        match frame {
            10 => {
                xenon.on_pointer_over(&hits[0]);
            }
            20 => {
                xenon.on_pointer_move(&hits[1]);
                xenon.on_pointer_down(&hits[1]);
            }
            21 => {
                xenon.on_pointer_up(&hits[1]);
            }
            30 => {
                xenon.on_pointer_move(&hits[2]);
                controllers.set([XrInputSource::new(
                    Handedness::Right,
                    Some(Gamepad::with_axes(&[0.0, 0.0, 0.0, -0.6])),
                )]);
            }
            60 => controllers.clear(),
            _ => {}
        }

        driver.execute_frame(now)?;

        let uploaded = match (&gpu, gpu_target.as_ref()) {
            (Some((_, queue)), Some(target)) => xenon.render_layer(&mut target.uploader(queue))?,
            _ => xenon.render_layer(&mut cpu_target)?,
        };
        if uploaded {
            uploads += 1;
        }
    }

    tracing::info!(
        frames = driver.frames_executed(),
        painted = xenon.frames_flushed(),
        uploads,
        clicks = clicks.get(),
        "session finished"
    );
    for report in registry.diagnose() {
        tracing::info!(?report, "diagnostics");
    }
    if let Some(list) = registry.element_position("list") {
        tracing::info!(?list, "list bounds");
    }
    clock.stop();

    // Same UI through the flat image path
    let display = FreeRunningDriver::new(|| {});
    let image = XenonImage::new(config.pixel_width, config.pixel_height, config.dpr, &display)?;
    image.mount(panel(clicks))?;
    display.on_display_frame(0.0)?;
    let frame = image
        .latest_frame()
        .context("flat image produced no frame")?;
    std::fs::write(&out_path, &frame.png).with_context(|| format!("writing {out_path}"))?;
    tracing::info!(path = %out_path, width = frame.width, height = frame.height, "wrote frame");

    Ok(())
}
