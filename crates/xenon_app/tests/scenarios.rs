//! End-to-end behaviour of an XR-hosted surface

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use xenon_app::prelude::*;
use xenon_core::{Color, Point, PointerButton, PointerKind, Vec2};
use xenon_gpu::CpuTexture;
use xenon_platform::{Gamepad, Handedness, XrInputSource};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn config_512() -> XenonConfig {
    XenonConfig::default().with_size(512, 512).with_dpr(2.0)
}

#[test]
fn first_tick_paints_once() {
    init_tracing();
    let driver = XrFrameDriver::new();
    let xenon = Xenon::new(config_512(), &driver).unwrap();
    xenon
        .mount(div().p_px(16.0).child(div().w(100.0).h(40.0).bg(Color::GREEN)))
        .unwrap();

    let ends = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&ends);
    xenon.on_frame_end(move |end| sink.borrow_mut().push(*end));

    driver.execute_frame(0.0).unwrap();
    driver.execute_frame(16.0).unwrap();

    let ends = ends.borrow();
    assert_eq!(ends.len(), 1);
    assert_eq!((ends[0].width, ends[0].height), (1024, 1024));
    assert!(xenon.binding().with_buffer(|buffer| !buffer.is_blank()));
    assert_eq!(
        xenon.binding().with_buffer(|buffer| buffer.pixel(64, 64)),
        Some(xenon_core::Rgba8::new(0, 255, 0, 255))
    );
}

#[test]
fn press_and_release_clicks_once() {
    init_tracing();
    let driver = XrFrameDriver::new();
    let xenon = Xenon::new(config_512(), &driver).unwrap();

    let clicks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&clicks);
    xenon
        .mount(
            div().justify_center().items_center().child(
                div()
                    .id("button")
                    .size(200.0, 200.0)
                    .bg(Color::BLUE)
                    .on_click(move |_| counter.set(counter.get() + 1)),
            ),
        )
        .unwrap();
    driver.execute_frame(0.0).unwrap();

    let pointer = xenon.pointer();
    assert!(pointer.inject_event(PointerKind::Down, 256.0, 256.0, PointerButton::Primary, 0));
    assert!(pointer.inject_event(PointerKind::Up, 256.0, 256.0, PointerButton::Primary, 0));
    assert_eq!(clicks.get(), 1);

    // Release outside the button does not click
    pointer.inject_event(PointerKind::Down, 256.0, 256.0, PointerButton::Primary, 0);
    pointer.inject_event(PointerKind::Up, 10.0, 10.0, PointerButton::Primary, 0);
    assert_eq!(clicks.get(), 1);
}

#[test]
fn ray_press_and_release_clicks_through_uv() {
    let driver = XrFrameDriver::new();
    let xenon = Xenon::new(config_512(), &driver).unwrap();

    let clicks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&clicks);
    xenon
        .mount(
            div().justify_center().items_center().child(
                div()
                    .size(200.0, 200.0)
                    .on_click(move |_| counter.set(counter.get() + 1)),
            ),
        )
        .unwrap();

    let hit = XrPointerEvent::at(0.5, 0.5).with_pointer_id(7);
    assert!(xenon.on_pointer_over(&hit));
    assert!(xenon.on_pointer_down(&hit));
    assert!(xenon.on_pointer_up(&hit));
    assert_eq!(clicks.get(), 1);
    assert_eq!(xenon.pointer().last_position(7), Some(Point::new(256.0, 256.0)));
}

#[test]
fn click_handler_restyles_its_own_button() {
    init_tracing();
    let driver = XrFrameDriver::new();
    let xenon = Xenon::new(config_512(), &driver).unwrap();
    let binding = xenon.binding().downgrade();
    xenon
        .mount(
            div().child(div().id("play").size(100.0, 100.0).bg(Color::BLUE).on_click(move |_| {
                if let Some(binding) = binding.upgrade() {
                    binding.with_root(|tree| tree.set_background("play", Color::RED));
                }
            })),
        )
        .unwrap();
    driver.execute_frame(0.0).unwrap();

    let pointer = xenon.pointer();
    assert!(pointer.inject_event(PointerKind::Down, 10.0, 10.0, PointerButton::Primary, 0));
    assert!(pointer.inject_event(PointerKind::Up, 10.0, 10.0, PointerButton::Primary, 0));
    assert_eq!(xenon.update(|tree| tree.background("play")).unwrap(), Some(Color::RED));
    assert!(xenon.binding().is_dirty());

    driver.execute_frame(16.0).unwrap();
    assert_eq!(
        xenon.binding().with_buffer(|buffer| buffer.pixel(20, 20)),
        Some(xenon_core::Rgba8::new(255, 0, 0, 255))
    );
}

#[test]
fn leave_uses_last_known_position() {
    init_tracing();
    let driver = XrFrameDriver::new();
    let xenon = Xenon::new(config_512(), &driver).unwrap();

    let left_at = Rc::new(Cell::new(None));
    let sink = Rc::clone(&left_at);
    xenon
        .mount(
            div().child(
                div()
                    .id("corner")
                    .size(50.0, 50.0)
                    .hover_bg(Color::RED)
                    .on_hover_leave(move |ctx| sink.set(Some(ctx.position))),
            ),
        )
        .unwrap();

    xenon.pointer().inject_event(PointerKind::Move, 10.0, 10.0, PointerButton::Primary, 0);
    assert!(xenon.update(|tree| tree.is_hovered("corner")).unwrap());

    xenon.pointer().inject_event(PointerKind::Leave, 400.0, 400.0, PointerButton::Primary, 0);
    assert!(!xenon.update(|tree| tree.is_hovered("corner")).unwrap());
    assert_eq!(left_at.get(), Some(Point::new(10.0, 10.0)));
    assert!(xenon.binding().is_dirty());
}

#[test]
fn thumbstick_scrolls_every_tick() {
    init_tracing();
    let driver = XrFrameDriver::new();
    let xenon = Xenon::new(
        config_512().with_joystick_scroll(true).with_scroll_sensitivity(50.0),
        &driver,
    )
    .unwrap();

    let deltas = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&deltas);
    xenon
        .mount(div().on_scroll(move |ctx| sink.borrow_mut().push(ctx.scroll_delta)))
        .unwrap();

    let sources = SharedInputSources::new();
    sources.set([XrInputSource::new(
        Handedness::Right,
        Some(Gamepad::with_axes(&[0.0, 0.0, 0.0, 0.5])),
    )]);
    xenon.set_input_sources(sources);
    xenon.on_pointer_move(&XrPointerEvent::at(0.5, 0.5));

    for tick in 0..3 {
        driver.execute_frame(tick as f64 * 16.0).unwrap();
    }
    assert_eq!(*deltas.borrow(), vec![Vec2::new(0.0, -25.0); 3]);
}

#[test]
fn thumbstick_moves_scroll_container() {
    let driver = XrFrameDriver::new();
    let xenon = Xenon::new(config_512(), &driver).unwrap();
    xenon
        .mount(
            div().child(
                div()
                    .id("list")
                    .scroll()
                    .flex_col()
                    .size(200.0, 200.0)
                    .children((0..10).map(|_| div().h(100.0).flex_shrink_0())),
            ),
        )
        .unwrap();

    let sources = SharedInputSources::new();
    // Pulling the stick toward the user scrolls content down
    sources.set([XrInputSource::new(
        Handedness::Left,
        Some(Gamepad::with_axes(&[0.0, 0.0, 0.0, -1.0])),
    )]);
    xenon.set_input_sources(sources);
    xenon.pointer().inject_event(PointerKind::Move, 100.0, 100.0, PointerButton::Primary, 0);

    driver.execute_frame(0.0).unwrap();
    driver.execute_frame(16.0).unwrap();
    let offset = xenon
        .update(|tree| {
            let list = tree.node_by_id("list").unwrap();
            tree.scroll_offset(list)
        })
        .unwrap();
    assert_eq!(offset, Point::new(0.0, 100.0));
}

#[test]
fn resize_keeps_tree_and_rescales_input() {
    init_tracing();
    let driver = XrFrameDriver::new();
    let mut xenon = Xenon::new(config_512(), &driver).unwrap();
    xenon
        .mount(div().child(div().id("panel").size(100.0, 100.0)))
        .unwrap();
    driver.execute_frame(0.0).unwrap();

    let before = xenon.update(|tree| tree.node_by_id("panel")).unwrap();
    xenon.update(|tree| tree.set_background("panel", Color::RED));

    assert!(xenon.resize(1024, 768, 2.0).unwrap());
    driver.execute_frame(16.0).unwrap();

    assert_eq!(xenon.update(|tree| tree.node_by_id("panel")).unwrap(), before);
    assert_eq!(
        xenon.update(|tree| tree.background("panel")).unwrap(),
        Some(Color::RED)
    );

    xenon.on_pointer_move(&XrPointerEvent::at(0.5, 0.25));
    assert_eq!(xenon.pointer().last_position(0), Some(Point::new(512.0, 576.0)));

    let mut texture = CpuTexture::new();
    xenon.render_layer(&mut texture).unwrap();
    assert_eq!(texture.dimensions(), (2048, 1536));
}
