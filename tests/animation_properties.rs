use std::rc::Rc;

use glyphgrid::animation::{
    ColorAnimation, ColorBounds, ColorField, Easing, SymbolAnimation, SymbolBounds, SymbolField,
    Timeline, ValueAnimation, ValueBounds, ValueField,
};
use glyphgrid::logging::MemoryLogger;
use glyphgrid::visibility::VisibilityMask;
use glyphgrid::{interpolate_color, Color, Display, DisplayConfig, TileConfig, TileId};

fn display() -> Display {
    let config = DisplayConfig::new("anim", (20, 20), (10, 10), (4, 4));
    Display::new(config, Rc::new(MemoryLogger::new())).expect("display should build")
}

fn tile(display: &mut Display) -> TileId {
    display.create_tile(
        2.0,
        2.0,
        "@",
        Color::WHITE,
        Color::BLACK,
        0,
        &TileConfig::default(),
    )
}

#[test]
fn value_animation_lands_on_one_and_stays_there() {
    let mut display = display();
    let id = tile(&mut display);
    display.start();
    display.frame(1_000.0);
    display.add_value_animation(
        id,
        ValueAnimation::new().with(ValueField::ScaleX, Timeline::new(2.0, ValueBounds::span(0.0, 1.0))),
    );

    display.frame(2_000.0);
    assert_eq!(display.get_tile(id).unwrap().scale_x, 0.0);
    display.frame(3_000.0);
    assert_eq!(display.get_tile(id).unwrap().scale_x, 0.5);
    display.frame(4_000.0);
    assert_eq!(display.get_tile(id).unwrap().scale_x, 1.0);
    display.frame(9_000.0);
    assert_eq!(display.get_tile(id).unwrap().scale_x, 1.0);
    assert!(!display.is_animating(id));
}

#[test]
fn animation_added_while_stopped_starts_on_the_next_frame() {
    let mut display = display();
    let id = tile(&mut display);
    display.start();
    display.frame(0.0);
    display.stop();
    display.add_value_animation(
        id,
        ValueAnimation::new().with(ValueField::ScaleX, Timeline::new(1.0, ValueBounds::span(0.0, 1.0))),
    );

    display.start();
    display.frame(60_000.0);
    assert_eq!(display.get_tile(id).unwrap().scale_x, 0.0);
    display.frame(60_250.0);
    assert_eq!(display.get_tile(id).unwrap().scale_x, 0.25);
    assert!(display.is_animating(id));
}

#[test]
fn color_midpoint_with_linear_easing() {
    let mut display = display();
    let id = tile(&mut display);
    display.start();
    display.add_color_animation(
        id,
        ColorAnimation::new().starting_at(0.0).with(
            ColorField::Fg,
            Timeline::new(1.0, ColorBounds::new("#FF0000FF", "#0000FFFF")),
        ),
    );
    display.frame(500.0);
    assert_eq!(display.get_tile(id).unwrap().fg.to_hex(), "#800080FF");
}

#[test]
fn chained_color_loop_returns_to_the_first_link() {
    let mut display = display();
    let id = tile(&mut display);
    let first = Timeline::new(0.5, ColorBounds::new("#000000", "#FFFFFF"))
        .chain_looping()
        .then(Timeline::new(0.5, ColorBounds::new("#FFFFFF", "#FF0000")));
    display.add_color_animation(
        id,
        ColorAnimation::new()
            .starting_at(0.0)
            .with(ColorField::Bg, first.clone()),
    );

    display.start();
    for now in [500.0, 1_000.0, 1_500.0, 2_000.0] {
        display.frame(now);
    }
    let instance = display.color_animations().get(id).expect("instance");
    assert_eq!(instance.timeline(ColorField::Bg), Some(&first));
    assert!(instance.is_running());
}

#[test]
fn reversed_loop_repeats_after_two_periods() {
    let mut display = display();
    let id = tile(&mut display);
    display.add_value_animation(
        id,
        ValueAnimation::new().starting_at(0.0).with(
            ValueField::Rotation,
            Timeline::new(0.8, ValueBounds::shift(1.0, 2.0))
                .looping()
                .reversed(),
        ),
    );

    display.start();
    let mut rotation_at = |now: f64| {
        display.frame(now);
        display.get_tile(id).unwrap().rotation
    };
    let early = rotation_at(300.0);
    let later = rotation_at(300.0 + 1_600.0);
    assert!((early - later).abs() < 1e-9);
}

#[test]
fn symbol_animation_steps_through_glyphs() {
    let mut display = display();
    let id = tile(&mut display);
    display.add_symbol_animation(
        id,
        SymbolAnimation::new().starting_at(0.0).with(
            SymbolField::Symbol,
            Timeline::new(1.0, SymbolBounds::new(["|", "/", "-"])),
        ),
    );

    display.start();
    display.frame(100.0);
    assert_eq!(display.get_tile(id).unwrap().glyph, "|");
    display.frame(600.0);
    assert_eq!(display.get_tile(id).unwrap().glyph, "/");
    display.frame(1_000.0);
    assert_eq!(display.get_tile(id).unwrap().glyph, "-");
}

#[test]
fn stop_freezes_and_clear_forgets() {
    let mut display = display();
    let id = tile(&mut display);
    display.add_value_animation(
        id,
        ValueAnimation::new()
            .starting_at(0.0)
            .with(ValueField::X, Timeline::new(1.0, ValueBounds::span(2.0, 6.0))),
    );

    display.start();
    display.frame(250.0);
    assert_eq!(display.get_tile(id).unwrap().x, 3.0);

    display.stop_tile_animations(id);
    display.frame(750.0);
    assert_eq!(display.get_tile(id).unwrap().x, 3.0);
    assert!(display.value_animations().get(id).is_some());

    display.clear_animations(id);
    assert!(display.value_animations().get(id).is_none());
}

#[test]
fn removing_a_tile_drops_its_animations() {
    let mut display = display();
    let id = tile(&mut display);
    display.add_symbol_animation(
        id,
        SymbolAnimation::new().with(SymbolField::Symbol, Timeline::new(1.0, SymbolBounds::new(["a"]))),
    );
    display.remove_tile(id);
    assert!(display.symbol_animations().get(id).is_none());
}

#[test]
fn moving_tiles_render_when_their_destination_is_visible() {
    let mut display = display();
    let id = tile(&mut display);
    let mut mask = VisibilityMask::new(20, 20);
    mask.set(6, 2, 1.0);
    display.set_visibility_mask(mask);
    assert!(!display.is_tile_rendered(id));

    display.add_value_animation(
        id,
        ValueAnimation::new()
            .starting_at(0.0)
            .with(ValueField::X, Timeline::new(1.0, ValueBounds::shift(2.0, 4.0))),
    );
    assert!(display.is_tile_rendered(id));
}

#[test]
fn eased_progress_stays_within_bounds() {
    for easing in [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
    ] {
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(1.0), 1.0);
    }
}

#[test]
fn interpolating_a_color_with_itself_is_identity() {
    let color = Color::rgba(12, 200, 99, 140);
    for progress in [0.0, 0.3, 0.5, 1.0] {
        assert_eq!(interpolate_color(color, color, progress), color);
    }
}
