//! Frame benchmarks: full repaint of a populated world.
//! Run: cargo bench

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glyphgrid::animation::{ColorAnimation, ColorBounds, ColorField, Timeline};
use glyphgrid::logging::LogFacade;
use glyphgrid::{Color, Display, DisplayConfig, TileConfig};

fn populated_display() -> Display {
    let config = DisplayConfig::new("bench", (120, 80), (60, 40), (12, 16));
    let mut display =
        Display::new(config, Rc::new(LogFacade)).expect("create display");
    display.set_background(".", Color::rgb(60, 60, 60), Color::rgb(10, 10, 16));

    for index in 0..400 {
        let id = display.create_tile(
            f64::from(index % 60),
            f64::from(index / 60),
            "@",
            Color::rgb(255, 200, 0),
            Color::TRANSPARENT,
            1,
            &TileConfig::default(),
        );
        display.add_color_animation(
            id,
            ColorAnimation::new().with(
                ColorField::Fg,
                Timeline::new(1.0, ColorBounds::new("#FFCC00", "#FF0000"))
                    .looping()
                    .reversed(),
            ),
        );
    }
    display
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    group.sample_size(30);

    group.bench_function("animated_60x40_viewport", |b| {
        let mut display = populated_display();
        display.start();
        let mut now = 0.0;
        b.iter(|| {
            now += 16.0;
            display.frame(now);
            black_box(display.output().width())
        });
    });

    group.bench_function("update_render_canvas", |b| {
        let mut display = populated_display();
        b.iter(|| {
            display.update_render_canvas().expect("repaint");
            black_box(display.render_bounds())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
