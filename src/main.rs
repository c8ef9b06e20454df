use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use tiny_skia::Pixmap;

use glyphgrid::display::SteppedClock;
use glyphgrid::error_codes::{exit_code_for, find_coded_error, CodedError, SCENE_INVALID};
use glyphgrid::logging::StderrLogger;
use glyphgrid::scene::load_scene;

#[derive(Debug, Parser)]
#[command(name = "glyphgrid")]
#[command(about = "Validate and render tile-grid scenes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse and validate a scene without rendering it.
    Check {
        scene: PathBuf,
        /// Print a JSON result instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Run a scene through the frame loop and write one PNG per frame.
    Render {
        scene: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long, default_value_t = 30)]
        frames: u64,
        #[arg(long, default_value_t = 30)]
        fps: u32,
        /// Font file overriding the scene's.
        #[arg(long)]
        font: Option<PathBuf>,
        #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
        verbose: u8,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("Error: {error:#}");
        std::process::exit(exit_code_for(&error));
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { scene, json } => run_check(&scene, json),
        Commands::Render {
            scene,
            output,
            frames,
            fps,
            font,
            verbose,
        } => run_render(&scene, &output, frames, fps, font.as_deref(), verbose),
    }
}

fn run_check(scene_path: &Path, json: bool) -> Result<()> {
    let result = load_scene(scene_path);
    if !json {
        let scene = result?;
        let summary = scene.summary();
        println!(
            "OK: {} ({}x{} world, {}x{} viewport)",
            scene_path.display(),
            summary.world[0],
            summary.world[1],
            summary.viewport[0],
            summary.viewport[1]
        );
        println!(
            "Tiles: {}, strings: {}, animations: {}",
            summary.tiles, summary.strings, summary.animations
        );
        return Ok(());
    }

    match result {
        Ok(scene) => {
            let body = json!({ "ok": true, "scene": scene.summary() });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(error) => {
            let envelope = match find_coded_error(&error) {
                Some(coded) => {
                    let mut coded = coded.clone();
                    coded.message = format!("{error:#}");
                    coded.envelope()
                }
                None => CodedError::config(SCENE_INVALID, format!("{error:#}")).envelope(),
            };
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            std::process::exit(envelope.error.kind.exit_code());
        }
    }
}

fn run_render(
    scene_path: &Path,
    output: &Path,
    frames: u64,
    fps: u32,
    font: Option<&Path>,
    verbose: u8,
) -> Result<()> {
    let scene = load_scene(scene_path)?;
    let base_dir = scene_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let logger = Rc::new(StderrLogger::from_verbosity(verbose));
    let (mut display, _) = scene.build_display(&base_dir, font, logger)?;

    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;

    let failure: Rc<RefCell<Option<anyhow::Error>>> = Rc::default();
    let written = Rc::new(Cell::new(0_u64));
    {
        let failure = Rc::clone(&failure);
        let written = Rc::clone(&written);
        let output = output.to_path_buf();
        display.add_frame_callback(move |display, _now| {
            let index = written.get();
            let path = output.join(format!("frame_{index:05}.png"));
            if let Err(error) = write_png(display.output(), &path) {
                failure.borrow_mut().get_or_insert(error);
                display.stop();
                return;
            }
            written.set(index + 1);
        });
    }

    display.run(&mut SteppedClock::new(fps, frames));

    let failure = failure.borrow_mut().take();
    if let Some(error) = failure {
        return Err(error);
    }
    println!("Wrote {} frames to {}", written.get(), output.display());
    Ok(())
}

fn write_png(pixmap: &Pixmap, path: &Path) -> Result<()> {
    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect::<Vec<_>>();
    let image = image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
        .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", pixmap.width(), pixmap.height()))?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}
