use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

const SCENE: &str = r##"
display:
  surface_id: demo
  cell_width: 6
  cell_height: 8
  world_width: 16
  world_height: 10
  viewport_width: 8
  viewport_height: 6
background: { glyph: ".", fg: "#444444", bg: "#101010" }
tiles:
  - { name: hero, x: 2, y: 2, glyph: "@", fg: "#FFCC00", z: 3 }
animations:
  - kind: color
    tile: hero
    fields:
      bg: { duration: 0.5, start: "#000000", end: "#FF0000", loop: true, reverse: true }
viewport: { x: 1, y: 1 }
"##;

fn write_scene(path: &Path, yaml: &str) {
    fs::write(path, yaml).expect("scene should write");
}

fn run_glyphgrid(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_glyphgrid"))
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("glyphgrid command should run")
}

#[test]
fn check_prints_a_summary() {
    let dir = tempdir().expect("tempdir should create");
    write_scene(&dir.path().join("scene.yaml"), SCENE);

    let output = run_glyphgrid(dir.path(), &["check", "scene.yaml"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("16x10 world"));
    assert!(stdout.contains("animations: 1"));
}

#[test]
fn check_json_reports_the_scene() {
    let dir = tempdir().expect("tempdir should create");
    write_scene(&dir.path().join("scene.yaml"), SCENE);

    let output = run_glyphgrid(dir.path(), &["check", "scene.yaml", "--json"]);
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(body["ok"], true);
    assert_eq!(body["scene"]["world"], serde_json::json!([16, 10]));
    assert_eq!(body["scene"]["tiles"], 1);
}

#[test]
fn check_json_emits_an_error_envelope() {
    let dir = tempdir().expect("tempdir should create");
    write_scene(
        &dir.path().join("scene.yaml"),
        &SCENE.replace("world_width: 16", "world_width: 0"),
    );

    let output = run_glyphgrid(dir.path(), &["check", "scene.yaml", "--json"]);
    assert!(!output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "DISPLAY_CONFIG_INVALID");
    assert_eq!(body["error"]["kind"], "config");
    assert_eq!(body["error"]["details"]["field"], "world_width");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn check_rejects_unknown_animation_targets() {
    let dir = tempdir().expect("tempdir should create");
    write_scene(
        &dir.path().join("scene.yaml"),
        &SCENE.replace("tile: hero", "tile: ghost"),
    );

    let output = run_glyphgrid(dir.path(), &["check", "scene.yaml", "--json"]);
    assert!(!output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(body["error"]["code"], "SCENE_INVALID");
}

#[test]
fn render_exits_with_the_config_status_on_an_invalid_scene() {
    let dir = tempdir().expect("tempdir should create");
    write_scene(
        &dir.path().join("scene.yaml"),
        &SCENE.replace("cell_width: 6", "cell_width: 0"),
    );

    let output = run_glyphgrid(dir.path(), &["render", "scene.yaml", "-o", "frames"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("DISPLAY_CONFIG_INVALID"));
}

#[test]
fn render_writes_one_png_per_frame() {
    let dir = tempdir().expect("tempdir should create");
    write_scene(&dir.path().join("scene.yaml"), SCENE);

    let output = run_glyphgrid(
        dir.path(),
        &["render", "scene.yaml", "-o", "frames", "--frames", "4", "--fps", "10"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let frames = dir.path().join("frames");
    let mut names = fs::read_dir(&frames)
        .expect("frames dir should exist")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(
        names,
        vec![
            "frame_00000.png",
            "frame_00001.png",
            "frame_00002.png",
            "frame_00003.png"
        ]
    );

    let first = image::open(frames.join("frame_00000.png")).expect("png should decode");
    assert_eq!((first.width(), first.height()), (8 * 6, 6 * 8));
}

#[test]
fn render_fails_cleanly_on_a_missing_font() {
    let dir = tempdir().expect("tempdir should create");
    write_scene(&dir.path().join("scene.yaml"), SCENE);

    let output = run_glyphgrid(
        dir.path(),
        &["render", "scene.yaml", "-o", "frames", "--font", "missing.ttf"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.ttf"));
}
