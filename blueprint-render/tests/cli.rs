use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

const DETECTIONS: &str = r#"{
  "id": "demo",
  "detections": [
    { "label": "wall", "confidence": 0.9, "bbox": [10, 10, 30, 20] },
    { "label": "Door", "confidence": 0.8, "bbox": [60, 20, 10, 10] },
    { "label": "room", "confidence": 0.7 }
  ]
}"#;

fn blueprint_render(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blueprint-render"))
        .args(args)
        .env_remove("BLUEPRINT_FONT_PATH")
        .env_remove("BLUEPRINT_API_URL")
        .output()
        .expect("failed to run blueprint-render")
}

fn fixtures(dir: &Path) -> (PathBuf, PathBuf) {
    let image_path = dir.join("plan.png");
    RgbaImage::from_pixel(100, 50, Rgba([30, 40, 200, 255]))
        .save(&image_path)
        .unwrap();

    let detections_path = dir.join("plan.json");
    std::fs::write(&detections_path, DETECTIONS).unwrap();
    (image_path, detections_path)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_render_writes_composited_png() {
    let dir = TempDir::new().unwrap();
    let (image_path, detections_path) = fixtures(dir.path());
    let output_path = dir.path().join("out.png");

    let output = blueprint_render(&[
        "render",
        "--image",
        path_str(&image_path),
        "--detections",
        path_str(&detections_path),
        "--width",
        "200",
        "--height",
        "100",
        "--output",
        path_str(&output_path),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let rendered = image::open(&output_path).unwrap().to_rgba8();
    assert_eq!(rendered.dimensions(), (200, 100));

    // 100x50 is not upscaled: it sits centred at (50, 25).
    assert_eq!(*rendered.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
    assert_eq!(*rendered.get_pixel(120, 70), Rgba([30, 40, 200, 255]));

    // Outer edge of the wall box stroke, [10,10,30,20] shifted by the offset.
    let edge = rendered.get_pixel(90, 55);
    assert!(edge[0] > 200 && edge[1] < 100 && edge[2] < 100, "{edge:?}");
}

#[test]
fn test_render_requires_an_image() {
    let dir = TempDir::new().unwrap();
    let (_, detections_path) = fixtures(dir.path());

    let output = blueprint_render(&["render", "--detections", path_str(&detections_path)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--image"));
}

#[test]
fn test_stats_json() {
    let dir = TempDir::new().unwrap();
    let (_, detections_path) = fixtures(dir.path());

    let output = blueprint_render(&["stats", "--detections", path_str(&detections_path), "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["by_type"]["door"], 1);
    assert!((stats["avg_confidence"].as_f64().unwrap() - 0.8).abs() < 1e-9);
}

#[test]
fn test_export_into_directory() {
    let dir = TempDir::new().unwrap();
    let (_, detections_path) = fixtures(dir.path());
    let out_dir = dir.path().join("exports");
    std::fs::create_dir(&out_dir).unwrap();

    let output = blueprint_render(&[
        "export",
        "--detections",
        path_str(&detections_path),
        "--output",
        path_str(&out_dir),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let exported = std::fs::read_to_string(out_dir.join("blueprint-detections.json")).unwrap();
    assert!(exported.starts_with("[\n  {\n"));
    let parsed: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 3);
    assert_eq!(parsed[1]["label"], "Door");
    assert!(parsed[2].get("bbox").is_none());
    assert!(String::from_utf8_lossy(&output.stderr).contains("3 detections ready to export"));
}

#[test]
fn test_upload_rejects_non_images() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("notes.png");
    std::fs::write(&bogus, "just text").unwrap();

    let output = blueprint_render(&["upload", path_str(&bogus)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a PNG or JPEG"));
}
