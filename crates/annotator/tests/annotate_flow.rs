//! Batch annotation over a directory: scripted sessions, persisted records,
//! merged manifest.

use annotator::{
    annotate_directory, merge_records, read_annotation, NullCanvas, PixelPoint, ScriptedEvents,
    SessionEvent,
};
use data_contracts::Annotation;
use image::RgbImage;
use std::fs;
use std::path::Path;

fn press(x: f32, y: f32) -> SessionEvent {
    SessionEvent::Press(PixelPoint::new(x, y))
}
fn release(x: f32, y: f32) -> SessionEvent {
    SessionEvent::Release(PixelPoint::new(x, y))
}

fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
    RgbImage::new(width, height).save(dir.join(name)).unwrap();
}

#[test]
fn directory_driver_runs_one_session_per_image() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let images_dir = tmp.path().join("images");
    let out_dir = tmp.path().join("annotations");
    fs::create_dir_all(&images_dir)?;
    write_image(&images_dir, "a_page.png", 200, 100);
    write_image(&images_dir, "b_page.jpg", 100, 100);
    // Non-image files are ignored by the driver.
    fs::write(images_dir.join("notes.txt"), "skip me")?;

    // First session draws one box then quits; the second draws two, undoes
    // the last, then quits.
    let mut events = ScriptedEvents::new([
        press(10.0, 10.0),
        SessionEvent::Move(PixelPoint::new(30.0, 30.0)),
        release(50.0, 60.0),
        SessionEvent::Quit,
        press(0.0, 0.0),
        release(50.0, 50.0),
        press(60.0, 60.0),
        release(80.0, 80.0),
        SessionEvent::Undo,
        SessionEvent::Quit,
    ]);
    let mut canvas = NullCanvas;
    let summary = annotate_directory(&images_dir, &out_dir, &mut events, &mut canvas)?;
    assert_eq!(summary.annotated, 2);

    let first = read_annotation(&out_dir.join("a_page.json"))?;
    assert_eq!(first.image, "a_page.png");
    assert_eq!(first.boxes.len(), 1);
    assert_eq!(first.boxes[0].as_array(), [0.05, 0.10, 0.25, 0.60, 1.0]);

    let second = read_annotation(&out_dir.join("b_page.json"))?;
    assert_eq!(second.boxes.len(), 1);
    assert_eq!(second.boxes[0].as_array(), [0.0, 0.0, 0.5, 0.5, 1.0]);

    let manifest = tmp.path().join("annotations.json");
    let merged = merge_records(&out_dir, &manifest)?;
    assert_eq!(merged.len(), 2);
    let parsed: Vec<Annotation> = serde_json::from_slice(&fs::read(&manifest)?)?;
    assert_eq!(parsed, merged);
    Ok(())
}

#[test]
fn exhausted_event_source_still_persists_committed_boxes() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let images_dir = tmp.path().join("images");
    let out_dir = tmp.path().join("annotations");
    fs::create_dir_all(&images_dir)?;
    write_image(&images_dir, "only.png", 100, 100);

    let mut events = ScriptedEvents::new([press(10.0, 10.0), release(20.0, 20.0)]);
    let mut canvas = NullCanvas;
    annotate_directory(&images_dir, &out_dir, &mut events, &mut canvas)?;

    let record = read_annotation(&out_dir.join("only.json"))?;
    assert_eq!(record.boxes.len(), 1);
    Ok(())
}
