//! End-to-end manifest loading: JSON records → preprocessed labeled samples.

use image::{Rgb, RgbImage};
use page_dataset::{
    load_labeled_samples, load_manifest, target_vector, DatasetError, Preprocessor,
};
use std::fs;
use std::path::Path;

fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
    let mut img = RgbImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = Rgb([90, 120, 200]);
    }
    img.save(dir.join(name)).unwrap();
}

#[test]
fn manifest_records_become_labeled_samples() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let images_dir = tmp.path().join("images");
    fs::create_dir_all(&images_dir)?;
    write_image(&images_dir, "page_a.png", 40, 30);
    write_image(&images_dir, "page_b.png", 17, 52);

    let manifest_path = tmp.path().join("annotations.json");
    fs::write(
        &manifest_path,
        r#"[
            {"image": "page_a.png", "boxes": [[0.1, 0.2, 0.5, 0.6, 1.0], [0.3, 0.3, 0.4, 0.4, 1.0]]},
            {"image": "page_b.png", "boxes": []}
        ]"#,
    )?;

    let entries = load_manifest(&manifest_path)?;
    assert_eq!(entries.len(), 2);
    assert_eq!(target_vector(&entries[0]), [0.1, 0.2, 0.5, 0.6, 1.0]);
    assert_eq!(target_vector(&entries[1]), [0.0; 5]);

    let pre = Preprocessor::new((16, 16));
    let samples = load_labeled_samples(&images_dir, &entries, &pre, false)?;
    assert_eq!(samples.len(), 2);
    for sample in &samples {
        assert_eq!(sample.tensor.data.len(), 16 * 16 * 3);
        assert!(sample.tensor.data.iter().all(|v| (0.0..=1.0).contains(v)));
    }
    Ok(())
}

#[test]
fn missing_manifest_fails_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_manifest(&tmp.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, DatasetError::Io { .. }));
}

#[test]
fn malformed_manifest_fails_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("annotations.json");
    fs::write(&path, "{ not json").unwrap();
    let err = load_manifest(&path).unwrap_err();
    assert!(matches!(err, DatasetError::Json { .. }));
}

#[test]
fn invalid_boxes_are_rejected_not_repaired() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("annotations.json");
    fs::write(
        &path,
        r#"[{"image": "p.png", "boxes": [[0.9, 0.1, 0.2, 0.6, 1.0]]}]"#,
    )
    .unwrap();
    let err = load_manifest(&path).unwrap_err();
    assert!(matches!(err, DatasetError::Validation { .. }));
}

#[test]
fn permissive_loading_skips_unreadable_images_only() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let images_dir = tmp.path().join("images");
    fs::create_dir_all(&images_dir)?;
    write_image(&images_dir, "good.png", 20, 20);

    let manifest_path = tmp.path().join("annotations.json");
    fs::write(
        &manifest_path,
        r#"[
            {"image": "good.png", "boxes": [[0.1, 0.1, 0.2, 0.2, 1.0]]},
            {"image": "gone.png", "boxes": [[0.1, 0.1, 0.2, 0.2, 1.0]]}
        ]"#,
    )?;
    let entries = load_manifest(&manifest_path)?;
    let pre = Preprocessor::new((8, 8));

    let samples = load_labeled_samples(&images_dir, &entries, &pre, true)?;
    assert_eq!(samples.len(), 1);

    let err = load_labeled_samples(&images_dir, &entries, &pre, false).unwrap_err();
    assert!(matches!(err, DatasetError::Image { .. }));
    Ok(())
}
