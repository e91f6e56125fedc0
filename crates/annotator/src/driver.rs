//! Sequential batch annotation over an image directory.

use crate::events::EventSource;
use crate::persist::{write_annotation, AnnotatorError, AnnotatorResult};
use crate::session::{run_session, AnnotationSession, Canvas};
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Collect the annotatable images under `dir`, sorted by path.
pub fn list_images(dir: &Path) -> AnnotatorResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| AnnotatorError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut images: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        })
        .collect();
    images.sort();
    Ok(images)
}

#[derive(Debug, Default)]
pub struct AnnotateSummary {
    pub annotated: usize,
    pub records: Vec<PathBuf>,
}

/// Run one blocking annotation session per image, sequentially, writing one
/// record per image. Only the image under edit is held at any point.
pub fn annotate_directory(
    images_dir: &Path,
    out_dir: &Path,
    events: &mut dyn EventSource,
    canvas: &mut dyn Canvas,
) -> AnnotatorResult<AnnotateSummary> {
    let mut summary = AnnotateSummary::default();
    for image in list_images(images_dir)? {
        let (width, height) =
            image::image_dimensions(&image).map_err(|e| AnnotatorError::Image {
                path: image.clone(),
                source: e,
            })?;
        let name = image
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        tracing::info!(image = %name, width, height, "annotating");

        let mut session = AnnotationSession::new(name, width, height);
        run_session(&mut session, events, canvas);
        let annotation = session.into_annotation();
        let path = write_annotation(out_dir, &image, &annotation)?;
        summary.annotated += 1;
        summary.records.push(path);
    }
    Ok(summary)
}
