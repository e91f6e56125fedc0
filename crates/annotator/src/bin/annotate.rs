use annotator::{annotate_directory, merge_records, Canvas, PixelRect};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "annotate",
    about = "Draw question boxes over page images and persist them as JSON"
)]
struct AnnotateArgs {
    /// Directory of page images to annotate.
    #[arg(long, default_value = "data/images")]
    images_dir: PathBuf,
    /// Output directory for per-image annotation records.
    #[arg(long, default_value = "data/annotations")]
    annotations_dir: PathBuf,
    /// Merged training manifest written after the last session.
    #[arg(long, default_value = "data/annotations.json")]
    manifest_out: PathBuf,
}

/// Reports rectangles through the log; a real drawing surface is outside
/// this tool's contract.
#[derive(Debug, Default)]
struct LogCanvas;

impl Canvas for LogCanvas {
    fn preview(&mut self, rect: PixelRect) {
        tracing::debug!(?rect, "preview");
    }
    fn commit(&mut self, rect: PixelRect) {
        tracing::info!(?rect, "box committed");
    }
    fn redraw(&mut self, rects: &[PixelRect]) {
        tracing::info!(boxes = rects.len(), "redraw");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = AnnotateArgs::parse();

    let mut events = annotator::events::stdin_events();
    let mut canvas = LogCanvas;
    let summary = annotate_directory(
        &args.images_dir,
        &args.annotations_dir,
        &mut events,
        &mut canvas,
    )?;
    merge_records(&args.annotations_dir, &args.manifest_out)?;
    tracing::info!(
        annotated = summary.annotated,
        manifest = %args.manifest_out.display(),
        "annotation complete"
    );
    Ok(())
}
