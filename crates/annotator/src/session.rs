//! The box-drawing state machine.

use crate::events::EventSource;
use data_contracts::{Annotation, BoundingBox};

/// Pointer position in image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in image pixels, used only for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// One pointer or keyboard event delivered to a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Press(PixelPoint),
    Move(PixelPoint),
    Release(PixelPoint),
    Undo,
    Quit,
}

/// Drawing state: waiting for a press, or dragging from an anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Idle,
    Drawing { anchor: PixelPoint },
}

/// Rendering surface for a session. Implementations draw rectangles in
/// image-pixel coordinates; the state machine never renders on its own.
pub trait Canvas {
    /// Draw the in-progress rectangle while the pointer is held.
    fn preview(&mut self, rect: PixelRect);
    /// Draw a newly committed rectangle.
    fn commit(&mut self, rect: PixelRect);
    /// Clear and redraw every committed rectangle.
    fn redraw(&mut self, rects: &[PixelRect]);
}

/// Canvas that draws nothing. Used by tests and headless replays.
#[derive(Debug, Default)]
pub struct NullCanvas;

impl Canvas for NullCanvas {
    fn preview(&mut self, _rect: PixelRect) {}
    fn commit(&mut self, _rect: PixelRect) {}
    fn redraw(&mut self, _rects: &[PixelRect]) {}
}

/// Single-image annotation session. Pointer coordinates are clamped to the
/// image bounds before normalization, so every committed box satisfies the
/// `BoundingBox` invariants.
#[derive(Debug)]
pub struct AnnotationSession {
    image: String,
    width: u32,
    height: u32,
    state: SessionState,
    boxes: Vec<BoundingBox>,
    finished: bool,
}

impl AnnotationSession {
    pub fn new(image: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            image: image.into(),
            width: width.max(1),
            height: height.max(1),
            state: SessionState::Idle,
            boxes: Vec::new(),
            finished: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one event and render the result. Returns `false` once the
    /// session has quit.
    pub fn handle(&mut self, event: SessionEvent, canvas: &mut dyn Canvas) -> bool {
        match event {
            SessionEvent::Press(p) => {
                self.state = SessionState::Drawing {
                    anchor: self.clamp(p),
                };
            }
            SessionEvent::Move(p) => {
                // Moves without a held button never touch the box list.
                if let SessionState::Drawing { anchor } = self.state {
                    canvas.preview(rect_between(anchor, self.clamp(p)));
                }
            }
            SessionEvent::Release(p) => {
                if let SessionState::Drawing { anchor } = self.state {
                    let rect = rect_between(anchor, self.clamp(p));
                    self.boxes.push(self.normalize(rect));
                    self.state = SessionState::Idle;
                    canvas.commit(rect);
                }
            }
            SessionEvent::Undo => {
                if self.boxes.pop().is_some() {
                    let rects: Vec<PixelRect> =
                        self.boxes.iter().map(|b| self.denormalize(b)).collect();
                    canvas.redraw(&rects);
                }
            }
            SessionEvent::Quit => {
                self.finished = true;
            }
        }
        !self.finished
    }

    /// The finished record: image basename plus boxes in drawing order.
    pub fn into_annotation(self) -> Annotation {
        Annotation {
            image: self.image,
            boxes: self.boxes,
        }
    }

    fn clamp(&self, p: PixelPoint) -> PixelPoint {
        PixelPoint {
            x: p.x.clamp(0.0, self.width as f32),
            y: p.y.clamp(0.0, self.height as f32),
        }
    }

    fn normalize(&self, rect: PixelRect) -> BoundingBox {
        BoundingBox {
            x1: rect.x1 / self.width as f32,
            y1: rect.y1 / self.height as f32,
            x2: rect.x2 / self.width as f32,
            y2: rect.y2 / self.height as f32,
            confidence: 1.0,
        }
    }

    fn denormalize(&self, b: &BoundingBox) -> PixelRect {
        PixelRect {
            x1: b.x1 * self.width as f32,
            y1: b.y1 * self.height as f32,
            x2: b.x2 * self.width as f32,
            y2: b.y2 * self.height as f32,
        }
    }
}

fn rect_between(a: PixelPoint, b: PixelPoint) -> PixelRect {
    PixelRect {
        x1: a.x.min(b.x),
        y1: a.y.min(b.y),
        x2: a.x.max(b.x),
        y2: a.y.max(b.y),
    }
}

/// Drive one session over a blocking event source until quit or the source
/// runs dry. Each event is handled and rendered before the next is read.
pub fn run_session(
    session: &mut AnnotationSession,
    events: &mut dyn EventSource,
    canvas: &mut dyn Canvas,
) {
    while let Some(event) = events.next_event() {
        if !session.handle(event, canvas) {
            break;
        }
    }
}
