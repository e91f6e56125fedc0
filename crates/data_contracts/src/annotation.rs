use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One human-drawn question region, normalized to the unit square.
///
/// On the wire a box is the 5-element array `[x1, y1, x2, y2, confidence]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 5]", into = "[f32; 5]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl From<[f32; 5]> for BoundingBox {
    fn from(v: [f32; 5]) -> Self {
        Self {
            x1: v[0],
            y1: v[1],
            x2: v[2],
            y2: v[3],
            confidence: v[4],
        }
    }
}

impl From<BoundingBox> for [f32; 5] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2, b.confidence]
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("box coordinate out of [0,1]: {0:?}")]
    CoordOutOfRange([f32; 4]),
    #[error("box min exceeds max: {0:?}")]
    InvertedBox([f32; 4]),
    #[error("confidence out of [0,1]: {0}")]
    InvalidConfidence(f32),
    #[error("missing image filename")]
    MissingImage,
}

impl BoundingBox {
    pub fn as_array(&self) -> [f32; 5] {
        (*self).into()
    }

    pub fn coords(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Invariants: finite coordinates in [0,1], min <= max per axis,
    /// confidence in [0,1]. Violations are rejected, never repaired.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let coords = self.coords();
        if coords.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
            return Err(ValidationError::CoordOutOfRange(coords));
        }
        if self.x1 > self.x2 || self.y1 > self.y2 {
            return Err(ValidationError::InvertedBox(coords));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::InvalidConfidence(self.confidence));
        }
        Ok(())
    }
}

/// All boxes drawn over one page image, in drawing order. Records are
/// written once per image and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Image basename, e.g. `page_007.png`.
    pub image: String,
    pub boxes: Vec<BoundingBox>,
}

impl Annotation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.image.trim().is_empty() {
            return Err(ValidationError::MissingImage);
        }
        for b in &self.boxes {
            b.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(v: [f32; 5]) -> BoundingBox {
        BoundingBox::from(v)
    }

    #[test]
    fn annotation_round_trips_with_box_order_preserved() {
        let annotation = Annotation {
            image: "page_001.png".to_string(),
            boxes: vec![
                boxed([0.05, 0.10, 0.25, 0.60, 1.0]),
                boxed([0.5, 0.5, 0.9, 0.7, 1.0]),
            ],
        };
        let json = serde_json::to_string(&annotation).unwrap();
        let parsed: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, annotation);
    }

    #[test]
    fn boxes_serialize_as_flat_arrays() {
        let annotation = Annotation {
            image: "p.png".to_string(),
            boxes: vec![boxed([0.0, 0.0, 1.0, 1.0, 1.0])],
        };
        let json = serde_json::to_string(&annotation).unwrap();
        assert_eq!(json, r#"{"image":"p.png","boxes":[[0.0,0.0,1.0,1.0,1.0]]}"#);
    }

    #[test]
    fn validate_rejects_inverted_and_out_of_range_boxes() {
        assert!(matches!(
            boxed([0.5, 0.1, 0.2, 0.6, 1.0]).validate(),
            Err(ValidationError::InvertedBox(_))
        ));
        assert!(matches!(
            boxed([-0.1, 0.0, 0.5, 0.5, 1.0]).validate(),
            Err(ValidationError::CoordOutOfRange(_))
        ));
        assert!(matches!(
            boxed([0.0, 0.0, 0.5, 0.5, 1.5]).validate(),
            Err(ValidationError::InvalidConfidence(_))
        ));
        assert!(boxed([0.0, 0.0, 0.5, 0.5, 1.0]).validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_image_name() {
        let annotation = Annotation {
            image: "  ".to_string(),
            boxes: Vec::new(),
        };
        assert!(matches!(
            annotation.validate(),
            Err(ValidationError::MissingImage)
        ));
    }
}
