//! Shared data contracts for annotations and box geometry.

pub mod annotation;

pub use annotation::{Annotation, BoundingBox, ValidationError};
