//! Fixed-shape image preprocessing.

use crate::types::{DatasetError, DatasetResult, PageTensor};
use image::imageops::FilterType;
use std::path::Path;

/// Input resolution the detector trains at.
pub const TRAIN_SIZE: (u32, u32) = (640, 640);

/// Normalizes arbitrary page images into fixed-shape tensors. The resize
/// stretches to the target size regardless of aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    target_size: (u32, u32),
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            target_size: TRAIN_SIZE,
        }
    }
}

impl Preprocessor {
    pub fn new(target_size: (u32, u32)) -> Self {
        Self { target_size }
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.target_size
    }

    /// Decode and normalize one page image. Mode conversion (grayscale,
    /// alpha) happens before the resize.
    pub fn load(&self, path: &Path) -> DatasetResult<PageTensor> {
        let img = image::open(path).map_err(|e| DatasetError::Image {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(self.from_rgb(img.to_rgb8()))
    }

    /// Normalize an already-decoded RGB image.
    pub fn from_rgb(&self, img: image::RgbImage) -> PageTensor {
        let (w, h) = self.target_size;
        let resized = if img.dimensions() == (w, h) {
            img
        } else {
            image::imageops::resize(&img, w, h, FilterType::Triangle)
        };

        let plane = (w * h) as usize;
        let mut data = vec![0.0f32; plane * PageTensor::CHANNELS];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let base = (y * w + x) as usize;
            data[base] = pixel[0] as f32 / 255.0;
            data[plane + base] = pixel[1] as f32 / 255.0;
            data[2 * plane + base] = pixel[2] as f32 / 255.0;
        }

        PageTensor {
            data,
            width: w,
            height: h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
        }
        img
    }

    #[test]
    fn output_has_fixed_shape_and_unit_range() {
        let pre = Preprocessor::new((64, 64));
        for (w, h) in [(10, 10), (300, 120), (64, 64), (1, 1)] {
            let tensor = pre.from_rgb(gradient(w, h));
            assert_eq!(tensor.width, 64);
            assert_eq!(tensor.height, 64);
            assert_eq!(tensor.data.len(), 64 * 64 * 3);
            assert!(tensor.data.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let pre = Preprocessor::new((32, 32));
        let a = pre.from_rgb(gradient(100, 50));
        let b = pre.from_rgb(gradient(100, 50));
        assert_eq!(a, b);
    }

    #[test]
    fn default_targets_the_training_resolution() {
        assert_eq!(Preprocessor::default().target_size(), (640, 640));
    }

    #[test]
    fn grayscale_images_convert_before_resize() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gray.png");
        let gray = image::GrayImage::from_pixel(20, 30, image::Luma([200]));
        gray.save(&path).unwrap();

        let tensor = Preprocessor::new((16, 16)).load(&path).unwrap();
        assert_eq!(tensor.data.len(), 16 * 16 * 3);
        let plane = 16 * 16;
        // All three channels carry the gray value.
        assert!((tensor.data[0] - tensor.data[plane]).abs() < 1e-6);
        assert!((tensor.data[0] - tensor.data[2 * plane]).abs() < 1e-6);
    }

    #[test]
    fn corrupt_file_surfaces_an_image_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = Preprocessor::default().load(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Image { .. }));
    }
}
