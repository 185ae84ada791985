//! Placement-frame detection on template bitmaps.
//!
//! Branded templates print a dark-bordered box where the QR panel belongs.
//! Detection is a heuristic threshold scan, so it lives behind a trait; a
//! template format with explicit coordinates can swap in its own strategy
//! without touching layout or composition.

use image::RgbImage;
use tracing::debug;

/// Detected placement region, in template pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBbox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl FrameBbox {
    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }
}

pub trait FrameDetector {
    /// `None` means no usable frame; callers fall back to default layout.
    fn detect(&self, background: &RgbImage) -> Option<FrameBbox>;
}

/// Scans for dark pixels in the region where the frame is printed: the left
/// 65% of the width, lower 75% of the height. The resulting bounding box is
/// inset to exclude the frame's own border stroke.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdFrameDetector {
    /// A pixel is "dark" when all three channels are below this.
    pub threshold: u8,
    /// Pixels shaved off each side of the raw bounding box.
    pub inset: u32,
}

impl Default for ThresholdFrameDetector {
    fn default() -> Self {
        ThresholdFrameDetector { threshold: 90, inset: 10 }
    }
}

impl FrameDetector for ThresholdFrameDetector {
    fn detect(&self, background: &RgbImage) -> Option<FrameBbox> {
        let (width, height) = background.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        let end_x = ((width as f32 * 0.65) as u32).min(width - 1);
        let start_y = ((height as f32 * 0.25) as u32).min(height - 1);

        let mut min_x = width;
        let mut min_y = height;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut found = false;

        for y in start_y..height {
            for x in 0..=end_x {
                let p = background.get_pixel(x, y);
                if p[0] < self.threshold && p[1] < self.threshold && p[2] < self.threshold {
                    found = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if !found {
            return None;
        }

        let inset = self.inset as i64;
        let min_x = min_x as i64 + inset;
        let min_y = min_y as i64 + inset;
        let max_x = max_x as i64 - inset;
        let max_y = max_y as i64 - inset;
        if max_x <= min_x || max_y <= min_y {
            // the box was all border stroke
            return None;
        }

        let bbox = FrameBbox {
            min_x: min_x as u32,
            min_y: min_y as u32,
            max_x: max_x as u32,
            max_y: max_y as u32,
        };
        debug!(?bbox, "detected placement frame");
        Some(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn white(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    #[test]
    fn all_white_image_has_no_frame() {
        assert!(ThresholdFrameDetector::default().detect(&white(200, 200)).is_none());
    }

    #[test]
    fn finds_dark_box_in_scan_region() {
        let mut img = white(400, 400);
        // 100x100 dark square in the lower-left quadrant
        for y in 200..300 {
            for x in 50..150 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let bbox = ThresholdFrameDetector::default().detect(&img).unwrap();
        assert_eq!(bbox, FrameBbox { min_x: 60, min_y: 210, max_x: 139, max_y: 289 });
        assert_eq!(bbox.width(), 79);
        assert_eq!(bbox.height(), 79);
    }

    #[test]
    fn ignores_dark_pixels_outside_scan_region() {
        let mut img = white(400, 400);
        // top-right corner: right of 65% width and above 25% height
        for y in 0..40 {
            for x in 320..400 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        assert!(ThresholdFrameDetector::default().detect(&img).is_none());
    }

    #[test]
    fn thin_stroke_collapses_under_inset() {
        let mut img = white(400, 400);
        // 15px tall bar: inset of 10 per side eats it
        for y in 200..215 {
            for x in 50..250 {
                img.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }
        assert!(ThresholdFrameDetector::default().detect(&img).is_none());
    }

    #[test]
    fn bright_pixels_are_not_dark() {
        let mut img = white(400, 400);
        // one channel over threshold disqualifies the pixel
        for y in 200..300 {
            for x in 50..150 {
                img.put_pixel(x, y, Rgb([10, 120, 10]));
            }
        }
        assert!(ThresholdFrameDetector::default().detect(&img).is_none());
    }
}
