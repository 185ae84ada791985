//! Payload-to-matrix rendering.
//!
//! The module raster is drawn at a fixed pixel-per-module scale and scaled
//! to its final size later with nearest-neighbor, so module edges stay hard.

use image::{Rgb, RgbImage};
use qrcode::{EcLevel, QrCode};

use crate::error::GenError;

/// Quiet-zone width in modules, per the QR spec.
pub const QUIET_ZONE_MODULES: u32 = 4;

const MODULE_PX: u32 = 8;
const DARK: Rgb<u8> = Rgb([0, 0, 0]);
const LIGHT: Rgb<u8> = Rgb([255, 255, 255]);

/// Encode the payload into a QR matrix (error-correction level M) and
/// rasterize it with the quiet zone included.
pub fn generate_qr(payload: &str) -> Result<RgbImage, GenError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| GenError::Image(format!("qr encode: {e}")))?;
    Ok(render_modules(&code, MODULE_PX, QUIET_ZONE_MODULES))
}

fn render_modules(code: &QrCode, module_px: u32, margin: u32) -> RgbImage {
    let width_modules = code.width() as u32;
    let total_modules = width_modules + 2 * margin;
    let size = total_modules * module_px;

    let mut img = RgbImage::from_pixel(size, size, LIGHT);
    for y in 0..width_modules {
        for x in 0..width_modules {
            if !matches!(code[(x as usize, y as usize)], qrcode::Color::Dark) {
                continue;
            }
            let px0 = (x + margin) * module_px;
            let py0 = (y + margin) * module_px;
            for py in py0..(py0 + module_px) {
                for px in px0..(px0 + module_px) {
                    img.put_pixel(px, py, DARK);
                }
            }
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_is_square_with_quiet_zone() {
        let img = generate_qr("00020101021138...").unwrap();
        assert_eq!(img.width(), img.height());
        // quiet zone rows are all light
        for x in 0..img.width() {
            assert_eq!(*img.get_pixel(x, 0), LIGHT);
        }
        // finder pattern corner is dark just past the quiet zone
        let inset = QUIET_ZONE_MODULES * MODULE_PX;
        assert_eq!(*img.get_pixel(inset, inset), DARK);
    }

    #[test]
    fn raster_is_deterministic() {
        let a = generate_qr("hello").unwrap();
        let b = generate_qr("hello").unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
