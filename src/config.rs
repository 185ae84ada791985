//! Per-call render configuration.
//!
//! Everything here is a read-only lookup passed explicitly into the pipeline;
//! the core never consults ambient state. Callers typically deserialize this
//! from whatever config layer they own.

use std::path::PathBuf;

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::GenError;

pub const DEFAULT_BORDER_COLOR: &str = "#0B5B3E";

fn default_font_px() -> f32 {
    16.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Branded background the panel is pasted onto. Must decode to RGB.
    pub template_path: PathBuf,
    /// Explicit panel position overrides, in template pixels.
    #[serde(default)]
    pub panel_x: Option<i32>,
    #[serde(default)]
    pub panel_y: Option<i32>,
    /// Explicit QR edge length override; the 120px floor still applies.
    #[serde(default)]
    pub qr_size: Option<u32>,
    /// Optional TTF for panel labels. Without one, a built-in bitmap face
    /// is used.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Pixel size for the TTF face; ignored for the bitmap face.
    #[serde(default = "default_font_px")]
    pub font_px: f32,
    /// Panel border color as `#RRGGBB`.
    #[serde(default)]
    pub border_color: Option<String>,
}

impl RenderConfig {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        RenderConfig {
            template_path: template_path.into(),
            panel_x: None,
            panel_y: None,
            qr_size: None,
            font_path: None,
            font_px: default_font_px(),
            border_color: None,
        }
    }

    pub fn border_rgb(&self) -> Result<Rgb<u8>, GenError> {
        parse_hex_color(self.border_color.as_deref().unwrap_or(DEFAULT_BORDER_COLOR))
    }
}

pub fn parse_hex_color(s: &str) -> Result<Rgb<u8>, GenError> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 {
        return Err(GenError::Image(format!("invalid color: {s}")));
    }
    let bytes = hex::decode(s).map_err(|_| GenError::Image(format!("invalid color: {s}")))?;
    Ok(Rgb([bytes[0], bytes[1], bytes[2]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_border_is_dark_green() {
        let cfg = RenderConfig::new("bg.png");
        assert_eq!(cfg.border_rgb().unwrap(), Rgb([0x0B, 0x5B, 0x3E]));
    }

    #[test]
    fn hex_color_parsing() {
        assert_eq!(parse_hex_color("#FF0080").unwrap(), Rgb([255, 0, 128]));
        assert_eq!(parse_hex_color("ff0080").unwrap(), Rgb([255, 0, 128]));
        assert!(parse_hex_color("#FFF").is_err());
        assert!(parse_hex_color("zzzzzz").is_err());
    }
}
