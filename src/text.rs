//! Text faces backing panel labels.
//!
//! Two backends: a TTF face via `rusttype` when the caller configures a font
//! file, and a built-in scaled 5x7 bitmap face that needs no assets. Both
//! answer the same two questions the layout engine asks: how big is a line,
//! and draw it here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rusttype::{point, Font, Scale};

use crate::config::RenderConfig;
use crate::error::GenError;

static FONT_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Font<'static>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Load and parse a TTF, memoized per path for the life of the process.
pub fn load_font_cached(path: &Path) -> Result<Arc<Font<'static>>, GenError> {
    if let Some(f) = FONT_CACHE.lock().get(path) {
        return Ok(Arc::clone(f));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| GenError::Font(format!("failed to read {}: {e}", path.display())))?;
    let font = Font::try_from_vec(bytes)
        .ok_or_else(|| GenError::Font(format!("failed to parse {}", path.display())))?;

    let font = Arc::new(font);
    FONT_CACHE.lock().insert(path.to_path_buf(), Arc::clone(&font));
    Ok(font)
}

#[derive(Clone)]
pub enum TextFace {
    /// Built-in 5x7 glyphs enlarged by `scale`.
    Bitmap { scale: u32 },
    Truetype { font: Arc<Font<'static>>, px: f32 },
}

impl Default for TextFace {
    fn default() -> Self {
        TextFace::Bitmap { scale: 2 }
    }
}

impl TextFace {
    pub fn from_config(cfg: &RenderConfig) -> Result<Self, GenError> {
        match &cfg.font_path {
            Some(path) => Ok(TextFace::Truetype {
                font: load_font_cached(path)?,
                px: cfg.font_px,
            }),
            None => Ok(TextFace::default()),
        }
    }

    /// Rendered pixel size of a single line. Empty text measures (0, 0).
    pub fn line_size(&self, text: &str) -> (u32, u32) {
        if text.is_empty() {
            return (0, 0);
        }
        match self {
            TextFace::Bitmap { scale } => {
                let n = text.chars().count() as u32;
                // glyph + 1 column of spacing, no trailing spacer
                (n * (GLYPH_W + 1) * scale - scale, GLYPH_H * scale)
            }
            TextFace::Truetype { font, px } => {
                let scale = Scale::uniform(*px);
                let v = font.v_metrics(scale);
                let mut width = 0f32;
                for g in font.layout(text, scale, point(0.0, v.ascent)) {
                    if let Some(bb) = g.pixel_bounding_box() {
                        width = width.max(bb.max.x as f32);
                    }
                }
                let height = (v.ascent - v.descent).ceil() as u32;
                (width.ceil() as u32, height)
            }
        }
    }

    /// Draw one line with its top-left corner at (x, y).
    pub fn draw_line(&self, img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        match self {
            TextFace::Bitmap { scale } => {
                let mut cx = x;
                let advance = ((GLYPH_W + 1) * scale) as i32;
                for ch in text.chars() {
                    draw_bitmap_glyph(img, cx, y, ch, color, *scale);
                    cx += advance;
                }
            }
            TextFace::Truetype { font, px } => {
                draw_truetype_line(img, font, *px, x, y, color, text);
            }
        }
    }
}

fn draw_truetype_line(
    img: &mut RgbImage,
    font: &Font<'static>,
    px: f32,
    x: i32,
    y: i32,
    color: Rgb<u8>,
    text: &str,
) {
    let scale = Scale::uniform(px);
    let v = font.v_metrics(scale);
    let baseline = y as f32 + v.ascent;
    let mut caret = x as f32;

    for ch in text.chars() {
        let glyph = font.glyph(ch).scaled(scale).positioned(point(caret, baseline));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, cov| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= img.width() || py >= img.height() {
                    return;
                }
                let a = cov.clamp(0.0, 1.0);
                if a <= 0.0 {
                    return;
                }
                let dst = img.get_pixel_mut(px, py);
                let inv = 1.0 - a;
                dst.0[0] = (color.0[0] as f32 * a + dst.0[0] as f32 * inv) as u8;
                dst.0[1] = (color.0[1] as f32 * a + dst.0[1] as f32 * inv) as u8;
                dst.0[2] = (color.0[2] as f32 * a + dst.0[2] as f32 * inv) as u8;
            });
        }
        caret += glyph.unpositioned().h_metrics().advance_width;
    }
}

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;

// Each row is 5 bits, MSB on the left. Covers what bank labels actually
// contain: digits, uppercase ASCII, and a little punctuation. Lowercase
// folds to uppercase.
#[rustfmt::skip]
const BITMAP_5X7: &[(char, [u8; 7])] = &[
    ('0', [0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110]),
    ('1', [0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110]),
    ('2', [0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111]),
    ('3', [0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110]),
    ('4', [0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010]),
    ('5', [0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110]),
    ('6', [0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110]),
    ('7', [0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000]),
    ('8', [0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110]),
    ('9', [0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100]),
    ('A', [0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001]),
    ('B', [0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110]),
    ('C', [0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110]),
    ('D', [0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100]),
    ('E', [0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111]),
    ('F', [0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000]),
    ('G', [0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111]),
    ('H', [0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001]),
    ('I', [0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110]),
    ('J', [0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100]),
    ('K', [0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001]),
    ('L', [0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111]),
    ('M', [0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001]),
    ('N', [0b10001,0b11001,0b10101,0b10011,0b10001,0b10001,0b10001]),
    ('O', [0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110]),
    ('P', [0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000]),
    ('Q', [0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101]),
    ('R', [0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001]),
    ('S', [0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110]),
    ('T', [0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100]),
    ('U', [0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110]),
    ('V', [0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100]),
    ('W', [0b10001,0b10001,0b10001,0b10101,0b10101,0b11011,0b10001]),
    ('X', [0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001]),
    ('Y', [0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100]),
    ('Z', [0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111]),
    (' ', [0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000]),
    ('.', [0b00000,0b00000,0b00000,0b00000,0b00000,0b01100,0b01100]),
    (',', [0b00000,0b00000,0b00000,0b00000,0b01100,0b00100,0b01000]),
    ('-', [0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000]),
    ('/', [0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000]),
    (':', [0b00000,0b01100,0b01100,0b00000,0b01100,0b01100,0b00000]),
    ('(', [0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010]),
    (')', [0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000]),
    ('\'', [0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000]),
];

// Hollow box for anything the table does not cover.
const GLYPH_UNKNOWN: [u8; 7] =
    [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111];

fn glyph_rows(ch: char) -> [u8; 7] {
    let ch = ch.to_ascii_uppercase();
    BITMAP_5X7
        .iter()
        .find(|(k, _)| *k == ch)
        .map(|(_, rows)| *rows)
        .unwrap_or(GLYPH_UNKNOWN)
}

fn draw_bitmap_glyph(img: &mut RgbImage, x: i32, y: i32, ch: char, color: Rgb<u8>, scale: u32) {
    let rows = glyph_rows(ch);
    let (w, h) = img.dimensions();
    for (row_idx, row_bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_W {
            if (row_bits >> (GLYPH_W - 1 - col)) & 1 == 0 {
                continue;
            }
            let px0 = x + (col * scale) as i32;
            let py0 = y + (row_idx as u32 * scale) as i32;
            for dy in 0..scale as i32 {
                for dx in 0..scale as i32 {
                    let sx = px0 + dx;
                    let sy = py0 + dy;
                    if sx >= 0 && sy >= 0 && (sx as u32) < w && (sy as u32) < h {
                        img.put_pixel(sx as u32, sy as u32, color);
                    }
                }
            }
        }
    }
}
