//! Text-metric-driven layout: block measurement, QR target sizing, panel
//! assembly, and final placement on the template.
//!
//! All numbers here mirror the printed templates this ships with, so they
//! are fixed constants rather than configuration.

use image::{imageops, Rgb, RgbImage};
use tracing::debug;

use crate::banks;
use crate::frame::FrameBbox;
use crate::payload::PaymentRequest;
use crate::text::TextFace;

/// Inner padding between the panel border and its content.
pub const PANEL_PADDING: u32 = 16;
/// Vertical gap between the QR bitmap and the first label line.
pub const QR_TEXT_GAP: u32 = 8;
/// Vertical gap between label lines.
pub const LINE_GAP: u32 = 4;
/// Breathing room kept between the panel and the detected frame stroke.
pub const FRAME_MARGIN: u32 = 12;
/// Fallback margin from the template edges when no frame was found.
pub const EDGE_MARGIN: i64 = 24;
/// Smallest QR edge that still scans reliably on phone cameras.
pub const MIN_QR_SIZE: u32 = 120;

const PANEL_RADIUS: u32 = 16;
const PANEL_BORDER: u32 = 3;
const DEFAULT_SIZE_RATIO: f32 = 0.32;
const FRAME_FILL_RATIO: f32 = 0.81;
// The panel border is visually heavier on the right/top; these nudges
// re-center it inside the printed frame.
const FRAME_OFFSET_X: i64 = -44;
const FRAME_OFFSET_Y: i64 = 39;

/// The three label lines printed under the QR code.
#[derive(Debug, Clone)]
pub struct PanelLabels {
    pub bank_name: String,
    pub account_name: String,
    pub account_no: String,
}

impl PanelLabels {
    /// Derive labels from a request, resolving the BIN against the bank
    /// directory and falling back to the raw BIN for unknown banks.
    pub fn for_request(req: &PaymentRequest) -> Self {
        let bank_name = banks::name_for_bin(req.bank_bin.trim())
            .map(str::to_string)
            .unwrap_or_else(|| req.bank_bin.clone());
        PanelLabels {
            bank_name,
            account_name: req.account_name.clone(),
            account_no: req.account_no.clone(),
        }
    }

    /// Trimmed lines in panel order; the holder line falls back to `"NA"`.
    pub fn lines(&self) -> [String; 3] {
        let holder = self.account_name.trim();
        [
            self.bank_name.trim().to_string(),
            if holder.is_empty() { "NA".to_string() } else { holder.to_string() },
            self.account_no.trim().to_string(),
        ]
    }
}

/// Measured dimensions of a stack of text lines.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub width: u32,
    pub height: u32,
    pub line_sizes: Vec<(u32, u32)>,
}

/// Block width is the widest line; height sums line heights plus
/// `line_gap` between consecutive lines (empty lines measure zero but
/// still separate their neighbors).
pub fn measure_text_block(lines: &[String], face: &TextFace, line_gap: u32) -> TextBlock {
    let line_sizes: Vec<(u32, u32)> = lines.iter().map(|l| face.line_size(l)).collect();
    let width = line_sizes.iter().map(|s| s.0).max().unwrap_or(0);
    let mut height: u32 = line_sizes.iter().map(|s| s.1).sum();
    height += line_gap * lines.len().saturating_sub(1) as u32;
    TextBlock { width, height, line_sizes }
}

/// Pick the QR edge length for a template.
///
/// An explicit override wins. Otherwise the code fills 81% of the space the
/// frame leaves after padding, margins and the label block; without a frame
/// it defaults to 32% of the template's short edge. Never below
/// [`MIN_QR_SIZE`].
pub fn resolve_qr_size(
    bg_w: u32,
    bg_h: u32,
    labels: &PanelLabels,
    face: &TextFace,
    frame: Option<FrameBbox>,
    size_override: Option<u32>,
) -> u32 {
    let default_size = (bg_w.min(bg_h) as f32 * DEFAULT_SIZE_RATIO) as u32;
    let size = if let Some(explicit) = size_override {
        explicit
    } else if let Some(frame) = frame {
        let block = measure_text_block(&labels.lines(), face, LINE_GAP);
        let avail_w = frame
            .width()
            .saturating_sub(PANEL_PADDING * 2)
            .saturating_sub(FRAME_MARGIN * 2);
        let avail_h = frame
            .height()
            .saturating_sub(QR_TEXT_GAP + block.height + PANEL_PADDING * 2)
            .saturating_sub(FRAME_MARGIN * 2);
        let target = (avail_w.min(avail_h) as f32 * FRAME_FILL_RATIO) as u32;
        if target == 0 {
            default_size
        } else {
            target
        }
    } else {
        default_size
    };
    size.max(MIN_QR_SIZE)
}

/// Nearest-neighbor only: interpolation would blur module edges and hurt
/// scannability.
pub fn resize_qr(qr: &RgbImage, target_size: u32) -> RgbImage {
    let target = target_size.max(MIN_QR_SIZE);
    imageops::resize(qr, target, target, imageops::FilterType::Nearest)
}

/// Assemble the bordered panel: QR centered on top, labels centered below.
pub fn build_panel(qr: &RgbImage, labels: &PanelLabels, face: &TextFace, border: Rgb<u8>) -> RgbImage {
    let lines = labels.lines();
    let block = measure_text_block(&lines, face, LINE_GAP);

    let panel_w = qr.width().max(block.width) + PANEL_PADDING * 2;
    let panel_h = qr.height() + QR_TEXT_GAP + block.height + PANEL_PADDING * 2;

    let mut panel = RgbImage::from_pixel(panel_w, panel_h, Rgb([255, 255, 255]));
    draw_rounded_border(&mut panel, PANEL_RADIUS, PANEL_BORDER, border);

    let qr_x = (panel_w - qr.width()) / 2;
    imageops::replace(&mut panel, qr, qr_x as i64, PANEL_PADDING as i64);

    let mut text_y = PANEL_PADDING + qr.height() + QR_TEXT_GAP;
    for (line, (line_w, line_h)) in lines.iter().zip(&block.line_sizes) {
        if line.is_empty() {
            continue;
        }
        let text_x = (panel_w.saturating_sub(*line_w)) / 2;
        face.draw_line(&mut panel, text_x as i32, text_y as i32, Rgb([0, 0, 0]), line);
        text_y += line_h + LINE_GAP;
    }
    panel
}

/// Resolve the panel's top-left corner on the template.
///
/// Explicit overrides win per axis. With a frame, unset axes center inside
/// it and the frame correction offsets apply; without one, the panel sits
/// [`EDGE_MARGIN`] from the left and bottom edges. The result is always
/// clamped so the panel stays fully on the template.
pub fn resolve_position(
    panel_w: u32,
    panel_h: u32,
    bg_w: u32,
    bg_h: u32,
    frame: Option<FrameBbox>,
    x_override: Option<i32>,
    y_override: Option<i32>,
) -> (u32, u32) {
    let (panel_w, panel_h) = (panel_w as i64, panel_h as i64);
    let (bg_w, bg_h) = (bg_w as i64, bg_h as i64);

    let mut x = x_override.map(i64::from);
    let mut y = y_override.map(i64::from);

    if x.is_none() || y.is_none() {
        if let Some(frame) = frame {
            let avail_w = frame.width() as i64;
            let avail_h = frame.height() as i64;
            let cx = frame.min_x as i64 + ((avail_w - panel_w) / 2).max(0);
            let cy = frame.min_y as i64 + ((avail_h - panel_h) / 2).max(0);
            x = Some(x.unwrap_or(cx) + FRAME_OFFSET_X);
            y = Some(y.unwrap_or(cy) + FRAME_OFFSET_Y);
        } else {
            x = Some(x.unwrap_or(EDGE_MARGIN));
            y = Some(y.unwrap_or(bg_h - panel_h - EDGE_MARGIN));
        }
    }

    let x = x.unwrap_or(0).min(bg_w - panel_w).max(0);
    let y = y.unwrap_or(0).min(bg_h - panel_h).max(0);
    debug!(x, y, "resolved panel position");
    (x as u32, y as u32)
}

/// Point-in-rounded-rectangle test with a uniform corner radius, in local
/// coordinates of a `w`×`h` rect.
fn in_rounded_rect(x: i32, y: i32, w: i32, h: i32, r: i32) -> bool {
    if x < 0 || y < 0 || x >= w || y >= h {
        return false;
    }
    if r <= 0 {
        return true;
    }
    if x < r && y < r {
        let dx = x - (r - 1);
        let dy = y - (r - 1);
        return dx * dx + dy * dy <= r * r;
    }
    if x >= w - r && y < r {
        let dx = x - (w - r);
        let dy = y - (r - 1);
        return dx * dx + dy * dy <= r * r;
    }
    if x < r && y >= h - r {
        let dx = x - (r - 1);
        let dy = y - (h - r);
        return dx * dx + dy * dy <= r * r;
    }
    if x >= w - r && y >= h - r {
        let dx = x - (w - r);
        let dy = y - (h - r);
        return dx * dx + dy * dy <= r * r;
    }
    true
}

fn draw_rounded_border(img: &mut RgbImage, radius: u32, stroke: u32, color: Rgb<u8>) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let r = radius as i32;
    let s = stroke as i32;
    let inner_r = (r - s).max(0);
    for y in 0..h {
        for x in 0..w {
            let outer = in_rounded_rect(x, y, w, h, r);
            let inner = in_rounded_rect(x - s, y - s, w - 2 * s, h - 2 * s, inner_r);
            if outer && !inner {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
