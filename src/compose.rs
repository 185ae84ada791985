//! Pipeline orchestration: template in, composited bitmap out.

use image::{imageops, RgbImage};
use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::error::GenError;
use crate::frame::{FrameDetector, ThresholdFrameDetector};
use crate::layout::{self, PanelLabels};
use crate::qr::generate_qr;
use crate::text::TextFace;

/// Stateless compositor. Holds the per-call configuration and the frame
/// detection strategy; every `render` call allocates its own bitmaps, so
/// concurrent use needs no coordination.
pub struct QrComposer {
    config: RenderConfig,
    detector: Box<dyn FrameDetector + Send + Sync>,
}

impl QrComposer {
    pub fn new(config: RenderConfig) -> Self {
        QrComposer {
            config,
            detector: Box::new(ThresholdFrameDetector::default()),
        }
    }

    /// Swap in another placement strategy (e.g. explicit coordinates for
    /// templates without a printed frame).
    pub fn with_detector(mut self, detector: Box<dyn FrameDetector + Send + Sync>) -> Self {
        self.detector = detector;
        self
    }

    /// Compose the final bitmap: QR from `payload`, labels underneath,
    /// pasted onto the configured template.
    pub fn render(&self, payload: &str, labels: &PanelLabels) -> Result<RgbImage, GenError> {
        let path = &self.config.template_path;
        if !path.is_file() {
            return Err(GenError::TemplateNotFound(path.clone()));
        }
        let background = image::open(path)
            .map_err(|e| GenError::Image(format!("decode {}: {e}", path.display())))?
            .to_rgb8();
        let (bg_w, bg_h) = background.dimensions();

        let face = TextFace::from_config(&self.config)?;
        let frame = self.detector.detect(&background);
        if frame.is_none() {
            warn!(template = %path.display(), "no placement frame detected, using default layout");
        }

        let qr = generate_qr(payload)?;
        let target = layout::resolve_qr_size(bg_w, bg_h, labels, &face, frame, self.config.qr_size);
        let qr = layout::resize_qr(&qr, target);
        debug!(target, "resolved qr size");

        let panel = layout::build_panel(&qr, labels, &face, self.config.border_rgb()?);
        let (x, y) = layout::resolve_position(
            panel.width(),
            panel.height(),
            bg_w,
            bg_h,
            frame,
            self.config.panel_x,
            self.config.panel_y,
        );

        let mut out = background;
        imageops::replace(&mut out, &panel, x as i64, y as i64);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;

    #[test]
    fn missing_template_is_reported_with_path() {
        let composer = QrComposer::new(RenderConfig::new("/no/such/template.png"));
        let labels = PanelLabels {
            bank_name: "Vietcombank".into(),
            account_name: "NGUYEN VAN A".into(),
            account_no: "0123456789".into(),
        };
        match composer.render("000201", &labels) {
            Err(GenError::TemplateNotFound(path)) => {
                assert_eq!(path, std::path::Path::new("/no/such/template.png"));
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected TemplateNotFound"),
        }
    }
}
