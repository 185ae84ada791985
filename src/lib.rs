//! VietQR payment-code generation.
//!
//! Two engines, converging at the compositor:
//!
//! - the **payload encoder** builds the NAPAS/EMVCo tag-length-value text
//!   payload for a bank transfer, CRC-16/CCITT-FALSE trailer included;
//! - the **image compositor** detects the placement frame on a branded
//!   template, sizes and positions a bordered QR panel with account labels,
//!   and pastes it onto the template.
//!
//! The whole pipeline is synchronous and pure: same request, template and
//! configuration in, same payload string and bitmap out. The only I/O is
//! reading the configured template (and optional font) from disk.
//!
//! ```no_run
//! use vietqr_gen::{generate, PaymentRequest, RenderConfig};
//!
//! let request = PaymentRequest {
//!     bank_bin: "970436".into(),
//!     account_no: "0123456789".into(),
//!     account_name: "NGUYEN VAN A".into(),
//!     amount: Some("100000".into()),
//!     purpose: Some("an trua".into()),
//! };
//! let (payload, image) = generate(&request, &RenderConfig::new("bg.png"))?;
//! # Ok::<(), vietqr_gen::GenError>(())
//! ```

pub mod amount;
pub mod banks;
pub mod compose;
pub mod config;
pub mod error;
pub mod frame;
pub mod layout;
pub mod payload;
pub mod qr;
pub mod text;

pub use compose::QrComposer;
pub use config::RenderConfig;
pub use error::GenError;
pub use frame::{FrameBbox, FrameDetector, ThresholdFrameDetector};
pub use layout::PanelLabels;
pub use payload::{build_payload, crc16_ccitt_false, PaymentRequest};

use image::RgbImage;

/// Run the full pipeline: encode the payload and composite it onto the
/// configured template. Returns both outputs; the caller owns transport
/// encoding and delivery.
pub fn generate(
    request: &PaymentRequest,
    config: &RenderConfig,
) -> Result<(String, RgbImage), GenError> {
    let payload = build_payload(request)?;
    let labels = PanelLabels::for_request(request);
    let image = QrComposer::new(config.clone()).render(&payload, &labels)?;
    Ok((payload, image))
}
