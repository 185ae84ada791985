//! EMVCo-style TLV payload builder for the VietQR/NAPAS profile.
//!
//! A payload is a flat string of `tag + len + value` fields where `len` is
//! always exactly 2 decimal digits and a value may itself be a sequence of
//! encoded fields. The whole thing is terminated by a CRC-16/CCITT-FALSE
//! trailer that scanning apps verify, so every byte here has to be exact.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::amount::normalize_amount;
use crate::error::GenError;

// EMVCo top-level tags.
const TAG_VERSION: &str = "00";
const TAG_INIT_METHOD: &str = "01";
const TAG_MERCHANT_INFO: &str = "38";
const TAG_CATEGORY: &str = "52";
const TAG_CURRENCY: &str = "53";
const TAG_AMOUNT: &str = "54";
const TAG_COUNTRY: &str = "58";
const TAG_MERCHANT_NAME: &str = "59";
const TAG_CITY: &str = "60";
const TAG_ADDITIONAL: &str = "62";
const TAG_CRC: &str = "63";

// NAPAS profile constants.
const NAPAS_GUID: &str = "A000000727";
const SERVICE_ACCOUNT_TRANSFER: &str = "QRIBFTTA";
const INIT_STATIC: &str = "11";
const INIT_DYNAMIC: &str = "12";
const CURRENCY_VND: &str = "704";
const COUNTRY_VN: &str = "VN";
const CITY_DEFAULT: &str = "HANOI";

const MAX_NAME_LEN: usize = 25;
const MAX_PURPOSE_LEN: usize = 99;

/// A validated payment intent. All fields arrive as the surrounding layers
/// collected them; `build_payload` does the final validation and clipping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// NAPAS bank BIN, 6 or 8 digits.
    pub bank_bin: String,
    /// Beneficiary account number, digits only, at least 6.
    pub account_no: String,
    /// Account holder name as printed on the panel and embedded in tag 59.
    pub account_name: String,
    /// Free-form amount; run through the normalizer. `None` or unusable
    /// input produces a static (amount-less) code.
    #[serde(default)]
    pub amount: Option<String>,
    /// Transfer purpose, embedded under tag 62/08 when non-empty.
    #[serde(default)]
    pub purpose: Option<String>,
}

/// One TLV field. The value is either raw text or an ordered run of nested
/// fields, so the 2-digit length invariant is enforced in exactly one place.
#[derive(Debug, Clone)]
pub struct Field {
    pub tag: &'static str,
    pub value: FieldValue,
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    Leaf(String),
    Nested(Vec<Field>),
}

impl Field {
    pub fn leaf(tag: &'static str, value: impl Into<String>) -> Self {
        Field { tag, value: FieldValue::Leaf(value.into()) }
    }

    pub fn nested(tag: &'static str, fields: Vec<Field>) -> Self {
        Field { tag, value: FieldValue::Nested(fields) }
    }

    /// Encode as `tag + len2 + value`. Fails if the serialized value would
    /// not fit the 2-digit length marker; a wrong marker corrupts everything
    /// after it, so this is never emitted silently.
    pub fn encode(&self) -> Result<String, GenError> {
        let value = match &self.value {
            FieldValue::Leaf(text) => text.clone(),
            FieldValue::Nested(fields) => {
                let mut buf = String::new();
                for f in fields {
                    buf.push_str(&f.encode()?);
                }
                buf
            }
        };
        let len = value.chars().count();
        if len > 99 {
            return Err(GenError::FieldTooLong { tag: self.tag.to_string(), len });
        }
        Ok(format!("{}{:02}{}", self.tag, len, value))
    }
}

/// CRC-16/CCITT-FALSE: init 0xFFFF, poly 0x1021, MSB-first, not reflected.
/// Each character's code point lands in the high byte of the register.
pub fn crc16_ccitt_false(data: &str) -> String {
    let mut crc: u32 = 0xFFFF;
    for ch in data.chars() {
        crc ^= (ch as u32) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
            crc &= 0xFFFF;
        }
    }
    format!("{crc:04X}")
}

fn clip_chars(s: &str, max: usize, what: &str) -> String {
    if s.chars().count() > max {
        warn!(%what, max, "clipping over-length value before encoding");
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}

/// Build the full VietQR payload string, CRC trailer included.
///
/// Validation failures name the offending field and nothing is emitted for
/// a bad request. Holder name and purpose are clipped to the profile limits
/// (25 / 99 chars) before encoding.
pub fn build_payload(req: &PaymentRequest) -> Result<String, GenError> {
    let bank_bin: String = req.bank_bin.chars().filter(|c| *c != ' ').collect();
    let account_no: String = req.account_no.chars().filter(|c| *c != ' ').collect();

    if bank_bin.is_empty() {
        return Err(GenError::Validation {
            field: "bank_bin",
            reason: "missing bank BIN".into(),
        });
    }
    if account_no.is_empty() {
        return Err(GenError::Validation {
            field: "account_no",
            reason: "missing account number".into(),
        });
    }
    if !bank_bin.chars().all(|c| c.is_ascii_digit()) || !matches!(bank_bin.len(), 6 | 8) {
        return Err(GenError::Validation {
            field: "bank_bin",
            reason: "bank BIN must be 6 or 8 digits".into(),
        });
    }
    if !account_no.chars().all(|c| c.is_ascii_digit()) || account_no.len() < 6 {
        return Err(GenError::Validation {
            field: "account_no",
            reason: "account number must be digits only, at least 6".into(),
        });
    }

    let amount = req.amount.as_deref().and_then(normalize_amount);
    let name = if req.account_name.is_empty() {
        "NA".to_string()
    } else {
        clip_chars(&req.account_name, MAX_NAME_LEN, "account_name")
    };
    let purpose = req
        .purpose
        .as_deref()
        .map(|p| clip_chars(p, MAX_PURPOSE_LEN, "purpose"))
        .filter(|p| !p.is_empty());

    // 38 / 01 nests the beneficiary (BIN + account) inside the NAPAS
    // merchant-info envelope; its encoded bytes become the 01 value.
    let beneficiary = vec![Field::leaf("00", bank_bin), Field::leaf("01", account_no)];
    let merchant_info = Field::nested(
        TAG_MERCHANT_INFO,
        vec![
            Field::leaf("00", NAPAS_GUID),
            Field::nested("01", beneficiary),
            Field::leaf("02", SERVICE_ACCOUNT_TRANSFER),
        ],
    );

    let mut fields = vec![
        Field::leaf(TAG_VERSION, "01"),
        Field::leaf(
            TAG_INIT_METHOD,
            if amount.is_some() { INIT_DYNAMIC } else { INIT_STATIC },
        ),
        merchant_info,
        Field::leaf(TAG_CATEGORY, "0000"),
        Field::leaf(TAG_CURRENCY, CURRENCY_VND),
    ];
    if let Some(amount) = &amount {
        fields.push(Field::leaf(TAG_AMOUNT, amount.clone()));
    }
    fields.push(Field::leaf(TAG_COUNTRY, COUNTRY_VN));
    fields.push(Field::leaf(TAG_MERCHANT_NAME, name));
    fields.push(Field::leaf(TAG_CITY, CITY_DEFAULT));
    if let Some(purpose) = purpose {
        fields.push(Field::nested(TAG_ADDITIONAL, vec![Field::leaf("08", purpose)]));
    }

    let mut payload = String::new();
    for field in &fields {
        payload.push_str(&field.encode()?);
    }
    payload.push_str(TAG_CRC);
    payload.push_str("04");
    let crc = crc16_ccitt_false(&payload);
    payload.push_str(&crc);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            bank_bin: "970436".into(),
            account_no: "0123456789".into(),
            account_name: "NGUYEN VAN A".into(),
            amount: Some("100000".into()),
            purpose: Some("an trua".into()),
        }
    }

    #[test]
    fn crc_reference_vectors() {
        assert_eq!(crc16_ccitt_false("123456789"), "29B1");
        assert_eq!(crc16_ccitt_false("A"), "B915");
        assert_eq!(crc16_ccitt_false(""), "FFFF");
        assert_eq!(crc16_ccitt_false("6304"), "6007");
    }

    #[test]
    fn encode_pads_length_to_two_digits() {
        assert_eq!(Field::leaf("00", "01").encode().unwrap(), "000201");
        assert_eq!(Field::leaf("54", "100000").encode().unwrap(), "5406100000");
    }

    #[test]
    fn encode_rejects_over_length_values() {
        let long = "9".repeat(100);
        match Field::leaf("54", long).encode() {
            Err(GenError::FieldTooLong { tag, len }) => {
                assert_eq!(tag, "54");
                assert_eq!(len, 100);
            }
            other => panic!("expected FieldTooLong, got {other:?}"),
        }
    }

    #[test]
    fn nested_length_counts_encoded_bytes() {
        let f = Field::nested(
            "38",
            vec![Field::leaf("00", "A000000727"), Field::leaf("02", "QRIBFTTA")],
        );
        let encoded = f.encode().unwrap();
        // 00 10 A000000727 (14) + 02 08 QRIBFTTA (12) = 26 chars of value
        assert!(encoded.starts_with("3826"));
    }

    #[test]
    fn dynamic_payload_matches_reference() {
        let payload = build_payload(&request()).unwrap();
        assert_eq!(
            payload,
            "00020101021238540010A00000072701240006970436011001234567890208QRIBFTTA\
             52040000530370454061000005802VN5912NGUYEN VAN A6005HANOI62110807an trua63041800"
        );
    }

    #[test]
    fn static_payload_omits_amount_field() {
        let mut req = request();
        req.amount = None;
        req.purpose = None;
        let payload = build_payload(&req).unwrap();
        assert_eq!(
            payload,
            "00020101021138540010A00000072701240006970436011001234567890208QRIBFTTA\
             5204000053037045802VN5912NGUYEN VAN A6005HANOI6304896E"
        );
        assert!(payload.contains("010211"));
        assert!(!payload.contains("5406"));
    }

    #[test]
    fn checksum_round_trip() {
        for req in [request(), {
            let mut r = request();
            r.amount = None;
            r
        }] {
            let payload = build_payload(&req).unwrap();
            let (body, crc) = payload.split_at(payload.len() - 4);
            assert!(body.ends_with("6304"));
            assert_eq!(crc16_ccitt_false(body), crc);
            assert!(crc.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn length_markers_match_values() {
        // Walk the top level of the payload and check every 2-digit marker.
        let payload = build_payload(&request()).unwrap();
        let bytes: Vec<char> = payload.chars().collect();
        let mut i = 0;
        while i < bytes.len() {
            let len: usize = payload[i + 2..i + 4].parse().unwrap();
            assert!(i + 4 + len <= bytes.len(), "marker overruns payload");
            i += 4 + len;
        }
        assert_eq!(i, bytes.len());
    }

    #[test]
    fn short_account_is_rejected() {
        let mut req = request();
        req.account_no = "12345".into();
        match build_payload(&req) {
            Err(GenError::Validation { field, .. }) => assert_eq!(field, "account_no"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn short_bank_bin_is_rejected() {
        let mut req = request();
        req.bank_bin = "97041".into();
        match build_payload(&req) {
            Err(GenError::Validation { field, .. }) => assert_eq!(field, "bank_bin"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn spaces_are_stripped_before_validation() {
        let mut req = request();
        req.bank_bin = "970 436".into();
        req.account_no = "0123 456 789".into();
        let payload = build_payload(&req).unwrap();
        assert!(payload.contains("0006970436"));
        assert!(payload.contains("01100123456789"));
    }

    #[test]
    fn name_and_purpose_are_clipped() {
        let mut req = request();
        req.account_name = "A".repeat(40);
        req.purpose = Some("B".repeat(120));
        let payload = build_payload(&req).unwrap();
        assert!(payload.contains(&format!("5925{}", "A".repeat(25))));
        assert!(payload.contains(&format!("08{}{}", 99, "B".repeat(99))));
    }

    #[test]
    fn empty_name_falls_back_to_na() {
        let mut req = request();
        req.account_name = String::new();
        let payload = build_payload(&req).unwrap();
        assert!(payload.contains("5902NA"));
    }

    #[test]
    fn oversized_account_overflows_nested_container() {
        // The beneficiary fits but the merchant-info wrapper would need a
        // 3-digit length; that must fail loudly.
        let mut req = request();
        req.account_no = "1".repeat(80);
        match build_payload(&req) {
            Err(GenError::FieldTooLong { tag, .. }) => assert_eq!(tag, "38"),
            other => panic!("expected FieldTooLong, got {other:?}"),
        }
    }
}
