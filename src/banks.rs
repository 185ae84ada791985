//! Directory of Vietnamese banks participating in NAPAS 247 transfers.

/// (display name, BIN) pairs. BINs are the 6-digit NAPAS bank codes that go
/// into the payload's beneficiary field.
pub const BANKS: &[(&str, &str)] = &[
    ("Vietcombank", "970436"),
    ("VietinBank", "970415"),
    ("BIDV", "970418"),
    ("Agribank", "970405"),
    ("Techcombank", "970407"),
    ("ACB", "970416"),
    ("Sacombank", "970403"),
    ("MB", "970422"),
    ("TPBank", "970423"),
    ("VPBank", "970432"),
    ("VIB", "970441"),
];

/// Look up the display name for a bank BIN.
pub fn name_for_bin(bin: &str) -> Option<&'static str> {
    BANKS.iter().find(|(_, b)| *b == bin).map(|(name, _)| *name)
}
