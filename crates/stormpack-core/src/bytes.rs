//! Byte amounts such as `"512MB"` or `"2GB"`.

use serde::{Deserialize, Deserializer};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;

/// Parse a byte amount like "1024", "64KB", "512MB", "2GB".
///
/// Units are binary (1KB = 1024 bytes). A bare number is taken as bytes.
pub fn parse_byte_amount(s: &str) -> Option<u64> {
    let s = s.trim();
    let upper = s.to_ascii_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, GIB)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, MIB)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, KIB)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };
    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Serde helper for optional byte amounts given as integers or strings.
pub(crate) fn deserialize_opt_bytes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Bytes(u64),
        Text(String),
    }

    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Bytes(n)) => Ok(Some(n)),
        Some(Amount::Text(s)) => parse_byte_amount(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid byte amount: {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_number_is_bytes() {
        assert_eq!(parse_byte_amount("2048"), Some(2048));
        assert_eq!(parse_byte_amount("2048B"), Some(2048));
    }

    #[test]
    fn binary_units() {
        assert_eq!(parse_byte_amount("64KB"), Some(64 * KIB));
        assert_eq!(parse_byte_amount("512MB"), Some(512 * MIB));
        assert_eq!(parse_byte_amount("2gb"), Some(2 * GIB));
        assert_eq!(parse_byte_amount(" 1 GB "), Some(GIB));
    }

    #[test]
    fn rejects_garbage_and_overflow() {
        assert_eq!(parse_byte_amount("lots"), None);
        assert_eq!(parse_byte_amount("-1MB"), None);
        assert_eq!(parse_byte_amount("18446744073709551615GB"), None);
    }
}
