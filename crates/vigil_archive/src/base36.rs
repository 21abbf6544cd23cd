//! Base-36 codec for the compressed GNSS filename fields.

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Encode a number as an uppercase base-36 string (no padding).
pub fn encode(mut number: u32) -> String {
    if number == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while number != 0 {
        out.push(ALPHABET[(number % 36) as usize]);
        number /= 36;
    }
    out.reverse();
    // ALPHABET is pure ASCII.
    String::from_utf8(out).unwrap_or_default()
}

/// Encode a number as base-36, left-padded with zeros to `width`.
pub fn encode_width(number: u32, width: usize) -> String {
    let raw = encode(number);
    if raw.len() >= width {
        raw
    } else {
        let mut out = "0".repeat(width - raw.len());
        out.push_str(&raw);
        out
    }
}

/// Decode a base-36 string (case-insensitive) to an integer.
pub fn decode(digits: &str) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for ch in digits.chars() {
        let digit = ch.to_ascii_uppercase();
        let idx = ALPHABET.iter().position(|&b| b as char == digit)?;
        value = value.checked_mul(36)?.checked_add(idx as u32)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_digits_round_trip() {
        for n in 0..36 {
            let encoded = encode(n);
            assert_eq!(encoded.len(), 1);
            assert_eq!(decode(&encoded), Some(n));
        }
    }

    #[test]
    fn multi_digit_values_round_trip() {
        for n in [36, 100, 1295, 46_655] {
            assert_eq!(decode(&encode(n)), Some(n));
        }
    }

    #[test]
    fn encode_width_pads_with_zeros() {
        assert_eq!(encode_width(10, 2), "0A");
        assert_eq!(encode_width(35, 2), "0Z");
        assert_eq!(encode_width(1295, 2), "ZZ");
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(decode("0a"), decode("0A"));
        assert_eq!(decode("zz"), Some(1295));
    }

    #[test]
    fn decode_rejects_invalid_digits() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("0!"), None);
        assert_eq!(decode("-1"), None);
    }
}
