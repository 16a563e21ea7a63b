//! Base-62 short identifiers for paste IDs.
//!
//! The alphabet is digits, then upper-case, then lower-case letters, used as
//! a positional numeral system (most significant digit first).

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE: u64 = 62;

/// Encode `n` as a base-62 string. `encode(0)` is `"0"`.
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return (ALPHABET[0] as char).to_string();
    }
    // u64::MAX needs 11 digits
    let mut buf = Vec::with_capacity(11);
    while n > 0 {
        buf.push(ALPHABET[(n % BASE) as usize]);
        n /= BASE;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Decode a base-62 string. Returns `None` for an empty string, characters
/// outside the alphabet, or values that overflow `u64`.
pub fn decode(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    s.bytes().try_fold(0u64, |acc, b| {
        let digit = digit_value(b)?;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

fn digit_value(b: u8) -> Option<u64> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u64),
        b'A'..=b'Z' => Some((b - b'A') as u64 + 10),
        b'a'..=b'z' => Some((b - b'a') as u64 + 36),
        _ => None,
    }
}
