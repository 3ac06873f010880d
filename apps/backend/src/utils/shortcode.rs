//! Shareable duel shortcodes: 6 uppercase alphanumeric characters drawn from
//! the OS RNG. Uniqueness is enforced by the caller against the store.

use rand::rngs::OsRng;
use rand::{Rng, TryRngCore};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const SHORTCODE_LEN: usize = 6;

pub fn generate_shortcode() -> String {
    let mut rng = OsRng.unwrap_err();
    (0..SHORTCODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_shortcode(code: &str) -> bool {
    code.len() == SHORTCODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_well_formed() {
        for _ in 0..200 {
            let code = generate_shortcode();
            assert!(is_valid_shortcode(&code), "bad shortcode {code}");
        }
    }

    #[test]
    fn rejects_lowercase_and_wrong_length() {
        assert!(!is_valid_shortcode("abc123"));
        assert!(!is_valid_shortcode("ABC12"));
        assert!(is_valid_shortcode("ABC123"));
    }
}
