//! Transaction reference generation.
//!
//! References are the externally citable identifier on every ledger row:
//! a fixed `TXN` prefix plus a 16-character uppercase alphanumeric suffix
//! drawn from the OS entropy source (~82 bits). Uniqueness is overwhelmingly
//! probable; the store's uniqueness constraint is the safety net.

use rand::rngs::OsRng;
use rand::Rng;

pub const REFERENCE_PREFIX: &str = "TXN";

const SUFFIX_LEN: usize = 16;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a fresh transaction reference.
pub fn generate_reference() -> String {
    let mut out = String::with_capacity(REFERENCE_PREFIX.len() + SUFFIX_LEN);
    out.push_str(REFERENCE_PREFIX);
    for _ in 0..SUFFIX_LEN {
        let idx = OsRng.gen_range(0..ALPHABET.len());
        out.push(ALPHABET[idx] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn has_prefix_and_uppercase_alphanumeric_suffix() {
        let r = generate_reference();
        assert!(r.starts_with(REFERENCE_PREFIX));
        let suffix = &r[REFERENCE_PREFIX.len()..];
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn generation_does_not_repeat_in_practice() {
        let refs: HashSet<String> = (0..10_000).map(|_| generate_reference()).collect();
        assert_eq!(refs.len(), 10_000);
    }
}
