use rand::{seq::SliceRandom, Rng};

use super::ElectionRef;

/// Refs only use letters, so they can never be mistaken for a numeric ID.
const REF_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a random election ref of the given length.
pub fn generate_ref(rng: &mut impl Rng, length: usize) -> ElectionRef {
    (0..length)
        .filter_map(|_| REF_ALPHABET.choose(rng))
        .map(|&byte| char::from(byte))
        .collect()
}

/// Could this string have been produced by [`generate_ref`]?
pub fn is_valid_ref(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.bytes().all(|b| REF_ALPHABET.contains(&b))
}
