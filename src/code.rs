//! Short, human-typeable room codes.

use rand::Rng;

/// Safe character set for room codes (excludes 0/O, 1/I to avoid confusion)
pub const CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Default room code length (32^6, roughly a billion codes)
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Generate a random code of `length` characters.
///
/// Uniqueness is the caller's problem; the room store regenerates on collision.
pub fn generate(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}
