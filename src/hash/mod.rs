//! Integrity hashing for corruption detection
//!
//! Provides the digest used by the stack's optional integrity layer:
//! - [`hash`]: the crate's own order-sensitive, length-folding digest
//! - [`Digest`]: pluggable digest algorithm (swap without touching containers)
//! - [`bit_rotate`]: circular rotation over arbitrary byte spans
//!
//! None of this is cryptographically secure. The goal is to catch stray
//! writes and buffer overruns cheaply, not to resist an adversary.

mod rotate;

pub use rotate::bit_rotate;

use rotate::rotate_byte;
use std::fmt;

/// Input is padded to a multiple of this many bytes
pub const BLOCK_SIZE: usize = 64;

/// Key material, indexed cyclically by byte position
pub const KEYS: [u32; 16] = [
    0x26964da6, 0x69b25a6d, 0x9b4d9693, 0x64d26d2c,
    0x4b65a6c9, 0x9a592d36, 0xa4da6cb4, 0x4b2696c9,
    0xd36934b6, 0x369b2d92, 0x6cb4da59, 0x4b65a6d2,
    0xda592d93, 0x2696c964, 0xb26d365b, 0x25936934,
];

/// Bits the accumulator is rotated right after every step
const ACCUMULATOR_ROTATION: u32 = 3;

/// Compute the integrity digest of `bytes`.
///
/// Algorithm:
/// 1. Zero-pad to `⌊len / 64⌋ * 64 + 64` bytes and fold `len` into the last
///    eight bytes (little-endian), so truncation and extension show up
/// 2. Seed the accumulator with `KEYS[len % 16]`
/// 3. Walk both halves of the padded buffer in lock-step, mixing each pair
///    with rotated copies, key material and the mirrored pair read from the
///    far ends, rotating the accumulator after every step
///
/// Deterministic and cheap; collisions are possible in principle.
pub fn hash(bytes: &[u8]) -> u64 {
    let len = bytes.len();
    let padded_len = (len / BLOCK_SIZE) * BLOCK_SIZE + BLOCK_SIZE;
    let mid = padded_len / 2;

    let mut buf = vec![0u8; padded_len];
    buf[..len].copy_from_slice(bytes);

    let tail = padded_len - 8;
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[tail..]);
    let folded = u64::from_le_bytes(word).wrapping_add(len as u64);
    buf[tail..].copy_from_slice(&folded.to_le_bytes());

    let mut acc = KEYS[len % KEYS.len()] as u64;

    for i in 0..mid {
        let b1 = signed(buf[i]);
        let b2 = signed(buf[i + mid]);

        let p1 = signed(rotate_byte(buf[i], 1 + i as i64));
        let p2 = signed(rotate_byte(buf[i + mid], 1 - i as i64));

        let q1 = (b2 ^ p1 ^ (KEYS[i % KEYS.len()] as i64 + b1)) as i32 as i64;
        let q2 = (b1 ^ p2 ^ (KEYS[(i + 1) % KEYS.len()] as i64 + b2)) as i32 as i64;

        let m1 = signed(buf[padded_len - 1 - i]);
        let m2 = signed(buf[mid - 1 - i]);

        let cross = (q1 * m2 + q2 * m1) as u64;
        let fold = (q1 * m1 + q2 * m2 + q1 + q2 + m1 + m2) as u64;

        acc = acc.wrapping_mul(cross).wrapping_add(acc) ^ fold;
        acc = acc.rotate_right(ACCUMULATOR_ROTATION);
    }

    acc
}

#[inline]
fn signed(byte: u8) -> i64 {
    byte as i8 as i64
}

/// Render a digest the way dumps print it
pub fn format_digest(digest: u64) -> String {
    format!("0x{:016X}", digest)
}

/// Pluggable digest algorithm for the integrity layer
///
/// Containers only ever call [`Digest::digest`]; the algorithm can be
/// replaced without touching container logic.
pub trait Digest: fmt::Debug + Send + Sync {
    /// Short algorithm name (shown in dumps)
    fn name(&self) -> &'static str;

    /// Digest of `bytes`
    fn digest(&self, bytes: &[u8]) -> u64;
}

/// The crate's own digest ([`hash`])
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityHash;

impl Digest for IntegrityHash {
    fn name(&self) -> &'static str {
        "integrity-hash"
    }

    fn digest(&self, bytes: &[u8]) -> u64 {
        hash(bytes)
    }
}

/// BLAKE3, truncated to its first eight bytes (little-endian)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Digest;

impl Digest for Blake3Digest {
    fn name(&self) -> &'static str {
        "blake3"
    }

    fn digest(&self, bytes: &[u8]) -> u64 {
        let full = blake3::hash(bytes);
        let mut word = [0u8; 8];
        word.copy_from_slice(&full.as_bytes()[..8]);
        u64::from_le_bytes(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let data = b"the quick brown fox";
        assert_eq!(hash(data), hash(data));
    }

    #[test]
    fn test_length_is_folded_in() {
        // Trailing zeros are indistinguishable from padding without the length
        assert_ne!(hash(&[1, 2, 3]), hash(&[1, 2, 3, 0]));
        assert_ne!(hash(&[]), hash(&[0]));
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(hash(b"ab"), hash(b"ba"));
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let original = vec![0x5Au8; 200];
        let base = hash(&original);
        for idx in [0usize, 63, 64, 127, 199] {
            let mut corrupted = original.clone();
            corrupted[idx] ^= 0x01;
            assert_ne!(hash(&corrupted), base, "flip at {} went unnoticed", idx);
        }
    }

    #[test]
    fn test_block_boundary_lengths() {
        // 63, 64 and 65 bytes land in different padded sizes
        let a = hash(&[7u8; 63]);
        let b = hash(&[7u8; 64]);
        let c = hash(&[7u8; 65]);
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_digest_trait_objects() {
        let algorithms: Vec<Box<dyn Digest>> = vec![Box::new(IntegrityHash), Box::new(Blake3Digest)];
        for algo in &algorithms {
            assert_eq!(algo.digest(b"stack"), algo.digest(b"stack"));
            assert_ne!(algo.digest(b"stack"), algo.digest(b"stacks"));
        }
        assert_eq!(IntegrityHash.digest(b"x"), hash(b"x"));
    }

    #[test]
    fn test_format_digest() {
        assert_eq!(format_digest(0xAB), "0x00000000000000AB");
    }
}
