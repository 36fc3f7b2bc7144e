//! Circular bit rotation over arbitrary-length byte spans
//!
//! The span is viewed as one bit sequence: bytes in ascending order,
//! least-significant bit first inside each byte. A positive amount moves
//! every bit towards index zero, which for a single byte is
//! `u8::rotate_right` and for a little-endian `u64` image is
//! `u64::rotate_right`.

use bitvec::prelude::*;

/// Rotate `bytes` in place by `amount` bit positions.
///
/// Positive `amount` rotates right, negative rotates left. Zero or an empty
/// span leaves the bytes untouched. Amounts larger than the span's bit
/// length wrap around.
///
/// Returns `false` when nothing was rotated.
pub fn bit_rotate(bytes: &mut [u8], amount: i64) -> bool {
    if bytes.is_empty() || amount == 0 {
        return false;
    }

    let bits = bytes.view_bits_mut::<Lsb0>();
    let len = bits.len() as u64;
    let by = (amount.unsigned_abs() % len) as usize;

    if amount > 0 {
        bits.rotate_left(by);
    } else {
        bits.rotate_right(by);
    }

    true
}

/// Rotate a single byte by a signed amount, same convention as [`bit_rotate`].
#[inline]
pub(crate) fn rotate_byte(byte: u8, amount: i64) -> u8 {
    let by = (amount.unsigned_abs() % 8) as u32;
    if amount >= 0 {
        byte.rotate_right(by)
    } else {
        byte.rotate_left(by)
    }
}
