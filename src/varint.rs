//! Minecraft's variable-length integer encoding.
//! [Data types: VarInt](https://wiki.vg/Protocol#VarInt_and_VarLong)

use crate::Error;

/// The most bytes a 32-bit VarInt may occupy on the wire.
pub const MAX_LEN: usize = 5;

const SEGMENT_BITS: u32 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Encodes `value` as a VarInt.
///
/// # Examples
///
/// ```
/// assert_eq!(slping::varint::encode(25565), [0xDD, 0xC7, 0x01]);
/// ```
#[must_use]
pub fn encode(value: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_LEN);
    encode_into(value, &mut buf);
    buf
}

/// Appends the VarInt encoding of `value` to `buf`.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_into(mut value: u32, buf: &mut Vec<u8>) {
    while value & !SEGMENT_BITS != 0 {
        buf.push((value & SEGMENT_BITS) as u8 | CONTINUE_BIT);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Decodes a VarInt from the front of `bytes`.
///
/// Returns the value and the number of bytes it occupied. Any bytes after the
/// terminating byte are left alone.
///
/// # Errors
///
/// [`Error::TruncatedVarInt`] if `bytes` runs out before a byte without the
/// continuation bit, [`Error::VarIntTooLong`] if no such byte shows up within
/// [`MAX_LEN`] bytes.
pub fn decode(bytes: &[u8]) -> Result<(u32, usize), Error> {
    let mut value = 0u32;
    for i in 0..MAX_LEN {
        let byte = *bytes.get(i).ok_or(Error::TruncatedVarInt)?;
        value |= (u32::from(byte) & SEGMENT_BITS) << (7 * i);
        if byte & CONTINUE_BIT == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::VarIntTooLong)
}
