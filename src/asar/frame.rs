//! Length-framed binary blocks.
//!
//! A frame is a `u32` little-endian length followed by exactly that many
//! bytes. The archive header is stored as two nested frames: an 8-byte frame
//! whose payload is the header size, then the header frame itself, whose
//! payload starts with its own `u32` text length.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::error::{Error, Result};

/// Size of the length prefix in front of every frame
pub const FRAME_PREFIX_LEN: usize = 4;

/// Upper bound on the buffer reserved before a frame's bytes actually arrive
const MAX_PREALLOC: usize = 64 * 1024;

/// Fixed-size little-endian value that can be carried by a single frame.
pub trait FrameValue: Sized {
    const SIZE: usize;

    /// Decode from exactly `SIZE` bytes
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! frame_value {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl FrameValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn decode(bytes: &[u8]) -> Self {
                    LittleEndian::$read(bytes)
                }
            }
        )*
    };
}

frame_value!(u32 => read_u32, i32 => read_i32, u64 => read_u64, i64 => read_i64);

/// Read one frame from the current position of `reader`.
///
/// # Errors
///
/// Returns [`Error::TruncatedFrame`] if the source ends before the declared
/// number of bytes, and [`Error::Io`] if the length prefix itself is missing.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = reader.read_u32::<LittleEndian>()? as u64;

    let mut payload = Vec::with_capacity((len as usize).min(MAX_PREALLOC));
    reader.take(len).read_to_end(&mut payload)?;

    if payload.len() as u64 != len {
        return Err(Error::TruncatedFrame {
            expected: len,
            actual: payload.len() as u64,
        });
    }

    Ok(payload)
}

/// Read one frame and reinterpret it as a fixed-size value.
pub fn read_fixed<T: FrameValue, R: Read>(reader: &mut R) -> Result<T> {
    let payload = read_frame(reader)?;

    if payload.len() != T::SIZE {
        return Err(Error::FrameSizeMismatch {
            expected: T::SIZE,
            actual: payload.len(),
        });
    }

    Ok(T::decode(&payload))
}

/// Extract the text bytes from a header frame payload.
///
/// The payload's first four bytes declare the text length; anything past
/// that length is frame padding and is dropped.
pub fn text_payload(payload: &[u8]) -> Result<&[u8]> {
    if payload.len() < FRAME_PREFIX_LEN {
        return Err(Error::FrameSizeMismatch {
            expected: FRAME_PREFIX_LEN,
            actual: payload.len(),
        });
    }

    let declared = LittleEndian::read_u32(&payload[..FRAME_PREFIX_LEN]) as usize;
    let body = &payload[FRAME_PREFIX_LEN..];

    body.get(..declared).ok_or(Error::HeaderLength {
        declared: declared as u64,
        available: body.len() as u64,
    })
}
