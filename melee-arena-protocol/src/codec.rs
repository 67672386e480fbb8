//! Binary framing for the Talk stream.
//!
//! Big-endian, length-prefixed collections, one tag byte per enum. A frame
//! is a single encoded message; decoding rejects trailing bytes so a frame
//! can never smuggle a second message.

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use melee_arena_geom::Vec2;
use thiserror::Error;

type O = BigEndian;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid bool encoding 0x{0:02x}")]
    InvalidBool(u8),

    #[error("string is not valid utf-8")]
    InvalidUtf8,

    #[error("invalid {0} tag 0x{1:02x}")]
    InvalidTag(&'static str, u8),

    #[error("{0} unexpected trailing byte(s)")]
    TrailingData(usize),
}

pub trait StreamCodec: Sized {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError>;
    fn write_to(&self, w: &mut Vec<u8>);
}

/// Encodes one message into a fresh frame.
pub fn encode<T: StreamCodec>(value: &T) -> Vec<u8> {
    let mut w = Vec::new();
    value.write_to(&mut w);
    w
}

/// Decodes exactly one message from a frame.
pub fn decode<T: StreamCodec>(mut bytes: &[u8]) -> Result<T, DecodeError> {
    let value = T::read_from(&mut bytes)?;
    if !bytes.is_empty() {
        return Err(DecodeError::TrailingData(bytes.len()));
    }
    Ok(value)
}

fn eof<T>(result: std::io::Result<T>) -> Result<T, DecodeError> {
    result.map_err(|_| DecodeError::UnexpectedEof)
}

impl StreamCodec for u8 {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        eof(r.read_u8())
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        w.write_u8(*self).unwrap();
    }
}

macro_rules! impl_stream_codec_for_number {
    ($t:ty, $read:ident, $write:ident) => {
        impl StreamCodec for $t {
            fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
                eof(r.$read::<O>())
            }

            fn write_to(&self, w: &mut Vec<u8>) {
                w.$write::<O>(*self).unwrap();
            }
        }
    };
}

impl_stream_codec_for_number!(u16, read_u16, write_u16);
impl_stream_codec_for_number!(u32, read_u32, write_u32);
impl_stream_codec_for_number!(u64, read_u64, write_u64);
impl_stream_codec_for_number!(i32, read_i32, write_i32);
impl_stream_codec_for_number!(i64, read_i64, write_i64);
impl_stream_codec_for_number!(f32, read_f32, write_f32);

impl StreamCodec for bool {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::read_from(r)? {
            0 => Ok(false),
            1 => Ok(true),
            x => Err(DecodeError::InvalidBool(x)),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        w.write_u8(u8::from(*self)).unwrap();
    }
}

impl StreamCodec for String {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        let len = u32::read_from(r)? as usize;
        if r.len() < len {
            return Err(DecodeError::UnexpectedEof);
        }
        let mut bytes = vec![0; len];
        eof(r.read_exact(&mut bytes))?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        (self.len() as u32).write_to(w);
        w.extend_from_slice(self.as_bytes());
    }
}

impl<T: StreamCodec> StreamCodec for Option<T> {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(if bool::read_from(r)? {
            Some(T::read_from(r)?)
        } else {
            None
        })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        match self {
            Some(value) => {
                true.write_to(w);
                value.write_to(w);
            }
            None => false.write_to(w),
        }
    }
}

impl<T: StreamCodec> StreamCodec for Vec<T> {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        let count = u32::read_from(r)? as usize;
        // Cap the preallocation; a hostile count must not allocate gigabytes.
        let mut values = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            values.push(T::read_from(r)?);
        }
        Ok(values)
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        (self.len() as u32).write_to(w);
        for value in self {
            value.write_to(w);
        }
    }
}

impl StreamCodec for Vec2 {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Vec2::new(f32::read_from(r)?, f32::read_from(r)?))
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.x.write_to(w);
        self.y.write_to(w);
    }
}
