//! Linear binary buffer used to hand records across process boundaries.
//!
//! Integers are little-endian. A string is an `i32` byte length (`-1` for an
//! absent string) followed by its UTF-8 bytes, zero-padded to the next
//! 4-byte boundary.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

const ABSENT_STRING: i32 = -1;
const ALIGNMENT: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParcelError {
    #[error("parcel truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("invalid string length {0}")]
    NegativeLength(i32),
    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),
}

#[derive(Debug, Default)]
pub struct ParcelWriter {
    buf: BytesMut,
}

impl ParcelWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_i32(i32::from(value));
    }

    pub fn write_string(&mut self, value: Option<&str>) {
        let Some(value) = value else {
            self.write_i32(ABSENT_STRING);
            return;
        };

        // Anything past i32::MAX bytes is cut off.
        let len = i32::try_from(value.len()).unwrap_or(i32::MAX);
        self.write_i32(len);
        self.buf.put_slice(&value.as_bytes()[..len as usize]);
        self.buf.put_bytes(0, padding(len as usize));
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

#[derive(Debug)]
pub struct ParcelReader<'a> {
    buf: &'a [u8],
}

impl<'a> ParcelReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn read_i32(&mut self) -> Result<i32, ParcelError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_i64(&mut self) -> Result<i64, ParcelError> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    /// Any value other than 1 reads as `false`.
    pub fn read_bool(&mut self) -> Result<bool, ParcelError> {
        Ok(self.read_i32()? == 1)
    }

    pub fn read_string(&mut self) -> Result<Option<String>, ParcelError> {
        let len = match self.read_i32()? {
            ABSENT_STRING => return Ok(None),
            len if len < 0 => return Err(ParcelError::NegativeLength(len)),
            len => len as usize,
        };

        self.ensure(len)?;
        let value = std::str::from_utf8(&self.buf[..len])
            .map_err(ParcelError::InvalidUtf8)?
            .to_owned();
        self.buf.advance(len);

        // The final field may legitimately omit its padding.
        let pad = padding(len).min(self.buf.remaining());
        self.buf.advance(pad);
        Ok(Some(value))
    }

    fn ensure(&self, needed: usize) -> Result<(), ParcelError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(ParcelError::Truncated { needed, remaining });
        }
        Ok(())
    }
}

fn padding(len: usize) -> usize {
    (ALIGNMENT - len % ALIGNMENT) % ALIGNMENT
}
