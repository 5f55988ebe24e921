//! Primitive encodings shared by the [`Compiler`] and the [`Interpreter`].
//!
//! All integers are unsigned LEB128 varints: seven bits per byte, least
//! significant group first, high bit set on every byte except the last.
//!
//! | Field          | Encoding                                                     |
//! |----------------|--------------------------------------------------------------|
//! | integer        | varint                                                       |
//! | string         | varint `len + 1`, then `len` UTF-8 bytes; `0` means *absent* |
//! | text run       | varint `len`, then `len` UTF-8 bytes                         |
//!
//! Reserving `0` in the string prefix keeps the empty string distinct from an
//! absent one. A single string or text run is limited to [`MAX_FIELD_LEN`]
//! bytes; writers refuse longer fields with [`EncodeError::FieldTooLong`]
//! and leave the buffer untouched.
//!
//! [`Compiler`]: crate::Compiler
//! [`Interpreter`]: crate::Interpreter

use std::ops::Range;
use std::str::from_utf8;

use crate::errors::{DecodeError, EncodeError};
use crate::opcode::Opcode;

/// Maximum number of bytes in a single string or text field.
pub const MAX_FIELD_LEN: usize = u32::MAX as usize - 1;

/// Maximum number of bytes in an encoded `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Returns the number of bytes [`write_varint`] needs for `value`.
#[inline]
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Appends `value` as a varint.
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) -> Result<(), EncodeError> {
    buf.try_reserve(varint_len(value))?;
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
    Ok(())
}

/// Appends the opcode byte of a record.
#[inline]
pub fn write_opcode(buf: &mut Vec<u8>, opcode: Opcode) -> Result<(), EncodeError> {
    buf.try_reserve(1)?;
    buf.push(opcode.to_byte());
    Ok(())
}

/// Appends a string that may be absent.
pub fn write_opt_str(buf: &mut Vec<u8>, value: Option<&str>) -> Result<(), EncodeError> {
    match value {
        None => write_varint(buf, 0),
        Some(s) => write_field(buf, s.as_bytes(), 1, MAX_FIELD_LEN),
    }
}

/// Appends a string that is always present.
#[inline]
pub fn write_str(buf: &mut Vec<u8>, value: &str) -> Result<(), EncodeError> {
    write_opt_str(buf, Some(value))
}

/// Appends a text run of a `Characters`, `IgnorableWhitespace` or `Comment` record.
pub fn write_text(buf: &mut Vec<u8>, text: &str) -> Result<(), EncodeError> {
    write_field(buf, text.as_bytes(), 0, MAX_FIELD_LEN)
}

/// Appends a length prefix `bytes.len() + bias` followed by `bytes`.
/// Fields longer than `max` are refused before anything is written.
fn write_field(buf: &mut Vec<u8>, bytes: &[u8], bias: u64, max: usize) -> Result<(), EncodeError> {
    if bytes.len() > max {
        return Err(EncodeError::FieldTooLong {
            length: bytes.len(),
            max,
        });
    }
    let prefix = bytes.len() as u64 + bias;
    buf.try_reserve(varint_len(prefix) + bytes.len())?;
    write_varint(buf, prefix)?;
    buf.extend_from_slice(bytes);
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A reading position in an encoded stream.
///
/// All reads are bounds-checked: a field that does not fit into the remaining
/// bytes is reported as [`DecodeError::Truncated`], never read partially.
/// Offsets in errors are relative to the start of the slice given to [`new`].
///
/// [`new`]: Cursor::new
#[derive(Clone, Debug)]
pub struct Cursor<'b> {
    bytes: &'b [u8],
    position: usize,
}

impl<'b> Cursor<'b> {
    /// Creates a cursor at the start of `bytes`.
    #[inline]
    pub fn new(bytes: &'b [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Returns the offset of the next unread byte.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Returns `true` if every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the whole underlying slice, including already consumed bytes.
    #[inline]
    pub fn get_ref(&self) -> &'b [u8] {
        self.bytes
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        match self.bytes.get(self.position) {
            Some(byte) => {
                self.position += 1;
                Ok(*byte)
            }
            None => Err(self.truncated(self.position, 1)),
        }
    }

    /// Reads an opcode byte. Bytes outside of the opcode table are rejected.
    pub fn read_opcode(&mut self) -> Result<Opcode, DecodeError> {
        let offset = self.position;
        let byte = self.read_u8()?;
        Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode {
            opcode: byte,
            offset,
        })
    }

    /// Reads a varint.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let offset = self.position;
        let mut value = 0u64;
        for index in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            let group = u64::from(byte & 0x7F);
            // the tenth byte may carry only the single remaining bit
            if index == MAX_VARINT_LEN - 1 && group > 1 {
                return Err(DecodeError::VarintOverflow { offset });
            }
            value |= group << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::VarintOverflow { offset })
    }

    /// Reads a varint that counts items or bytes and checks that it fits into
    /// `usize` and does not exceed `max`.
    pub fn read_len(&mut self, max: usize) -> Result<usize, DecodeError> {
        let offset = self.position;
        let length = self.read_varint()?;
        match usize::try_from(length) {
            Ok(len) if len <= max => Ok(len),
            _ => Err(DecodeError::LengthOverflow { offset, length }),
        }
    }

    /// Reads a string that may be absent and returns the range it occupies
    /// in the underlying slice. The bytes in the range are valid UTF-8.
    pub fn read_opt_str_range(&mut self) -> Result<Option<Range<usize>>, DecodeError> {
        let offset = self.position;
        match self.read_len(MAX_FIELD_LEN + 1)? {
            0 => Ok(None),
            len => {
                let s = self.take_utf8(offset, len - 1)?;
                Ok(Some(self.position - s.len()..self.position))
            }
        }
    }

    /// Reads a string that must be present and returns the range it occupies
    /// in the underlying slice.
    pub fn read_str_range(&mut self) -> Result<Range<usize>, DecodeError> {
        let offset = self.position;
        self.read_opt_str_range()?
            .ok_or(DecodeError::UnexpectedAbsent { offset })
    }

    /// Reads a string that may be absent.
    #[inline]
    pub fn read_opt_str(&mut self) -> Result<Option<&'b str>, DecodeError> {
        let offset = self.position;
        match self.read_len(MAX_FIELD_LEN + 1)? {
            0 => Ok(None),
            len => self.take_utf8(offset, len - 1).map(Some),
        }
    }

    /// Reads a string that must be present.
    #[inline]
    pub fn read_str(&mut self) -> Result<&'b str, DecodeError> {
        let offset = self.position;
        self.read_opt_str()?
            .ok_or(DecodeError::UnexpectedAbsent { offset })
    }

    /// Reads a text run.
    pub fn read_text(&mut self) -> Result<&'b str, DecodeError> {
        let offset = self.position;
        let len = self.read_len(MAX_FIELD_LEN)?;
        self.take_utf8(offset, len)
    }

    /// Consumes `len` bytes that must form a valid UTF-8 string.
    /// `offset` is the start of the field, used in errors.
    fn take_utf8(&mut self, offset: usize, len: usize) -> Result<&'b str, DecodeError> {
        let start = self.position;
        if len > self.remaining() {
            return Err(self.truncated(offset, self.position - offset + len));
        }
        let end = start + len;
        let bytes: &'b [u8] = self.bytes;
        let s = from_utf8(&bytes[start..end]).map_err(|error| DecodeError::Utf8 {
            offset: start,
            error,
        })?;
        self.position = end;
        Ok(s)
    }

    #[inline]
    fn truncated(&self, offset: usize, needed: usize) -> DecodeError {
        DecodeError::Truncated {
            offset,
            needed,
            available: self.bytes.len() - offset,
        }
    }
}

/// Returns the string at `range`, which was validated when it was read by a
/// [`Cursor`] over the same `bytes`. Used for attribute fields, which are
/// kept as ranges and looked up on demand.
#[inline]
pub(crate) fn str_at(bytes: &[u8], range: Range<usize>) -> &str {
    bytes
        .get(range)
        .and_then(|b| from_utf8(b).ok())
        .unwrap_or_default()
}
