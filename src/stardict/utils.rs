//! Low-level byte reading and writing utilities.
//!
//! StarDict stores every integer in network byte order and every headword as
//! a null-terminated UTF-8 string. Offsets are 4 or 8 bytes wide depending on
//! the dictionary's `idxoffsetbits`; all other numbers are 4 bytes.

use std::io::{BufRead, Write};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::types::error::{Result, StardictError};

/// Encodes `value` as a big-endian integer of `width_bits` (32 or 64) bits.
pub fn encode_uint(value: u64, width_bits: u32) -> Result<Vec<u8>> {
    match width_bits {
        64 => {
            let mut out = vec![0u8; 8];
            BigEndian::write_u64(&mut out, value);
            Ok(out)
        }
        32 => {
            let narrow = u32::try_from(value).map_err(|_| {
                StardictError::InvalidFormat(format!("Value {} does not fit in 32 bits", value))
            })?;
            let mut out = vec![0u8; 4];
            BigEndian::write_u32(&mut out, narrow);
            Ok(out)
        }
        _ => Err(StardictError::UnsupportedOffsetWidth(width_bits)),
    }
}

/// Decodes a big-endian integer of `width_bits` bits. `bytes` must be exactly that wide.
pub fn decode_uint(bytes: &[u8], width_bits: u32) -> Result<u64> {
    let expected = match width_bits {
        32 | 64 => (width_bits / 8) as usize,
        _ => return Err(StardictError::UnsupportedOffsetWidth(width_bits)),
    };
    if bytes.len() != expected {
        return Err(StardictError::SizeMismatch {
            context: "big-endian integer",
            expected: expected as u64,
            found: bytes.len() as u64,
        });
    }
    Ok(match width_bits {
        64 => BigEndian::read_u64(bytes),
        _ => BigEndian::read_u32(bytes) as u64,
    })
}

/// Write a 4 or 8 byte big-endian number.
pub fn write_number(writer: &mut impl Write, value: u64, number_width: usize) -> Result<()> {
    match number_width {
        8 => writer.write_u64::<BigEndian>(value)?,
        4 => {
            let narrow = u32::try_from(value).map_err(|_| {
                StardictError::InvalidFormat(format!("Value {} does not fit in 32 bits", value))
            })?;
            writer.write_u32::<BigEndian>(narrow)?
        }
        _ => {
            return Err(StardictError::InvalidFormat(format!(
                "Invalid number width: {}",
                number_width
            )))
        }
    }
    Ok(())
}

/// Encodes `text` as UTF-8 followed by a single `\0`.
pub fn encode_cstring(text: &str) -> Result<Vec<u8>> {
    if text.as_bytes().contains(&0) {
        return Err(StardictError::SchemaMismatch(format!(
            "String {:?} contains a NUL byte",
            text
        )));
    }
    let mut out = Vec::with_capacity(text.len() + 1);
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    Ok(out)
}

/// Writes `text` as a null-terminated string and returns the bytes written.
pub fn write_cstring(writer: &mut impl Write, text: &str) -> Result<usize> {
    let bytes = encode_cstring(text)?;
    writer.write_all(&bytes)?;
    Ok(bytes.len())
}

/// Reads a null-terminated UTF-8 string from a buffered stream.
///
/// Fails with `InvalidFormat` if the stream ends before the terminator. The
/// stream position is unknown here, so callers that track one should use
/// [`ByteReader::read_cstring`] for a positioned `Truncated` error.
pub fn read_cstring(reader: &mut impl BufRead) -> Result<String> {
    let mut buf = Vec::new();
    reader.read_until(0, &mut buf)?;
    if buf.pop() == Some(0) {
        return decode_utf8(buf);
    }
    Err(StardictError::InvalidFormat(format!(
        "Unterminated string: stream ended after {} bytes",
        buf.len()
    )))
}

fn decode_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| StardictError::InvalidFormat(format!("Invalid UTF-8 in string: {}", e)))
}

/// A forward-only reader over an in-memory byte slice.
///
/// Every failure reports the absolute offset at which it occurred, counted
/// from `base` (the position of the slice inside its file).
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    pub fn with_base(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    fn truncated(&self, context: &'static str) -> StardictError {
        StardictError::Truncated {
            context,
            offset: self.offset(),
        }
    }

    pub fn read_u8(&mut self, context: &'static str) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or_else(|| self.truncated(context))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize, context: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(self.truncated(context));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Consumes everything that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    /// Read a 4 or 8 byte big-endian number.
    pub fn read_number(&mut self, number_width: usize, context: &'static str) -> Result<u64> {
        match number_width {
            8 => Ok(BigEndian::read_u64(self.read_bytes(8, context)?)),
            4 => Ok(BigEndian::read_u32(self.read_bytes(4, context)?) as u64),
            _ => Err(StardictError::InvalidFormat(format!(
                "Invalid number width: {}",
                number_width
            ))),
        }
    }

    /// Bytes up to (not including) the next `\0`; the terminator is consumed.
    pub fn read_cstring_bytes(&mut self, context: &'static str) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&byte| byte == 0)
            .ok_or_else(|| self.truncated(context))?;
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    /// A null-terminated UTF-8 string.
    pub fn read_cstring(&mut self, context: &'static str) -> Result<String> {
        let start = self.offset();
        let bytes = self.read_cstring_bytes(context)?;
        std::str::from_utf8(bytes).map(str::to_owned).map_err(|e| {
            StardictError::InvalidFormat(format!(
                "Invalid UTF-8 in {} at byte offset {}: {}",
                context, start, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_encoding_is_big_endian() {
        assert_eq!(encode_uint(0x0102_0304, 32).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(
            encode_uint(0x0102_0304_0506_0708, 64).unwrap(),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert_eq!(decode_uint(&[0, 0, 1, 0], 32).unwrap(), 256);
        assert_eq!(decode_uint(&[0, 0, 0, 0, 0, 0, 1, 0], 64).unwrap(), 256);
    }

    #[test]
    fn uint_rejects_bad_width_and_length() {
        assert!(matches!(
            encode_uint(1, 16),
            Err(StardictError::UnsupportedOffsetWidth(16))
        ));
        assert!(decode_uint(&[0, 0, 1], 32).unwrap_err().is_format_error());
        assert!(encode_uint(u64::from(u32::MAX) + 1, 32).is_err());
    }

    #[test]
    fn cstring_round_trip_and_truncation() {
        let bytes = encode_cstring("žluťoučký").unwrap();
        assert_eq!(*bytes.last().unwrap(), 0);
        let mut stream = &bytes[..];
        assert_eq!(read_cstring(&mut stream).unwrap(), "žluťoučký");

        let mut short: &[u8] = b"abc";
        let err = read_cstring(&mut short).unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(err.to_string(), "Invalid format: Unterminated string: stream ended after 3 bytes");
        assert!(encode_cstring("a\0b").unwrap_err().is_schema_mismatch());
    }

    #[test]
    fn byte_reader_reports_absolute_offsets() {
        let data = b"ab\0\x00\x00";
        let mut reader = ByteReader::with_base(data, 100);
        assert_eq!(reader.read_cstring("word").unwrap(), "ab");
        match reader.read_number(4, "size") {
            Err(StardictError::Truncated { offset, .. }) => assert_eq!(offset, 103),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
