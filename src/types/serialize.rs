//! Value serialization strategy
//!
//! Used for row payloads in the store and for sort spill records. The
//! encoding is lossless: decoding reproduces a value that compares equal
//! bit for bit, which keeps spilled runs in the same order they were sorted in.
//!
//! Default encoding:
//!
//! ```text
//! Null   0x00
//! Bool   0x01 u8
//! Int    0x02 i64 BE
//! Float  0x03 u64 BE (IEEE bits)
//! Text   0x04 u32 BE length, UTF-8 bytes
//! Bytes  0x05 u32 BE length, bytes
//! ```

use thiserror::Error;

use super::compare::DefaultTypes;
use super::value::Value;

const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_FLOAT: u8 = 0x03;
const TAG_TEXT: u8 = 0x04;
const TAG_BYTES: u8 = 0x05;

/// Failure to decode serialized values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated value: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("unknown value tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("text value is not valid UTF-8")]
    InvalidUtf8,
}

/// Serializer for scalar values
pub trait ValueSerializer: Send + Sync {
    /// Append the encoding of `value` to `out`
    fn write_value(&self, value: &Value, out: &mut Vec<u8>);

    /// Decode one value from the front of `input`.
    ///
    /// Returns the value and the number of bytes consumed.
    fn read_value(&self, input: &[u8]) -> Result<(Value, usize), DecodeError>;
}

/// Append every value in order
pub fn write_values(serializer: &dyn ValueSerializer, values: &[Value], out: &mut Vec<u8>) {
    for value in values {
        serializer.write_value(value, out);
    }
}

/// Decode values until `input` is exhausted
pub fn read_values(
    serializer: &dyn ValueSerializer,
    mut input: &[u8],
) -> Result<Vec<Value>, DecodeError> {
    let mut values = Vec::new();
    while !input.is_empty() {
        let (value, used) = serializer.read_value(input)?;
        values.push(value);
        input = &input[used..];
    }
    Ok(values)
}

fn take(input: &[u8], needed: usize) -> Result<&[u8], DecodeError> {
    if input.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            available: input.len(),
        });
    }
    Ok(&input[..needed])
}

fn read_len_prefixed(input: &[u8]) -> Result<(&[u8], usize), DecodeError> {
    let len_bytes = take(input, 4)?;
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    let body = take(&input[4..], len)?;
    Ok((body, 4 + len))
}

impl ValueSerializer for DefaultTypes {
    fn write_value(&self, value: &Value, out: &mut Vec<u8>) {
        match value {
            Value::Null => out.push(TAG_NULL),
            Value::Bool(b) => {
                out.push(TAG_BOOL);
                out.push(u8::from(*b));
            }
            Value::Int(i) => {
                out.push(TAG_INT);
                out.extend_from_slice(&i.to_be_bytes());
            }
            Value::Float(f) => {
                out.push(TAG_FLOAT);
                out.extend_from_slice(&f.to_bits().to_be_bytes());
            }
            Value::Text(s) => {
                out.push(TAG_TEXT);
                out.extend_from_slice(&(s.len() as u32).to_be_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            Value::Bytes(b) => {
                out.push(TAG_BYTES);
                out.extend_from_slice(&(b.len() as u32).to_be_bytes());
                out.extend_from_slice(b);
            }
        }
    }

    fn read_value(&self, input: &[u8]) -> Result<(Value, usize), DecodeError> {
        let tag = take(input, 1)?[0];
        let rest = &input[1..];
        match tag {
            TAG_NULL => Ok((Value::Null, 1)),
            TAG_BOOL => {
                let b = take(rest, 1)?;
                Ok((Value::Bool(b[0] != 0), 2))
            }
            TAG_INT => {
                let b = take(rest, 8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(b);
                Ok((Value::Int(i64::from_be_bytes(buf)), 9))
            }
            TAG_FLOAT => {
                let b = take(rest, 8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(b);
                Ok((Value::Float(f64::from_bits(u64::from_be_bytes(buf))), 9))
            }
            TAG_TEXT => {
                let (body, used) = read_len_prefixed(rest)?;
                let s = std::str::from_utf8(body).map_err(|_| DecodeError::InvalidUtf8)?;
                Ok((Value::Text(s.to_string()), 1 + used))
            }
            TAG_BYTES => {
                let (body, used) = read_len_prefixed(rest)?;
                Ok((Value::Bytes(body.to_vec()), 1 + used))
            }
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}
