//! Order-preserving packing of HKeys into store keys
//!
//! ```text
//! segment := 0x01 ordinal(u32 BE) value*
//! Null    := 0x20
//! Bool    := 0x21 (false) | 0x22 (true)
//! Int     := 0x30 (i64 BE with sign bit flipped)
//! Float   := 0x40 (IEEE bits, negative values inverted, positive sign-flipped)
//! Text    := 0x50 escaped-bytes 0x00
//! Bytes   := 0x60 escaped-bytes 0x00
//! ```
//!
//! Escaping writes a literal 0x00 as 0x00 0xFF so the terminator stays
//! unambiguous. Byte comparison of packed keys equals `HKey` comparison,
//! and a packed parent is a strict prefix of every packed descendant.
//!
//! A packed key can also be a byte prefix of a sibling (`"a"` of `"a\0"`),
//! so a subtree is bounded by `subtree_end`, never by the raw prefix.

use thiserror::Error;

use crate::types::Value;

use super::hkey::{HKey, HKeySegment};

const SEGMENT: u8 = 0x01;
const NULL: u8 = 0x20;
const FALSE: u8 = 0x21;
const TRUE: u8 = 0x22;
const INT: u8 = 0x30;
const FLOAT: u8 = 0x40;
const TEXT: u8 = 0x50;
const BYTES: u8 = 0x60;

const ESCAPE: u8 = 0xFF;
const SIGN: u64 = 1 << 63;

/// Malformed packed key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HKeyDecodeError {
    #[error("packed key is empty")]
    Empty,

    #[error("expected segment marker at offset {0}")]
    MissingSegment(usize),

    #[error("packed key truncated at offset {0}")]
    Truncated(usize),

    #[error("unknown key tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("text segment at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),
}

/// Pack an HKey into its store key
pub fn pack(hkey: &HKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 * hkey.depth());
    for segment in hkey.segments() {
        out.push(SEGMENT);
        out.extend_from_slice(&segment.ordinal.to_be_bytes());
        for value in &segment.values {
            pack_value(value, &mut out);
        }
    }
    out
}

fn pack_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(NULL),
        Value::Bool(false) => out.push(FALSE),
        Value::Bool(true) => out.push(TRUE),
        Value::Int(i) => {
            out.push(INT);
            out.extend_from_slice(&((*i as u64) ^ SIGN).to_be_bytes());
        }
        Value::Float(f) => {
            out.push(FLOAT);
            let bits = f.to_bits();
            let ordered = if bits & SIGN != 0 { !bits } else { bits ^ SIGN };
            out.extend_from_slice(&ordered.to_be_bytes());
        }
        Value::Text(s) => {
            out.push(TEXT);
            pack_escaped(s.as_bytes(), out);
        }
        Value::Bytes(b) => {
            out.push(BYTES);
            pack_escaped(b, out);
        }
    }
}

fn pack_escaped(bytes: &[u8], out: &mut Vec<u8>) {
    for &b in bytes {
        out.push(b);
        if b == 0x00 {
            out.push(ESCAPE);
        }
    }
    out.push(0x00);
}

/// Exclusive upper bound of the subtree rooted at `packed`.
///
/// Descendants continue `packed` with a segment marker; any other
/// continuation is a different key at the same or a shallower depth.
pub fn subtree_end(packed: &[u8]) -> Vec<u8> {
    let mut end = Vec::with_capacity(packed.len() + 1);
    end.extend_from_slice(packed);
    end.push(SEGMENT + 1);
    end
}

/// Unpack a store key produced by `pack`
pub fn unpack(bytes: &[u8]) -> Result<HKey, HKeyDecodeError> {
    if bytes.is_empty() {
        return Err(HKeyDecodeError::Empty);
    }
    let mut segments = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != SEGMENT {
            return Err(HKeyDecodeError::MissingSegment(pos));
        }
        pos += 1;
        let ordinal = u32::from_be_bytes(fixed::<4>(bytes, pos)?);
        pos += 4;

        let mut values = Vec::new();
        while pos < bytes.len() && bytes[pos] != SEGMENT {
            let (value, next) = unpack_value(bytes, pos)?;
            values.push(value);
            pos = next;
        }
        segments.push(HKeySegment::new(ordinal, values));
    }
    Ok(HKey::from_segments(segments))
}

fn fixed<const N: usize>(bytes: &[u8], pos: usize) -> Result<[u8; N], HKeyDecodeError> {
    let slice = bytes
        .get(pos..pos + N)
        .ok_or(HKeyDecodeError::Truncated(pos))?;
    let mut buf = [0u8; N];
    buf.copy_from_slice(slice);
    Ok(buf)
}

fn unpack_value(bytes: &[u8], pos: usize) -> Result<(Value, usize), HKeyDecodeError> {
    let tag = bytes[pos];
    let body = pos + 1;
    match tag {
        NULL => Ok((Value::Null, body)),
        FALSE => Ok((Value::Bool(false), body)),
        TRUE => Ok((Value::Bool(true), body)),
        INT => {
            let raw = u64::from_be_bytes(fixed::<8>(bytes, body)?);
            Ok((Value::Int((raw ^ SIGN) as i64), body + 8))
        }
        FLOAT => {
            let ordered = u64::from_be_bytes(fixed::<8>(bytes, body)?);
            let bits = if ordered & SIGN != 0 { ordered ^ SIGN } else { !ordered };
            Ok((Value::Float(f64::from_bits(bits)), body + 8))
        }
        TEXT => {
            let (raw, next) = unpack_escaped(bytes, body)?;
            let text = String::from_utf8(raw).map_err(|_| HKeyDecodeError::InvalidUtf8(body))?;
            Ok((Value::Text(text), next))
        }
        BYTES => {
            let (raw, next) = unpack_escaped(bytes, body)?;
            Ok((Value::Bytes(raw), next))
        }
        other => Err(HKeyDecodeError::UnknownTag {
            tag: other,
            offset: pos,
        }),
    }
}

fn unpack_escaped(bytes: &[u8], mut pos: usize) -> Result<(Vec<u8>, usize), HKeyDecodeError> {
    let mut raw = Vec::new();
    loop {
        let b = *bytes.get(pos).ok_or(HKeyDecodeError::Truncated(pos))?;
        if b == 0x00 {
            if bytes.get(pos + 1) == Some(&ESCAPE) {
                raw.push(0x00);
                pos += 2;
                continue;
            }
            return Ok((raw, pos + 1));
        }
        raw.push(b);
        pos += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(segments: &[(u32, Vec<Value>)]) -> HKey {
        HKey::from_segments(
            segments
                .iter()
                .map(|(o, v)| HKeySegment::new(*o, v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_subtree_end_excludes_nul_sibling() {
        let root = key(&[(1, vec![Value::from("a")])]);
        let child = root.extend(2, vec![Value::Int(1)]);
        let grandchild = child.extend(3, vec![Value::from("\0")]);
        let sibling = key(&[(1, vec![Value::from("a\0")])]);
        let next = key(&[(1, vec![Value::from("a\0\0")])]);

        let start = pack(&root);
        let end = subtree_end(&start);
        for inside in [&root, &child, &grandchild] {
            let packed = pack(inside);
            assert!(packed >= start && packed < end, "{} inside", inside);
        }
        for outside in [&sibling, &next] {
            let packed = pack(outside);
            assert!(packed.starts_with(&start));
            assert!(packed >= end, "{} outside", outside);
        }
    }

    #[test]
    fn test_byte_order_matches_hkey_order() {
        let keys = vec![
            key(&[(1, vec![Value::Int(-5)])]),
            key(&[(1, vec![Value::Int(-5)]), (2, vec![Value::from("")])]),
            key(&[(1, vec![Value::Int(-5)]), (2, vec![Value::from("a")])]),
            key(&[(1, vec![Value::Int(-5)]), (2, vec![Value::from("a\0")])]),
            key(&[(1, vec![Value::Int(-5)]), (2, vec![Value::from("ab")])]),
            key(&[(1, vec![Value::Int(-5)]), (3, vec![Value::Null])]),
            key(&[(1, vec![Value::Int(0)])]),
            key(&[(1, vec![Value::Int(7)]), (2, vec![Value::Float(-2.5)])]),
            key(&[(1, vec![Value::Int(7)]), (2, vec![Value::Float(0.0)])]),
            key(&[(1, vec![Value::Int(7)]), (2, vec![Value::Float(1e10)])]),
            key(&[(1, vec![Value::Float(1.0)])]),
            key(&[(1, vec![Value::Bytes(vec![0, 0])])]),
        ];
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{} < {}", pair[0], pair[1]);
            assert!(pack(&pair[0]) < pack(&pair[1]), "packed {} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_parent_is_byte_prefix() {
        let parent = key(&[(1, vec![Value::from("x\0y"), Value::Int(3)])]);
        let child = parent.extend(2, vec![Value::Bool(true)]);
        let packed_parent = pack(&parent);
        assert!(pack(&child).starts_with(&packed_parent));
    }

    #[test]
    fn test_unpack_restores_key() {
        let original = key(&[
            (1, vec![Value::Int(i64::MIN), Value::Null]),
            (4, vec![Value::from("a\0b"), Value::Bytes(vec![0xff, 0x00])]),
            (9, vec![Value::Float(-0.0), Value::Bool(false)]),
        ]);
        assert_eq!(unpack(&pack(&original)).unwrap(), original);
    }

    #[test]
    fn test_unpack_errors() {
        assert_eq!(unpack(&[]), Err(HKeyDecodeError::Empty));
        assert_eq!(unpack(&[0x30]), Err(HKeyDecodeError::MissingSegment(0)));
        assert_eq!(unpack(&[SEGMENT, 0, 0]), Err(HKeyDecodeError::Truncated(1)));
        assert_eq!(
            unpack(&[SEGMENT, 0, 0, 0, 1, 0x99]),
            Err(HKeyDecodeError::UnknownTag { tag: 0x99, offset: 5 })
        );
        assert_eq!(
            unpack(&[SEGMENT, 0, 0, 0, 1, TEXT, b'a']),
            Err(HKeyDecodeError::Truncated(7))
        );
    }
}
