//! PackStream decoder.

use std::collections::HashMap;

use bytes::Buf;

use super::marker::*;
use super::types::{PackStreamStructure, PackStreamValue};
use super::PackStreamError;

/// Nesting limit for lists, maps and structures.
pub const MAX_DEPTH: usize = 256;

/// Reads packed values from a byte slice.
pub struct PackStreamDecoder<'a> {
    data: &'a [u8],
    depth: usize,
}

impl<'a> PackStreamDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, depth: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.has_remaining()
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> Result<PackStreamValue, PackStreamError> {
        let marker = self.take::<1>()?[0];
        if is_tiny_int(marker) {
            return Ok(PackStreamValue::Integer(marker as i8 as i64));
        }
        match tiny_family(marker) {
            TINY_STRING => return self.string(tiny_size(marker)),
            TINY_LIST => return self.list(tiny_size(marker)),
            TINY_MAP => return self.map(tiny_size(marker)),
            TINY_STRUCT => return self.structure(tiny_size(marker)),
            _ => {}
        }
        match marker {
            NULL => Ok(PackStreamValue::Null),
            TRUE => Ok(PackStreamValue::Boolean(true)),
            FALSE => Ok(PackStreamValue::Boolean(false)),
            FLOAT_64 => Ok(PackStreamValue::Float(f64::from_be_bytes(self.take()?))),
            INT_8 => Ok(PackStreamValue::Integer(i8::from_be_bytes(self.take()?) as i64)),
            INT_16 => Ok(PackStreamValue::Integer(i16::from_be_bytes(self.take()?) as i64)),
            INT_32 => Ok(PackStreamValue::Integer(i32::from_be_bytes(self.take()?) as i64)),
            INT_64 => Ok(PackStreamValue::Integer(i64::from_be_bytes(self.take()?))),
            BYTES_8 | BYTES_16 | BYTES_32 => {
                let len = self.size(marker - BYTES_8)?;
                Ok(PackStreamValue::Bytes(self.slice(len)?.to_vec()))
            }
            STRING_8 | STRING_16 | STRING_32 => {
                let len = self.size(marker - STRING_8)?;
                self.string(len)
            }
            LIST_8 | LIST_16 | LIST_32 => {
                let len = self.size(marker - LIST_8)?;
                self.list(len)
            }
            MAP_8 | MAP_16 | MAP_32 => {
                let len = self.size(marker - MAP_8)?;
                self.map(len)
            }
            STRUCT_8 | STRUCT_16 => {
                let len = self.size(marker - STRUCT_8)?;
                self.structure(len)
            }
            _ => Err(PackStreamError::UnknownMarker(marker)),
        }
    }

    /// Size following a sized marker; `width` 0, 1, 2 selects 8, 16, 32 bits.
    fn size(&mut self, width: u8) -> Result<usize, PackStreamError> {
        Ok(match width {
            0 => u8::from_be_bytes(self.take()?) as usize,
            1 => u16::from_be_bytes(self.take()?) as usize,
            _ => u32::from_be_bytes(self.take()?) as usize,
        })
    }

    fn string(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        let bytes = self.slice(len)?;
        std::str::from_utf8(bytes)
            .map(|s| PackStreamValue::String(s.to_string()))
            .map_err(|e| PackStreamError::InvalidUtf8(e.to_string()))
    }

    fn list(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        self.nested(|d| {
            let mut items = Vec::with_capacity(len.min(d.remaining()));
            for _ in 0..len {
                items.push(d.decode()?);
            }
            Ok(PackStreamValue::List(items))
        })
    }

    fn map(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        self.nested(|d| {
            let mut map = HashMap::with_capacity(len.min(d.remaining()));
            for _ in 0..len {
                let key = match d.decode()? {
                    PackStreamValue::String(s) => s,
                    _ => return Err(PackStreamError::InvalidMapKey),
                };
                let value = d.decode()?;
                map.insert(key, value);
            }
            Ok(PackStreamValue::Map(map))
        })
    }

    fn structure(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        let tag = self.take::<1>()?[0];
        self.nested(|d| {
            let mut fields = Vec::with_capacity(len.min(d.remaining()));
            for _ in 0..len {
                fields.push(d.decode()?);
            }
            Ok(PackStreamValue::Structure(PackStreamStructure::new(tag, fields)))
        })
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, PackStreamError>,
    ) -> Result<T, PackStreamError> {
        if self.depth >= MAX_DEPTH {
            return Err(PackStreamError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], PackStreamError> {
        if self.data.remaining() < N {
            return Err(PackStreamError::UnexpectedEof);
        }
        let mut out = [0u8; N];
        self.data.copy_to_slice(&mut out);
        Ok(out)
    }

    fn slice(&mut self, len: usize) -> Result<&'a [u8], PackStreamError> {
        if self.data.remaining() < len {
            return Err(PackStreamError::UnexpectedEof);
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }
}

/// Decode a single value from bytes.
pub fn decode(data: &[u8]) -> Result<PackStreamValue, PackStreamError> {
    PackStreamDecoder::new(data).decode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(decode(&[0xC0]).unwrap(), PackStreamValue::Null);
        assert_eq!(decode(&[0xC3]).unwrap(), PackStreamValue::Boolean(true));
        assert_eq!(decode(&[0xC2]).unwrap(), PackStreamValue::Boolean(false));
        assert_eq!(decode(&[0x2A]).unwrap(), PackStreamValue::Integer(42));
        assert_eq!(decode(&[0xFF]).unwrap(), PackStreamValue::Integer(-1));
        assert_eq!(decode(&[INT_8, 0x80]).unwrap(), PackStreamValue::Integer(-128));
        assert_eq!(decode(&[INT_16, 0x01, 0x00]).unwrap(), PackStreamValue::Integer(256));
        let mut float = vec![FLOAT_64];
        float.extend_from_slice(&2.5f64.to_be_bytes());
        assert_eq!(decode(&float).unwrap(), PackStreamValue::Float(2.5));
    }

    #[test]
    fn test_collections() {
        assert_eq!(
            decode(&[0x92, 0x01, 0x81, b'x']).unwrap(),
            PackStreamValue::List(vec![1i64.into(), "x".into()])
        );
        let map = decode(&[0xA1, 0x81, b'k', 0xC0]).unwrap();
        assert_eq!(map.as_map().unwrap().get("k"), Some(&PackStreamValue::Null));
        assert_eq!(
            decode(&[STRING_8, 0x02, b'o', b'k']).unwrap(),
            PackStreamValue::String("ok".into())
        );
        assert_eq!(
            decode(&[BYTES_8, 0x01, 0xAB]).unwrap(),
            PackStreamValue::Bytes(vec![0xAB])
        );
    }

    #[test]
    fn test_structure() {
        let value = decode(&[0xB2, 0x74, 0x01, 0x02]).unwrap();
        let s = value.as_structure().unwrap();
        assert_eq!(s.tag, 0x74);
        assert_eq!(s.fields.len(), 2);
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(decode(&[]), Err(PackStreamError::UnexpectedEof)));
        assert!(matches!(decode(&[INT_32, 0x00]), Err(PackStreamError::UnexpectedEof)));
        assert!(matches!(decode(&[0x83, b'a']), Err(PackStreamError::UnexpectedEof)));
        assert!(matches!(decode(&[0x92, 0x01]), Err(PackStreamError::UnexpectedEof)));
        // huge declared list over a short buffer must not preallocate
        assert!(matches!(
            decode(&[LIST_32, 0xFF, 0xFF, 0xFF, 0xFF]),
            Err(PackStreamError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(decode(&[0xC4]), Err(PackStreamError::UnknownMarker(0xC4))));
        assert!(matches!(decode(&[0xA1, 0x01, 0x01]), Err(PackStreamError::InvalidMapKey)));
        assert!(matches!(decode(&[0x81, 0xFF]), Err(PackStreamError::InvalidUtf8(_))));
    }

    #[test]
    fn test_nesting_limit() {
        let data = vec![0x91; MAX_DEPTH + 1];
        assert!(matches!(decode(&data), Err(PackStreamError::TooDeep(MAX_DEPTH))));
    }

    #[test]
    fn test_sequential_values() {
        let data = [0x01, 0xC0, 0x80];
        let mut decoder = PackStreamDecoder::new(&data);
        assert_eq!(decoder.decode().unwrap(), PackStreamValue::Integer(1));
        assert_eq!(decoder.decode().unwrap(), PackStreamValue::Null);
        assert_eq!(decoder.decode().unwrap(), PackStreamValue::String(String::new()));
        assert!(decoder.is_empty());
    }
}
