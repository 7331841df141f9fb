//! PackStream encoder.

use std::collections::HashMap;

use bytes::{BufMut, BytesMut};

use super::marker::*;
use super::types::{PackStreamStructure, PackStreamValue};
use super::PackStreamError;

/// Size markers of a sized type: tiny family (if any), then 8/16/32 bit forms.
struct SizeMarkers {
    name: &'static str,
    tiny: Option<u8>,
    sized: [Option<u8>; 3],
}

const BYTES: SizeMarkers = SizeMarkers {
    name: "bytes",
    tiny: None,
    sized: [Some(BYTES_8), Some(BYTES_16), Some(BYTES_32)],
};
const STRING: SizeMarkers = SizeMarkers {
    name: "string",
    tiny: Some(TINY_STRING),
    sized: [Some(STRING_8), Some(STRING_16), Some(STRING_32)],
};
const LIST: SizeMarkers = SizeMarkers {
    name: "list",
    tiny: Some(TINY_LIST),
    sized: [Some(LIST_8), Some(LIST_16), Some(LIST_32)],
};
const MAP: SizeMarkers = SizeMarkers {
    name: "map",
    tiny: Some(TINY_MAP),
    sized: [Some(MAP_8), Some(MAP_16), Some(MAP_32)],
};
const STRUCT: SizeMarkers = SizeMarkers {
    name: "structure",
    tiny: Some(TINY_STRUCT),
    sized: [Some(STRUCT_8), Some(STRUCT_16), None],
};

/// Writes packed values into a growable buffer.
pub struct PackStreamEncoder {
    buffer: BytesMut,
}

impl Default for PackStreamEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackStreamEncoder {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_bytes(self) -> BytesMut {
        self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Encode any value.
    pub fn encode(&mut self, value: &PackStreamValue) -> Result<(), PackStreamError> {
        match value {
            PackStreamValue::Null => self.buffer.put_u8(NULL),
            PackStreamValue::Boolean(b) => self.buffer.put_u8(if *b { TRUE } else { FALSE }),
            PackStreamValue::Integer(i) => self.encode_int(*i),
            PackStreamValue::Float(f) => {
                self.buffer.put_u8(FLOAT_64);
                self.buffer.put_f64(*f);
            }
            PackStreamValue::Bytes(b) => {
                self.write_header(&BYTES, b.len())?;
                self.buffer.put_slice(b);
            }
            PackStreamValue::String(s) => self.encode_string(s)?,
            PackStreamValue::List(items) => {
                self.write_header(&LIST, items.len())?;
                for item in items {
                    self.encode(item)?;
                }
            }
            PackStreamValue::Map(map) => self.encode_map(map)?,
            PackStreamValue::Structure(s) => self.encode_structure(s)?,
        }
        Ok(())
    }

    /// Integer in its smallest representation.
    pub fn encode_int(&mut self, value: i64) {
        if (TINY_INT_MIN..=TINY_INT_MAX).contains(&value) {
            self.buffer.put_i8(value as i8);
        } else if let Ok(v) = i8::try_from(value) {
            self.buffer.put_u8(INT_8);
            self.buffer.put_i8(v);
        } else if let Ok(v) = i16::try_from(value) {
            self.buffer.put_u8(INT_16);
            self.buffer.put_i16(v);
        } else if let Ok(v) = i32::try_from(value) {
            self.buffer.put_u8(INT_32);
            self.buffer.put_i32(v);
        } else {
            self.buffer.put_u8(INT_64);
            self.buffer.put_i64(value);
        }
    }

    pub fn encode_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        self.write_header(&STRING, value.len())?;
        self.buffer.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn encode_map(&mut self, map: &HashMap<String, PackStreamValue>) -> Result<(), PackStreamError> {
        self.write_header(&MAP, map.len())?;
        for (key, value) in map {
            self.encode_string(key)?;
            self.encode(value)?;
        }
        Ok(())
    }

    pub fn encode_structure(&mut self, structure: &PackStreamStructure) -> Result<(), PackStreamError> {
        self.write_header(&STRUCT, structure.fields.len())?;
        self.buffer.put_u8(structure.tag);
        for field in &structure.fields {
            self.encode(field)?;
        }
        Ok(())
    }

    fn write_header(&mut self, markers: &SizeMarkers, len: usize) -> Result<(), PackStreamError> {
        if let Some(tiny) = markers.tiny {
            if len <= TINY_MAX {
                self.buffer.put_u8(tiny | len as u8);
                return Ok(());
            }
        }
        match markers.sized {
            [Some(m), _, _] if len <= u8::MAX as usize => {
                self.buffer.put_u8(m);
                self.buffer.put_u8(len as u8);
            }
            [_, Some(m), _] if len <= u16::MAX as usize => {
                self.buffer.put_u8(m);
                self.buffer.put_u16(len as u16);
            }
            [_, _, Some(m)] if len <= u32::MAX as usize => {
                self.buffer.put_u8(m);
                self.buffer.put_u32(len as u32);
            }
            _ => return Err(PackStreamError::ValueTooLarge(markers.name, len)),
        }
        Ok(())
    }
}

/// Encode a single value into a fresh buffer.
pub fn encode(value: &PackStreamValue) -> Result<BytesMut, PackStreamError> {
    let mut encoder = PackStreamEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}
