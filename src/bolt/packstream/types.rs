//! PackStream value types.

use std::collections::HashMap;

use super::PackStreamError;

/// A value in its packed-wire shape.
#[derive(Debug, Clone, PartialEq)]
pub enum PackStreamValue {
    Null,
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit IEEE 754 float
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<PackStreamValue>),
    /// Map with string keys
    Map(HashMap<String, PackStreamValue>),
    /// Tagged structure
    Structure(PackStreamStructure),
}

/// A tagged structure: signature byte plus ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamStructure {
    pub tag: u8,
    pub fields: Vec<PackStreamValue>,
}

impl PackStreamStructure {
    /// Create a new structure with given tag and fields.
    pub fn new(tag: u8, fields: Vec<PackStreamValue>) -> Self {
        Self { tag, fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fail unless the structure has exactly `count` fields.
    pub fn expect_fields(&self, name: &str, count: usize) -> Result<(), PackStreamError> {
        if self.fields.len() != count {
            return Err(PackStreamError::FieldCount {
                name: name.to_string(),
                expected: count,
                actual: self.fields.len(),
            });
        }
        Ok(())
    }

    /// Integer field at `index`.
    pub fn int_field(&self, name: &str, index: usize) -> Result<i64, PackStreamError> {
        self.fields
            .get(index)
            .and_then(PackStreamValue::as_int)
            .ok_or_else(|| {
                PackStreamError::InvalidStructure(format!(
                    "{} field {} must be an integer",
                    name, index
                ))
            })
    }

    /// String field at `index`.
    pub fn str_field(&self, name: &str, index: usize) -> Result<&str, PackStreamError> {
        self.fields
            .get(index)
            .and_then(PackStreamValue::as_str)
            .ok_or_else(|| {
                PackStreamError::InvalidStructure(format!(
                    "{} field {} must be a string",
                    name, index
                ))
            })
    }

    /// Map field at `index`.
    pub fn map_field(
        &self,
        name: &str,
        index: usize,
    ) -> Result<&HashMap<String, PackStreamValue>, PackStreamError> {
        self.fields
            .get(index)
            .and_then(PackStreamValue::as_map)
            .ok_or_else(|| {
                PackStreamError::InvalidStructure(format!("{} field {} must be a map", name, index))
            })
    }
}

impl PackStreamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PackStreamValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PackStreamValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PackStreamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PackStreamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PackStreamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PackStreamValue]> {
        match self {
            PackStreamValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, PackStreamValue>> {
        match self {
            PackStreamValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&PackStreamStructure> {
        match self {
            PackStreamValue::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// List of strings, skipping nothing: any non-string entry yields `None`.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        self.as_list()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PackStreamValue::Null => "Null",
            PackStreamValue::Boolean(_) => "Boolean",
            PackStreamValue::Integer(_) => "Integer",
            PackStreamValue::Float(_) => "Float",
            PackStreamValue::Bytes(_) => "Bytes",
            PackStreamValue::String(_) => "String",
            PackStreamValue::List(_) => "List",
            PackStreamValue::Map(_) => "Map",
            PackStreamValue::Structure(_) => "Structure",
        }
    }
}

impl From<bool> for PackStreamValue {
    fn from(v: bool) -> Self {
        PackStreamValue::Boolean(v)
    }
}

impl From<i64> for PackStreamValue {
    fn from(v: i64) -> Self {
        PackStreamValue::Integer(v)
    }
}

impl From<i32> for PackStreamValue {
    fn from(v: i32) -> Self {
        PackStreamValue::Integer(v as i64)
    }
}

impl From<f64> for PackStreamValue {
    fn from(v: f64) -> Self {
        PackStreamValue::Float(v)
    }
}

impl From<String> for PackStreamValue {
    fn from(v: String) -> Self {
        PackStreamValue::String(v)
    }
}

impl From<&str> for PackStreamValue {
    fn from(v: &str) -> Self {
        PackStreamValue::String(v.to_string())
    }
}

impl From<Vec<String>> for PackStreamValue {
    fn from(v: Vec<String>) -> Self {
        PackStreamValue::List(v.into_iter().map(PackStreamValue::String).collect())
    }
}

impl From<HashMap<String, PackStreamValue>> for PackStreamValue {
    fn from(v: HashMap<String, PackStreamValue>) -> Self {
        PackStreamValue::Map(v)
    }
}

impl From<PackStreamStructure> for PackStreamValue {
    fn from(v: PackStreamStructure) -> Self {
        PackStreamValue::Structure(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accessors() {
        let s = PackStreamStructure::new(
            0x10,
            vec!["RETURN 1".into(), PackStreamValue::Map(HashMap::new()), 7i64.into()],
        );
        assert_eq!(s.str_field("RUN", 0).unwrap(), "RETURN 1");
        assert!(s.map_field("RUN", 1).unwrap().is_empty());
        assert_eq!(s.int_field("RUN", 2).unwrap(), 7);
        assert!(s.int_field("RUN", 0).is_err());
        assert!(s.int_field("RUN", 9).is_err());
    }

    #[test]
    fn test_expect_fields() {
        let s = PackStreamStructure::new(0x44, vec![1i64.into()]);
        assert!(s.expect_fields("Date", 1).is_ok());
        let err = s.expect_fields("Date", 2).unwrap_err();
        assert!(matches!(
            err,
            PackStreamError::FieldCount {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_string_list() {
        let v = PackStreamValue::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(v.as_string_list(), Some(vec!["a".to_string(), "b".to_string()]));
        let mixed = PackStreamValue::List(vec!["a".into(), 1i64.into()]);
        assert_eq!(mixed.as_string_list(), None);
    }

    #[test]
    fn test_integers_are_not_floats() {
        assert_eq!(PackStreamValue::Integer(3).as_float(), None);
        assert_eq!(PackStreamValue::Float(3.0).as_int(), None);
        assert_eq!(PackStreamValue::Null.type_name(), "Null");
    }
}
