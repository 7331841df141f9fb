//! Driver Values
//!
//! 애플리케이션 값 타입과 PackStream 변환 (hydration / dehydration)

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::bolt::packstream::marker::MAX_SAFE_INTEGER;
use crate::bolt::packstream::{PackStreamValue, StructCodec, TemporalValue};
use crate::bolt::{BoltError, BoltResult};
use crate::temporal::{Date, DateTime, Duration, LocalDateTime, LocalTime, Time};

// ============================================================================
// Value - 애플리케이션 값
// ============================================================================

/// 드라이버 값 타입
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer (i64)
    Integer(i64),
    /// Float (f64)
    Float(f64),
    /// String
    String(String),
    /// Bytes
    Bytes(Vec<u8>),
    /// List
    List(Vec<Value>),
    /// Map
    Map(HashMap<String, Value>),
    /// Duration
    Duration(Duration),
    /// LocalTime
    LocalTime(LocalTime),
    /// Time (UTC offset 포함)
    Time(Time),
    /// Date
    Date(Date),
    /// LocalDateTime
    LocalDateTime(LocalDateTime),
    /// DateTime (offset 또는 zone id)
    DateTime(DateTime),
}

impl Value {
    /// Null 여부
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean으로 변환
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer로 변환
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float로 변환 (Integer 포함)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// String으로 변환
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// List로 변환
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Map으로 변환
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// 시간 값 여부
    pub fn is_temporal(&self) -> bool {
        self.as_temporal().is_some()
    }

    fn as_temporal(&self) -> Option<TemporalValue> {
        match self {
            Value::Duration(v) => Some(TemporalValue::Duration(*v)),
            Value::LocalTime(v) => Some(TemporalValue::LocalTime(*v)),
            Value::Time(v) => Some(TemporalValue::Time(*v)),
            Value::Date(v) => Some(TemporalValue::Date(*v)),
            Value::LocalDateTime(v) => Some(TemporalValue::LocalDateTime(*v)),
            Value::DateTime(v) => Some(TemporalValue::DateTime(*v)),
            _ => None,
        }
    }

    /// 타입 이름
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Duration(_) => "Duration",
            Value::LocalTime(_) => "LocalTime",
            Value::Time(_) => "Time",
            Value::Date(_) => "Date",
            Value::LocalDateTime(_) => "LocalDateTime",
            Value::DateTime(_) => "DateTime",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(l) => {
                let items: Vec<String> = l.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Map(m) => {
                let mut items: Vec<String> = m.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                items.sort();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::Duration(v) => write!(f, "{}", v),
            Value::LocalTime(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::LocalDateTime(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

macro_rules! temporal_value {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$ty(v)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = BoltError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::$ty(v) => Ok(v),
                        other => Err(BoltError::type_conversion(format!(
                            concat!("Expected ", stringify!($ty), ", got {}"),
                            other.type_name()
                        ))),
                    }
                }
            }
        )*
    };
}

temporal_value!(Duration, LocalTime, Time, Date, LocalDateTime, DateTime);

impl From<TemporalValue> for Value {
    fn from(v: TemporalValue) -> Self {
        match v {
            TemporalValue::Duration(d) => Value::Duration(d),
            TemporalValue::LocalTime(t) => Value::LocalTime(t),
            TemporalValue::Time(t) => Value::Time(t),
            TemporalValue::Date(d) => Value::Date(d),
            TemporalValue::LocalDateTime(dt) => Value::LocalDateTime(dt),
            TemporalValue::DateTime(dt) => Value::DateTime(dt),
        }
    }
}

// ============================================================================
// TryFrom implementations
// ============================================================================

impl TryFrom<Value> for bool {
    type Error = BoltError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(BoltError::type_conversion(format!(
                "Expected Boolean, got {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = BoltError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(BoltError::type_conversion(format!(
                "Expected Integer, got {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = BoltError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(BoltError::type_conversion(format!(
                "Expected Float, got {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = BoltError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(BoltError::type_conversion(format!(
                "Expected String, got {}",
                other.type_name()
            ))),
        }
    }
}

impl<T> TryFrom<Value> for Vec<T>
where
    T: TryFrom<Value, Error = BoltError>,
{
    type Error = BoltError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::List(items) => items.into_iter().map(T::try_from).collect(),
            other => Err(BoltError::type_conversion(format!(
                "Expected List, got {}",
                other.type_name()
            ))),
        }
    }
}

// ============================================================================
// Hydrator - PackStream <-> Value
// ============================================================================

/// 정수 표현 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegerMode {
    /// 64비트 정수 그대로 유지
    #[default]
    Lossless,
    /// 안전 범위(±2^53-1)를 넘는 정수는 Float로 변환 (손실 가능)
    Narrowed,
}

impl IntegerMode {
    /// 정수를 모드에 맞게 변환
    pub fn apply(self, value: i64) -> Value {
        match self {
            IntegerMode::Narrowed if (value as i128).abs() > MAX_SAFE_INTEGER as i128 => {
                Value::Float(value as f64)
            }
            _ => Value::Integer(value),
        }
    }
}

/// 연결 단위의 값 변환기
///
/// 협상된 프로토콜 버전의 [`StructCodec`]으로 시간 구조체를 풀고 묶는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hydrator {
    codec: StructCodec,
    integer_mode: IntegerMode,
}

impl Hydrator {
    /// 새 변환기 생성
    pub fn new(codec: StructCodec, integer_mode: IntegerMode) -> Self {
        Self {
            codec,
            integer_mode,
        }
    }

    pub fn codec(&self) -> StructCodec {
        self.codec
    }

    pub fn integer_mode(&self) -> IntegerMode {
        self.integer_mode
    }

    /// 수신 값 변환 (알 수 없는 구조체는 에러)
    pub fn hydrate(&self, value: PackStreamValue) -> BoltResult<Value> {
        Ok(match value {
            PackStreamValue::Null => Value::Null,
            PackStreamValue::Boolean(b) => Value::Boolean(b),
            PackStreamValue::Integer(i) => self.integer_mode.apply(i),
            PackStreamValue::Float(f) => Value::Float(f),
            PackStreamValue::Bytes(b) => Value::Bytes(b),
            PackStreamValue::String(s) => Value::String(s),
            PackStreamValue::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|v| self.hydrate(v))
                    .collect::<BoltResult<_>>()?,
            ),
            PackStreamValue::Map(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| Ok((k, self.hydrate(v)?)))
                    .collect::<BoltResult<_>>()?,
            ),
            PackStreamValue::Structure(s) => self.codec.decode(&s)?.into(),
        })
    }

    /// 레코드 필드 변환
    pub fn hydrate_all(&self, values: Vec<PackStreamValue>) -> BoltResult<Vec<Value>> {
        values.into_iter().map(|v| self.hydrate(v)).collect()
    }

    /// 송신 값 변환
    pub fn dehydrate(&self, value: &Value) -> BoltResult<PackStreamValue> {
        if let Some(temporal) = value.as_temporal() {
            return Ok(PackStreamValue::Structure(self.codec.encode(&temporal)?));
        }
        Ok(match value {
            Value::Boolean(b) => PackStreamValue::Boolean(*b),
            Value::Integer(i) => PackStreamValue::Integer(*i),
            Value::Float(f) => PackStreamValue::Float(*f),
            Value::String(s) => PackStreamValue::String(s.clone()),
            Value::Bytes(b) => PackStreamValue::Bytes(b.clone()),
            Value::List(items) => PackStreamValue::List(
                items
                    .iter()
                    .map(|v| self.dehydrate(v))
                    .collect::<BoltResult<_>>()?,
            ),
            Value::Map(map) => PackStreamValue::Map(self.dehydrate_map(map)?),
            _ => PackStreamValue::Null,
        })
    }

    /// 쿼리 파라미터 변환
    pub fn dehydrate_map(
        &self,
        map: &HashMap<String, Value>,
    ) -> BoltResult<HashMap<String, PackStreamValue>> {
        map.iter()
            .map(|(k, v)| Ok((k.clone(), self.dehydrate(v)?)))
            .collect()
    }
}
