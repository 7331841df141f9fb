//! Bolt protocol response messages.
//!
//! Response messages are sent from the server to the client. Every response
//! has a fixed field count: one map for SUCCESS and FAILURE, one list for
//! RECORD, none for IGNORED. Anything else is rejected.

use std::collections::HashMap;

use super::tag;
use crate::bolt::packstream::{PackStreamError, PackStreamStructure, PackStreamValue};

/// All Bolt response messages.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltResponse {
    /// SUCCESS - Operation completed successfully
    Success(SuccessMessage),
    /// RECORD - Query result record
    Record(RecordMessage),
    /// FAILURE - Operation failed
    Failure(FailureMessage),
    /// IGNORED - Message was ignored (connection in FAILED state)
    Ignored,
}

impl BoltResponse {
    pub fn tag(&self) -> u8 {
        match self {
            BoltResponse::Success(_) => tag::SUCCESS,
            BoltResponse::Record(_) => tag::RECORD,
            BoltResponse::Failure(_) => tag::FAILURE,
            BoltResponse::Ignored => tag::IGNORED,
        }
    }

    /// Message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, BoltResponse::Record(_))
    }

    pub fn to_structure(&self) -> PackStreamStructure {
        match self {
            BoltResponse::Success(msg) => {
                PackStreamStructure::new(tag::SUCCESS, vec![msg.metadata.clone().into()])
            }
            BoltResponse::Record(msg) => {
                PackStreamStructure::new(tag::RECORD, vec![PackStreamValue::List(msg.fields.clone())])
            }
            BoltResponse::Failure(msg) => msg.to_structure(),
            BoltResponse::Ignored => PackStreamStructure::new(tag::IGNORED, vec![]),
        }
    }

    /// Parse a response, checking the field count for its tag.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        match s.tag {
            tag::SUCCESS => {
                s.expect_fields("SUCCESS", 1)?;
                Ok(BoltResponse::Success(SuccessMessage::new(
                    s.map_field("SUCCESS", 0)?.clone(),
                )))
            }
            tag::RECORD => {
                s.expect_fields("RECORD", 1)?;
                let fields = s.fields[0].as_list().ok_or_else(|| {
                    PackStreamError::InvalidStructure("RECORD field must be a list".into())
                })?;
                Ok(BoltResponse::Record(RecordMessage::new(fields.to_vec())))
            }
            tag::FAILURE => {
                s.expect_fields("FAILURE", 1)?;
                Ok(BoltResponse::Failure(FailureMessage::from_map(s.map_field("FAILURE", 0)?)?))
            }
            tag::IGNORED => {
                s.expect_fields("IGNORED", 0)?;
                Ok(BoltResponse::Ignored)
            }
            _ => Err(PackStreamError::InvalidStructure(format!(
                "Unknown response message tag: 0x{:02X}",
                s.tag
            ))),
        }
    }
}

/// SUCCESS message - Operation completed successfully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessMessage {
    pub metadata: HashMap<String, PackStreamValue>,
}

impl SuccessMessage {
    pub fn new(metadata: HashMap<String, PackStreamValue>) -> Self {
        Self { metadata }
    }

    pub fn get(&self, key: &str) -> Option<&PackStreamValue> {
        self.metadata.get(key)
    }

    /// Builder-style insert, used by test servers.
    pub fn with(mut self, key: &str, value: impl Into<PackStreamValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Server agent string from HELLO.
    pub fn server(&self) -> Option<&str> {
        self.get("server").and_then(|v| v.as_str())
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.get("connection_id").and_then(|v| v.as_str())
    }

    /// Column names from RUN.
    pub fn fields(&self) -> Option<Vec<String>> {
        self.get("fields").and_then(|v| v.as_string_list())
    }

    /// Statement id from RUN inside an explicit transaction.
    pub fn qid(&self) -> Option<i64> {
        self.get("qid").and_then(|v| v.as_int())
    }

    /// True when PULL/DISCARD left records on the server.
    pub fn has_more(&self) -> bool {
        self.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn bookmark(&self) -> Option<&str> {
        self.get("bookmark").and_then(|v| v.as_str())
    }

    pub fn db(&self) -> Option<&str> {
        self.get("db").and_then(|v| v.as_str())
    }
}

/// RECORD message - Query result record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMessage {
    pub fields: Vec<PackStreamValue>,
}

impl RecordMessage {
    pub fn new(fields: Vec<PackStreamValue>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// FAILURE message - Operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage {
    /// Server error code
    pub code: String,
    pub message: String,
}

impl FailureMessage {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Second segment of the code, e.g. `ClientError`.
    pub fn classification(&self) -> &str {
        self.code.split('.').nth(1).unwrap_or("Unknown")
    }

    pub fn is_transient(&self) -> bool {
        self.classification() == "TransientError"
    }

    pub fn to_structure(&self) -> PackStreamStructure {
        let mut metadata = HashMap::new();
        metadata.insert("code".to_string(), self.code.as_str().into());
        metadata.insert("message".to_string(), self.message.as_str().into());
        PackStreamStructure::new(tag::FAILURE, vec![metadata.into()])
    }

    pub fn from_map(metadata: &HashMap<String, PackStreamValue>) -> Result<Self, PackStreamError> {
        let code = metadata
            .get("code")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PackStreamError::InvalidStructure("FAILURE requires code".to_string()))?;
        let message = metadata
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(Self::new(code, message))
    }
}

impl std::fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
