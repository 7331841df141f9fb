//! Result Summary - 결과 요약
//!
//! RUN 응답과 마지막 PULL/DISCARD 응답의 메타데이터를 합쳐 만든다.
//! 키는 연결에서 이미 정규화되어 있다 (`t_first` → `result_available_after`).

use std::collections::HashMap;

use crate::bolt::message::{Notification, QueryStats};
use crate::bolt::packstream::PackStreamValue;
use crate::bolt::protocol::{RESULT_AVAILABLE_AFTER, RESULT_CONSUMED_AFTER};
use crate::bolt::BoltVersion;

use super::value::Value;

// ============================================================================
// Query
// ============================================================================

/// 실행한 쿼리
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub text: String,
    pub parameters: HashMap<String, Value>,
}

impl Query {
    pub fn new(text: impl Into<String>, parameters: HashMap<String, Value>) -> Self {
        Self {
            text: text.into(),
            parameters,
        }
    }
}

// ============================================================================
// QueryType
// ============================================================================

/// 쿼리 유형 (`type` 메타데이터)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    ReadOnly,
    ReadWrite,
    WriteOnly,
    SchemaWrite,
}

impl QueryType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "r" => Some(QueryType::ReadOnly),
            "rw" => Some(QueryType::ReadWrite),
            "w" => Some(QueryType::WriteOnly),
            "s" => Some(QueryType::SchemaWrite),
            _ => None,
        }
    }
}

// ============================================================================
// ServerInfo
// ============================================================================

/// 결과를 만든 서버 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// HELLO 응답의 `server`
    pub agent: Option<String>,
    /// 협상된 프로토콜 버전
    pub protocol_version: BoltVersion,
}

// ============================================================================
// ResultSummary
// ============================================================================

/// 결과 요약
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub query: Query,
    pub query_type: Option<QueryType>,
    pub counters: QueryStats,
    pub notifications: Vec<Notification>,
    pub server: ServerInfo,
    /// 쿼리가 실행된 데이터베이스 (4.0+)
    pub database: Option<String>,
    /// 자동 커밋 쿼리의 북마크
    pub bookmark: Option<String>,
    /// 첫 레코드가 준비되기까지 걸린 시간 (ms)
    pub result_available_after: Option<i64>,
    /// 마지막 레코드까지 소비하는 데 걸린 시간 (ms)
    pub result_consumed_after: Option<i64>,
    /// 병합된 원본 메타데이터 (`plan`, `profile` 등 포함)
    pub metadata: HashMap<String, PackStreamValue>,
}

impl ResultSummary {
    /// RUN 메타데이터와 마지막 스트림 메타데이터로 생성
    pub fn new(
        query: Query,
        server: ServerInfo,
        run: &HashMap<String, PackStreamValue>,
        last: &HashMap<String, PackStreamValue>,
    ) -> Self {
        let mut metadata = run.clone();
        metadata.extend(last.iter().map(|(k, v)| (k.clone(), v.clone())));

        let text = |key: &str| metadata.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let int = |key: &str| metadata.get(key).and_then(|v| v.as_int());

        Self {
            query,
            query_type: metadata
                .get("type")
                .and_then(|v| v.as_str())
                .and_then(QueryType::from_code),
            counters: metadata
                .get("stats")
                .and_then(|v| v.as_map())
                .map(QueryStats::from_map)
                .unwrap_or_default(),
            notifications: metadata
                .get("notifications")
                .map(Notification::list_from)
                .unwrap_or_default(),
            server,
            database: text("db"),
            bookmark: text("bookmark"),
            result_available_after: int(RESULT_AVAILABLE_AFTER),
            result_consumed_after: int(RESULT_CONSUMED_AFTER),
            metadata,
        }
    }

    /// 실행 계획 포함 여부
    pub fn has_plan(&self) -> bool {
        self.metadata.contains_key("plan") || self.has_profile()
    }

    /// 프로파일 포함 여부
    pub fn has_profile(&self) -> bool {
        self.metadata.contains_key("profile")
    }
}
