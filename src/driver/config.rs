//! Connection Configuration
//!
//! 연결 설정과 빌더

use std::collections::HashMap;

use crate::bolt::codec::DEFAULT_MAX_MESSAGE_SIZE;
use crate::bolt::message::StreamMessage;
use crate::bolt::packstream::PackStreamValue;
use crate::bolt::{AuthToken, BoltAgent, Handshake, HelloParams, NotificationFilter};

use super::value::IntegerMode;

/// 기본 User Agent
pub const DEFAULT_USER_AGENT: &str = concat!("boltcore/", env!("CARGO_PKG_VERSION"));

/// 기본 Fetch Size
pub const DEFAULT_FETCH_SIZE: i64 = 1000;

/// Watermarks as tenths of the fetch size
const HIGH_WATERMARK_TENTHS: usize = 7;
const LOW_WATERMARK_TENTHS: usize = 3;

// ============================================================================
// FetchSize - PULL 배치 크기
// ============================================================================

/// PULL 한 번에 요청할 레코드 수
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSize {
    /// 남은 레코드 전체
    All,
    /// 고정 크기 배치
    Batch(u32),
}

impl FetchSize {
    /// PULL 메시지의 `n` 값
    pub fn as_n(self) -> i64 {
        match self {
            FetchSize::All => StreamMessage::ALL,
            FetchSize::Batch(0) => StreamMessage::ALL,
            FetchSize::Batch(n) => n as i64,
        }
    }
}

impl Default for FetchSize {
    fn default() -> Self {
        FetchSize::Batch(DEFAULT_FETCH_SIZE as u32)
    }
}

// ============================================================================
// FlowControl - 버퍼 워터마크
// ============================================================================

/// 스트림 흐름 제어 설정
///
/// 버퍼가 `high`에 도달하면 다음 PULL을 보류하고, `low` 이하로 줄면 재개한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowControl {
    pub fetch_size: FetchSize,
    pub high_watermark: usize,
    pub low_watermark: usize,
}

impl FlowControl {
    /// 워터마크 없음
    pub fn unbounded(fetch_size: FetchSize) -> Self {
        Self {
            fetch_size,
            high_watermark: usize::MAX,
            low_watermark: usize::MAX,
        }
    }

    /// 배치 크기에서 워터마크 유도 (70% / 30%)
    pub fn for_fetch_size(fetch_size: FetchSize) -> Self {
        match fetch_size {
            FetchSize::Batch(n) if n > 0 => {
                let n = n as usize;
                Self {
                    fetch_size,
                    high_watermark: (n * HIGH_WATERMARK_TENTHS / 10).max(1),
                    low_watermark: n * LOW_WATERMARK_TENTHS / 10,
                }
            }
            _ => Self::unbounded(fetch_size),
        }
    }
}

impl Default for FlowControl {
    fn default() -> Self {
        Self::unbounded(FetchSize::default())
    }
}

// ============================================================================
// ConnectionConfig - 연결 설정
// ============================================================================

/// 연결 설정
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// 인증 토큰
    pub auth: AuthToken,
    /// User Agent
    pub user_agent: String,
    /// Bolt Agent (5.3+)
    pub bolt_agent: BoltAgent,
    /// HELLO 라우팅 컨텍스트 (4.1+)
    pub routing: Option<HashMap<String, PackStreamValue>>,
    /// 알림 필터 (5.2+)
    pub notification_filter: Option<NotificationFilter>,
    /// 흐름 제어
    pub flow: FlowControl,
    /// 정수 변환 모드
    pub integer_mode: IntegerMode,
    /// 수신 메시지 최대 크기
    pub max_message_size: usize,
    /// 핸드셰이크 제안
    pub handshake: Handshake,
}

impl ConnectionConfig {
    /// 설정 빌더
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// HELLO 파라미터
    pub fn hello_params(&self) -> HelloParams {
        let mut params = HelloParams::new(self.user_agent.clone(), self.auth.clone())
            .with_bolt_agent(self.bolt_agent.clone());
        if let Some(routing) = &self.routing {
            params = params.with_routing(routing.clone());
        }
        if let Some(filter) = &self.notification_filter {
            params = params.with_notification_filter(filter.clone());
        }
        params
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            auth: AuthToken::none(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bolt_agent: BoltAgent::current(),
            routing: None,
            notification_filter: None,
            flow: FlowControl::default(),
            integer_mode: IntegerMode::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            handshake: Handshake::new(),
        }
    }
}

// ============================================================================
// ConnectionConfigBuilder - 설정 빌더
// ============================================================================

/// 설정 빌더
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
    high_watermark: Option<usize>,
    low_watermark: Option<usize>,
}

impl ConnectionConfigBuilder {
    /// 인증 토큰 설정
    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.config.auth = auth;
        self
    }

    /// User Agent 설정
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Bolt Agent 설정
    pub fn with_bolt_agent(mut self, agent: BoltAgent) -> Self {
        self.config.bolt_agent = agent;
        self
    }

    /// 라우팅 컨텍스트 설정
    pub fn with_routing(mut self, routing: HashMap<String, PackStreamValue>) -> Self {
        self.config.routing = Some(routing);
        self
    }

    /// 알림 필터 설정
    pub fn with_notification_filter(mut self, filter: NotificationFilter) -> Self {
        self.config.notification_filter = Some(filter);
        self
    }

    /// Fetch Size 설정
    pub fn with_fetch_size(mut self, fetch_size: FetchSize) -> Self {
        self.config.flow = FlowControl::for_fetch_size(fetch_size);
        self
    }

    /// 상한 워터마크 설정
    pub fn with_high_watermark(mut self, high: usize) -> Self {
        self.high_watermark = Some(high);
        self
    }

    /// 하한 워터마크 설정
    pub fn with_low_watermark(mut self, low: usize) -> Self {
        self.low_watermark = Some(low);
        self
    }

    /// 정수 모드 설정
    pub fn with_integer_mode(mut self, mode: IntegerMode) -> Self {
        self.config.integer_mode = mode;
        self
    }

    /// 최대 메시지 크기 설정
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// 핸드셰이크 제안 설정
    pub fn with_handshake(mut self, handshake: Handshake) -> Self {
        self.config.handshake = handshake;
        self
    }

    /// 설정 생성
    pub fn build(mut self) -> ConnectionConfig {
        if let Some(high) = self.high_watermark {
            self.config.flow.high_watermark = high;
        }
        if let Some(low) = self.low_watermark {
            self.config.flow.low_watermark = low;
        }
        if self.config.flow.low_watermark > self.config.flow.high_watermark {
            self.config.flow.low_watermark = self.config.flow.high_watermark;
        }
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_unbounded() {
        let config = ConnectionConfig::builder().build();
        assert_eq!(config.flow.fetch_size, FetchSize::Batch(1000));
        assert_eq!(config.flow.high_watermark, usize::MAX);
        assert_eq!(config.flow.low_watermark, usize::MAX);
        assert_eq!(config.integer_mode, IntegerMode::Lossless);
        assert!(config.user_agent.starts_with("boltcore/"));
    }

    #[test]
    fn test_fetch_size_derives_watermarks() {
        let config = ConnectionConfig::builder()
            .with_fetch_size(FetchSize::Batch(100))
            .build();
        assert_eq!(config.flow.high_watermark, 70);
        assert_eq!(config.flow.low_watermark, 30);

        let config = ConnectionConfig::builder()
            .with_fetch_size(FetchSize::Batch(100))
            .with_high_watermark(500)
            .build();
        assert_eq!(config.flow.high_watermark, 500);
        assert_eq!(config.flow.low_watermark, 30);

        let config = ConnectionConfig::builder()
            .with_fetch_size(FetchSize::All)
            .build();
        assert_eq!(config.flow, FlowControl::unbounded(FetchSize::All));
    }

    #[test]
    fn test_low_clamped_to_high() {
        let config = ConnectionConfig::builder()
            .with_high_watermark(10)
            .with_low_watermark(50)
            .build();
        assert_eq!(config.flow.low_watermark, 10);
    }

    #[test]
    fn test_fetch_size_n() {
        assert_eq!(FetchSize::All.as_n(), -1);
        assert_eq!(FetchSize::Batch(0).as_n(), -1);
        assert_eq!(FetchSize::Batch(25).as_n(), 25);
    }

    #[test]
    fn test_hello_params() {
        let config = ConnectionConfig::builder()
            .with_auth(AuthToken::basic("neo4j", "secret"))
            .with_user_agent("app/1.0")
            .build();
        let params = config.hello_params();
        assert_eq!(params.user_agent, "app/1.0");
        assert_eq!(params.routing, None);
    }
}
