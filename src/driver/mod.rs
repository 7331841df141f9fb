//! Driver Module
//!
//! Bolt 연결 런타임: 응답 큐, 결과 스트리밍, 값 변환
//!
//! # Components
//!
//! - [`Connection`]: 요청 파이프라이닝, 응답 옵저버 큐, 실패/리셋 상태
//! - [`ResultStream`]: RUN 결과의 레코드/요약 스트리밍 (배치 PULL, 워터마크)
//! - [`Hydrator`]: PackStream ↔ [`Value`] 변환 (시간 타입 구조체 포함)
//! - [`Transport`]: 바이트 전송 계층 ([`connect`]는 tokio 스트림 위에서 동작)
//!
//! # Example
//!
//! ```ignore
//! use boltcore::driver::{connect, ConnectionConfig};
//! use boltcore::bolt::{AuthToken, TxConfig};
//! use boltcore::params;
//!
//! let stream = tokio::net::TcpStream::connect("localhost:7687").await?;
//! let config = ConnectionConfig::builder()
//!     .with_auth(AuthToken::basic("neo4j", "password"))
//!     .build();
//! let conn = connect(stream, config).await?;
//! conn.initialize()?.await?;
//!
//! // 쿼리 실행
//! let result = conn.run("RETURN $when AS when", params! {"when" => date}, &TxConfig::new())?;
//! let records = result.collect().await?;
//! let summary = result.summary()?.await?;
//!
//! conn.goodbye();
//! ```

mod config;
mod connection;
mod observer;
mod record;
mod stream;
mod summary;
mod transport;
mod value;

// Re-exports
pub use config::{
    ConnectionConfig, ConnectionConfigBuilder, FetchSize, FlowControl, DEFAULT_FETCH_SIZE,
    DEFAULT_USER_AGENT,
};
pub use connection::{Connection, ConnectionState, WeakConnection};
pub use observer::{Completion, ResponseObserver};
pub use record::Record;
pub use stream::{
    Consumption, KeysFuture, RecordStream, ResultObserver, ResultStream, StreamState,
    SummaryFuture,
};
pub use summary::{Query, QueryType, ResultSummary, ServerInfo};
pub use transport::{connect, RecordingTransport, Transport};
pub use value::{Hydrator, IntegerMode, Value};

/// 파라미터 맵 생성 매크로
#[macro_export]
macro_rules! params {
    () => {
        std::collections::HashMap::<String, $crate::driver::Value>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::<String, $crate::driver::Value>::new();
        $(
            map.insert($key.into(), $crate::driver::Value::from($value));
        )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Date;

    #[test]
    fn test_params_macro() {
        let empty = params!();
        assert!(empty.is_empty());

        let date = Date::new(2024, 2, 29).unwrap();
        let map = params! {
            "name" => "Ada",
            "age" => 36i64,
            "born" => date,
        };
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("name"), Some(&Value::from("Ada")));
        assert_eq!(map.get("born"), Some(&Value::Date(date)));
    }
}
