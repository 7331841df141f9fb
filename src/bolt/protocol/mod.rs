//! Protocol version dispatch.
//!
//! One [`Protocol`] value per connection, fixed at handshake time. It builds
//! the message sequence for each logical operation in the shape the
//! negotiated version expects, and rejects options the version cannot carry
//! before anything is written.
//!
//! Version differences are captured by a single capability table
//! ([`Feature::since`]) rather than one type per version:
//!
//! | Feature | Since |
//! |---|---|
//! | named databases, `PULL`/`DISCARD` with `n`/`qid` | 4.0 |
//! | routing context in HELLO | 4.1 |
//! | ROUTE message | 4.3 |
//! | impersonation, ROUTE extra map | 4.4 |
//! | UTC date-time structures | 5.0 |
//! | LOGON/LOGOFF | 5.1 |
//! | notification filters | 5.2 |
//! | `bolt_agent` | 5.3 |

mod normalize;
mod routing;

pub use normalize::{normalize_metadata, RESULT_AVAILABLE_AFTER, RESULT_CONSUMED_AFTER};
pub use routing::{
    decode_route_success, decode_routing_record, RouteParams, RoutingRequest, ROUTING_PROCEDURE,
    ROUTING_PROCEDURE_MULTI_DB, SYSTEM_DATABASE,
};

use std::collections::HashMap;
use std::fmt;

use super::error::{BoltError, BoltResult};
use super::handshake::BoltVersion;
use super::message::{
    AuthToken, BeginMessage, BoltAgent, BoltRequest, HelloMessage, LogonMessage,
    NotificationFilter, RunMessage, StreamMessage, TxConfig,
};
use super::packstream::{PackStreamValue, StructCodec};

/// A protocol feature whose availability depends on the version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    MultiDatabase,
    /// PULL/DISCARD with a batch size and statement id
    BatchedPull,
    RoutingContext,
    RouteMessage,
    Impersonation,
    UtcDateTime,
    Logon,
    NotificationFilter,
    BoltAgent,
}

impl Feature {
    /// First version that supports the feature.
    pub const fn since(self) -> BoltVersion {
        match self {
            Feature::MultiDatabase | Feature::BatchedPull => BoltVersion::V4_0,
            Feature::RoutingContext => BoltVersion::V4_1,
            Feature::RouteMessage => BoltVersion::V4_3,
            Feature::Impersonation => BoltVersion::V4_4,
            Feature::UtcDateTime => BoltVersion::V5_0,
            Feature::Logon => BoltVersion::V5_1,
            Feature::NotificationFilter => BoltVersion::V5_2,
            Feature::BoltAgent => BoltVersion::V5_3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Feature::MultiDatabase => "Database name",
            Feature::BatchedPull => "Batched PULL",
            Feature::RoutingContext => "Routing context in HELLO",
            Feature::RouteMessage => "ROUTE",
            Feature::Impersonation => "Impersonation",
            Feature::UtcDateTime => "UTC date-time",
            Feature::Logon => "LOGON/LOGOFF",
            Feature::NotificationFilter => "Notification filter",
            Feature::BoltAgent => "Bolt agent",
        }
    }
}

/// Parameters for connection initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct HelloParams {
    pub user_agent: String,
    pub auth: AuthToken,
    /// Routing context; `None` or empty for direct connections
    pub routing: Option<HashMap<String, PackStreamValue>>,
    pub notification_filter: Option<NotificationFilter>,
    pub bolt_agent: BoltAgent,
}

impl HelloParams {
    pub fn new(user_agent: impl Into<String>, auth: AuthToken) -> Self {
        Self {
            user_agent: user_agent.into(),
            auth,
            routing: None,
            notification_filter: None,
            bolt_agent: BoltAgent::current(),
        }
    }

    pub fn with_routing(mut self, routing: HashMap<String, PackStreamValue>) -> Self {
        self.routing = Some(routing);
        self
    }

    pub fn with_notification_filter(mut self, filter: NotificationFilter) -> Self {
        self.notification_filter = Some(filter);
        self
    }

    pub fn with_bolt_agent(mut self, agent: BoltAgent) -> Self {
        self.bolt_agent = agent;
        self
    }
}

/// Message builder bound to one negotiated version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Protocol {
    version: BoltVersion,
}

impl Protocol {
    pub fn new(version: BoltVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> BoltVersion {
        self.version
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.version >= feature.since()
    }

    /// Fail with a capability error unless `feature` is available.
    pub fn require(&self, feature: Feature) -> BoltResult<()> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(BoltError::capability(feature.name(), self.version))
        }
    }

    /// Temporal structure codec for this version.
    pub fn struct_codec(&self) -> StructCodec {
        StructCodec::new(self.supports(Feature::UtcDateTime))
    }

    /// Reject transaction options the version cannot carry.
    pub fn check_tx_config(&self, config: &TxConfig) -> BoltResult<()> {
        if config.database_name().is_some() {
            self.require(Feature::MultiDatabase)?;
        }
        if config.impersonated_user.is_some() {
            self.require(Feature::Impersonation)?;
        }
        self.check_notification_filter(config.notification_filter.as_ref())
    }

    fn check_notification_filter(&self, filter: Option<&NotificationFilter>) -> BoltResult<()> {
        match filter {
            Some(f) if !f.is_empty() => self.require(Feature::NotificationFilter),
            _ => Ok(()),
        }
    }

    /// HELLO, followed by LOGON from 5.1 on.
    pub fn hello(&self, params: &HelloParams) -> BoltResult<Vec<BoltRequest>> {
        let routing = params.routing.as_ref().filter(|r| !r.is_empty());
        if routing.is_some() {
            self.require(Feature::RoutingContext)?;
        }
        self.check_notification_filter(params.notification_filter.as_ref())?;

        let mut hello = HelloMessage::new(&params.user_agent);
        hello.routing = routing.cloned();
        hello.notification_filter = params
            .notification_filter
            .clone()
            .filter(|f| !f.is_empty());
        if self.supports(Feature::BoltAgent) {
            hello.bolt_agent = Some(params.bolt_agent.clone());
        }

        if self.supports(Feature::Logon) {
            Ok(vec![
                BoltRequest::Hello(hello),
                BoltRequest::Logon(LogonMessage {
                    auth: params.auth.clone(),
                }),
            ])
        } else {
            hello.auth = Some(params.auth.clone());
            Ok(vec![BoltRequest::Hello(hello)])
        }
    }

    pub fn logon(&self, auth: AuthToken) -> BoltResult<BoltRequest> {
        self.require(Feature::Logon)?;
        Ok(BoltRequest::Logon(LogonMessage { auth }))
    }

    pub fn logoff(&self) -> BoltResult<BoltRequest> {
        self.require(Feature::Logon)?;
        Ok(BoltRequest::Logoff)
    }

    pub fn begin(&self, config: &TxConfig) -> BoltResult<BoltRequest> {
        self.check_tx_config(config)?;
        Ok(BoltRequest::Begin(BeginMessage {
            extra: config.to_extra(),
        }))
    }

    /// RUN outside an explicit transaction, carrying the transaction config.
    pub fn run_auto_commit(
        &self,
        query: &str,
        parameters: HashMap<String, PackStreamValue>,
        config: &TxConfig,
    ) -> BoltResult<BoltRequest> {
        self.check_tx_config(config)?;
        Ok(BoltRequest::Run(
            RunMessage::new(query)
                .with_parameters(parameters)
                .with_extra(config.to_extra()),
        ))
    }

    /// RUN inside a transaction opened with BEGIN.
    pub fn run_in_transaction(
        &self,
        query: &str,
        parameters: HashMap<String, PackStreamValue>,
    ) -> BoltRequest {
        BoltRequest::Run(RunMessage::new(query).with_parameters(parameters))
    }

    /// Request `n` more records (`-1` for all). Bolt 3 always pulls everything.
    pub fn pull(&self, n: i64, qid: Option<i64>) -> BoltRequest {
        if self.supports(Feature::BatchedPull) {
            BoltRequest::Pull(StreamMessage::new(n, qid))
        } else {
            BoltRequest::PullAll
        }
    }

    /// Discard the rest of a stream.
    pub fn discard(&self, qid: Option<i64>) -> BoltRequest {
        if self.supports(Feature::BatchedPull) {
            BoltRequest::Discard(StreamMessage::new(StreamMessage::ALL, qid))
        } else {
            BoltRequest::DiscardAll
        }
    }

    pub fn commit(&self) -> BoltRequest {
        BoltRequest::Commit
    }

    pub fn rollback(&self) -> BoltRequest {
        BoltRequest::Rollback
    }

    pub fn reset(&self) -> BoltRequest {
        BoltRequest::Reset
    }

    pub fn goodbye(&self) -> BoltRequest {
        BoltRequest::Goodbye
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bolt {}", self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::bolt::message::AccessMode;

    fn routing_context() -> HashMap<String, PackStreamValue> {
        let mut ctx = HashMap::new();
        ctx.insert("address".to_string(), "localhost:7687".into());
        ctx
    }

    #[test]
    fn test_capability_table() {
        let v3 = Protocol::new(BoltVersion::V3);
        let v44 = Protocol::new(BoltVersion::V4_4);
        let v54 = Protocol::new(BoltVersion::V5_4);

        assert!(!v3.supports(Feature::MultiDatabase));
        assert!(v44.supports(Feature::MultiDatabase));
        assert!(v44.supports(Feature::Impersonation));
        assert!(!v44.supports(Feature::UtcDateTime));
        assert!(Protocol::new(BoltVersion::V4_3).supports(Feature::RouteMessage));
        assert!(!Protocol::new(BoltVersion::V4_2).supports(Feature::RouteMessage));
        assert!(!Protocol::new(BoltVersion::V4_0).supports(Feature::RoutingContext));
        assert!(Protocol::new(BoltVersion::V5_2).supports(Feature::NotificationFilter));
        assert!(!Protocol::new(BoltVersion::V5_2).supports(Feature::BoltAgent));
        for feature in [Feature::Logon, Feature::BoltAgent, Feature::UtcDateTime] {
            assert!(v54.supports(feature));
        }
    }

    #[test]
    fn test_struct_codec_follows_version() {
        assert!(!Protocol::new(BoltVersion::V4_4).struct_codec().utc_date_times());
        assert!(Protocol::new(BoltVersion::V5_0).struct_codec().utc_date_times());
    }

    #[test]
    fn test_hello_inline_auth_before_logon() {
        let params = HelloParams::new("boltcore/test", AuthToken::basic("neo4j", "pw"));
        let msgs = Protocol::new(BoltVersion::V4_4).hello(&params).unwrap();
        assert_eq!(msgs.len(), 1);
        let BoltRequest::Hello(ref hello) = msgs[0] else {
            panic!("expected HELLO");
        };
        assert_eq!(hello.auth.as_ref().map(|a| a.scheme.as_str()), Some("basic"));
        assert!(hello.bolt_agent.is_none());
    }

    #[test]
    fn test_hello_then_logon() {
        let params = HelloParams::new("boltcore/test", AuthToken::bearer("t"));
        let msgs = Protocol::new(BoltVersion::V5_3).hello(&params).unwrap();
        assert_eq!(msgs.len(), 2);
        let BoltRequest::Hello(ref hello) = msgs[0] else {
            panic!("expected HELLO");
        };
        assert!(hello.auth.is_none());
        assert!(hello.bolt_agent.is_some());
        assert!(matches!(msgs[1], BoltRequest::Logon(_)));
    }

    #[test]
    fn test_hello_gating() {
        let params =
            HelloParams::new("ua", AuthToken::none()).with_routing(routing_context());
        let err = Protocol::new(BoltVersion::V4_0).hello(&params).unwrap_err();
        assert!(err.is_capability_error());
        assert!(Protocol::new(BoltVersion::V4_1).hello(&params).is_ok());

        // An empty routing context is the default and is simply left out.
        let params = HelloParams::new("ua", AuthToken::none()).with_routing(HashMap::new());
        assert!(Protocol::new(BoltVersion::V3).hello(&params).is_ok());

        let filter = NotificationFilter {
            minimum_severity: Some("WARNING".to_string()),
            disabled_categories: None,
        };
        let params = HelloParams::new("ua", AuthToken::none()).with_notification_filter(filter);
        assert!(Protocol::new(BoltVersion::V5_1).hello(&params).is_err());
        assert!(Protocol::new(BoltVersion::V5_2).hello(&params).is_ok());
    }

    #[test]
    fn test_tx_config_gating() {
        let v3 = Protocol::new(BoltVersion::V3);
        let db = TxConfig::new().with_database("movies");
        assert!(matches!(
            v3.begin(&db),
            Err(BoltError::Capability { version: BoltVersion::V3, .. })
        ));
        assert!(v3.run_auto_commit("RETURN 1", HashMap::new(), &db).is_err());
        // Empty name means the default database.
        assert!(v3.begin(&TxConfig::new().with_database("")).is_ok());

        let imp = TxConfig::new().with_impersonated_user("alice");
        assert!(Protocol::new(BoltVersion::V4_3).begin(&imp).is_err());
        assert!(Protocol::new(BoltVersion::V4_4).begin(&imp).is_ok());
    }

    #[test]
    fn test_begin_extra() {
        let config = TxConfig::new()
            .with_bookmarks(vec!["bm:1".to_string()])
            .with_timeout(Duration::from_millis(1500))
            .with_mode(AccessMode::Read)
            .with_database("movies");
        let BoltRequest::Begin(begin) = Protocol::new(BoltVersion::V5_0).begin(&config).unwrap()
        else {
            panic!("expected BEGIN");
        };
        assert_eq!(begin.extra.get("tx_timeout").and_then(|v| v.as_int()), Some(1500));
        assert_eq!(begin.extra.get("mode").and_then(|v| v.as_str()), Some("r"));
        assert_eq!(begin.extra.get("db").and_then(|v| v.as_str()), Some("movies"));
    }

    #[test]
    fn test_pull_and_discard_shapes() {
        let v3 = Protocol::new(BoltVersion::V3);
        assert_eq!(v3.pull(100, None), BoltRequest::PullAll);
        assert_eq!(v3.discard(None), BoltRequest::DiscardAll);

        let v4 = Protocol::new(BoltVersion::V4_0);
        assert_eq!(
            v4.pull(100, Some(3)),
            BoltRequest::Pull(StreamMessage::new(100, Some(3)))
        );
        assert_eq!(
            v4.discard(None),
            BoltRequest::Discard(StreamMessage::new(-1, None))
        );
    }

    #[test]
    fn test_logon_requires_5_1() {
        assert!(Protocol::new(BoltVersion::V5_0).logoff().is_err());
        assert_eq!(Protocol::new(BoltVersion::V5_1).logoff().unwrap(), BoltRequest::Logoff);
        let err = Protocol::new(BoltVersion::V4_4)
            .logon(AuthToken::none())
            .unwrap_err();
        assert_eq!(err.to_string(), "LOGON/LOGOFF is not supported by Bolt 4.4");
    }
}
