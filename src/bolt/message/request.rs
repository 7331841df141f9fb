//! Bolt protocol request messages.
//!
//! Request messages are sent from the client to the server. The structs here
//! carry already-validated content; which fields a given protocol version
//! may use is decided in [`crate::bolt::protocol`].

use std::collections::HashMap;
use std::time::Duration;

use super::tag;
use crate::bolt::packstream::{PackStreamError, PackStreamStructure, PackStreamValue};

/// Access mode for transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read-write access (default)
    #[default]
    Write,
    /// Read-only access
    Read,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
        }
    }
}

/// Authentication token, passed through to the server as a map.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    /// Authentication scheme (e.g., "basic", "bearer")
    pub scheme: String,
    pub principal: Option<String>,
    pub credentials: Option<String>,
    pub realm: Option<String>,
    /// Additional parameters
    pub parameters: HashMap<String, PackStreamValue>,
}

impl AuthToken {
    /// Create a basic auth token.
    pub fn basic(principal: &str, credentials: &str) -> Self {
        Self {
            scheme: "basic".to_string(),
            principal: Some(principal.to_string()),
            credentials: Some(credentials.to_string()),
            realm: None,
            parameters: HashMap::new(),
        }
    }

    /// Create a bearer token.
    pub fn bearer(token: &str) -> Self {
        Self {
            scheme: "bearer".to_string(),
            principal: None,
            credentials: Some(token.to_string()),
            realm: None,
            parameters: HashMap::new(),
        }
    }

    /// Create an anonymous auth token (no auth).
    pub fn none() -> Self {
        Self {
            scheme: "none".to_string(),
            principal: None,
            credentials: None,
            realm: None,
            parameters: HashMap::new(),
        }
    }

    pub fn to_map(&self) -> HashMap<String, PackStreamValue> {
        let mut map = self.parameters.clone();
        map.insert("scheme".to_string(), self.scheme.as_str().into());
        for (key, value) in [
            ("principal", &self.principal),
            ("credentials", &self.credentials),
            ("realm", &self.realm),
        ] {
            if let Some(v) = value {
                map.insert(key.to_string(), v.as_str().into());
            }
        }
        map
    }

    pub fn from_map(map: &HashMap<String, PackStreamValue>) -> Self {
        let text = |key: &str| map.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let parameters = map
            .iter()
            .filter(|(k, _)| !["scheme", "principal", "credentials", "realm"].contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            scheme: text("scheme").unwrap_or_else(|| "none".to_string()),
            principal: text("principal"),
            credentials: text("credentials"),
            realm: text("realm"),
            parameters,
        }
    }
}

/// Driver identification sent as `bolt_agent` (Bolt 5.3+).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoltAgent {
    pub product: String,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub language_details: Option<String>,
}

impl BoltAgent {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            platform: None,
            language: None,
            language_details: None,
        }
    }

    /// Agent describing this library and the host it runs on.
    pub fn current() -> Self {
        Self {
            product: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            platform: Some(format!("{}; {}", std::env::consts::OS, std::env::consts::ARCH)),
            language: Some("Rust".to_string()),
            language_details: None,
        }
    }

    pub fn to_map(&self) -> HashMap<String, PackStreamValue> {
        let mut map = HashMap::new();
        map.insert("product".to_string(), self.product.as_str().into());
        for (key, value) in [
            ("platform", &self.platform),
            ("language", &self.language),
            ("language_details", &self.language_details),
        ] {
            if let Some(v) = value {
                map.insert(key.to_string(), v.as_str().into());
            }
        }
        map
    }
}

/// Server-side notification filtering (Bolt 5.2+).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    /// Lowest severity to report; `"OFF"` disables notifications
    pub minimum_severity: Option<String>,
    /// Categories the server should not report
    pub disabled_categories: Option<Vec<String>>,
}

impl NotificationFilter {
    pub fn is_empty(&self) -> bool {
        self.minimum_severity.is_none() && self.disabled_categories.is_none()
    }

    pub fn write_to(&self, extra: &mut HashMap<String, PackStreamValue>) {
        if let Some(ref severity) = self.minimum_severity {
            extra.insert(
                "notifications_minimum_severity".to_string(),
                severity.as_str().into(),
            );
        }
        if let Some(ref categories) = self.disabled_categories {
            extra.insert(
                "notifications_disabled_categories".to_string(),
                categories.clone().into(),
            );
        }
    }

    pub fn read_from(extra: &HashMap<String, PackStreamValue>) -> Option<Self> {
        let filter = Self {
            minimum_severity: extra
                .get("notifications_minimum_severity")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            disabled_categories: extra
                .get("notifications_disabled_categories")
                .and_then(|v| v.as_string_list()),
        };
        (!filter.is_empty()).then_some(filter)
    }
}

/// Transaction configuration for BEGIN and auto-commit RUN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxConfig {
    pub bookmarks: Vec<String>,
    pub timeout: Option<Duration>,
    pub metadata: HashMap<String, PackStreamValue>,
    pub mode: AccessMode,
    pub database: Option<String>,
    pub impersonated_user: Option<String>,
    pub notification_filter: Option<NotificationFilter>,
}

impl TxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, PackStreamValue>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_impersonated_user(mut self, user: impl Into<String>) -> Self {
        self.impersonated_user = Some(user.into());
        self
    }

    pub fn with_notification_filter(mut self, filter: NotificationFilter) -> Self {
        self.notification_filter = Some(filter);
        self
    }

    /// Database name, treating an empty name as the default database.
    pub fn database_name(&self) -> Option<&str> {
        self.database.as_deref().filter(|db| !db.is_empty())
    }

    /// The `extra` map shared by BEGIN and RUN.
    pub fn to_extra(&self) -> HashMap<String, PackStreamValue> {
        let mut extra = HashMap::new();
        if !self.bookmarks.is_empty() {
            extra.insert("bookmarks".to_string(), self.bookmarks.clone().into());
        }
        if let Some(timeout) = self.timeout {
            let millis = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
            extra.insert("tx_timeout".to_string(), millis.into());
        }
        if !self.metadata.is_empty() {
            extra.insert("tx_metadata".to_string(), self.metadata.clone().into());
        }
        if self.mode == AccessMode::Read {
            extra.insert("mode".to_string(), "r".into());
        }
        if let Some(db) = self.database_name() {
            extra.insert("db".to_string(), db.into());
        }
        if let Some(ref user) = self.impersonated_user {
            extra.insert("imp_user".to_string(), user.as_str().into());
        }
        if let Some(ref filter) = self.notification_filter {
            filter.write_to(&mut extra);
        }
        extra
    }

    pub fn from_extra(extra: &HashMap<String, PackStreamValue>) -> Self {
        let text = |key: &str| extra.get(key).and_then(|v| v.as_str()).map(str::to_string);
        Self {
            bookmarks: extra
                .get("bookmarks")
                .and_then(|v| v.as_string_list())
                .unwrap_or_default(),
            timeout: extra
                .get("tx_timeout")
                .and_then(|v| v.as_int())
                .map(|ms| Duration::from_millis(ms.max(0) as u64)),
            metadata: extra
                .get("tx_metadata")
                .and_then(|v| v.as_map())
                .cloned()
                .unwrap_or_default(),
            mode: match text("mode").as_deref() {
                Some("r") => AccessMode::Read,
                _ => AccessMode::Write,
            },
            database: text("db"),
            impersonated_user: text("imp_user"),
            notification_filter: NotificationFilter::read_from(extra),
        }
    }
}

/// All Bolt request messages.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltRequest {
    /// HELLO - Initialize connection
    Hello(HelloMessage),
    /// LOGON - Authenticate (Bolt 5.1+)
    Logon(LogonMessage),
    /// LOGOFF - Deauthenticate (Bolt 5.1+)
    Logoff,
    /// GOODBYE - Close connection gracefully
    Goodbye,
    /// RESET - Reset connection state
    Reset,
    /// RUN - Execute a query
    Run(RunMessage),
    /// BEGIN - Start transaction
    Begin(BeginMessage),
    /// COMMIT - Commit transaction
    Commit,
    /// ROLLBACK - Rollback transaction
    Rollback,
    /// PULL - Pull a batch of records (Bolt 4.0+)
    Pull(StreamMessage),
    /// PULL_ALL - Pull every record (Bolt 3)
    PullAll,
    /// DISCARD - Discard records (Bolt 4.0+)
    Discard(StreamMessage),
    /// DISCARD_ALL - Discard every record (Bolt 3)
    DiscardAll,
    /// ROUTE - Request routing information (Bolt 4.3+)
    Route(RouteMessage),
}

impl BoltRequest {
    pub fn tag(&self) -> u8 {
        match self {
            BoltRequest::Hello(_) => tag::HELLO,
            BoltRequest::Logon(_) => tag::LOGON,
            BoltRequest::Logoff => tag::LOGOFF,
            BoltRequest::Goodbye => tag::GOODBYE,
            BoltRequest::Reset => tag::RESET,
            BoltRequest::Run(_) => tag::RUN,
            BoltRequest::Begin(_) => tag::BEGIN,
            BoltRequest::Commit => tag::COMMIT,
            BoltRequest::Rollback => tag::ROLLBACK,
            BoltRequest::Pull(_) | BoltRequest::PullAll => tag::PULL,
            BoltRequest::Discard(_) | BoltRequest::DiscardAll => tag::DISCARD,
            BoltRequest::Route(_) => tag::ROUTE,
        }
    }

    /// Message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltRequest::Hello(_) => "HELLO",
            BoltRequest::Logon(_) => "LOGON",
            BoltRequest::Logoff => "LOGOFF",
            BoltRequest::Goodbye => "GOODBYE",
            BoltRequest::Reset => "RESET",
            BoltRequest::Run(_) => "RUN",
            BoltRequest::Begin(_) => "BEGIN",
            BoltRequest::Commit => "COMMIT",
            BoltRequest::Rollback => "ROLLBACK",
            BoltRequest::Pull(_) => "PULL",
            BoltRequest::PullAll => "PULL_ALL",
            BoltRequest::Discard(_) => "DISCARD",
            BoltRequest::DiscardAll => "DISCARD_ALL",
            BoltRequest::Route(_) => "ROUTE",
        }
    }

    /// True for requests the server answers with a response.
    pub fn expects_response(&self) -> bool {
        !matches!(self, BoltRequest::Goodbye)
    }

    pub fn to_structure(&self) -> PackStreamStructure {
        match self {
            BoltRequest::Hello(msg) => msg.to_structure(),
            BoltRequest::Logon(msg) => {
                PackStreamStructure::new(tag::LOGON, vec![msg.auth.to_map().into()])
            }
            BoltRequest::Run(msg) => msg.to_structure(),
            BoltRequest::Begin(msg) => {
                PackStreamStructure::new(tag::BEGIN, vec![msg.extra.clone().into()])
            }
            BoltRequest::Pull(msg) | BoltRequest::Discard(msg) => {
                PackStreamStructure::new(self.tag(), vec![msg.to_map().into()])
            }
            BoltRequest::Route(msg) => msg.to_structure(),
            BoltRequest::Logoff
            | BoltRequest::Goodbye
            | BoltRequest::Reset
            | BoltRequest::Commit
            | BoltRequest::Rollback
            | BoltRequest::PullAll
            | BoltRequest::DiscardAll => PackStreamStructure::new(self.tag(), vec![]),
        }
    }

    /// Parse a request, as a server would.
    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        let request = match (s.tag, s.fields.len()) {
            (tag::HELLO, 1) => BoltRequest::Hello(HelloMessage::from_structure(s)?),
            (tag::LOGON, 1) => BoltRequest::Logon(LogonMessage {
                auth: AuthToken::from_map(s.map_field("LOGON", 0)?),
            }),
            (tag::LOGOFF, 0) => BoltRequest::Logoff,
            (tag::GOODBYE, 0) => BoltRequest::Goodbye,
            (tag::RESET, 0) => BoltRequest::Reset,
            (tag::RUN, 3) => BoltRequest::Run(RunMessage::from_structure(s)?),
            (tag::BEGIN, 1) => BoltRequest::Begin(BeginMessage {
                extra: s.map_field("BEGIN", 0)?.clone(),
            }),
            (tag::COMMIT, 0) => BoltRequest::Commit,
            (tag::ROLLBACK, 0) => BoltRequest::Rollback,
            (tag::PULL, 0) => BoltRequest::PullAll,
            (tag::PULL, 1) => BoltRequest::Pull(StreamMessage::from_map(s.map_field("PULL", 0)?)),
            (tag::DISCARD, 0) => BoltRequest::DiscardAll,
            (tag::DISCARD, 1) => {
                BoltRequest::Discard(StreamMessage::from_map(s.map_field("DISCARD", 0)?))
            }
            (tag::ROUTE, 3) => BoltRequest::Route(RouteMessage::from_structure(s)?),
            (t, n) => {
                return Err(PackStreamError::InvalidStructure(format!(
                    "Unknown request message 0x{:02X} with {} fields",
                    t, n
                )))
            }
        };
        Ok(request)
    }
}

/// HELLO keys that are not part of the auth token.
const HELLO_KEYS: [&str; 5] = [
    "user_agent",
    "routing",
    "bolt_agent",
    "notifications_minimum_severity",
    "notifications_disabled_categories",
];

/// HELLO message - Initialize connection.
#[derive(Debug, Clone, PartialEq)]
pub struct HelloMessage {
    pub user_agent: String,
    /// Credentials inline in HELLO (before Bolt 5.1)
    pub auth: Option<AuthToken>,
    /// Routing context (Bolt 4.1+)
    pub routing: Option<HashMap<String, PackStreamValue>>,
    /// Notification filter (Bolt 5.2+)
    pub notification_filter: Option<NotificationFilter>,
    /// Driver identification (Bolt 5.3+)
    pub bolt_agent: Option<BoltAgent>,
}

impl HelloMessage {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            auth: None,
            routing: None,
            notification_filter: None,
            bolt_agent: None,
        }
    }

    pub fn to_structure(&self) -> PackStreamStructure {
        let mut extra = self.auth.as_ref().map(AuthToken::to_map).unwrap_or_default();
        extra.insert("user_agent".to_string(), self.user_agent.as_str().into());
        if let Some(ref routing) = self.routing {
            extra.insert("routing".to_string(), routing.clone().into());
        }
        if let Some(ref filter) = self.notification_filter {
            filter.write_to(&mut extra);
        }
        if let Some(ref agent) = self.bolt_agent {
            extra.insert("bolt_agent".to_string(), agent.to_map().into());
        }
        PackStreamStructure::new(tag::HELLO, vec![extra.into()])
    }

    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        let extra = s.map_field("HELLO", 0)?;
        let user_agent = extra
            .get("user_agent")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PackStreamError::InvalidStructure("HELLO requires user_agent".into()))?;
        let bolt_agent = extra.get("bolt_agent").and_then(|v| v.as_map()).map(|m| {
            let text = |key: &str| m.get(key).and_then(|v| v.as_str()).map(str::to_string);
            BoltAgent {
                product: text("product").unwrap_or_default(),
                platform: text("platform"),
                language: text("language"),
                language_details: text("language_details"),
            }
        });
        Ok(Self {
            user_agent: user_agent.to_string(),
            auth: extra.contains_key("scheme").then(|| {
                let credentials = extra
                    .iter()
                    .filter(|(k, _)| !HELLO_KEYS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                AuthToken::from_map(&credentials)
            }),
            routing: extra.get("routing").and_then(|v| v.as_map()).cloned(),
            notification_filter: NotificationFilter::read_from(extra),
            bolt_agent,
        })
    }
}

/// LOGON message (Bolt 5.1+).
#[derive(Debug, Clone, PartialEq)]
pub struct LogonMessage {
    pub auth: AuthToken,
}

/// RUN message - Execute a query.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMessage {
    pub query: String,
    pub parameters: HashMap<String, PackStreamValue>,
    pub extra: HashMap<String, PackStreamValue>,
}

impl RunMessage {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            parameters: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    pub fn with_parameters(mut self, params: HashMap<String, PackStreamValue>) -> Self {
        self.parameters = params;
        self
    }

    pub fn with_extra(mut self, extra: HashMap<String, PackStreamValue>) -> Self {
        self.extra = extra;
        self
    }

    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(
            tag::RUN,
            vec![
                self.query.as_str().into(),
                self.parameters.clone().into(),
                self.extra.clone().into(),
            ],
        )
    }

    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        Ok(Self {
            query: s.str_field("RUN", 0)?.to_string(),
            parameters: s.map_field("RUN", 1)?.clone(),
            extra: s.map_field("RUN", 2)?.clone(),
        })
    }
}

/// BEGIN message - Start an explicit transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeginMessage {
    pub extra: HashMap<String, PackStreamValue>,
}

/// Body of PULL and DISCARD (Bolt 4.0+).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMessage {
    /// Number of records; -1 means all remaining
    pub n: i64,
    /// Statement id inside an explicit transaction; `None` means the last one
    pub qid: Option<i64>,
}

impl StreamMessage {
    pub const ALL: i64 = -1;

    pub fn new(n: i64, qid: Option<i64>) -> Self {
        Self { n, qid }
    }

    pub fn all() -> Self {
        Self::new(Self::ALL, None)
    }

    pub fn to_map(&self) -> HashMap<String, PackStreamValue> {
        let mut map = HashMap::new();
        map.insert("n".to_string(), self.n.into());
        if let Some(qid) = self.qid.filter(|q| *q != Self::ALL) {
            map.insert("qid".to_string(), qid.into());
        }
        map
    }

    pub fn from_map(map: &HashMap<String, PackStreamValue>) -> Self {
        Self {
            n: map.get("n").and_then(|v| v.as_int()).unwrap_or(Self::ALL),
            qid: map.get("qid").and_then(|v| v.as_int()),
        }
    }
}

/// Third field of ROUTE, which changed shape in Bolt 4.4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Bolt 4.3: database name or null
    Database(Option<String>),
    /// Bolt 4.4+: `{db, imp_user}` map
    Extra {
        database: Option<String>,
        impersonated_user: Option<String>,
    },
}

/// ROUTE message - Request routing information (Bolt 4.3+).
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMessage {
    pub routing: HashMap<String, PackStreamValue>,
    pub bookmarks: Vec<String>,
    pub target: RouteTarget,
}

impl RouteMessage {
    pub fn to_structure(&self) -> PackStreamStructure {
        let target = match &self.target {
            RouteTarget::Database(db) => db.as_deref().map_or(PackStreamValue::Null, Into::into),
            RouteTarget::Extra {
                database,
                impersonated_user,
            } => {
                let mut extra = HashMap::new();
                if let Some(db) = database {
                    extra.insert("db".to_string(), db.as_str().into());
                }
                if let Some(user) = impersonated_user {
                    extra.insert("imp_user".to_string(), user.as_str().into());
                }
                extra.into()
            }
        };
        PackStreamStructure::new(
            tag::ROUTE,
            vec![
                self.routing.clone().into(),
                self.bookmarks.clone().into(),
                target,
            ],
        )
    }

    pub fn from_structure(s: &PackStreamStructure) -> Result<Self, PackStreamError> {
        s.expect_fields("ROUTE", 3)?;
        let bookmarks = s.fields[1].as_string_list().ok_or_else(|| {
            PackStreamError::InvalidStructure("ROUTE bookmarks must be a list of strings".into())
        })?;
        let target = match &s.fields[2] {
            PackStreamValue::Null => RouteTarget::Database(None),
            PackStreamValue::String(db) => RouteTarget::Database(Some(db.clone())),
            PackStreamValue::Map(extra) => {
                let text = |key: &str| extra.get(key).and_then(|v| v.as_str()).map(str::to_string);
                RouteTarget::Extra {
                    database: text("db"),
                    impersonated_user: text("imp_user"),
                }
            }
            other => {
                return Err(PackStreamError::InvalidStructure(format!(
                    "ROUTE target cannot be {}",
                    other.type_name()
                )))
            }
        };
        Ok(Self {
            routing: s.map_field("ROUTE", 0)?.clone(),
            bookmarks,
            target,
        })
    }
}
