//! Connection state machine.
//!
//! A [`Connection`] writes requests through its [`Transport`] and keeps one
//! [`ResponseObserver`] per request that expects an answer. Responses arrive
//! through [`Connection::handle_message`] in request order and go to the
//! observer at the head of the queue; RECORDs keep that observer at the head
//! until its SUCCESS or failure.
//!
//! Observers are always called with the connection lock released, so they
//! may write follow-up requests from inside a callback.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::codec::Encoder;
use tracing::{debug, trace, warn};

use crate::bolt::packstream::{PackStreamStructure, PackStreamValue};
use crate::bolt::protocol::{normalize_metadata, RoutingRequest};
use crate::bolt::{
    AuthToken, BoltError, BoltRequest, BoltResponse, BoltResponseCodec, BoltResult, BoltVersion,
    HelloParams, Protocol, RouteParams, RoutingTable, SuccessMessage, TxConfig,
};

use super::config::ConnectionConfig;
use super::observer::{
    Completion, DiscardingObserver, ResponseObserver, RouteObserver, RoutingProcedureObserver,
    SuccessObserver,
};
use super::stream::ResultStream;
use super::summary::Query;
use super::transport::Transport;
use super::value::{Hydrator, Value};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake done, initialization not yet acknowledged
    Connecting,
    /// Nothing pending
    Ready,
    /// Records are being pulled or discarded
    Streaming,
    /// Waiting for a non-streaming response
    AwaitingResponse,
    /// Closed by GOODBYE or by a fatal error
    Closed,
}

/// A request and the observer for its response.
///
/// Requests that expect a response but come without an observer get one
/// that drops the outcome.
pub(crate) type Outgoing = (BoltRequest, Option<Box<dyn ResponseObserver>>);

struct Inner {
    id: u64,
    transport: Box<dyn Transport>,
    protocol: Protocol,
    config: ConnectionConfig,
    codec: BoltResponseCodec,
    pending: VecDeque<Box<dyn ResponseObserver>>,
    /// Names of pending requests, parallel to `pending`
    pending_names: VecDeque<&'static str>,
    initialized: bool,
    closed: bool,
    current_failure: Option<BoltError>,
    server_agent: Option<String>,
    server_connection_id: Option<String>,
}

impl Inner {
    /// Mark closed and hand back every pending observer.
    fn shutdown(&mut self) -> Vec<Box<dyn ResponseObserver>> {
        if !self.closed {
            debug!(conn = self.id, "connection closed");
        }
        self.closed = true;
        self.transport.close();
        self.pending_names.clear();
        self.pending.drain(..).collect()
    }

    fn pop(&mut self) -> Option<Box<dyn ResponseObserver>> {
        self.pending_names.pop_front();
        self.pending.pop_front()
    }
}

fn fail_all(observers: Vec<Box<dyn ResponseObserver>>, error: &BoltError) {
    for observer in observers {
        observer.on_failure(error.clone());
    }
}

/// Client side of one Bolt connection.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Mutex<Inner>>,
}

/// Non-owning handle held by observers and I/O tasks.
#[derive(Clone)]
pub struct WeakConnection {
    inner: Weak<Mutex<Inner>>,
}

impl WeakConnection {
    pub fn upgrade(&self) -> Option<Connection> {
        self.inner.upgrade().map(|inner| Connection { inner })
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Connection")
            .field("id", &inner.id)
            .field("version", &inner.protocol.version())
            .field("pending", &inner.pending.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl Connection {
    /// Wrap a transport that already completed the handshake for `version`.
    pub fn new(transport: Box<dyn Transport>, version: BoltVersion, config: ConnectionConfig) -> Self {
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        let codec = BoltResponseCodec::with_max_size(config.max_message_size);
        debug!(conn = id, %version, "connection created");
        Self {
            inner: Arc::new(Mutex::new(Inner {
                id,
                transport,
                protocol: Protocol::new(version),
                config,
                codec,
                pending: VecDeque::new(),
                pending_names: VecDeque::new(),
                initialized: false,
                closed: false,
                current_failure: None,
                server_agent: None,
                server_connection_id: None,
            })),
        }
    }

    pub fn downgrade(&self) -> WeakConnection {
        WeakConnection {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> u64 {
        self.inner.lock().id
    }

    pub fn protocol(&self) -> Protocol {
        self.inner.lock().protocol
    }

    pub fn version(&self) -> BoltVersion {
        self.protocol().version()
    }

    pub fn config(&self) -> ConnectionConfig {
        self.inner.lock().config.clone()
    }

    /// Value converter for this connection's version and integer mode.
    pub fn hydrator(&self) -> Hydrator {
        let inner = self.inner.lock();
        Hydrator::new(inner.protocol.struct_codec(), inner.config.integer_mode)
    }

    /// Server agent string from the HELLO response.
    pub fn server_agent(&self) -> Option<String> {
        self.inner.lock().server_agent.clone()
    }

    /// Server-assigned connection id from the HELLO response.
    pub fn server_connection_id(&self) -> Option<String> {
        self.inner.lock().server_connection_id.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_open(&self) -> bool {
        !self.inner.lock().closed
    }

    pub fn state(&self) -> ConnectionState {
        let inner = self.inner.lock();
        if inner.closed {
            ConnectionState::Closed
        } else if !inner.initialized {
            ConnectionState::Connecting
        } else {
            match inner.pending_names.front() {
                None => ConnectionState::Ready,
                Some(&"PULL" | &"PULL_ALL" | &"DISCARD" | &"DISCARD_ALL") => {
                    ConnectionState::Streaming
                }
                Some(_) => ConnectionState::AwaitingResponse,
            }
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Encode `batch`, queue its observers and write it in one go.
    ///
    /// Encoding errors are returned before anything is queued or written.
    /// Everything else, including a closed connection or a failed write,
    /// reaches the observers.
    pub(crate) fn send(&self, batch: Vec<Outgoing>) -> BoltResult<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            drop(inner);
            for (_, observer) in batch {
                if let Some(observer) = observer {
                    observer.on_failure(BoltError::ConnectionClosed);
                }
            }
            return Ok(());
        }

        let mut buf = BytesMut::new();
        for (request, _) in &batch {
            inner.codec.encode(request.clone(), &mut buf)?;
        }

        let id = inner.id;
        for (request, observer) in batch {
            debug!(conn = id, "C: {}", request.name());
            if request.expects_response() {
                let observer = observer
                    .unwrap_or_else(|| Box::new(DiscardingObserver::new(request.name())));
                inner.pending_names.push_back(request.name());
                inner.pending.push_back(observer);
            }
        }

        if let Err(error) = inner.transport.write(buf.freeze()) {
            warn!(conn = id, %error, "write failed, closing connection");
            let pending = inner.shutdown();
            drop(inner);
            fail_all(pending, &error);
        }
        Ok(())
    }

    pub(crate) fn send_one(&self, request: BoltRequest, observer: Box<dyn ResponseObserver>) -> BoltResult<()> {
        self.send(vec![(request, Some(observer))])
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Deliver one response structure read from the server.
    pub fn handle_message(&self, structure: PackStreamStructure) {
        let response = BoltResponse::from_structure(&structure);
        let mut inner = self.inner.lock();
        let id = inner.id;
        let Some(mut observer) = inner.pop() else {
            warn!(conn = id, tag = structure.tag, "response with no pending request");
            return;
        };

        match response {
            Err(e) => {
                drop(inner);
                warn!(conn = id, error = %e, "malformed response");
                observer.on_failure(BoltError::protocol(format!("Malformed response: {}", e)));
            }
            Ok(BoltResponse::Record(record)) => {
                let name = observer.name();
                inner.pending_names.push_front(name);
                drop(inner);
                trace!(conn = id, "S: RECORD");
                let result = observer.on_record(record.fields);

                let mut inner = self.inner.lock();
                inner.pending_names.pop_front();
                match result {
                    Ok(()) if !inner.closed => {
                        inner.pending_names.push_front(name);
                        inner.pending.push_front(observer);
                    }
                    Ok(()) => {
                        drop(inner);
                        observer.on_failure(BoltError::ConnectionClosed);
                    }
                    Err(e) => {
                        drop(inner);
                        observer.on_failure(e);
                    }
                }
            }
            Ok(BoltResponse::Success(success)) => {
                drop(inner);
                trace!(conn = id, "S: SUCCESS {:?}", success.metadata.keys().collect::<Vec<_>>());
                observer.on_success(normalize_metadata(success.metadata));
            }
            Ok(BoltResponse::Failure(failure)) => {
                let error = BoltError::from(&failure);
                inner.current_failure = Some(error.clone());
                drop(inner);
                debug!(conn = id, "S: FAILURE {}", failure);
                observer.on_failure(error);
            }
            Ok(BoltResponse::Ignored) => {
                let error = inner.current_failure.clone().unwrap_or(BoltError::Ignored);
                drop(inner);
                trace!(conn = id, "S: IGNORED");
                observer.on_failure(error);
            }
        }
    }

    /// Tear the connection down after a transport or framing error.
    pub fn handle_fatal(&self, error: BoltError) {
        let mut inner = self.inner.lock();
        if inner.closed && inner.pending.is_empty() {
            return;
        }
        warn!(conn = inner.id, %error, "fatal connection error");
        let pending = inner.shutdown();
        drop(inner);
        fail_all(pending, &error);
    }

    fn record_server_info(&self, metadata: &HashMap<String, PackStreamValue>, ready: bool) {
        let mut inner = self.inner.lock();
        if let Some(server) = metadata.get("server").and_then(|v| v.as_str()) {
            inner.server_agent = Some(server.to_string());
        }
        if let Some(id) = metadata.get("connection_id").and_then(|v| v.as_str()) {
            inner.server_connection_id = Some(id.to_string());
        }
        if ready && !inner.closed {
            inner.initialized = true;
            debug!(conn = inner.id, "connection ready");
        }
    }

    fn clear_failure(&self) {
        self.inner.lock().current_failure = None;
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Send HELLO (and LOGON from 5.1) with the configured parameters.
    pub fn initialize(&self) -> BoltResult<Completion<SuccessMessage>> {
        let params = self.inner.lock().config.hello_params();
        self.hello(&params)
    }

    /// Send HELLO (and LOGON from 5.1).
    ///
    /// The completion resolves with the last response of the exchange.
    pub fn hello(&self, params: &HelloParams) -> BoltResult<Completion<SuccessMessage>> {
        let requests = self.protocol().hello(params)?;
        let count = requests.len();
        let (tx, completion) = Completion::channel();
        let mut tx = Some(tx);
        let batch = requests
            .into_iter()
            .enumerate()
            .map(|(i, request)| {
                let last = i + 1 == count;
                let observer: Box<dyn ResponseObserver> = Box::new(InitObserver {
                    name: request.name(),
                    conn: self.downgrade(),
                    ready: last,
                    tx: if last { tx.take() } else { None },
                });
                (request, Some(observer))
            })
            .collect();
        self.send(batch)?;
        Ok(completion)
    }

    /// Authenticate again on 5.1+.
    pub fn logon(&self, auth: AuthToken) -> BoltResult<Completion<SuccessMessage>> {
        let request = self.protocol().logon(auth)?;
        let (observer, completion) = SuccessObserver::new("LOGON");
        self.send_one(request, Box::new(observer))?;
        Ok(completion)
    }

    pub fn logoff(&self) -> BoltResult<Completion<SuccessMessage>> {
        let request = self.protocol().logoff()?;
        let (observer, completion) = SuccessObserver::new("LOGOFF");
        self.send_one(request, Box::new(observer))?;
        Ok(completion)
    }

    pub fn begin(&self, config: &TxConfig) -> BoltResult<Completion<SuccessMessage>> {
        let request = self.protocol().begin(config)?;
        let (observer, completion) = SuccessObserver::new("BEGIN");
        self.send_one(request, Box::new(observer))?;
        Ok(completion)
    }

    pub fn commit(&self) -> BoltResult<Completion<SuccessMessage>> {
        let (observer, completion) = SuccessObserver::new("COMMIT");
        self.send_one(self.protocol().commit(), Box::new(observer))?;
        Ok(completion)
    }

    pub fn rollback(&self) -> BoltResult<Completion<SuccessMessage>> {
        let (observer, completion) = SuccessObserver::new("ROLLBACK");
        self.send_one(self.protocol().rollback(), Box::new(observer))?;
        Ok(completion)
    }

    /// Return a failed connection to a usable state.
    pub fn reset(&self) -> BoltResult<Completion<SuccessMessage>> {
        let (tx, completion) = Completion::channel();
        let observer = ResetObserver {
            conn: self.downgrade(),
            tx,
        };
        self.send_one(self.protocol().reset(), Box::new(observer))?;
        Ok(completion)
    }

    /// Send GOODBYE and close. Pending requests fail with
    /// [`BoltError::ConnectionClosed`].
    pub fn goodbye(&self) {
        // the connection closes either way
        if let Err(error) = self.send(vec![(self.protocol().goodbye(), None)]) {
            debug!(conn = self.id(), %error, "GOODBYE not written");
        }
        let mut inner = self.inner.lock();
        let pending = inner.shutdown();
        drop(inner);
        fail_all(pending, &BoltError::ConnectionClosed);
    }

    /// Fetch a routing table.
    pub fn route(&self, params: &RouteParams) -> BoltResult<Completion<RoutingTable>> {
        match self.protocol().route(params)? {
            RoutingRequest::Route(request) => {
                let (observer, completion) = RouteObserver::new();
                self.send_one(request, Box::new(observer))?;
                Ok(completion)
            }
            RoutingRequest::Procedure {
                run,
                pull,
                database,
            } => {
                let (observer, completion) = RoutingProcedureObserver::new(database);
                let observer: Box<dyn ResponseObserver> = Box::new(observer);
                self.send(vec![(run, None), (pull, Some(observer))])?;
                Ok(completion)
            }
        }
    }

    /// Run an auto-commit query.
    ///
    /// Capability and encoding errors are returned here, before any byte is
    /// written. RUN is sent right away; records are pulled once the result
    /// is consumed.
    pub fn run(
        &self,
        query: &str,
        parameters: HashMap<String, Value>,
        config: &TxConfig,
    ) -> BoltResult<ResultStream> {
        let protocol = self.protocol();
        let packed = self.hydrator().dehydrate_map(&parameters)?;
        let request = protocol.run_auto_commit(query, packed, config)?;
        ResultStream::start(self, request, Query::new(query, parameters))
    }

    /// Run a query inside the transaction opened by [`Connection::begin`].
    pub fn run_in_transaction(
        &self,
        query: &str,
        parameters: HashMap<String, Value>,
    ) -> BoltResult<ResultStream> {
        let packed = self.hydrator().dehydrate_map(&parameters)?;
        let request = self.protocol().run_in_transaction(query, packed);
        ResultStream::start(self, request, Query::new(query, parameters))
    }
}

// ============================================================================
// Connection-level observers
// ============================================================================

/// HELLO / LOGON: records server details before completing.
struct InitObserver {
    name: &'static str,
    conn: WeakConnection,
    ready: bool,
    tx: Option<oneshot::Sender<BoltResult<SuccessMessage>>>,
}

impl ResponseObserver for InitObserver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_success(self: Box<Self>, metadata: HashMap<String, PackStreamValue>) {
        if let Some(conn) = self.conn.upgrade() {
            conn.record_server_info(&metadata, self.ready);
        }
        if let Some(tx) = self.tx {
            let _ = tx.send(Ok(SuccessMessage::new(metadata)));
        }
    }

    fn on_failure(self: Box<Self>, error: BoltError) {
        if let Some(tx) = self.tx {
            let _ = tx.send(Err(error));
        }
    }
}

/// RESET: forgets the failure that IGNORED responses were reporting.
struct ResetObserver {
    conn: WeakConnection,
    tx: oneshot::Sender<BoltResult<SuccessMessage>>,
}

impl ResponseObserver for ResetObserver {
    fn name(&self) -> &'static str {
        "RESET"
    }

    fn on_success(self: Box<Self>, metadata: HashMap<String, PackStreamValue>) {
        if let Some(conn) = self.conn.upgrade() {
            conn.clear_failure();
        }
        let _ = self.tx.send(Ok(SuccessMessage::new(metadata)));
    }

    fn on_failure(self: Box<Self>, error: BoltError) {
        let _ = self.tx.send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::message::{FailureMessage, RecordMessage};
    use crate::driver::transport::RecordingTransport;

    fn connection(version: BoltVersion) -> (Connection, RecordingTransport) {
        let transport = RecordingTransport::new();
        let conn = Connection::new(
            Box::new(transport.clone()),
            version,
            ConnectionConfig::default(),
        );
        (conn, transport)
    }

    fn reply(conn: &Connection, response: BoltResponse) {
        conn.handle_message(response.to_structure());
    }

    fn success() -> BoltResponse {
        BoltResponse::Success(SuccessMessage::default())
    }

    #[tokio::test]
    async fn test_hello_then_logon_on_5_1() {
        let (conn, transport) = connection(BoltVersion::V5_1);
        let done = conn.initialize().unwrap();
        assert_eq!(transport.request_names(), vec!["HELLO", "LOGON"]);
        assert_eq!(transport.write_count(), 1);
        assert_eq!(conn.state(), ConnectionState::Connecting);

        reply(
            &conn,
            BoltResponse::Success(SuccessMessage::default().with("server", "Neo4j/5.8.0")),
        );
        assert_eq!(conn.state(), ConnectionState::Connecting);
        reply(&conn, success());

        done.await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Ready);
        assert_eq!(conn.server_agent().as_deref(), Some("Neo4j/5.8.0"));
    }

    #[tokio::test]
    async fn test_failure_then_ignored_then_reset() {
        let (conn, _transport) = connection(BoltVersion::V4_4);
        let begin = conn.begin(&TxConfig::new()).unwrap();
        let commit = conn.commit().unwrap();
        assert_eq!(conn.pending_count(), 2);

        reply(
            &conn,
            BoltResponse::Failure(FailureMessage::new("Neo.ClientError.Security.Forbidden", "no")),
        );
        reply(&conn, BoltResponse::Ignored);

        let err = begin.await.unwrap_err();
        assert_eq!(err.code(), Some("Neo.ClientError.Security.Forbidden"));
        let err = commit.await.unwrap_err();
        assert_eq!(err.code(), Some("Neo.ClientError.Security.Forbidden"));

        let reset = conn.reset().unwrap();
        reply(&conn, success());
        reset.await.unwrap();

        let rollback = conn.rollback().unwrap();
        reply(&conn, BoltResponse::Ignored);
        assert!(matches!(rollback.await, Err(BoltError::Ignored)));
    }

    #[tokio::test]
    async fn test_write_failure_fails_all_pending() {
        let (conn, transport) = connection(BoltVersion::V4_4);
        let begin = conn.begin(&TxConfig::new()).unwrap();
        transport.fail_writes();
        let commit = conn.commit().unwrap();

        assert!(matches!(begin.await, Err(BoltError::Io(_))));
        assert!(matches!(commit.await, Err(BoltError::Io(_))));
        assert_eq!(conn.state(), ConnectionState::Closed);

        let late = conn.rollback().unwrap();
        assert!(matches!(late.await, Err(BoltError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_malformed_response_fails_only_head() {
        let (conn, _transport) = connection(BoltVersion::V4_4);
        let begin = conn.begin(&TxConfig::new()).unwrap();
        let commit = conn.commit().unwrap();

        conn.handle_message(PackStreamStructure::new(0x70, vec![]));
        reply(&conn, success());

        assert!(matches!(begin.await, Err(BoltError::Protocol(_))));
        assert!(commit.await.is_ok());
        assert!(conn.is_open());
    }

    #[tokio::test]
    async fn test_unexpected_record() {
        let (conn, _transport) = connection(BoltVersion::V4_4);
        let commit = conn.commit().unwrap();
        reply(&conn, BoltResponse::Record(RecordMessage::new(vec![1i64.into()])));
        assert!(matches!(commit.await, Err(BoltError::Protocol(_))));
    }

    #[test]
    fn test_capability_error_writes_nothing() {
        let (conn, transport) = connection(BoltVersion::V3);
        let config = TxConfig::new().with_database("movies");
        assert!(conn.begin(&config).unwrap_err().is_capability_error());
        assert!(conn
            .run("RETURN 1", HashMap::new(), &config)
            .unwrap_err()
            .is_capability_error());
        assert!(conn.logon(AuthToken::none()).is_err());
        assert_eq!(transport.write_count(), 0);
        assert_eq!(conn.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_goodbye_closes() {
        let (conn, transport) = connection(BoltVersion::V4_4);
        let begin = conn.begin(&TxConfig::new()).unwrap();
        conn.goodbye();

        assert_eq!(transport.request_names(), vec!["BEGIN", "GOODBYE"]);
        assert!(transport.is_closed());
        assert!(matches!(begin.await, Err(BoltError::ConnectionClosed)));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_goodbye_on_broken_transport() {
        let (conn, transport) = connection(BoltVersion::V4_4);
        let begin = conn.begin(&TxConfig::new()).unwrap();
        transport.fail_writes();
        conn.goodbye();

        assert_eq!(transport.request_names(), vec!["BEGIN"]);
        assert!(begin.await.is_err());
        assert_eq!(conn.state(), ConnectionState::Closed);
        conn.goodbye();
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_route_message() {
        let (conn, transport) = connection(BoltVersion::V4_4);
        let table = RoutingTable {
            ttl: 300,
            database: Some("neo4j".to_string()),
            routers: vec!["a:7687".to_string()],
            readers: vec!["b:7687".to_string()],
            writers: vec!["a:7687".to_string()],
        };
        let done = conn.route(&RouteParams::default()).unwrap();
        assert_eq!(transport.request_names(), vec!["ROUTE"]);
        reply(
            &conn,
            BoltResponse::Success(SuccessMessage::default().with("rt", table.to_map())),
        );
        assert_eq!(done.await.unwrap(), table);
    }

    #[tokio::test]
    async fn test_route_procedure() {
        let (conn, transport) = connection(BoltVersion::V4_0);
        let table = RoutingTable {
            ttl: 60,
            database: Some("movies".to_string()),
            routers: vec!["r:7687".to_string()],
            readers: vec![],
            writers: vec!["w:7687".to_string()],
        };
        let done = conn
            .route(&RouteParams::default().with_database("movies"))
            .unwrap();
        assert_eq!(transport.request_names(), vec!["RUN", "PULL"]);

        let servers = table.to_map().remove("servers").unwrap();
        reply(
            &conn,
            BoltResponse::Success(SuccessMessage::default().with("fields", vec![
                "ttl".to_string(),
                "servers".to_string(),
            ])),
        );
        reply(
            &conn,
            BoltResponse::Record(RecordMessage::new(vec![60i64.into(), servers])),
        );
        reply(&conn, success());
        assert_eq!(done.await.unwrap(), table);
        assert_eq!(conn.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_late_response_ignored() {
        let (conn, _transport) = connection(BoltVersion::V4_4);
        reply(&conn, success());
        assert!(conn.is_open());
    }
}
