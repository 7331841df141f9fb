//! Streaming result engine.
//!
//! A [`ResultStream`] is created when RUN is written and moves through three
//! states:
//!
//! ```text
//! Ready ──records()/subscribe()──▶ Streaming(Records) ──┐
//!   │                                                   ├──▶ Completed
//!   └──summary()/drop──────────▶ Streaming(Summary) ────┘
//! ```
//!
//! Record consumption pulls `fetch_size` records per PULL. Pulled records sit
//! in a ring buffer that every [`RecordStream`] cursor reads at its own pace;
//! once the buffer holds `high_watermark` records no further PULL is sent
//! until it drains to `low_watermark`. Summary consumption sends one DISCARD.
//! The terminal summary or error is cached and handed to anyone who asks
//! after completion.
//!
//! The stream lock is never held while calling into the connection or into
//! user callbacks.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures::{Stream, TryStreamExt};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::bolt::packstream::PackStreamValue;
use crate::bolt::{BoltError, BoltRequest, BoltResult, Feature, Protocol, SuccessMessage};

use super::config::{FetchSize, FlowControl};
use super::connection::{Connection, WeakConnection};
use super::observer::ResponseObserver;
use super::record::Record;
use super::summary::{Query, ResultSummary, ServerInfo};
use super::value::Hydrator;

// ============================================================================
// Public types
// ============================================================================

/// How a streaming result is being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    Records,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// RUN written, nothing consumed yet
    Ready,
    Streaming(Consumption),
    /// Summary or error received
    Completed,
}

/// Callbacks for a result, invoked from the connection's I/O context.
///
/// All `on_record` calls of a batch come before that batch's completion;
/// nothing is delivered after `on_completed` or `on_error`.
pub trait ResultObserver: Send {
    fn on_keys(&mut self, _keys: &[String]) {}

    fn on_record(&mut self, record: &Record);

    fn on_completed(&mut self, _summary: &ResultSummary) {}

    fn on_error(&mut self, _error: &BoltError) {}
}

// ============================================================================
// Core
// ============================================================================

enum Action {
    Pull,
    Discard,
}

struct StreamCore {
    state: StreamState,
    conn: WeakConnection,
    protocol: Protocol,
    hydrator: Hydrator,
    flow: FlowControl,
    query: Query,
    server: ServerInfo,
    keys: Option<Arc<Vec<String>>>,
    qid: Option<i64>,
    run_metadata: HashMap<String, PackStreamValue>,
    /// Records not yet read by every cursor
    buffer: VecDeque<Record>,
    /// Sequence number of `buffer[0]`
    base: u64,
    /// Cursor id to the sequence number it reads next
    cursors: HashMap<u64, u64>,
    next_cursor: u64,
    terminal: Option<BoltResult<ResultSummary>>,
    /// Server has more records and no request for them is out
    paused: bool,
    handle_alive: bool,
    abandoned: bool,
    wakers: Vec<Waker>,
    subscribers: Vec<Box<dyn ResultObserver>>,
}

impl StreamCore {
    fn received(&self) -> u64 {
        self.base + self.buffer.len() as u64
    }

    fn register(&mut self, waker: &Waker) {
        if !self.wakers.iter().any(|w| w.will_wake(waker)) {
            self.wakers.push(waker.clone());
        }
    }

    fn take_wakers(&mut self) -> Vec<Waker> {
        std::mem::take(&mut self.wakers)
    }

    /// Drop records every cursor has read.
    fn trim(&mut self) {
        let Some(min) = self.cursors.values().min().copied() else {
            return;
        };
        while self.base < min && self.buffer.pop_front().is_some() {
            self.base += 1;
        }
    }

    fn clear_buffer(&mut self) {
        self.base = self.received();
        self.buffer.clear();
    }

    fn activate(&mut self, kind: Consumption) -> BoltResult<Option<Action>> {
        match self.state {
            StreamState::Ready => {
                self.state = StreamState::Streaming(kind);
                Ok(Some(match kind {
                    Consumption::Records => Action::Pull,
                    Consumption::Summary => Action::Discard,
                }))
            }
            StreamState::Streaming(current) if current != kind => {
                Err(BoltError::streaming_misuse(format!(
                    "result is already being consumed for its {}",
                    match current {
                        Consumption::Records => "records",
                        Consumption::Summary => "summary",
                    }
                )))
            }
            _ => Ok(None),
        }
    }

    fn maybe_resume(&mut self) -> Option<Action> {
        if self.paused && !self.abandoned && self.buffer.len() <= self.flow.low_watermark {
            self.paused = false;
            return Some(Action::Pull);
        }
        None
    }

    fn is_unobserved(&self) -> bool {
        !self.handle_alive && self.cursors.is_empty() && self.subscribers.is_empty()
    }

    /// Nobody will read the rest: stop pulling and let the server drop it.
    fn abandon(&mut self) -> Option<Action> {
        match self.state {
            StreamState::Ready => {
                self.state = StreamState::Streaming(Consumption::Summary);
                self.abandoned = true;
                Some(Action::Discard)
            }
            StreamState::Streaming(Consumption::Records) => {
                self.abandoned = true;
                self.clear_buffer();
                if self.paused {
                    self.paused = false;
                    Some(Action::Discard)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
struct Shared(Arc<Mutex<StreamCore>>);

impl Shared {
    fn perform(&self, action: Option<Action>) {
        let Some(action) = action else {
            return;
        };
        let (conn, request, name) = {
            let core = self.0.lock();
            let Some(conn) = core.conn.upgrade() else {
                return;
            };
            let request = match action {
                Action::Pull => core.protocol.pull(core.flow.fetch_size.as_n(), core.qid),
                Action::Discard => core.protocol.discard(core.qid),
            };
            let name = request.name();
            (conn, request, name)
        };
        let observer = StreamObserver {
            shared: self.clone(),
            name,
        };
        if let Err(error) = conn.send_one(request, Box::new(observer)) {
            self.finish(Err(error));
        }
    }

    fn restore(&self, mut subscribers: Vec<Box<dyn ResultObserver>>) {
        let mut core = self.0.lock();
        if core.state == StreamState::Completed {
            return;
        }
        subscribers.append(&mut core.subscribers);
        core.subscribers = subscribers;
    }

    fn on_run_success(&self, metadata: HashMap<String, PackStreamValue>) {
        let success = SuccessMessage::new(metadata);
        let keys = Arc::new(success.fields().unwrap_or_default());
        let mut core = self.0.lock();
        core.keys = Some(keys.clone());
        core.qid = success.qid();
        core.run_metadata = success.metadata;
        let wakers = core.take_wakers();
        let mut subscribers = std::mem::take(&mut core.subscribers);
        drop(core);

        wakers.into_iter().for_each(Waker::wake);
        for subscriber in &mut subscribers {
            subscriber.on_keys(&keys);
        }
        self.restore(subscribers);
    }

    fn on_record(&self, fields: Vec<PackStreamValue>) {
        let mut core = self.0.lock();
        if core.state == StreamState::Completed || core.abandoned {
            return;
        }
        let values = match core.hydrator.hydrate_all(fields) {
            Ok(values) => values,
            Err(error) => {
                drop(core);
                self.finish(Err(error));
                return;
            }
        };
        let keys = core.keys.clone().unwrap_or_default();
        let record = Record::new(keys, values);
        if !core.cursors.is_empty() || core.subscribers.is_empty() {
            core.buffer.push_back(record.clone());
        }
        let wakers = core.take_wakers();
        let mut subscribers = std::mem::take(&mut core.subscribers);
        drop(core);

        wakers.into_iter().for_each(Waker::wake);
        if !subscribers.is_empty() {
            for subscriber in &mut subscribers {
                subscriber.on_record(&record);
            }
            self.restore(subscribers);
        }
    }

    fn on_batch_success(&self, metadata: HashMap<String, PackStreamValue>) {
        let has_more = metadata
            .get("has_more")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !has_more {
            self.finish(Ok(metadata));
            return;
        }

        let mut core = self.0.lock();
        let action = if core.state != StreamState::Streaming(Consumption::Records) || core.abandoned {
            Some(Action::Discard)
        } else if core.buffer.len() < core.flow.high_watermark {
            Some(Action::Pull)
        } else {
            trace!(buffered = core.buffer.len(), "pausing pulls");
            core.paused = true;
            None
        };
        drop(core);
        self.perform(action);
    }

    fn finish(&self, result: BoltResult<HashMap<String, PackStreamValue>>) {
        let mut core = self.0.lock();
        if core.state == StreamState::Completed {
            return;
        }
        let terminal = result.map(|last| {
            ResultSummary::new(core.query.clone(), core.server.clone(), &core.run_metadata, &last)
        });
        core.state = StreamState::Completed;
        core.paused = false;
        core.terminal = Some(terminal.clone());
        if core.abandoned {
            core.clear_buffer();
        }
        let wakers = core.take_wakers();
        let subscribers = std::mem::take(&mut core.subscribers);
        drop(core);

        match &terminal {
            Ok(_) => debug!("result completed"),
            Err(error) => debug!(%error, "result failed"),
        }
        wakers.into_iter().for_each(Waker::wake);
        for mut subscriber in subscribers {
            match &terminal {
                Ok(summary) => subscriber.on_completed(summary),
                Err(error) => subscriber.on_error(error),
            }
        }
    }
}

// ============================================================================
// Response observers
// ============================================================================

struct RunObserver {
    shared: Shared,
}

impl ResponseObserver for RunObserver {
    fn name(&self) -> &'static str {
        "RUN"
    }

    fn on_success(self: Box<Self>, metadata: HashMap<String, PackStreamValue>) {
        self.shared.on_run_success(metadata);
    }

    fn on_failure(self: Box<Self>, error: BoltError) {
        self.shared.finish(Err(error));
    }
}

/// PULL or DISCARD.
struct StreamObserver {
    shared: Shared,
    name: &'static str,
}

impl ResponseObserver for StreamObserver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_record(&mut self, fields: Vec<PackStreamValue>) -> BoltResult<()> {
        self.shared.on_record(fields);
        Ok(())
    }

    fn on_success(self: Box<Self>, metadata: HashMap<String, PackStreamValue>) {
        self.shared.on_batch_success(metadata);
    }

    fn on_failure(self: Box<Self>, error: BoltError) {
        self.shared.finish(Err(error));
    }
}

// ============================================================================
// ResultStream
// ============================================================================

/// Handle to the result of one RUN.
///
/// Dropping the handle while nothing reads the result sends DISCARD.
pub struct ResultStream {
    shared: Shared,
    conn: Connection,
}

impl std::fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.0.lock();
        f.debug_struct("ResultStream")
            .field("state", &core.state)
            .field("buffered", &core.buffer.len())
            .finish()
    }
}

impl ResultStream {
    /// Write `run` and start tracking its result.
    pub(crate) fn start(conn: &Connection, run: BoltRequest, query: Query) -> BoltResult<Self> {
        let protocol = conn.protocol();
        let flow = if protocol.supports(Feature::BatchedPull) {
            conn.config().flow
        } else {
            FlowControl::unbounded(FetchSize::All)
        };
        let core = StreamCore {
            state: StreamState::Ready,
            conn: conn.downgrade(),
            protocol,
            hydrator: conn.hydrator(),
            flow,
            query,
            server: ServerInfo {
                agent: conn.server_agent(),
                protocol_version: protocol.version(),
            },
            keys: None,
            qid: None,
            run_metadata: HashMap::new(),
            buffer: VecDeque::new(),
            base: 0,
            cursors: HashMap::new(),
            next_cursor: 0,
            terminal: None,
            paused: false,
            handle_alive: true,
            abandoned: false,
            wakers: Vec::new(),
            subscribers: Vec::new(),
        };
        let shared = Shared(Arc::new(Mutex::new(core)));
        let observer = RunObserver {
            shared: shared.clone(),
        };
        conn.send_one(run, Box::new(observer))?;
        Ok(Self {
            shared,
            conn: conn.clone(),
        })
    }

    pub fn state(&self) -> StreamState {
        self.shared.0.lock().state
    }

    /// Records pulled but not yet read by every cursor.
    pub fn buffered(&self) -> usize {
        self.shared.0.lock().buffer.len()
    }

    /// Column names. Does not start consumption.
    pub fn keys(&self) -> KeysFuture {
        KeysFuture {
            shared: self.shared.clone(),
        }
    }

    /// Start or join record consumption.
    ///
    /// Every cursor sees the records still buffered when it attaches and
    /// everything pulled afterwards. Fails while the result is being
    /// consumed for its summary.
    pub fn records(&self) -> BoltResult<RecordStream> {
        let (id, action) = {
            let mut core = self.shared.0.lock();
            let action = core.activate(Consumption::Records)?;
            let id = core.next_cursor;
            core.next_cursor += 1;
            let start = core.base;
            core.cursors.insert(id, start);
            (id, action)
        };
        self.shared.perform(action);
        Ok(RecordStream {
            shared: self.shared.clone(),
            id,
            error_delivered: false,
            _conn: self.conn.clone(),
        })
    }

    /// Discard remaining records and wait for the summary.
    ///
    /// Fails while records are being streamed. After completion this returns
    /// the cached summary (or error) again.
    pub fn summary(&self) -> BoltResult<SummaryFuture> {
        let action = self.shared.0.lock().activate(Consumption::Summary)?;
        self.shared.perform(action);
        Ok(SummaryFuture {
            shared: self.shared.clone(),
        })
    }

    /// Receive records through callbacks instead of a cursor.
    pub fn subscribe(&self, mut observer: Box<dyn ResultObserver>) -> BoltResult<()> {
        let mut core = self.shared.0.lock();
        if core.state == StreamState::Completed {
            let keys = core.keys.clone();
            let terminal = core.terminal.clone();
            drop(core);
            if let Some(keys) = keys {
                observer.on_keys(&keys);
            }
            match terminal {
                Some(Ok(summary)) => observer.on_completed(&summary),
                Some(Err(error)) => observer.on_error(&error),
                None => {}
            }
            return Ok(());
        }

        let action = core.activate(Consumption::Records)?;
        let keys = core.keys.clone();
        match keys {
            Some(keys) => {
                drop(core);
                observer.on_keys(&keys);
                self.shared.0.lock().subscribers.push(observer);
            }
            None => {
                core.subscribers.push(observer);
                drop(core);
            }
        }
        self.shared.perform(action);
        Ok(())
    }

    /// Read every record.
    pub async fn collect(&self) -> BoltResult<Vec<Record>> {
        self.records()?.try_collect().await
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        let action = {
            let mut core = self.shared.0.lock();
            core.handle_alive = false;
            if core.is_unobserved() {
                core.abandon()
            } else {
                None
            }
        };
        if action.is_some() {
            debug!("result dropped before consumption, discarding");
        }
        self.shared.perform(action);
    }
}

// ============================================================================
// Cursors and futures
// ============================================================================

/// One reader of a result's records.
///
/// Yields each record once, then `Err` if the result failed.
pub struct RecordStream {
    shared: Shared,
    id: u64,
    error_delivered: bool,
    _conn: Connection,
}

impl Stream for RecordStream {
    type Item = BoltResult<Record>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let mut core = this.shared.0.lock();
        let base = core.base;
        let position = core.cursors.get(&this.id).copied().unwrap_or(base).max(base);

        if position < core.received() {
            let record = core.buffer[(position - base) as usize].clone();
            core.cursors.insert(this.id, position + 1);
            core.trim();
            let action = core.maybe_resume();
            drop(core);
            this.shared.perform(action);
            return Poll::Ready(Some(Ok(record)));
        }

        match &core.terminal {
            Some(Err(error)) if !this.error_delivered => {
                let error = error.clone();
                this.error_delivered = true;
                Poll::Ready(Some(Err(error)))
            }
            Some(_) => Poll::Ready(None),
            None => {
                core.register(cx.waker());
                Poll::Pending
            }
        }
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        let action = {
            let mut core = self.shared.0.lock();
            core.cursors.remove(&self.id);
            core.trim();
            if core.is_unobserved() {
                core.abandon()
            } else {
                core.maybe_resume()
            }
        };
        self.shared.perform(action);
    }
}

/// Resolves with the column names once RUN succeeds.
pub struct KeysFuture {
    shared: Shared,
}

impl Future for KeysFuture {
    type Output = BoltResult<Vec<String>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut core = self.shared.0.lock();
        if let Some(keys) = &core.keys {
            return Poll::Ready(Ok(keys.to_vec()));
        }
        match &core.terminal {
            Some(Err(error)) => Poll::Ready(Err(error.clone())),
            Some(Ok(_)) => Poll::Ready(Ok(Vec::new())),
            None => {
                core.register(cx.waker());
                Poll::Pending
            }
        }
    }
}

/// Resolves with the summary, or the error that ended the result.
pub struct SummaryFuture {
    shared: Shared,
}

impl Future for SummaryFuture {
    type Output = BoltResult<ResultSummary>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut core = self.shared.0.lock();
        match &core.terminal {
            Some(terminal) => Poll::Ready(terminal.clone()),
            None => {
                core.register(cx.waker());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::message::{FailureMessage, RecordMessage};
    use crate::bolt::packstream::PackStreamStructure;
    use crate::bolt::{BoltResponse, BoltVersion, TxConfig};
    use crate::driver::config::ConnectionConfig;
    use crate::driver::transport::RecordingTransport;
    use crate::driver::value::Value;
    use futures::StreamExt;

    fn connection(version: BoltVersion, config: ConnectionConfig) -> (Connection, RecordingTransport) {
        let transport = RecordingTransport::new();
        let conn = Connection::new(Box::new(transport.clone()), version, config);
        (conn, transport)
    }

    fn batched(n: u32) -> ConnectionConfig {
        ConnectionConfig::builder()
            .with_fetch_size(FetchSize::Batch(n))
            .with_high_watermark(usize::MAX)
            .with_low_watermark(usize::MAX)
            .build()
    }

    fn run(conn: &Connection) -> ResultStream {
        conn.run("UNWIND range(1, $n) AS x RETURN x", HashMap::new(), &TxConfig::new())
            .unwrap()
    }

    fn reply(conn: &Connection, response: BoltResponse) {
        conn.handle_message(response.to_structure());
    }

    fn run_success(conn: &Connection) {
        reply(
            conn,
            BoltResponse::Success(SuccessMessage::default().with("fields", vec!["x".to_string()])),
        );
    }

    fn records(conn: &Connection, from: i64, count: i64) {
        for x in from..from + count {
            reply(conn, BoltResponse::Record(RecordMessage::new(vec![x.into()])));
        }
    }

    fn batch_done(conn: &Connection, has_more: bool) {
        let success = if has_more {
            SuccessMessage::default().with("has_more", true)
        } else {
            SuccessMessage::default().with("t_last", 4i64).with("type", "r")
        };
        reply(conn, BoltResponse::Success(success));
    }

    fn count(transport: &RecordingTransport, name: &str) -> usize {
        transport.request_names().iter().filter(|n| **n == name).count()
    }

    #[derive(Clone, Default)]
    struct EventLog(Arc<Mutex<Vec<String>>>);

    impl EventLog {
        fn events(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    impl ResultObserver for EventLog {
        fn on_keys(&mut self, keys: &[String]) {
            self.0.lock().push(format!("keys {}", keys.join(",")));
        }

        fn on_record(&mut self, record: &Record) {
            self.0.lock().push(format!("record {}", record.values()[0]));
        }

        fn on_completed(&mut self, _summary: &ResultSummary) {
            self.0.lock().push("completed".to_string());
        }

        fn on_error(&mut self, error: &BoltError) {
            self.0.lock().push(format!("error {}", error));
        }
    }

    #[tokio::test]
    async fn test_pulls_in_batches() {
        let (conn, transport) = connection(BoltVersion::V4_4, batched(10));
        let result = run(&conn);
        let log = EventLog::default();
        result.subscribe(Box::new(log.clone())).unwrap();
        assert_eq!(transport.request_names(), vec!["RUN", "PULL"]);

        run_success(&conn);
        records(&conn, 1, 10);
        assert_eq!(log.events().len(), 11);
        batch_done(&conn, true);
        assert_eq!(count(&transport, "PULL"), 2);

        records(&conn, 11, 10);
        batch_done(&conn, true);
        records(&conn, 21, 5);
        assert!(!log.events().contains(&"completed".to_string()));
        batch_done(&conn, false);

        // ceil(25 / 10) pulls
        assert_eq!(count(&transport, "PULL"), 3);
        let events = log.events();
        assert_eq!(events.first().map(String::as_str), Some("keys x"));
        assert_eq!(events.iter().filter(|e| e.starts_with("record")).count(), 25);
        assert_eq!(events.last().map(String::as_str), Some("completed"));
        assert_eq!(events.iter().filter(|e| *e == "completed").count(), 1);

        let summary = result.summary().unwrap().await.unwrap();
        assert_eq!(summary.result_consumed_after, Some(4));
        assert_eq!(count(&transport, "DISCARD"), 0);
    }

    #[tokio::test]
    async fn test_pull_messages_carry_fetch_size() {
        let (conn, transport) = connection(BoltVersion::V4_4, batched(10));
        let result = run(&conn);
        let _cursor = result.records().unwrap();
        let requests = transport.requests().unwrap();
        let BoltRequest::Pull(pull) = &requests[1] else {
            panic!("expected PULL");
        };
        assert_eq!(pull.n, 10);
    }

    #[tokio::test]
    async fn test_abandoned_result_discards() {
        let (conn, transport) = connection(BoltVersion::V4_4, batched(10));
        let result = run(&conn);
        drop(result);

        assert_eq!(transport.request_names(), vec!["RUN", "DISCARD"]);
        assert_eq!(count(&transport, "PULL"), 0);
        assert_eq!(conn.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_cursor_reads_records_then_summary() {
        let (conn, _transport) = connection(BoltVersion::V5_0, batched(100));
        let result = run(&conn);
        let mut cursor = result.records().unwrap();

        run_success(&conn);
        records(&conn, 1, 3);
        batch_done(&conn, false);

        let mut seen = Vec::new();
        while let Some(record) = cursor.next().await {
            seen.push(record.unwrap().get_as::<i64>("x").unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(result.state(), StreamState::Completed);
        assert_eq!(result.buffered(), 0);

        let first = result.summary().unwrap().await.unwrap();
        let again = result.summary().unwrap().await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn test_keys_do_not_activate() {
        let (conn, transport) = connection(BoltVersion::V4_4, batched(10));
        let result = run(&conn);
        let keys = result.keys();
        run_success(&conn);

        assert_eq!(keys.await.unwrap(), vec!["x".to_string()]);
        assert_eq!(result.state(), StreamState::Ready);
        assert_eq!(transport.request_names(), vec!["RUN"]);
    }

    #[tokio::test]
    async fn test_summary_discards() {
        let (conn, transport) = connection(BoltVersion::V4_4, batched(10));
        let result = run(&conn);
        let summary = result.summary().unwrap();
        assert_eq!(transport.request_names(), vec!["RUN", "DISCARD"]);

        run_success(&conn);
        batch_done(&conn, false);
        let summary = summary.await.unwrap();
        assert_eq!(summary.result_consumed_after, Some(4));
    }

    #[tokio::test]
    async fn test_mixed_consumption_is_misuse() {
        let (conn, _transport) = connection(BoltVersion::V4_4, batched(10));
        let result = run(&conn);
        let _summary = result.summary().unwrap();
        assert!(matches!(result.records(), Err(BoltError::StreamingMisuse(_))));

        let other = run(&conn);
        let _cursor = other.records().unwrap();
        let _second = other.records().unwrap();
        assert!(matches!(other.summary(), Err(BoltError::StreamingMisuse(_))));
    }

    #[tokio::test]
    async fn test_watermarks_pause_and_resume() {
        let config = ConnectionConfig::builder()
            .with_fetch_size(FetchSize::Batch(10))
            .build();
        let (conn, transport) = connection(BoltVersion::V4_4, config);
        let result = run(&conn);
        let mut cursor = result.records().unwrap();
        run_success(&conn);
        records(&conn, 1, 10);
        batch_done(&conn, true);

        // 10 buffered >= high watermark of 7
        assert_eq!(count(&transport, "PULL"), 1);
        for _ in 0..6 {
            cursor.next().await.unwrap().unwrap();
        }
        assert_eq!(count(&transport, "PULL"), 1);
        // 3 left <= low watermark of 3
        cursor.next().await.unwrap().unwrap();
        assert_eq!(count(&transport, "PULL"), 2);
    }

    #[tokio::test]
    async fn test_dropping_slow_cursor_resumes_pulls() {
        let config = ConnectionConfig::builder()
            .with_fetch_size(FetchSize::Batch(10))
            .build();
        let (conn, transport) = connection(BoltVersion::V4_4, config);
        let result = run(&conn);
        let mut fast = result.records().unwrap();
        let slow = result.records().unwrap();
        run_success(&conn);
        records(&conn, 1, 10);
        batch_done(&conn, true);

        for _ in 0..10 {
            fast.next().await.unwrap().unwrap();
        }
        // the slow cursor still holds every record
        assert_eq!(result.buffered(), 10);
        assert_eq!(count(&transport, "PULL"), 1);

        drop(slow);
        assert_eq!(result.buffered(), 0);
        assert_eq!(count(&transport, "PULL"), 2);

        records(&conn, 11, 2);
        batch_done(&conn, false);
        let rest: Vec<_> = (&mut fast).map(|r| r.unwrap()).collect().await;
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn test_fan_out_cursors() {
        let (conn, _transport) = connection(BoltVersion::V4_4, batched(10));
        let result = run(&conn);
        let mut first = result.records().unwrap();
        let mut second = result.records().unwrap();
        run_success(&conn);
        records(&conn, 1, 2);
        batch_done(&conn, false);

        let a: Vec<_> = (&mut first).map(|r| r.unwrap()).collect().await;
        assert_eq!(result.buffered(), 2);
        let b: Vec<_> = (&mut second).map(|r| r.unwrap()).collect().await;
        assert_eq!(a, b);
        assert_eq!(result.buffered(), 0);
    }

    #[tokio::test]
    async fn test_run_failure() {
        let (conn, _transport) = connection(BoltVersion::V4_4, batched(10));
        let result = run(&conn);
        let mut cursor = result.records().unwrap();
        reply(
            &conn,
            BoltResponse::Failure(FailureMessage::new(
                "Neo.ClientError.Statement.SyntaxError",
                "bad",
            )),
        );
        reply(&conn, BoltResponse::Ignored);

        let err = cursor.next().await.unwrap().unwrap_err();
        assert_eq!(err.code(), Some("Neo.ClientError.Statement.SyntaxError"));
        assert!(cursor.next().await.is_none());
        assert!(result.keys().await.is_err());
        assert!(result.summary().unwrap().await.is_err());

        let log = EventLog::default();
        result.subscribe(Box::new(log.clone())).unwrap();
        assert_eq!(log.events().len(), 1);
        assert!(log.events()[0].starts_with("error"));
    }

    #[tokio::test]
    async fn test_undecodable_record_fails_stream() {
        let (conn, transport) = connection(BoltVersion::V4_4, batched(1));
        let result = run(&conn);
        let mut cursor = result.records().unwrap();
        run_success(&conn);
        let bad = PackStreamValue::Structure(PackStreamStructure::new(0x01, vec![]));
        reply(&conn, BoltResponse::Record(RecordMessage::new(vec![bad])));
        batch_done(&conn, true);

        assert!(matches!(cursor.next().await, Some(Err(BoltError::PackStream(_)))));
        assert_eq!(transport.request_names(), vec!["RUN", "PULL", "DISCARD"]);
    }

    #[tokio::test]
    async fn test_bolt3_pulls_everything() {
        let (conn, transport) = connection(BoltVersion::V3, batched(10));
        let result = run(&conn);
        let _cursor = result.records().unwrap();
        assert_eq!(transport.request_names(), vec!["RUN", "PULL_ALL"]);
        drop(result);

        let other = run(&conn);
        drop(other);
        assert_eq!(count(&transport, "DISCARD_ALL"), 1);
    }

    #[tokio::test]
    async fn test_collect() {
        let (conn, _transport) = connection(BoltVersion::V4_4, batched(10));
        let result = conn
            .run("RETURN $x AS x", HashMap::from([("x".to_string(), Value::from(1))]), &TxConfig::new())
            .unwrap();
        run_success(&conn);
        let mut pending = Box::pin(result.collect());
        assert!(futures::poll!(&mut pending).is_pending());
        records(&conn, 1, 1);
        batch_done(&conn, false);
        let records = pending.await.unwrap();
        assert_eq!(records.len(), 1);
        let summary = result.summary().unwrap().await.unwrap();
        assert_eq!(summary.query.text, "RETURN $x AS x");
        assert_eq!(summary.query.parameters.get("x"), Some(&Value::Integer(1)));
    }
}
