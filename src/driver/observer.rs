//! Response Observers
//!
//! 요청마다 하나씩 대기열에 등록되어 서버 응답을 받는 관찰자

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::trace;

use crate::bolt::packstream::PackStreamValue;
use crate::bolt::protocol::{decode_route_success, decode_routing_record};
use crate::bolt::{BoltError, BoltResult, RoutingTable, SuccessMessage};

// ============================================================================
// ResponseObserver - 응답 관찰자
// ============================================================================

/// 하나의 요청에 대한 응답 관찰자
///
/// 연결은 요청을 보낸 순서대로 관찰자를 보관하고, 응답이 도착하면 맨 앞의
/// 관찰자에게 전달한다. RECORD는 같은 관찰자에 여러 번 전달될 수 있으며,
/// SUCCESS 또는 실패는 정확히 한 번 전달된다.
pub trait ResponseObserver: Send {
    /// 로그용 이름
    fn name(&self) -> &'static str;

    /// RECORD 수신. 레코드를 기대하지 않는 요청은 프로토콜 에러
    fn on_record(&mut self, _fields: Vec<PackStreamValue>) -> BoltResult<()> {
        Err(BoltError::protocol(format!(
            "Unexpected RECORD in response to {}",
            self.name()
        )))
    }

    /// SUCCESS 수신 (정규화된 메타데이터)
    fn on_success(self: Box<Self>, metadata: HashMap<String, PackStreamValue>);

    /// FAILURE, IGNORED 또는 연결 에러
    fn on_failure(self: Box<Self>, error: BoltError);
}

// ============================================================================
// Completion - 응답 Future
// ============================================================================

/// 관찰자가 완료되면 준비되는 Future
///
/// 관찰자가 결과를 전달하지 못하고 사라지면 [`BoltError::ConnectionClosed`].
#[derive(Debug)]
#[must_use = "completions do nothing unless awaited"]
pub struct Completion<T> {
    rx: oneshot::Receiver<BoltResult<T>>,
}

impl<T> Completion<T> {
    /// 완료 쌍 생성
    pub fn channel() -> (oneshot::Sender<BoltResult<T>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// 이미 완료된 결과
    pub fn ready(result: BoltResult<T>) -> Self {
        let (tx, completion) = Self::channel();
        let _ = tx.send(result);
        completion
    }

    /// 결과가 도착했으면 꺼내기 (대기하지 않음)
    pub fn try_take(&mut self) -> Option<BoltResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(BoltError::ConnectionClosed)),
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = BoltResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(BoltError::ConnectionClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ============================================================================
// 기본 관찰자
// ============================================================================

/// SUCCESS 메타데이터를 그대로 전달
pub struct SuccessObserver {
    name: &'static str,
    tx: oneshot::Sender<BoltResult<SuccessMessage>>,
}

impl SuccessObserver {
    pub fn new(name: &'static str) -> (Self, Completion<SuccessMessage>) {
        let (tx, completion) = Completion::channel();
        (Self { name, tx }, completion)
    }
}

impl ResponseObserver for SuccessObserver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_success(self: Box<Self>, metadata: HashMap<String, PackStreamValue>) {
        let _ = self.tx.send(Ok(SuccessMessage::new(metadata)));
    }

    fn on_failure(self: Box<Self>, error: BoltError) {
        let _ = self.tx.send(Err(error));
    }
}

/// 결과를 기다리는 쪽이 없는 요청 (파이프라인 중간 요청 등)
pub struct DiscardingObserver {
    name: &'static str,
}

impl DiscardingObserver {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl ResponseObserver for DiscardingObserver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_record(&mut self, _fields: Vec<PackStreamValue>) -> BoltResult<()> {
        Ok(())
    }

    fn on_success(self: Box<Self>, _metadata: HashMap<String, PackStreamValue>) {
        trace!(request = self.name, "response discarded");
    }

    fn on_failure(self: Box<Self>, error: BoltError) {
        trace!(request = self.name, %error, "failure discarded");
    }
}

// ============================================================================
// 라우팅 관찰자
// ============================================================================

/// ROUTE 응답의 `rt` 메타데이터 해석
pub struct RouteObserver {
    tx: oneshot::Sender<BoltResult<RoutingTable>>,
}

impl RouteObserver {
    pub fn new() -> (Self, Completion<RoutingTable>) {
        let (tx, completion) = Completion::channel();
        (Self { tx }, completion)
    }
}

impl ResponseObserver for RouteObserver {
    fn name(&self) -> &'static str {
        "ROUTE"
    }

    fn on_success(self: Box<Self>, metadata: HashMap<String, PackStreamValue>) {
        let table = decode_route_success(&SuccessMessage::new(metadata));
        let _ = self.tx.send(table);
    }

    fn on_failure(self: Box<Self>, error: BoltError) {
        let _ = self.tx.send(Err(error));
    }
}

/// 라우팅 프로시저의 단일 레코드 해석
pub struct RoutingProcedureObserver {
    database: Option<String>,
    record: Option<Vec<PackStreamValue>>,
    tx: oneshot::Sender<BoltResult<RoutingTable>>,
}

impl RoutingProcedureObserver {
    pub fn new(database: Option<String>) -> (Self, Completion<RoutingTable>) {
        let (tx, completion) = Completion::channel();
        (
            Self {
                database,
                record: None,
                tx,
            },
            completion,
        )
    }
}

impl ResponseObserver for RoutingProcedureObserver {
    fn name(&self) -> &'static str {
        "PULL"
    }

    fn on_record(&mut self, fields: Vec<PackStreamValue>) -> BoltResult<()> {
        if self.record.is_none() {
            self.record = Some(fields);
        }
        Ok(())
    }

    fn on_success(self: Box<Self>, _metadata: HashMap<String, PackStreamValue>) {
        let table = match &self.record {
            Some(fields) => decode_routing_record(fields, self.database.as_deref()),
            None => Err(BoltError::protocol("Routing procedure returned no record")),
        };
        let _ = self.tx.send(table);
    }

    fn on_failure(self: Box<Self>, error: BoltError) {
        let _ = self.tx.send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_observer() {
        let (observer, completion) = SuccessObserver::new("BEGIN");
        let mut meta = HashMap::new();
        meta.insert("bookmark".to_string(), "bm:1".into());
        Box::new(observer).on_success(meta);

        let success = completion.await.unwrap();
        assert_eq!(success.bookmark(), Some("bm:1"));
    }

    #[tokio::test]
    async fn test_unexpected_record() {
        let (mut observer, completion) = SuccessObserver::new("COMMIT");
        let err = observer.on_record(vec![]).unwrap_err();
        assert!(matches!(err, BoltError::Protocol(_)));
        Box::new(observer).on_failure(err);
        assert!(matches!(completion.await, Err(BoltError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_dropped_observer_closes_completion() {
        let (observer, completion) = SuccessObserver::new("RESET");
        drop(observer);
        assert!(matches!(completion.await, Err(BoltError::ConnectionClosed)));
    }

    #[test]
    fn test_try_take() {
        let mut completion = Completion::ready(Ok(5));
        assert_eq!(completion.try_take().unwrap().unwrap(), 5);

        let (_tx, mut pending) = Completion::<i32>::channel();
        assert!(pending.try_take().is_none());
    }

    #[tokio::test]
    async fn test_routing_procedure_without_record() {
        let (observer, completion) = RoutingProcedureObserver::new(None);
        Box::new(observer).on_success(HashMap::new());
        assert!(matches!(completion.await, Err(BoltError::Protocol(_))));
    }
}
