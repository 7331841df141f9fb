//! Byte transports under a [`Connection`].
//!
//! A transport only accepts framed bytes; responses are fed back through
//! [`Connection::handle_message`] by whoever reads the socket. [`connect`]
//! wires both directions to a tokio stream.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::{debug, info, warn};

use crate::bolt::codec::BoltRequestCodec;
use crate::bolt::handshake::HANDSHAKE_RESPONSE_SIZE;
use crate::bolt::{BoltError, BoltRequest, BoltResponseCodec, BoltResult, HandshakeError};

use super::config::ConnectionConfig;
use super::connection::{Connection, WeakConnection};

/// Sink for framed request bytes.
///
/// `write` must not block; it hands the bytes to whatever performs the I/O.
/// An error from `write` is fatal for the connection.
pub trait Transport: Send {
    fn write(&mut self, bytes: Bytes) -> BoltResult<()>;

    /// Stop accepting writes and release the underlying stream.
    fn close(&mut self);
}

// ============================================================================
// Tokio pump
// ============================================================================

/// Transport feeding the writer task of [`connect`].
struct ChannelTransport {
    tx: Option<mpsc::UnboundedSender<Bytes>>,
}

impl Transport for ChannelTransport {
    fn write(&mut self, bytes: Bytes) -> BoltResult<()> {
        let tx = self.tx.as_ref().ok_or(BoltError::ConnectionClosed)?;
        tx.send(bytes).map_err(|_| BoltError::ConnectionClosed)
    }

    fn close(&mut self) {
        self.tx = None;
    }
}

/// Perform the handshake over `stream` and start the I/O tasks.
///
/// The returned connection still needs [`Connection::initialize`] before it
/// can run queries. Must be called within a tokio runtime.
pub async fn connect<S>(mut stream: S, config: ConnectionConfig) -> BoltResult<Connection>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    stream.write_all(&config.handshake.request()).await?;
    stream.flush().await?;

    let mut response = [0u8; HANDSHAKE_RESPONSE_SIZE];
    stream.read_exact(&mut response).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            BoltError::Handshake(HandshakeError::ConnectionClosed)
        } else {
            e.into()
        }
    })?;
    let version = config.handshake.parse_response(response)?;
    info!(%version, "negotiated protocol version");

    let max_message_size = config.max_message_size;
    let (tx, rx) = mpsc::unbounded_channel();
    let conn = Connection::new(Box::new(ChannelTransport { tx: Some(tx) }), version, config);

    let (reader, writer) = tokio::io::split(stream);
    tokio::spawn(write_loop(writer, rx, conn.downgrade()));
    tokio::spawn(read_loop(
        FramedRead::new(reader, BoltResponseCodec::with_max_size(max_message_size)),
        conn.downgrade(),
    ));

    Ok(conn)
}

async fn write_loop<W>(mut writer: W, rx: mpsc::UnboundedReceiver<Bytes>, conn: WeakConnection)
where
    W: AsyncWrite + Unpin,
{
    let mut outgoing = UnboundedReceiverStream::new(rx);
    while let Some(bytes) = outgoing.next().await {
        let result = match writer.write_all(&bytes).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(error = %e, "write failed");
            if let Some(conn) = conn.upgrade() {
                conn.handle_fatal(e.into());
            }
            return;
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "shutdown failed");
    }
    debug!("writer finished");
}

async fn read_loop<R>(mut frames: FramedRead<R, BoltResponseCodec>, conn: WeakConnection)
where
    R: AsyncRead + Unpin,
{
    loop {
        let item = frames.next().await;
        let Some(conn) = conn.upgrade() else {
            return;
        };
        match item {
            Some(Ok(structure)) => conn.handle_message(structure),
            Some(Err(error)) => {
                warn!(%error, "read failed");
                conn.handle_fatal(error);
                return;
            }
            None => {
                conn.handle_fatal(BoltError::ConnectionClosed);
                debug!("reader finished");
                return;
            }
        }
    }
}

// ============================================================================
// RecordingTransport
// ============================================================================

#[derive(Debug, Default)]
struct Recording {
    bytes: BytesMut,
    writes: usize,
    fail_writes: bool,
    closed: bool,
}

/// In-memory transport that keeps everything written to it.
///
/// Clones share the same recording, so a test can keep one handle while the
/// connection owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail with an I/O error.
    pub fn fail_writes(&self) {
        self.inner.lock().fail_writes = true;
    }

    /// Number of `write` calls that reached the transport.
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Decode every request written so far.
    pub fn requests(&self) -> BoltResult<Vec<BoltRequest>> {
        let mut bytes = self.inner.lock().bytes.clone();
        let mut codec = BoltRequestCodec::new();
        let mut out = Vec::new();
        while let Some(request) = codec.decode(&mut bytes)? {
            out.push(request);
        }
        Ok(out)
    }

    /// Names of the requests written so far, in order.
    pub fn request_names(&self) -> Vec<&'static str> {
        self.requests()
            .map(|reqs| reqs.iter().map(BoltRequest::name).collect())
            .unwrap_or_default()
    }
}

impl Transport for RecordingTransport {
    fn write(&mut self, bytes: Bytes) -> BoltResult<()> {
        let mut rec = self.inner.lock();
        if rec.closed {
            return Err(BoltError::ConnectionClosed);
        }
        if rec.fail_writes {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "recording closed").into());
        }
        rec.writes += 1;
        rec.bytes.extend_from_slice(&bytes);
        Ok(())
    }

    fn close(&mut self) {
        self.inner.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::handshake::{negotiate, HANDSHAKE_SIZE};
    use crate::bolt::message::{BoltResponse, RecordMessage, SuccessMessage};
    use crate::bolt::{AuthToken, BoltVersion, TxConfig};
    use crate::driver::connection::ConnectionState;
    use crate::driver::value::Value;
    use crate::temporal::{Date, DateTime, DateTimeZone, Duration, LocalDateTime, LocalTime, Time};
    use futures::SinkExt;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;
    use tokio::io::DuplexStream;
    use tokio_util::codec::Framed;

    async fn accept(mut server: DuplexStream, supported: &[BoltVersion]) -> Framed<DuplexStream, BoltRequestCodec> {
        let mut request = [0u8; HANDSHAKE_SIZE];
        server.read_exact(&mut request).await.unwrap();
        let version = negotiate(&request, supported).unwrap();
        server.write_all(&version.to_bytes()).await.unwrap();
        Framed::new(server, BoltRequestCodec::new())
    }

    #[test]
    fn test_recording_transport() {
        let transport = RecordingTransport::new();
        let mut writer = transport.clone();

        let mut buf = BytesMut::new();
        tokio_util::codec::Encoder::encode(&mut BoltResponseCodec::new(), BoltRequest::Reset, &mut buf)
            .unwrap();
        writer.write(buf.freeze()).unwrap();

        assert_eq!(transport.write_count(), 1);
        assert_eq!(transport.request_names(), vec!["RESET"]);

        transport.fail_writes();
        assert!(writer.write(Bytes::from_static(&[0, 0])).is_err());
        writer.close();
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn test_connect_and_hello() {
        let (client, server) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move {
            let mut framed = accept(server, &[BoltVersion::V4_4]).await;
            let hello = framed.next().await.unwrap().unwrap();
            assert_eq!(hello.name(), "HELLO");
            framed
                .send(BoltResponse::Success(
                    SuccessMessage::default()
                        .with("server", "Neo4j/4.4.0")
                        .with("connection_id", "bolt-7"),
                ))
                .await
                .unwrap();
            let goodbye = framed.next().await.unwrap().unwrap();
            assert_eq!(goodbye.name(), "GOODBYE");
        });

        let config = ConnectionConfig::builder()
            .with_auth(AuthToken::basic("neo4j", "pass"))
            .build();
        let conn = connect(client, config).await.unwrap();
        assert_eq!(conn.version(), BoltVersion::V4_4);
        assert_eq!(conn.state(), ConnectionState::Connecting);

        let hello = conn.initialize().unwrap().await.unwrap();
        assert_eq!(hello.server(), Some("Neo4j/4.4.0"));
        assert_eq!(conn.state(), ConnectionState::Ready);
        assert_eq!(conn.server_agent().as_deref(), Some("Neo4j/4.4.0"));

        conn.goodbye();
        assert_eq!(conn.state(), ConnectionState::Closed);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_rejected() {
        let (client, mut server) = tokio::io::duplex(1024);
        tokio::spawn(async move {
            let mut request = [0u8; HANDSHAKE_SIZE];
            server.read_exact(&mut request).await.unwrap();
            server.write_all(&[0, 0, 0, 0]).await.unwrap();
        });

        let err = connect(client, ConnectionConfig::default()).await.unwrap_err();
        assert!(matches!(
            err,
            BoltError::Handshake(HandshakeError::NoCompatibleVersion)
        ));
    }

    #[tokio::test]
    async fn test_server_hangup_fails_pending() {
        let (client, server) = tokio::io::duplex(1024);
        let server = tokio::spawn(async move {
            let mut framed = accept(server, &[BoltVersion::V5_0]).await;
            let _ = framed.next().await;
            drop(framed);
        });

        let conn = connect(client, ConnectionConfig::default()).await.unwrap();
        let hello = conn.initialize().unwrap();
        server.await.unwrap();

        assert!(matches!(hello.await, Err(BoltError::ConnectionClosed)));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    fn random_temporal(rng: &mut StdRng) -> Value {
        let (h, m, sec) = (rng.gen_range(0..24), rng.gen_range(0..60), rng.gen_range(0..60));
        let nanos = rng.gen_range(0..1_000_000_000i64);
        let date = Date::from_epoch_day(rng.gen_range(-700_000i64..700_000)).unwrap();
        match rng.gen_range(0..6) {
            0 => Duration::new(
                rng.gen_range(-1000i64..1000),
                rng.gen_range(-1000i64..1000),
                rng.gen_range(-100_000i64..100_000),
                nanos,
            )
            .unwrap()
            .into(),
            1 => LocalTime::new(h, m, sec, nanos).unwrap().into(),
            2 => Time::new(h, m, sec, nanos, rng.gen_range(-64_800i64..=64_800)).unwrap().into(),
            3 => date.into(),
            4 => LocalDateTime::new(date.year(), date.month(), date.day(), h, m, sec, nanos)
                .unwrap()
                .into(),
            _ => DateTime::new(
                date.year(),
                date.month(),
                date.day(),
                h,
                m,
                sec,
                nanos,
                DateTimeZone::Offset(rng.gen_range(-50_400..=50_400)),
            )
            .unwrap()
            .into(),
        }
    }

    #[tokio::test]
    async fn test_temporal_arrays_survive_live_exchange() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let server = tokio::spawn(async move {
            let mut framed = accept(server, &[BoltVersion::V5_0]).await;
            let _hello = framed.next().await.unwrap().unwrap();
            framed.send(BoltResponse::Success(SuccessMessage::default())).await.unwrap();
            loop {
                let Some(Ok(BoltRequest::Run(run))) = framed.next().await else {
                    return;
                };
                let values = run.parameters.get("values").cloned().unwrap();
                let pull = framed.next().await.unwrap().unwrap();
                assert_eq!(pull.name(), "PULL");
                framed
                    .send(BoltResponse::Success(
                        SuccessMessage::default().with("fields", vec!["values".to_string()]),
                    ))
                    .await
                    .unwrap();
                framed.send(BoltResponse::Record(RecordMessage::new(vec![values]))).await.unwrap();
                framed.send(BoltResponse::Success(SuccessMessage::default())).await.unwrap();
            }
        });

        let conn = connect(client, ConnectionConfig::default()).await.unwrap();
        conn.initialize().unwrap().await.unwrap();

        let mut rng = StdRng::seed_from_u64(0x5EED_0003);
        for _ in 0..5 {
            let len = rng.gen_range(20..=1000);
            let sent: Vec<Value> = (0..len).map(|_| random_temporal(&mut rng)).collect();
            let params = HashMap::from([("values".to_string(), Value::List(sent.clone()))]);
            let result = conn.run("RETURN $values AS values", params, &TxConfig::new()).unwrap();
            let records = result.collect().await.unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].get("values"), Some(&Value::List(sent)));
        }

        conn.goodbye();
        server.await.unwrap();
    }
}
