//! Bolt protocol codec for tokio_util.
//!
//! Messages are split into chunks with a 2-byte big-endian length prefix and
//! terminated by an empty chunk. An empty message (a lone terminator) is a
//! NOOP keep-alive and is skipped.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::message::{BoltRequest, BoltResponse};
use super::packstream::{decode, PackStreamEncoder, PackStreamStructure, PackStreamValue};
use super::BoltError;

/// Maximum chunk size (16KB)
pub const MAX_CHUNK_SIZE: usize = 16384;

/// Default maximum size of one reassembled message (16MB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// End of message marker (0x00 0x00)
pub const END_MARKER: [u8; 2] = [0x00, 0x00];

/// Chunked framing over PackStream values.
#[derive(Debug)]
pub struct BoltCodec {
    max_message_size: usize,
    /// Chunks of the message being reassembled
    message_buffer: BytesMut,
}

impl BoltCodec {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a codec with custom max message size.
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            message_buffer: BytesMut::with_capacity(4096),
        }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Frame one packed message into `dst`.
    pub fn write_chunked(data: &[u8], dst: &mut BytesMut) {
        dst.reserve(data.len() + 2 * (data.len() / MAX_CHUNK_SIZE + 2));
        for chunk in data.chunks(MAX_CHUNK_SIZE) {
            dst.put_u16(chunk.len() as u16);
            dst.put_slice(chunk);
        }
        dst.put_slice(&END_MARKER);
    }

    fn encode_structure(
        &mut self,
        structure: PackStreamStructure,
        dst: &mut BytesMut,
    ) -> Result<(), BoltError> {
        let mut encoder = PackStreamEncoder::with_capacity(128);
        encoder.encode_structure(&structure)?;
        Self::write_chunked(encoder.as_bytes(), dst);
        Ok(())
    }

    fn decode_structure(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<PackStreamStructure>, BoltError> {
        match self.decode(src)? {
            Some(PackStreamValue::Structure(s)) => Ok(Some(s)),
            Some(other) => Err(BoltError::codec(format!(
                "Expected a message structure, got {}",
                other.type_name()
            ))),
            None => Ok(None),
        }
    }
}

impl Default for BoltCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BoltCodec {
    type Item = PackStreamValue;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.len() < 2 {
                return Ok(None);
            }

            let chunk_size = u16::from_be_bytes([src[0], src[1]]) as usize;

            if chunk_size == 0 {
                src.advance(2);
                if self.message_buffer.is_empty() {
                    continue;
                }
                let message_data = self.message_buffer.split();
                return Ok(Some(decode(&message_data)?));
            }

            if src.len() < 2 + chunk_size {
                src.reserve(2 + chunk_size - src.len());
                return Ok(None);
            }

            let size = self.message_buffer.len() + chunk_size;
            if size > self.max_message_size {
                return Err(BoltError::MessageTooLarge {
                    size,
                    max: self.max_message_size,
                });
            }

            src.advance(2);
            self.message_buffer.extend_from_slice(&src[..chunk_size]);
            src.advance(chunk_size);
        }
    }
}

impl Encoder<PackStreamValue> for BoltCodec {
    type Error = BoltError;

    fn encode(&mut self, item: PackStreamValue, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut encoder = PackStreamEncoder::new();
        encoder.encode(&item)?;
        Self::write_chunked(encoder.as_bytes(), dst);
        Ok(())
    }
}

/// Server-side codec: reads requests, writes responses.
///
/// Used by in-process test servers.
#[derive(Debug, Default)]
pub struct BoltRequestCodec {
    inner: BoltCodec,
}

impl BoltRequestCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for BoltRequestCodec {
    type Item = BoltRequest;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode_structure(src)? {
            Some(structure) => Ok(Some(BoltRequest::from_structure(&structure)?)),
            None => Ok(None),
        }
    }
}

impl Encoder<BoltResponse> for BoltRequestCodec {
    type Error = BoltError;

    fn encode(&mut self, item: BoltResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner.encode_structure(item.to_structure(), dst)
    }
}

/// Client-side codec: writes requests, reads raw response structures.
///
/// Responses are left as structures so that a malformed one can be reported
/// to the observer waiting for it instead of tearing down the connection.
#[derive(Debug, Default)]
pub struct BoltResponseCodec {
    inner: BoltCodec,
}

impl BoltResponseCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(max_message_size: usize) -> Self {
        Self {
            inner: BoltCodec::with_max_size(max_message_size),
        }
    }
}

impl Decoder for BoltResponseCodec {
    type Item = PackStreamStructure;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.inner.decode_structure(src)
    }
}

impl Encoder<BoltRequest> for BoltResponseCodec {
    type Error = BoltError;

    fn encode(&mut self, item: BoltRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner.encode_structure(item.to_structure(), dst)
    }
}
