//! Request body normalization.
//!
//! Every outbound body is reduced to the triple the executor needs: what to
//! transmit, how many bytes, and the value of `x-amz-content-sha256`.
//!
//! | source            | length                     | payload hash                 |
//! |-------------------|----------------------------|------------------------------|
//! | `Empty`           | 0                          | SHA-256 of the empty string  |
//! | `Bytes`           | buffer length              | SHA-256 of the buffer        |
//! | `Seekable`        | bytes left from position   | `UNSIGNED-PAYLOAD` (or hash) |
//! | `Reader`          | bytes read to the end      | SHA-256 of what was read     |
//!
//! Seekable sources are never consumed by normalization: length and digest
//! passes seek back to the position the stream had on entry.

use crate::error::{S3Error, TransferError};
use crate::signing::{sha256_hex, EMPTY_SHA256, UNSIGNED_PAYLOAD};
use crate::transport::ByteStream;
use base64::Engine;
use bytes::Bytes;
use futures::Stream;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::SeekFrom;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, ReadBuf, Take};

/// Chunk size for length and digest passes over a stream.
pub const DIGEST_CHUNK_SIZE: usize = 1024 * 1024;

/// Chunk size used when a stream is sent on the wire.
pub const TRANSMIT_CHUNK_SIZE: usize = 64 * 1024;

/// A readable, seekable body source.
pub trait SeekableStream: AsyncRead + AsyncSeek + Send + Sync + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Sync + Unpin> SeekableStream for T {}

/// Outbound request body.
pub enum RequestBody {
    /// No body.
    Empty,
    /// In-memory content.
    Bytes(Bytes),
    /// Stream with a size known without reading it.
    Seekable(Box<dyn SeekableStream>),
    /// Readable source of unknown size; buffered in full before sending.
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl RequestBody {
    /// Body read from a seekable stream.
    pub fn seekable<S: SeekableStream + 'static>(stream: S) -> Self {
        RequestBody::Seekable(Box::new(stream))
    }

    /// Body read from a source of unknown size.
    pub fn reader<R: AsyncRead + Send + Unpin + 'static>(reader: R) -> Self {
        RequestBody::Reader(Box::new(reader))
    }

    /// Body streamed from a file.
    pub async fn file(path: impl AsRef<Path>) -> Result<Self, S3Error> {
        let file = tokio::fs::File::open(path).await?;
        Ok(RequestBody::seekable(file))
    }

    /// Normalize the body for transmission.
    ///
    /// With `sign_stream_payloads` a seekable source is hashed in a
    /// separate pass instead of being sent as `UNSIGNED-PAYLOAD`.
    pub async fn normalize(self, sign_stream_payloads: bool) -> Result<NormalizedBody, S3Error> {
        match self {
            RequestBody::Empty => Ok(NormalizedBody::empty()),
            RequestBody::Bytes(bytes) => Ok(NormalizedBody::buffered(bytes)),
            RequestBody::Seekable(mut stream) => {
                let info = inspect_stream(&mut stream, sign_stream_payloads).await?;
                Ok(NormalizedBody {
                    content: BodyContent::Streamed(stream),
                    length: info.length,
                    payload_hash: info.payload_hash,
                })
            }
            RequestBody::Reader(mut reader) => {
                let mut buffer = Vec::new();
                reader
                    .read_to_end(&mut buffer)
                    .await
                    .map_err(TransferError::from)?;
                Ok(NormalizedBody::buffered(Bytes::from(buffer)))
            }
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Empty
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            RequestBody::Seekable(_) => f.write_str("Seekable(..)"),
            RequestBody::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for RequestBody {
    fn from(bytes: &'static [u8]) -> Self {
        RequestBody::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Bytes(Bytes::from(text))
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        RequestBody::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

/// Transmissible form of a body.
pub enum BodyContent {
    /// Nothing to send.
    Empty,
    /// Send this buffer.
    Buffered(Bytes),
    /// Stream this many bytes from the source, starting at its current
    /// position.
    Streamed(Box<dyn SeekableStream>),
}

/// A body ready to be signed and sent.
pub struct NormalizedBody {
    /// What to transmit.
    pub content: BodyContent,
    /// Number of bytes that will be sent.
    pub length: u64,
    /// Hex SHA-256 of the content, or `UNSIGNED-PAYLOAD`.
    pub payload_hash: String,
}

impl NormalizedBody {
    /// The absent body.
    pub fn empty() -> Self {
        Self {
            content: BodyContent::Empty,
            length: 0,
            payload_hash: EMPTY_SHA256.to_string(),
        }
    }

    /// An in-memory body.
    pub fn buffered(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        Self {
            length: bytes.len() as u64,
            payload_hash: sha256_hex(&bytes),
            content: BodyContent::Buffered(bytes),
        }
    }

    /// Whether the payload hash is the unsigned sentinel.
    pub fn is_unsigned(&self) -> bool {
        self.payload_hash == UNSIGNED_PAYLOAD
    }

    /// Base64 MD5 of buffered content, for `Content-MD5`.
    pub fn content_md5(&self) -> Option<String> {
        match &self.content {
            BodyContent::Buffered(bytes) => Some(content_md5(bytes)),
            _ => None,
        }
    }
}

impl fmt::Debug for NormalizedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.content {
            BodyContent::Empty => "empty",
            BodyContent::Buffered(_) => "buffered",
            BodyContent::Streamed(_) => "streamed",
        };
        f.debug_struct("NormalizedBody")
            .field("content", &kind)
            .field("length", &self.length)
            .field("payload_hash", &self.payload_hash)
            .finish()
    }
}

/// Base64 MD5 of `data`, the value of a `Content-MD5` header.
pub fn content_md5(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(Md5::digest(data))
}

/// Length and payload hash of a stream, measured from its current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Bytes remaining.
    pub length: u64,
    /// Hex digest of the remaining bytes, or `UNSIGNED-PAYLOAD`.
    pub payload_hash: String,
}

/// Measure a stream without consuming it.
///
/// The stream is left at the position it had on entry, so calling this
/// repeatedly yields the same answer.
pub async fn inspect_stream<S>(stream: &mut S, digest: bool) -> Result<StreamInfo, S3Error>
where
    S: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    let start = stream.seek(SeekFrom::Current(0)).await?;
    let measured = measure_from(stream, start, digest).await;
    let restored = stream.seek(SeekFrom::Start(start)).await;
    let info = measured?;
    restored?;
    Ok(info)
}

/// Length and digest pass from `start`; leaves the position wherever it stopped.
async fn measure_from<S>(stream: &mut S, start: u64, digest: bool) -> Result<StreamInfo, S3Error>
where
    S: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    let end = stream.seek(SeekFrom::End(0)).await?;
    let length = end.saturating_sub(start);

    if !digest {
        return Ok(StreamInfo {
            length,
            payload_hash: UNSIGNED_PAYLOAD.to_string(),
        });
    }

    stream.seek(SeekFrom::Start(start)).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; DIGEST_CHUNK_SIZE];
    let mut remaining = length;
    while remaining > 0 {
        let want = remaining.min(DIGEST_CHUNK_SIZE as u64) as usize;
        let read = stream.read(&mut buffer[..want]).await?;
        if read == 0 {
            return Err(S3Error::Transfer(TransferError::StreamInterrupted {
                bytes_transferred: length - remaining,
                message: "stream ended before its measured length".to_string(),
            }));
        }
        hasher.update(&buffer[..read]);
        remaining -= read as u64;
    }

    Ok(StreamInfo {
        length,
        payload_hash: hex::encode(hasher.finalize()),
    })
}

/// Turn a seekable source into a wire stream of exactly `length` bytes.
pub fn into_byte_stream(stream: Box<dyn SeekableStream>, length: u64) -> ByteStream {
    Box::new(ChunkStream {
        reader: stream.take(length),
        buffer: vec![0u8; TRANSMIT_CHUNK_SIZE],
        done: false,
    })
}

struct ChunkStream {
    reader: Take<Box<dyn SeekableStream>>,
    buffer: Vec<u8>,
    done: bool,
}

impl Stream for ChunkStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let mut buf = ReadBuf::new(&mut this.buffer);
        match Pin::new(&mut this.reader).poll_read(cx, &mut buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(Ok(())) if buf.filled().is_empty() => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Ready(Ok(())) => Poll::Ready(Some(Ok(Bytes::copy_from_slice(buf.filled())))),
        }
    }
}
