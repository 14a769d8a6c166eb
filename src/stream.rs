//! Bounded reads over provider byte streams.
//!
//! Remote objects can be arbitrarily large, so content is pulled chunk by
//! chunk and the stream is dropped as soon as the byte ceiling is reached.
//! Objects whose name ends in `.gz` are inflated on the fly and the ceiling
//! applies to the decompressed bytes.

use std::{fmt, io};

use async_compression::tokio::bufread::GzipDecoder;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use log::debug;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::error::StreamError;

pub const GZIP_SUFFIX: &str = ".gz";

pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

pub fn is_gzip_path(name: &str) -> bool {
    let name = name.as_bytes();
    name.len() >= GZIP_SUFFIX.len()
        && name[name.len() - GZIP_SUFFIX.len()..].eq_ignore_ascii_case(GZIP_SUFFIX.as_bytes())
}

/// Marks errors raised by the transport underneath the gzip decoder so they
/// can be told apart from corrupt compressed data.
#[derive(Debug)]
struct TransportError(io::Error);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

fn gunzip(stream: ByteStream) -> ByteStream {
    let tagged = stream.map_err(|err| io::Error::other(TransportError(err)));
    let decoder = GzipDecoder::new(StreamReader::new(tagged));
    ReaderStream::new(decoder).boxed()
}

fn classify(err: io::Error, compressed: bool) -> StreamError {
    if !compressed {
        return StreamError::Io(err);
    }
    let from_transport = err
        .get_ref()
        .is_some_and(|inner| inner.is::<TransportError>());
    if from_transport {
        StreamError::Io(err)
    } else {
        StreamError::Decompress(err)
    }
}

/// Drains `stream` into a UTF-8 string, stopping after the first chunk that
/// brings the total to `max_size` bytes or more.
///
/// Reaching the ceiling is not an error: whatever was read so far, including
/// the whole of the crossing chunk, is returned.
pub async fn read_bounded(
    stream: ByteStream,
    name: &str,
    max_size: Option<u64>,
) -> Result<String, StreamError> {
    let compressed = is_gzip_path(name);
    let mut chunks = if compressed { gunzip(stream) } else { stream };
    let mut buffer: Vec<u8> = Vec::new();
    let mut truncated = false;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|err| classify(err, compressed))?;
        buffer.extend_from_slice(&chunk);
        if let Some(limit) = max_size {
            if buffer.len() as u64 >= limit {
                debug!(
                    "Byte ceiling of {limit} reached for '{name}' after {} byte(s)",
                    buffer.len()
                );
                truncated = true;
                break;
            }
        }
    }
    drop(chunks);

    decode_utf8(buffer, truncated)
}

/// Decodes the accumulated bytes. A multi-byte sequence that the ceiling cut
/// in half is dropped; any other invalid sequence is fatal.
pub(crate) fn decode_utf8(bytes: Vec<u8>, truncated: bool) -> Result<String, StreamError> {
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let utf8 = err.utf8_error();
            if !truncated || utf8.error_len().is_some() {
                return Err(StreamError::Decode(utf8));
            }
            let mut bytes = err.into_bytes();
            bytes.truncate(utf8.valid_up_to());
            String::from_utf8(bytes).map_err(|err| StreamError::Decode(err.utf8_error()))
        }
    }
}
