// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Stream capture.

use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 8192;

/// Everything read from one stream so far.
#[derive(Clone, Debug, Default)]
pub struct CaptureBuffer {
    bytes: Vec<u8>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the whole stream. Invalid UTF-8 is replaced, not rejected.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// Read `reader` until EOF, passing each raw chunk to `observe` as it
/// arrives. Chunks are not decoded, so a multi-byte character may be split
/// across two calls.
///
/// A missing reader (stream not piped) yields an empty capture.
pub async fn capture<R, F>(reader: Option<R>, mut observe: F) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
    F: FnMut(&[u8]),
{
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };

    let mut buffer = CaptureBuffer::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.push(&chunk[..n]);
        observe(&chunk[..n]);
    }
    Ok(buffer.into_string())
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
