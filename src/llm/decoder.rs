// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Incremental Server-Sent-Events decoding
//!
//! Response bodies arrive in chunks that are not aligned to protocol lines:
//! a chunk may end mid-line, mid-JSON, or even in the middle of a multi-byte
//! UTF-8 character. [`StreamDecoder`] buffers the incomplete tail, yields
//! every complete `data: ` line as a parsed event, and stops for good at the
//! `data: [DONE]` sentinel or at the first payload that fails to parse.

use std::marker::PhantomData;

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ParleyError, Result};

/// Prefix carried by every event line
pub const DATA_PREFIX: &str = "data: ";

/// Line that marks the normal end of a stream
pub const DONE_SENTINEL: &str = "data: [DONE]";

/// Splits arbitrary byte chunks into complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every line it completes.
    ///
    /// Lines are returned without their `\n` (or `\r\n`) terminator. The
    /// trailing fragment stays buffered until a later chunk completes it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let mut line = &self.buffer[start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Bytes of the incomplete line still waiting for its terminator
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// What a single complete line turned out to be
#[derive(Debug)]
pub enum DecodedLine<E> {
    /// Not an event line (blank, `event:`, comment); ignored
    Skip,
    /// The `[DONE]` sentinel
    Done,
    /// A parsed payload, or the error explaining why it could not be parsed
    Event(Result<E>),
}

/// Stateful decoder from byte chunks to typed events
#[derive(Debug)]
pub struct StreamDecoder<E> {
    lines: LineBuffer,
    finished: bool,
    _event: PhantomData<fn() -> E>,
}

impl<E> Default for StreamDecoder<E> {
    fn default() -> Self {
        Self {
            lines: LineBuffer::new(),
            finished: false,
            _event: PhantomData,
        }
    }
}

impl<E: DeserializeOwned> StreamDecoder<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the sentinel or a fatal decode error has been seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed a chunk and return the events of every line it completes, in order.
    ///
    /// A decode error is always the last item returned: the decoder finishes
    /// and ignores all further input.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<E>> {
        if self.finished {
            return Vec::new();
        }

        let mut events = Vec::new();
        for line in self.lines.push(chunk) {
            match Self::decode_line(&line) {
                DecodedLine::Skip => continue,
                DecodedLine::Done => {
                    self.finish();
                    break;
                }
                DecodedLine::Event(event) => {
                    let failed = event.is_err();
                    events.push(event);
                    if failed {
                        self.finish();
                        break;
                    }
                }
            }
        }

        events
    }

    /// Signal end of input. An unterminated trailing fragment is dropped.
    pub fn finish(&mut self) {
        if !self.finished && !self.lines.pending().is_empty() {
            tracing::debug!(
                target: "parley.decoder",
                pending_bytes = self.lines.pending().len(),
                "discarding unterminated trailing line"
            );
        }
        self.finished = true;
        self.lines.clear();
    }

    /// Classify and parse one complete line
    pub fn decode_line(line: &str) -> DecodedLine<E> {
        if line == DONE_SENTINEL {
            return DecodedLine::Done;
        }
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return DecodedLine::Skip;
        };

        DecodedLine::Event(serde_json::from_str(payload).map_err(|e| {
            ParleyError::Api(ApiError::Decode {
                line: line.to_string(),
                message: e.to_string(),
            })
        }))
    }
}

/// Decode a streamed response body lazily.
///
/// Transport errors end the stream with [`ApiError::StreamError`]; a body
/// that closes without producing a single byte yields [`ApiError::MissingBody`].
pub fn decode_stream<E, S, B, X>(body: S) -> impl Stream<Item = Result<E>>
where
    E: DeserializeOwned,
    S: Stream<Item = std::result::Result<B, X>>,
    B: AsRef<[u8]>,
    X: std::fmt::Display,
{
    async_stream::stream! {
        let mut body = Box::pin(body);
        let mut decoder = StreamDecoder::<E>::new();
        let mut received_bytes = false;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(ParleyError::Api(ApiError::StreamError(e.to_string())));
                    return;
                }
            };
            let bytes = chunk.as_ref();
            received_bytes |= !bytes.is_empty();

            for event in decoder.feed(bytes) {
                yield event;
            }
            if decoder.is_finished() {
                return;
            }
        }

        if !received_bytes {
            yield Err(ParleyError::Api(ApiError::MissingBody));
            return;
        }
        decoder.finish();
    }
}
