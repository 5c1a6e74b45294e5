//! Incremental decoding of streamed chat replies.
//!
//! Bytes flow one way: [`decoder`] turns chunks into text, [`framer`] cuts the
//! text into records, [`record`] pulls a fragment out of each record, and
//! [`Snapshots`] appends fragments and hands the cumulative text to the caller.

pub mod decoder;
pub mod framer;
pub mod record;

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;
use std::time::Duration;

use self::decoder::Utf8Decoder;
use self::framer::LineFramer;
use self::record::{Framing, Interpreted, Leniency};
use super::{ApiError, ChatReply};

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Reading,
    Draining,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOptions {
    pub framing: Framing,
    pub leniency: Leniency,
}

/// Cumulative text after a record contributed something.
///
/// `text` replaces whatever the caller displayed before; `fragment` is the
/// piece that was just appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub fragment: String,
}

/// Single-pass iterator of cumulative-text snapshots read from `R`.
///
/// Transport closure ends the stream. An unterminated trailing record is
/// discarded, never parsed.
pub struct Snapshots<R> {
    reader: R,
    options: StreamOptions,
    decoder: Utf8Decoder,
    framer: LineFramer,
    records: VecDeque<String>,
    text: String,
    model: Option<String>,
    done_hint: bool,
    state: StreamState,
    failure: Option<ApiError>,
    buf: Vec<u8>,
}

impl<R: Read> Snapshots<R> {
    pub fn new(reader: R, options: StreamOptions) -> Self {
        Self {
            reader,
            options,
            decoder: Utf8Decoder::new(),
            framer: LineFramer::new(),
            records: VecDeque::new(),
            text: String::new(),
            model: None,
            done_hint: false,
            state: StreamState::Idle,
            failure: None,
            buf: vec![0; READ_CHUNK],
        }
    }

    /// Model id to report in the final [`ChatReply`].
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Whether any record carried `"done": true` (or SSE `[DONE]`).
    pub fn done_hint(&self) -> bool {
        self.done_hint
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Drain the remaining snapshots and return the final reply.
    ///
    /// A stream that already failed keeps failing, even if the caller saw
    /// the error from the iterator first.
    pub fn finish(mut self) -> Result<ChatReply, ApiError> {
        for snapshot in self.by_ref() {
            snapshot?;
        }

        if let Some(err) = self.failure.take() {
            return Err(err);
        }

        Ok(ChatReply {
            text: self.text,
            model: self.model,
            processing_time: Duration::ZERO,
        })
    }

    fn feed(&mut self, text: &str) {
        self.records.extend(self.framer.push(text));
    }

    fn drain(&mut self) {
        self.state = StreamState::Draining;

        let tail = self.decoder.decode(&[], false);
        self.feed(&tail);

        if let Some(residual) = std::mem::take(&mut self.framer).into_residual() {
            log::debug!(
                "Discarding unterminated trailing record ({} bytes)",
                residual.len()
            );
            log::trace!("Discarded record: {residual}");
        }

        self.state = StreamState::Done;
        log::debug!(
            "Stream finished: {} chars, done hint: {}",
            self.text.len(),
            self.done_hint
        );
    }

    fn fail(&mut self, err: ApiError) -> Option<Result<Snapshot, ApiError>> {
        log::debug!("Stream failed: {err}");
        self.state = StreamState::Failed;
        self.records.clear();
        self.failure = err.replay();
        Some(Err(err))
    }
}

impl<R: Read> Iterator for Snapshots<R> {
    type Item = Result<Snapshot, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(line) = self.records.pop_front() {
                match record::interpret(&line, self.options.framing, self.options.leniency) {
                    Ok(Interpreted { fragment, done }) => {
                        self.done_hint |= done;
                        if fragment.is_empty() {
                            continue;
                        }
                        self.text.push_str(&fragment);
                        return Some(Ok(Snapshot {
                            text: self.text.clone(),
                            fragment,
                        }));
                    }
                    Err(bad) => {
                        let err = ApiError::MalformedRecord {
                            record: bad.record,
                            partial: self.text.clone(),
                        };
                        return self.fail(err);
                    }
                }
            }

            match self.state {
                StreamState::Idle | StreamState::Reading => {
                    self.state = StreamState::Reading;
                    match self.reader.read(&mut self.buf) {
                        Ok(0) => self.drain(),
                        Ok(n) => {
                            let text = self.decoder.decode(&self.buf[..n], true);
                            self.feed(&text);
                        }
                        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                        Err(source) => {
                            let err = ApiError::Interrupted {
                                partial: self.text.clone(),
                                source,
                            };
                            return self.fail(err);
                        }
                    }
                }
                // drain() always leaves Draining for Done before returning
                StreamState::Draining | StreamState::Done | StreamState::Failed => return None,
            }
        }
    }
}

impl<R: Read> FusedIterator for Snapshots<R> {}
