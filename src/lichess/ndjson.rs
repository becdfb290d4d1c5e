use futures::stream::{self, LocalBoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use crate::error::{BotError, BotResult};

struct LineBuffer<S> {
    body: Pin<Box<S>>,
    partial: Vec<u8>,
    ready: VecDeque<String>,
    finished: bool,
}

impl<S> LineBuffer<S> {
    fn push(&mut self, chunk: &[u8]) {
        self.partial.extend_from_slice(chunk);
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            self.keep(&line);
        }
    }

    fn flush(&mut self) {
        let rest = std::mem::take(&mut self.partial);
        self.keep(&rest);
    }

    fn keep(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line).trim().to_string();
        if !text.is_empty() {
            self.ready.push_back(text);
        }
    }
}

/// Split a chunked response body into newline-delimited JSON lines.
///
/// Blank keep-alive lines are dropped. A body error is yielded once as a
/// `Transport` error and ends the stream.
pub fn ndjson_lines<S, B, E>(body: S, endpoint: &str) -> LocalBoxStream<'static, BotResult<String>>
where
    S: Stream<Item = Result<B, E>> + 'static,
    B: AsRef<[u8]> + 'static,
    E: fmt::Display + 'static,
{
    let endpoint = endpoint.to_string();
    let buffer = LineBuffer {
        body: Box::pin(body),
        partial: Vec::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold((buffer, endpoint), |(mut buffer, endpoint)| async move {
        loop {
            if let Some(line) = buffer.ready.pop_front() {
                return Some((Ok(line), (buffer, endpoint)));
            }
            if buffer.finished {
                return None;
            }
            match buffer.body.next().await {
                Some(Ok(chunk)) => buffer.push(chunk.as_ref()),
                Some(Err(e)) => {
                    buffer.finished = true;
                    let err = BotError::transport(endpoint.as_str(), e);
                    return Some((Err(err), (buffer, endpoint)));
                }
                None => {
                    buffer.finished = true;
                    buffer.flush();
                }
            }
        }
    })
    .boxed_local()
}
