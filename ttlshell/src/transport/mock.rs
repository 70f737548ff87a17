//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::Transport;
use crate::error::{Result, TransportError};

type Responder = Box<dyn FnMut(&str) -> Option<String> + Send>;

struct MockState {
    open: bool,
    pending: VecDeque<(Instant, Vec<u8>)>,
    responder: Option<Responder>,
    reply_delay: Duration,
    writes: Vec<(Instant, String)>,
    io_calls: usize,
    clears: usize,
}

/// Transport whose remote side is a closure.
///
/// Every write is recorded with its timestamp and handed to the responder;
/// the returned text becomes readable after `reply_delay`. Clones share
/// state so a test can keep a handle after moving one into a shell.
#[derive(Clone)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// An open transport that never replies.
    pub fn silent() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                open: true,
                pending: VecDeque::new(),
                responder: None,
                reply_delay: Duration::ZERO,
                writes: Vec::new(),
                io_calls: 0,
                clears: 0,
            })),
        }
    }

    /// An open transport that answers writes through `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: FnMut(&str) -> Option<String> + Send + 'static,
    {
        let mock = Self::silent();
        mock.state().responder = Some(Box::new(responder));
        mock
    }

    /// A transport that echoes each written line, prints `output` for
    /// `command` and then a shell prompt. Other lines just get a prompt.
    pub fn echoing(command: &str, output: &str, prompt: &str) -> Self {
        let command_line = format!("{command}\n");
        let reply = format!("{command}\r\n{output}\r\n{prompt}");
        let prompt = prompt.to_string();
        Self::new(move |written| {
            if written == command_line {
                Some(reply.clone())
            } else {
                Some(format!("{}\r\n{}", written.trim_end(), prompt))
            }
        })
    }

    /// Delay every reply by `delay`.
    pub fn with_reply_delay(self, delay: Duration) -> Self {
        self.state().reply_delay = delay;
        self
    }

    /// Make `text` readable immediately, as if the board printed it unprompted.
    pub fn push_output(&self, text: &str) {
        self.state()
            .pending
            .push_back((Instant::now(), text.as_bytes().to_vec()));
    }

    /// Raw bytes version of [`push_output`](Self::push_output).
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.state().pending.push_back((Instant::now(), bytes.to_vec()));
    }

    /// Everything written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.state().writes.iter().map(|(_, w)| w.clone()).collect()
    }

    /// Writes with the instant each one happened.
    pub fn timed_writes(&self) -> Vec<(Instant, String)> {
        self.state().writes.clone()
    }

    /// How many times exactly `text` was written.
    pub fn count_writes(&self, text: &str) -> usize {
        self.state().writes.iter().filter(|(_, w)| w == text).count()
    }

    /// Number of read/write/clear calls made against the transport.
    pub fn io_calls(&self) -> usize {
        self.state().io_calls
    }

    /// Number of `clear_input` calls.
    pub fn clears(&self) -> usize {
        self.state().clears
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl Transport for MockTransport {
    async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        let mut state = self.state();
        state.io_calls += 1;

        let now = Instant::now();
        match state.pending.front() {
            Some((ready_at, _)) if *ready_at <= now => {
                Ok(state.pending.pop_front().map(|(_, data)| data).unwrap_or_default())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        state.io_calls += 1;
        if !state.open {
            return Err(TransportError::NotOpen.into());
        }

        let now = Instant::now();
        let text = String::from_utf8_lossy(data).to_string();
        state.writes.push((now, text.clone()));

        let reply = state.responder.as_mut().and_then(|r| r(&text));
        if let Some(reply) = reply {
            let ready_at = now + state.reply_delay;
            state.pending.push_back((ready_at, reply.into_bytes()));
        }
        Ok(())
    }

    async fn clear_input(&mut self) -> Result<()> {
        let mut state = self.state();
        state.io_calls += 1;
        state.clears += 1;
        let now = Instant::now();
        state.pending.retain(|(ready_at, _)| *ready_at > now);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.state().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state().open
    }
}
