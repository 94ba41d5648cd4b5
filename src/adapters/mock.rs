//! Scripted in-memory transport.
//!
//! Clones share state, so a test can keep one handle for scripting and inspection
//! while the facade owns another.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

use super::Transport;
use crate::error::{AppResult, DaqError};

#[derive(Debug, Default)]
struct MockState {
    writes: Vec<String>,
    replies: VecDeque<String>,
    stall_reads: bool,
    stall_writes: bool,
    fail_writes: Option<String>,
}

/// Scripted in-memory transport. Clones share one state, so a test keeps a
/// handle to inspect writes after moving a clone into a facade.
#[derive(Debug, Clone, Default)]
pub struct MockAdapter {
    state: Arc<Mutex<MockState>>,
}

impl MockAdapter {
    /// An adapter with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a queue of reply lines.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        mock.lock()
            .replies
            .extend(replies.into_iter().map(Into::into));
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the log from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue one reply line.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock().replies.push_back(reply.into());
    }

    /// Every command written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Number of commands written so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Replies not yet consumed.
    pub fn pending_replies(&self) -> usize {
        self.lock().replies.len()
    }

    /// Reads never complete while set.
    pub fn stall_reads(&self, stall: bool) {
        self.lock().stall_reads = stall;
    }

    /// Writes are recorded but never complete while set.
    pub fn stall_writes(&self, stall: bool) {
        self.lock().stall_writes = stall;
    }

    /// Fail every write with a transport error while set.
    pub fn fail_writes(&self, reason: Option<&str>) {
        self.lock().fail_writes = reason.map(str::to_string);
    }
}

#[async_trait]
impl Transport for MockAdapter {
    async fn write(&mut self, command: &str) -> AppResult<()> {
        let stall = {
            let mut state = self.lock();
            if let Some(reason) = &state.fail_writes {
                return Err(DaqError::Transport(reason.clone()));
            }
            trace!(command, "mock write");
            state.writes.push(command.to_string());
            state.stall_writes
        };
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn read_line(&mut self) -> AppResult<String> {
        let (stall, reply) = {
            let mut state = self.lock();
            if state.stall_reads {
                (true, None)
            } else {
                (false, state.replies.pop_front())
            }
        };
        if stall {
            std::future::pending::<()>().await;
        }
        reply.ok_or_else(|| DaqError::Transport("mock: no reply queued".to_string()))
    }
}
