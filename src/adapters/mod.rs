//! Transport adapters
//!
//! The facade speaks to instruments only through the [`Transport`] trait: write one
//! command line, read one reply line. Framing (terminators, buffering) belongs to the
//! adapter, never to the parameter layer.

pub mod line_adapter;
pub mod mock;

pub use line_adapter::LineAdapter;
pub use mock::MockAdapter;

use async_trait::async_trait;

use crate::error::AppResult;

/// Line-oriented command channel to an instrument.
#[async_trait]
pub trait Transport: Send {
    /// Send one command. The adapter appends its line terminator.
    async fn write(&mut self, command: &str) -> AppResult<()>;

    /// Read one reply line with the terminator removed.
    async fn read_line(&mut self) -> AppResult<String>;
}
