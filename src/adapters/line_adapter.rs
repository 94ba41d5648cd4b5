//! Line framing over any async byte stream.
//!
//! Raw-socket SCPI instruments (port 5025) accept newline-terminated commands and
//! answer with newline-terminated replies. [`LineAdapter`] implements that framing
//! for any `AsyncRead + AsyncWrite` stream, so the same code serves a `TcpStream`
//! in production and an in-memory duplex pipe in tests.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use super::Transport;
use crate::error::{AppResult, DaqError};

/// Default raw-socket SCPI port.
pub const SCPI_RAW_PORT: u16 = 5025;

/// Replies longer than this are treated as a framing fault.
pub const MAX_REPLY_BYTES: usize = 1024 * 1024;

/// Newline-framed [`Transport`] over an async byte stream.
pub struct LineAdapter<S> {
    stream: BufReader<S>,
    terminator: String,
}

impl<S> LineAdapter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream using `\n` as the line terminator.
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            terminator: "\n".to_string(),
        }
    }

    /// Use a different terminator, e.g. `"\r\n"`. An empty string keeps the current one.
    #[must_use]
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        let terminator = terminator.into();
        if !terminator.is_empty() {
            self.terminator = terminator;
        }
        self
    }

    /// The terminator appended on write and stripped on read.
    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    fn delimiter(&self) -> u8 {
        self.terminator.as_bytes().last().copied().unwrap_or(b'\n')
    }
}

impl LineAdapter<TcpStream> {
    /// Open a raw-socket connection. A bare host gets the default SCPI port.
    pub async fn connect_tcp(address: &str) -> AppResult<Self> {
        let address = if address.contains(':') {
            address.to_string()
        } else {
            format!("{}:{}", address, SCPI_RAW_PORT)
        };
        let stream = TcpStream::connect(&address)
            .await
            .map_err(|e| DaqError::Transport(format!("failed to connect to {}: {}", address, e)))?;
        stream.set_nodelay(true)?;
        debug!(%address, "raw socket connected");
        Ok(Self::new(stream))
    }
}

#[async_trait]
impl<S> Transport for LineAdapter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, command: &str) -> AppResult<()> {
        let mut line = String::with_capacity(command.len() + self.terminator.len());
        line.push_str(command);
        line.push_str(&self.terminator);

        let stream = self.stream.get_mut();
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> AppResult<String> {
        let delimiter = self.delimiter();
        let mut buf = Vec::new();
        let n = (&mut self.stream)
            .take(MAX_REPLY_BYTES as u64)
            .read_until(delimiter, &mut buf)
            .await?;

        if n == 0 {
            return Err(DaqError::Transport("connection closed by instrument".to_string()));
        }
        if buf.last() != Some(&delimiter) {
            let reason = if n >= MAX_REPLY_BYTES {
                format!("reply exceeds {} bytes", MAX_REPLY_BYTES)
            } else {
                "connection closed mid-reply".to_string()
            };
            return Err(DaqError::Transport(reason));
        }

        let text = String::from_utf8_lossy(&buf);
        let text = text.strip_suffix(self.terminator.as_str()).unwrap_or(&text);
        Ok(text.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_write_appends_terminator() {
        let (client, mut server) = duplex(256);
        let mut adapter = LineAdapter::new(client).with_terminator("\r\n");
        adapter.write(":OUTP:STAT 1").await.unwrap();

        let mut buf = [0u8; 14];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b":OUTP:STAT 1\r\n");
    }

    #[tokio::test]
    async fn test_read_line_strips_terminator() {
        let (client, mut server) = duplex(256);
        let mut adapter = LineAdapter::new(client);
        server.write_all(b"5000000000.00\n1\r\n").await.unwrap();

        assert_eq!(adapter.read_line().await.unwrap(), "5000000000.00");
        assert_eq!(adapter.read_line().await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_eof_is_transport_error() {
        let (client, server) = duplex(64);
        let mut adapter = LineAdapter::new(client);
        drop(server);
        assert!(matches!(
            adapter.read_line().await,
            Err(DaqError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_line_then_eof() {
        let (client, mut server) = duplex(64);
        let mut adapter = LineAdapter::new(client);
        server.write_all(b"Rohde&Schwarz").await.unwrap();
        drop(server);
        let err = adapter.read_line().await.unwrap_err();
        assert!(err.to_string().contains("mid-reply"));
    }

    #[test]
    fn test_empty_terminator_is_ignored() {
        let (client, _server) = duplex(8);
        let adapter = LineAdapter::new(client).with_terminator("");
        assert_eq!(adapter.terminator(), "\n");
    }
}
