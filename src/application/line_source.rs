// Line source trait - the seam the serial port (or a replayed capture) plugs into
use async_trait::async_trait;

/// Result of a single bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Line(String),
    /// The source's read timeout expired without a complete line.
    Timeout,
    /// The stream ended; no further lines will arrive.
    Exhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("line source {name} unavailable: {reason}")]
    Unavailable { name: String, reason: String },
    #[error("line source read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait LineSource: Send {
    /// Human-readable name (port path, file name, "stdin").
    fn name(&self) -> &str;

    /// Wait for the next line, never longer than the source's read timeout.
    async fn next_line(&mut self) -> Result<SourceEvent, SourceError>;
}
