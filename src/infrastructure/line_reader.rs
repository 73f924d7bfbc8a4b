// Line sources over async byte streams: stdin, replayed captures, serial ports
use crate::application::line_source::{LineSource, SourceError, SourceEvent};
use crate::infrastructure::config::{SourceKind, SourceSettings};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Newline-delimited reader with a per-read timeout. Bytes that are not
/// valid UTF-8 are replaced rather than failing the line.
pub struct StreamLineSource<R> {
    name: String,
    reader: BufReader<R>,
    pending: Vec<u8>,
    read_timeout: Duration,
}

impl<R: AsyncRead + Unpin + Send> StreamLineSource<R> {
    pub fn new(name: impl Into<String>, reader: R, read_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            reader: BufReader::new(reader),
            pending: Vec::new(),
            read_timeout,
        }
    }

    fn take_line(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes)
            .trim_end_matches(['\r', '\n'])
            .to_string()
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> LineSource for StreamLineSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_line(&mut self) -> Result<SourceEvent, SourceError> {
        // Partial bytes stay in `pending` across a timeout and are completed
        // by the next read.
        let read = tokio::time::timeout(
            self.read_timeout,
            self.reader.read_until(b'\n', &mut self.pending),
        )
        .await;

        match read {
            Err(_) => Ok(SourceEvent::Timeout),
            Ok(Err(err)) => Err(SourceError::Io(err)),
            Ok(Ok(0)) if self.pending.is_empty() => Ok(SourceEvent::Exhausted),
            Ok(Ok(_)) => Ok(SourceEvent::Line(self.take_line())),
        }
    }
}

/// Acquire the configured line source. Failure here is fatal to the session.
pub async fn open_source(settings: &SourceSettings) -> Result<Box<dyn LineSource>, SourceError> {
    let timeout = settings.read_timeout();
    match settings.kind {
        SourceKind::Stdin => Ok(Box::new(StreamLineSource::new(
            "stdin",
            tokio::io::stdin(),
            timeout,
        ))),
        SourceKind::Replay => {
            let file = tokio::fs::File::open(&settings.port)
                .await
                .map_err(|err| SourceError::Unavailable {
                    name: settings.port.clone(),
                    reason: err.to_string(),
                })?;
            Ok(Box::new(StreamLineSource::new(
                settings.port.clone(),
                file,
                timeout,
            )))
        }
        SourceKind::Serial => open_serial(settings),
    }
}

#[cfg(feature = "serial")]
fn open_serial(settings: &SourceSettings) -> Result<Box<dyn LineSource>, SourceError> {
    use tokio_serial::SerialPortBuilderExt;

    let port = tokio_serial::new(&settings.port, settings.baud_rate)
        .timeout(settings.read_timeout())
        .open_native_async()
        .map_err(|err| SourceError::Unavailable {
            name: settings.port.clone(),
            reason: err.to_string(),
        })?;
    tracing::info!(port = %settings.port, baud = settings.baud_rate, "serial port opened");
    Ok(Box::new(StreamLineSource::new(
        settings.port.clone(),
        port,
        settings.read_timeout(),
    )))
}

#[cfg(not(feature = "serial"))]
fn open_serial(settings: &SourceSettings) -> Result<Box<dyn LineSource>, SourceError> {
    Err(SourceError::Unavailable {
        name: settings.port.clone(),
        reason: "built without the `serial` feature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: SourceKind, port: &str) -> SourceSettings {
        SourceSettings {
            kind,
            port: port.to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 200,
        }
    }

    #[tokio::test]
    async fn test_reads_lines_then_exhausts() {
        let data: &[u8] = b"S 1.0 D 90\r\nS 2.0\n\xffT 3\nlast";
        let mut source = StreamLineSource::new("mem", data, Duration::from_millis(200));

        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Line("S 1.0 D 90".into()));
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Line("S 2.0".into()));
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Line("\u{fffd}T 3".into()));
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Line("last".into()));
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Exhausted);
    }

    #[tokio::test]
    async fn test_silent_stream_times_out() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut source = StreamLineSource::new("idle", reader, Duration::from_millis(20));
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Timeout);
    }

    #[tokio::test]
    async fn test_partial_line_survives_timeout() {
        use tokio::io::AsyncWriteExt;

        let (mut writer, reader) = tokio::io::duplex(64);
        let mut source = StreamLineSource::new("slow", reader, Duration::from_millis(20));

        writer.write_all(b"S 1.").await.unwrap();
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Timeout);
        writer.write_all(b"5 D 90\n").await.unwrap();
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Line("S 1.5 D 90".into()));
    }

    #[tokio::test]
    async fn test_missing_replay_file_is_unavailable() {
        let result = open_source(&settings(SourceKind::Replay, "/nonexistent/capture.log")).await;
        assert!(matches!(result, Err(SourceError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_replay_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.log");
        std::fs::write(&path, "S 1.0\nS 2.0\n").unwrap();

        let mut source = open_source(&settings(SourceKind::Replay, path.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Line("S 1.0".into()));
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Line("S 2.0".into()));
        assert_eq!(source.next_line().await.unwrap(), SourceEvent::Exhausted);
    }
}
