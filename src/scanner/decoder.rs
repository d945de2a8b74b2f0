//! Decoder adapters.
//!
//! QR decoding itself happens outside this crate. An adapter wraps
//! whatever engine produces decoded text and forwards each payload into
//! the channel it is handed on start. Dropping that sender closes the
//! decode stream.

use crate::config::{CameraFacing, ScannerConfig};
use std::future::Future;
use std::io::{BufRead, Read};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Errors that keep the scanner from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScannerError {
    #[error("decoder unavailable: {0}")]
    DecoderUnavailable(String),
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Source of decoded QR payloads.
pub trait DecoderAdapter {
    /// Begins decoding, sending every decoded payload to `sink`.
    fn start(
        &mut self,
        facing: CameraFacing,
        config: &ScannerConfig,
        sink: mpsc::Sender<String>,
    ) -> impl Future<Output = Result<(), ScannerError>>;

    /// Stops decoding and closes the stream.
    fn stop(&mut self) -> impl Future<Output = ()>;

    /// True while payloads may still arrive.
    fn is_scanning(&self) -> bool;
}

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BlockingReader = Box<dyn Read + Send>;

enum LineSource {
    Stdin,
    Path(PathBuf),
    Reader(Option<BoxedReader>),
    Blocking(Option<BlockingReader>),
}

enum Input {
    Async(BoxedReader),
    Blocking(BlockingReader),
}

enum Reading {
    Task(JoinHandle<()>),
    Thread(std::thread::JoinHandle<()>),
}

impl Reading {
    fn is_finished(&self) -> bool {
        match self {
            Reading::Task(task) => task.is_finished(),
            Reading::Thread(thread) => thread.is_finished(),
        }
    }
}

/// Reads one decoded payload per line.
///
/// Suits external decoding engines that print results (for example
/// `zbarcam --raw`) and keyboard-wedge hardware scanners. Blocking
/// sources (stdin, files, FIFOs) are read on a dedicated thread that is
/// detached on stop, so a read that never returns cannot hold the
/// process open. Lines that are not valid UTF-8 are skipped.
pub struct LineDecoder {
    source: LineSource,
    reading: Option<Reading>,
}

impl LineDecoder {
    /// Reads payloads from standard input.
    pub fn stdin() -> Self {
        Self::with_source(LineSource::Stdin)
    }

    /// Reads payloads from a file, FIFO or device node.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::with_source(LineSource::Path(path.into()))
    }

    /// Reads payloads from an async reader. Usable for one session.
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::with_source(LineSource::Reader(Some(Box::new(reader))))
    }

    /// Reads payloads from a blocking reader on its own thread.
    /// Usable for one session.
    pub fn from_blocking_reader(reader: impl Read + Send + 'static) -> Self {
        Self::with_source(LineSource::Blocking(Some(Box::new(reader))))
    }

    fn with_source(source: LineSource) -> Self {
        Self {
            source,
            reading: None,
        }
    }

    async fn open(&mut self) -> Result<Input, ScannerError> {
        match &mut self.source {
            LineSource::Stdin => Ok(Input::Blocking(Box::new(std::io::stdin()))),
            LineSource::Path(path) => match tokio::fs::File::open(&*path).await {
                Ok(file) => Ok(Input::Blocking(Box::new(file.into_std().await))),
                Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Err(
                    ScannerError::PermissionDenied(format!("{}: {e}", path.display())),
                ),
                Err(e) => Err(ScannerError::DeviceUnavailable(format!(
                    "{}: {e}",
                    path.display()
                ))),
            },
            LineSource::Reader(reader) => reader.take().map(Input::Async).ok_or_else(consumed),
            LineSource::Blocking(reader) => {
                reader.take().map(Input::Blocking).ok_or_else(consumed)
            }
        }
    }
}

fn consumed() -> ScannerError {
    ScannerError::DecoderUnavailable("input stream already consumed".to_string())
}

/// Strips the line terminator and rejects non-UTF-8 payloads.
fn decode_line(buf: &[u8]) -> Option<String> {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    match std::str::from_utf8(line) {
        Ok(line) => Some(line.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping decoded line that is not UTF-8");
            None
        }
    }
}

async fn read_async(reader: BoxedReader, sink: mpsc::Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                tracing::info!("Decoder input closed");
                break;
            }
            Ok(_) => {
                if let Some(line) = decode_line(&buf) {
                    if sink.send(line).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Decoder input failed");
                break;
            }
        }
    }
}

fn read_blocking(reader: BlockingReader, sink: mpsc::Sender<String>) {
    let mut reader = std::io::BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                tracing::info!("Decoder input closed");
                break;
            }
            Ok(_) => {
                if let Some(line) = decode_line(&buf) {
                    // Fails once the controller has dropped the stream.
                    if sink.blocking_send(line).is_err() {
                        break;
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "Decoder input failed");
                break;
            }
        }
    }
}

impl DecoderAdapter for LineDecoder {
    async fn start(
        &mut self,
        facing: CameraFacing,
        config: &ScannerConfig,
        sink: mpsc::Sender<String>,
    ) -> Result<(), ScannerError> {
        let reading = match self.open().await? {
            Input::Async(reader) => Reading::Task(tokio::spawn(read_async(reader, sink))),
            Input::Blocking(reader) => Reading::Thread(
                std::thread::Builder::new()
                    .name("line-decoder".to_string())
                    .spawn(move || read_blocking(reader, sink))
                    .map_err(|e| ScannerError::DecoderUnavailable(e.to_string()))?,
            ),
        };
        self.reading = Some(reading);
        tracing::info!(?facing, fps = config.fps, "Line decoder started");
        Ok(())
    }

    async fn stop(&mut self) {
        match self.reading.take() {
            Some(Reading::Task(task)) => {
                task.abort();
                let _ = task.await;
            }
            // A blocking read cannot be interrupted; the thread is
            // detached and exits on its next line or at process exit.
            Some(Reading::Thread(_)) => {}
            None => return,
        }
        tracing::info!("Line decoder stopped");
    }

    fn is_scanning(&self) -> bool {
        self.reading.as_ref().is_some_and(|reading| !reading.is_finished())
    }
}

/// Scripted decoder for tests and demos.
///
/// Emits each payload after its delay, measured from the previous one.
#[derive(Debug, Default)]
pub struct MockDecoder {
    script: Vec<(Duration, String)>,
    failure: Option<ScannerError>,
    hold_open: bool,
    task: Option<JoinHandle<()>>,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a payload emitted `delay` after the previous one.
    pub fn then(mut self, delay: Duration, payload: impl Into<String>) -> Self {
        self.script.push((delay, payload.into()));
        self
    }

    /// Makes `start` fail with `error`.
    pub fn failing(mut self, error: ScannerError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Keeps the stream open after the script until stopped.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

impl DecoderAdapter for MockDecoder {
    async fn start(
        &mut self,
        facing: CameraFacing,
        config: &ScannerConfig,
        sink: mpsc::Sender<String>,
    ) -> Result<(), ScannerError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        tracing::info!(?facing, fps = config.fps, events = self.script.len(), "MockDecoder started");

        let script = std::mem::take(&mut self.script);
        let hold_open = self.hold_open;
        self.task = Some(tokio::spawn(async move {
            for (delay, payload) in script {
                tokio::time::sleep(delay).await;
                if sink.send(payload).await.is_err() {
                    return;
                }
            }
            if hold_open {
                sink.closed().await;
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            tracing::info!("MockDecoder stopped");
        }
    }

    fn is_scanning(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}
