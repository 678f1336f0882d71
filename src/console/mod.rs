//! The console: read/write endpoint on a pty master plus an emulated terminal.
//!
//! A background reader copies pty output into a shared buffer and feeds the
//! same bytes to a `vt100` parser. Expectations poll the buffer; sends write
//! straight to the master.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use portable_pty::MasterPty;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::matcher;

mod query;

use self::query::QueryScanner;

/// Terminator appended to every line sent to the console.
pub const LINE_TERMINATOR: &str = "\n";

const SCROLLBACK_LINES: usize = 1000;

/// Position on the emulated screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Row (0-indexed from top).
    pub row: u16,
    /// Column (0-indexed from left).
    pub col: u16,
}

impl Position {
    /// Create a new position.
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StreamStatus {
    Open,
    Closed,
    Failed(String),
}

/// Everything the reader has seen so far.
struct Output {
    text: String,
    // Bytes of a UTF-8 sequence split across reads.
    partial: Vec<u8>,
    parser: vt100::Parser,
    queries: QueryScanner,
    status: StreamStatus,
}

impl Output {
    fn new(rows: u16, cols: u16) -> Self {
        Self {
            text: String::new(),
            partial: Vec::new(),
            parser: vt100::Parser::new(rows, cols, SCROLLBACK_LINES),
            queries: QueryScanner::default(),
            status: StreamStatus::Open,
        }
    }

    /// Record a chunk of output, returning replies to any cursor queries in it.
    ///
    /// Each reply reflects the screen as it was when the query was read.
    fn append(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut replies = Vec::new();
        let mut start = 0;
        for (end, query) in self.queries.scan(chunk) {
            self.parser.process(&chunk[start..end]);
            replies.push(query.reply(self.cursor()));
            start = end;
        }
        self.parser.process(&chunk[start..]);

        self.decode(chunk);
        replies
    }

    fn decode(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.partial);
        bytes.extend_from_slice(chunk);

        let mut input = bytes.as_slice();
        while !input.is_empty() {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    input = &[];
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    self.text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            self.partial = rest.to_vec();
                            input = &[];
                        }
                    }
                }
            }
        }
    }

    fn cursor(&self) -> Position {
        let (row, col) = self.parser.screen().cursor_position();
        Position::new(row, col)
    }
}

/// Console wired to the master side of a pty.
pub struct Console {
    /// Kept open for the lifetime of the console.
    _master: Option<Mutex<Box<dyn MasterPty + Send>>>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    output: Arc<Mutex<Output>>,
    /// Offset into the output already claimed by earlier matches.
    consumed: usize,
    timeout: Duration,
    poll_interval: Duration,
    _reader_handle: std::thread::JoinHandle<()>,
}

impl Console {
    /// Attach a console to a pty master and start the background reader.
    pub fn open(master: Box<dyn MasterPty + Send>, config: &HarnessConfig) -> Result<Self> {
        let reader = master
            .try_clone_reader()
            .map_err(|e| HarnessError::Setup(format!("failed to clone pty reader: {e}")))?;
        let writer = master
            .take_writer()
            .map_err(|e| HarnessError::Setup(format!("failed to take pty writer: {e}")))?;

        let mut console = Self::from_streams(reader, writer, config)?;
        console._master = Some(Mutex::new(master));
        Ok(console)
    }

    fn from_streams(
        reader: Box<dyn Read + Send>,
        writer: Box<dyn Write + Send>,
        config: &HarnessConfig,
    ) -> Result<Self> {
        let writer = Arc::new(Mutex::new(writer));
        let output = Arc::new(Mutex::new(Output::new(config.rows, config.cols)));
        let reader_handle = std::thread::Builder::new()
            .name("pty-reader".to_string())
            .spawn({
                let output = output.clone();
                let writer = writer.clone();
                move || read_loop(reader, output, writer)
            })
            .map_err(|e| HarnessError::Setup(format!("failed to start pty reader: {e}")))?;

        Ok(Self {
            _master: None,
            writer,
            output,
            consumed: 0,
            timeout: config.timeout(),
            poll_interval: config.poll_interval(),
            _reader_handle: reader_handle,
        })
    }

    /// Wait for text to appear in the output.
    ///
    /// Matching starts after the end of the previous successful match.
    pub fn expect(&mut self, text: &str) -> ExpectBuilder<'_> {
        let timeout = self.timeout;
        ExpectBuilder {
            console: self,
            text: text.to_string(),
            timeout,
        }
    }

    /// Send a line of input.
    ///
    /// A short write is an error.
    pub async fn send_line(&self, text: &str) -> Result<()> {
        let payload = format!("{text}{LINE_TERMINATOR}");
        let expected = payload.len();
        let send_error = |source: io::Error| HarnessError::Send {
            payload: payload.clone(),
            source,
        };

        let mut writer = self.writer.lock().await;
        let sent = writer.write(payload.as_bytes()).map_err(send_error)?;
        if sent != expected {
            return Err(HarnessError::ShortWrite {
                payload,
                sent,
                expected,
            });
        }
        writer.flush().map_err(send_error)?;

        tracing::debug!(payload = %payload.escape_debug(), "sent line");
        Ok(())
    }

    /// Current contents of the emulated screen.
    pub async fn screen_text(&self) -> String {
        self.output.lock().await.parser.screen().contents()
    }

    /// Cursor position on the emulated screen.
    pub async fn cursor(&self) -> Position {
        self.output.lock().await.cursor()
    }

    /// All output so far with escape sequences stripped.
    pub async fn snapshot(&self) -> String {
        matcher::normalize(&self.output.lock().await.text)
    }

    /// Whether the pty has reached end of stream.
    pub async fn is_closed(&self) -> bool {
        self.output.lock().await.status != StreamStatus::Open
    }

    /// Close the console, releasing the pty master.
    pub fn close(self) {
        tracing::debug!(consumed = self.consumed, "closing console");
    }

    async fn wait_for(&mut self, expected: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            {
                let output = self.output.lock().await;
                let pending = output.text.get(self.consumed..).unwrap_or_default();

                if let Some(end) = matcher::match_end(pending, expected) {
                    self.consumed += end;
                    tracing::debug!(expected = %expected.escape_debug(), "matched");
                    return Ok(());
                }

                match &output.status {
                    StreamStatus::Open => {}
                    StreamStatus::Closed => {
                        return Err(HarnessError::StreamClosed {
                            criteria: expected.to_string(),
                            buffer: matcher::normalize(pending),
                        });
                    }
                    StreamStatus::Failed(message) => {
                        return Err(HarnessError::Read {
                            criteria: expected.to_string(),
                            message: message.clone(),
                        });
                    }
                }

                if Instant::now() >= deadline {
                    return Err(HarnessError::MatchTimeout {
                        criteria: expected.to_string(),
                        buffer: matcher::normalize(pending),
                        timeout,
                    });
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Builder for expect operations with fluent API.
pub struct ExpectBuilder<'a> {
    console: &'a mut Console,
    text: String,
    timeout: Duration,
}

impl<'a> ExpectBuilder<'a> {
    /// Set the timeout for this wait.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait until the text appears.
    pub async fn await_match(self) -> Result<()> {
        self.console.wait_for(&self.text, self.timeout).await
    }
}

impl<'a> std::future::IntoFuture for ExpectBuilder<'a> {
    type Output = Result<()>;
    type IntoFuture =
        std::pin::Pin<Box<dyn std::future::Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.await_match())
    }
}

fn read_loop(
    mut reader: Box<dyn Read + Send>,
    output: Arc<Mutex<Output>>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
) {
    let mut buf = [0u8; 4096];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                output.blocking_lock().status = StreamStatus::Closed;
                break;
            }
            Ok(n) => {
                let replies = output.blocking_lock().append(&buf[..n]);

                if !replies.is_empty() {
                    let mut writer = writer.blocking_lock();
                    for reply in replies {
                        let _ = writer.write_all(&reply);
                    }
                    let _ = writer.flush();
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_end_of_stream(&e) => {
                output.blocking_lock().status = StreamStatus::Closed;
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "pty read failed");
                output.blocking_lock().status = StreamStatus::Failed(e.to_string());
                break;
            }
        }
    }
}

/// Linux reports EIO on the master once every slave handle is closed.
fn is_end_of_stream(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(nix::errno::Errno::EIO as i32)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}
