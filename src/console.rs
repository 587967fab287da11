//! Line-oriented dialogue with the user
//!
//! [`Dialogue`] is the only place user input is read, so it is also the only
//! place the exit sentinel is recognised. Typing `exit`, closing stdin, or
//! pressing Ctrl-C all trip the same [`CancellationToken`]. A second Ctrl-C
//! leaves without waiting for the session to wind down.

use async_trait::async_trait;
use std::future::Future;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;

/// Typed at any prompt to end the session
pub const EXIT_SENTINEL: &str = "exit";

pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_SENTINEL)
}

/// Raw terminal surface
#[async_trait]
pub trait Console: Send {
    /// Next line of input, `None` at end of input
    async fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Show a line of output attributed to `speaker`
    fn show(&mut self, speaker: &str, text: &str) -> io::Result<()>;
}

// ============================================================================
// Terminal
// ============================================================================

/// stdin/stdout console
pub struct TerminalConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl Console for TerminalConsole {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        {
            let mut stdout = io::stdout().lock();
            write!(stdout, "You: ")?;
            stdout.flush()?;
        }
        self.lines.next_line().await
    }

    fn show(&mut self, speaker: &str, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "\n[{speaker}]: {text}")?;
        stdout.flush()
    }
}

// ============================================================================
// Dialogue
// ============================================================================

/// Result of soliciting one line from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    /// The user ended the session; nothing more should be asked or sent
    Cancelled,
}

/// A console plus the session's cancellation signal
pub struct Dialogue {
    console: Box<dyn Console>,
    cancel: CancellationToken,
}

impl Dialogue {
    pub fn new(console: Box<dyn Console>) -> Self {
        Self::with_cancellation(console, CancellationToken::new())
    }

    /// Share an externally owned token, e.g. one tripped by Ctrl-C
    pub fn with_cancellation(console: Box<dyn Console>, cancel: CancellationToken) -> Self {
        Self { console, cancel }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn say(&mut self, speaker: &str, text: &str) -> io::Result<()> {
        self.console.show(speaker, text)
    }

    /// Show `question` and wait for an answer
    pub async fn ask(&mut self, speaker: &str, question: &str) -> io::Result<Reply> {
        if self.is_cancelled() {
            return Ok(Reply::Cancelled);
        }
        self.console.show(speaker, question)?;

        let line = tokio::select! {
            () = self.cancel.cancelled() => {
                tracing::info!(speaker, "Session interrupted");
                return Ok(Reply::Cancelled);
            }
            line = self.console.read_line() => line?,
        };

        match line {
            Some(line) if is_exit(&line) => {
                tracing::info!(speaker, "User typed exit");
                self.cancel.cancel();
                Ok(Reply::Cancelled)
            }
            Some(line) => Ok(Reply::Answer(line.trim().to_string())),
            None => {
                tracing::info!(speaker, "End of input");
                self.cancel.cancel();
                Ok(Reply::Cancelled)
            }
        }
    }
}

// ============================================================================
// Interrupts
// ============================================================================

/// Cancel `cancel` on the first interrupt and call `force_exit` on the second.
///
/// `next_signal` resolves once per interrupt; an error means signals cannot be
/// received and the watch ends.
pub async fn handle_interrupts<S, F, E>(
    mut next_signal: S,
    cancel: CancellationToken,
    force_exit: E,
) where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
    E: FnOnce(),
{
    if let Err(e) = next_signal().await {
        tracing::warn!(error = %e, "Cannot listen for interrupts");
        return;
    }
    tracing::info!("Received Ctrl-C");
    cancel.cancel();

    if next_signal().await.is_ok() {
        tracing::warn!("Received second Ctrl-C, exiting");
        force_exit();
    }
}
