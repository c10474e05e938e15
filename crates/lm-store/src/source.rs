//! Content source strategies for the daily log, plus governance loading.
//!
//! Sources are tried in order and each returns text or a [`SourceError`];
//! the first success wins and total failure degrades to empty text.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use std::{env, fs};

use lm_core::GovernanceDocument;

use crate::error::SourceError;
use crate::vault::Vault;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// One way of obtaining a day's log text.
pub trait ContentSource {
    fn describe(&self) -> String;

    fn fetch_daily(&self, date: &str) -> SourceResult<String>;
}

// ---------------------------------------------------------------------------
// Note-application command
// ---------------------------------------------------------------------------

/// Captured output of a finished command.
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

fn spawn_reader<R: Read + Send + 'static>(mut reader: R, pipe: Pipe, tx: Sender<(Pipe, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        let _ = tx.send((pipe, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Run `cmd`, killing it if it outlives `timeout`.
///
/// Output pipes are drained on background threads so a chatty child cannot
/// block on a full pipe while we poll. The same deadline bounds the wait for
/// those pipes to close: a background process that inherited them can keep
/// them open long after the child itself has exited.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> SourceResult<CommandOutput> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SourceError::Unavailable(format!("failed to run {program}: {e}")))?;

    let (tx, rx) = mpsc::channel();
    if let Some(out) = child.stdout.take() {
        spawn_reader(out, Pipe::Stdout, tx.clone());
    }
    if let Some(err) = child.stderr.take() {
        spawn_reader(err, Pipe::Stderr, tx.clone());
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SourceError::Timeout(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(SourceError::Unavailable(format!("{program}: {e}"))),
        }
    };

    let mut stdout = String::new();
    let mut stderr = String::new();
    loop {
        let wait = deadline
            .saturating_duration_since(Instant::now())
            .max(POLL_INTERVAL);
        match rx.recv_timeout(wait) {
            Ok((Pipe::Stdout, text)) => stdout = text,
            Ok((Pipe::Stderr, text)) => stderr = text,
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!("{program} exited but its output is still held open");
                return Err(SourceError::Timeout(timeout));
            }
        }
    }

    Ok(CommandOutput {
        status,
        stdout,
        stderr,
    })
}

#[cfg(unix)]
fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

/// The note application's command-line interface, run inside the vault.
#[derive(Debug, Clone)]
pub struct CommandSource {
    binary: String,
    vault_root: PathBuf,
    timeout: Duration,
    /// The command only knows about the current day.
    today: String,
}

impl CommandSource {
    pub fn new(
        binary: impl Into<String>,
        vault: &Vault,
        timeout: Duration,
        today: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            vault_root: vault.root().to_path_buf(),
            timeout,
            today: today.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).current_dir(&self.vault_root);
        if running_as_root() {
            cmd.arg("--no-sandbox");
        }
        if env::var_os("DISPLAY").is_none() {
            cmd.env("DISPLAY", ":99");
        }
        cmd
    }

    /// Run a subcommand and return its trimmed stdout.
    pub fn run(&self, args: &[&str]) -> SourceResult<String> {
        let output = run_with_timeout(self.command(args), self.timeout)?;
        if !output.status.success() {
            let stderr = output.stderr.trim();
            let detail = if stderr.is_empty() {
                format!("{} {} exited with {}", self.binary, args.join(" "), output.status)
            } else {
                stderr.to_string()
            };
            return Err(SourceError::Unavailable(detail));
        }
        Ok(output.stdout.trim().to_string())
    }
}

impl ContentSource for CommandSource {
    fn describe(&self) -> String {
        format!("{} daily:read", self.binary)
    }

    fn fetch_daily(&self, date: &str) -> SourceResult<String> {
        if date != self.today {
            return Err(SourceError::Unavailable(format!(
                "command only serves today's note ({})",
                self.today
            )));
        }
        let text = self.run(&["daily:read"])?;
        if text.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Daily note files
// ---------------------------------------------------------------------------

/// Reads `<date>.md` from the vault's conventional daily-note locations.
#[derive(Debug, Clone)]
pub struct FileSource {
    vault: Vault,
}

impl FileSource {
    pub fn new(vault: &Vault) -> Self {
        Self {
            vault: vault.clone(),
        }
    }
}

impl ContentSource for FileSource {
    fn describe(&self) -> String {
        format!("daily files under {}", self.vault.root().display())
    }

    fn fetch_daily(&self, date: &str) -> SourceResult<String> {
        for path in self.vault.daily_candidates(date) {
            match fs::read_to_string(&path) {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::debug!("daily note read from {}", path.display());
                    return Ok(text);
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("failed to read {}: {e}", path.display()),
            }
        }
        Err(SourceError::Empty)
    }
}

/// Try each source in order; the first success wins. Returns empty text
/// when every source fails.
pub fn acquire_daily(sources: &[Box<dyn ContentSource>], date: &str) -> String {
    for source in sources {
        match source.fetch_daily(date) {
            Ok(text) => return text,
            Err(e @ SourceError::Empty) => {
                tracing::debug!("{}: {e}", source.describe());
            }
            Err(e) => tracing::warn!("{}: {e}; trying next source", source.describe()),
        }
    }
    tracing::info!("no daily note found for {date}");
    String::new()
}

/// Read the named governance files in the given order. Missing or
/// unreadable files are skipped.
pub fn load_governance(vault: &Vault, names: &[&str]) -> Vec<GovernanceDocument> {
    names
        .iter()
        .filter_map(|name| {
            vault
                .governance_candidates(name)
                .into_iter()
                .find_map(|path| fs::read_to_string(path).ok())
                .map(|text| GovernanceDocument::new(*name, text))
        })
        .collect()
}
