//! External classifier process
//!
//! A long-lived child process answers one JSON line per file path written to
//! its stdin:
//!
//! ```text
//! > /samples/loop_01.wav
//! < {"success": true, "category": "Drum Loop", "features": {"bpm": 126.0}}
//! ```
//!
//! The process is started lazily on the first request. A request that gets no
//! answer within the timeout, a broken pipe or an early exit kills the process;
//! the next request starts a fresh one. None of these ever surface as errors:
//! the caller just receives an empty [`Classification`].

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use serde::Deserialize;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use wavevault_core::{Classification, TrackClassifier};

/// Default time to wait for one classifier answer
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ClassifierResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    features: Option<ClassifierFeatures>,
}

#[derive(Debug, Deserialize)]
struct ClassifierFeatures {
    #[serde(default)]
    bpm: Option<f64>,
}

/// Parse one response line; anything unexpected counts as "no classification"
fn parse_response(line: &str) -> Classification {
    match serde_json::from_str::<ClassifierResponse>(line) {
        Ok(response) if response.success => Classification {
            category: response.category.filter(|c| !c.trim().is_empty()),
            bpm: response.features.and_then(|f| f.bpm),
        },
        Ok(_) => Classification::default(),
        Err(e) => {
            tracing::debug!("Unparseable classifier response {:?}: {}", line, e);
            Classification::default()
        }
    }
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
}

impl Session {
    fn start(program: &Path, args: &[OsString]) -> std::io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(std::io::Error::other("classifier stdio was not captured"));
        };

        let (line_tx, lines) = unbounded();
        thread::Builder::new()
            .name("classifier-stdout".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            child,
            stdin,
            lines,
        })
    }

    fn stop(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// [`TrackClassifier`] backed by an external line-protocol process
///
/// Requests are serialized: the process handles one path at a time.
pub struct ProcessClassifier {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Duration,
    session: Mutex<Option<Session>>,
}

impl ProcessClassifier {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_CLASSIFIER_TIMEOUT,
            session: Mutex::new(None),
        }
    }

    /// Extra command-line arguments for the classifier program
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a classifier process is currently running
    pub fn is_running(&self) -> bool {
        self.session
            .lock()
            .map(|session| session.is_some())
            .unwrap_or(false)
    }

    fn request(&self, session: &mut Option<Session>, path: &Path) -> Classification {
        if session.is_none() {
            match Session::start(&self.program, &self.args) {
                Ok(started) => {
                    tracing::debug!(program = %self.program.display(), "Classifier process started");
                    *session = Some(started);
                }
                Err(e) => {
                    tracing::warn!(program = %self.program.display(), "Failed to start classifier: {}", e);
                    return Classification::default();
                }
            }
        }

        let Some(active) = session.as_mut() else {
            return Classification::default();
        };

        // Answers that arrived after an earlier give-up are not ours
        while active.lines.try_recv().is_ok() {}

        let written = writeln!(active.stdin, "{}", path.display()).and_then(|()| active.stdin.flush());
        if let Err(e) = written {
            tracing::warn!("Classifier pipe broken: {}", e);
            Self::reset(session);
            return Classification::default();
        }

        match active.lines.recv_timeout(self.timeout) {
            Ok(line) => parse_response(&line),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    path = %path.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Classifier timed out, restarting it on next request"
                );
                Self::reset(session);
                Classification::default()
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("Classifier process exited");
                Self::reset(session);
                Classification::default()
            }
        }
    }

    fn reset(session: &mut Option<Session>) {
        if let Some(old) = session.take() {
            old.stop();
        }
    }
}

impl TrackClassifier for ProcessClassifier {
    fn classify(&self, path: &Path) -> Classification {
        let mut session = match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.request(&mut session, path)
    }
}

impl Drop for ProcessClassifier {
    fn drop(&mut self) {
        let session = match self.session.get_mut() {
            Ok(session) => session,
            Err(poisoned) => poisoned.into_inner(),
        };
        Self::reset(session);
    }
}
