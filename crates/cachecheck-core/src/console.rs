//! Operational console.
//!
//! An append-only, timestamped log of things the user should see: failed
//! script evaluations, undecodable page data and navigation. Every line has
//! the form `<timestamp>: <message>`. Lines are kept in memory, mirrored to
//! an optional writer and emitted as `tracing` events. Writing to the
//! console never affects control flow.

use chrono::Local;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type Sink = Box<dyn Write + Send>;

#[derive(Default)]
struct Inner {
    lines: Vec<String>,
    sink: Option<Sink>,
}

/// Shared handle to the operational console
#[derive(Clone, Default)]
pub struct Console {
    inner: Arc<Mutex<Inner>>,
}

impl Console {
    /// Console that only keeps lines in memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Console that also writes every line to `sink`
    pub fn with_sink(sink: impl Write + Send + 'static) -> Self {
        let console = Self::new();
        console.lock().sink = Some(Box::new(sink));
        console
    }

    /// Append a timestamped line
    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let line = format!("{}: {}", Local::now().format(TIMESTAMP_FORMAT), message);
        tracing::debug!("{}", message);

        let mut inner = self.lock();
        if let Some(sink) = inner.sink.as_mut() {
            if let Err(e) = writeln!(sink, "{}", line).and_then(|_| sink.flush()) {
                tracing::debug!("Console sink write failed: {}", e);
            }
        }
        inner.lines.push(line);
    }

    /// All lines written so far, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lock().lines.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").field("lines", &self.len()).finish()
    }
}
