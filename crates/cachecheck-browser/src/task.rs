use crate::script::ScriptInjector;
use crate::surface::Surface;
use cachecheck_core::{urls, Console, LogRecord};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tokio::sync::Notify;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a [`CheckTask`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Finished,
}

/// Classify the style attribute of the checker's status marker.
///
/// The checker hides the "fulfilled" marker with `display: none` when the
/// user does not qualify, so any mention of `none` means not fulfilled.
pub fn classify(status_style: &str) -> bool {
    !status_style.to_lowercase().contains("none")
}

/// One challenge check for one logger against the checker page.
///
/// The task owns a snapshot of the record taken at submission. Running it
/// fills the logger's name into the checker, waits for the settle delay and
/// reads back the verdict as the task's [`outcome`](Self::outcome). A
/// check that fails leaves the outcome unset. Cancellation is a flag: it never
/// interrupts a running evaluation, it only tells whoever consumes the result
/// to throw it away.
#[derive(Debug)]
pub struct CheckTask {
    id: u64,
    record: Mutex<LogRecord>,
    outcome: Mutex<Option<bool>>,
    wait: Duration,
    state: RwLock<TaskState>,
    cancelled: AtomicBool,
    finished: Notify,
}

impl CheckTask {
    /// Create a task for `record` that waits `wait` between starting the
    /// checker and reading its result.
    pub fn new(record: LogRecord, wait: Duration) -> Self {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            record: Mutex::new(record),
            outcome: Mutex::new(None),
            wait,
            state: RwLock::new(TaskState::Pending),
            cancelled: AtomicBool::new(false),
            finished: Notify::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current snapshot of the checked record
    pub fn record(&self) -> LogRecord {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Verdict read from the checker, `None` until a check succeeds
    pub fn outcome(&self) -> Option<bool> {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn wait_time(&self) -> Duration {
        self.wait
    }

    pub fn state(&self) -> TaskState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_finished(&self) -> bool {
        self.state() == TaskState::Finished
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            tracing::debug!("Task {} cancelled in state {:?}", self.id, self.state());
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Wait until the task reaches [`TaskState::Finished`]
    pub async fn wait_finished(&self) {
        loop {
            let notified = self.finished.notified();
            if self.is_finished() {
                return;
            }
            notified.await;
        }
    }

    /// Run the task to completion on `surface`.
    ///
    /// A task cancelled before it starts finishes right away without touching
    /// the surface. Errors end the task with the result left unset; they are
    /// written to `console` and never retried.
    pub async fn start(&self, surface: &dyn Surface, console: &Console) {
        if self.was_cancelled() {
            tracing::debug!("Task {} was cancelled before it started", self.id);
            self.set_state(TaskState::Finished);
            return;
        }

        self.set_state(TaskState::Running);

        if let Some(fulfilled) = self.execute(surface, console).await {
            *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = Some(fulfilled);
            self.record
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .challenge_result = Some(fulfilled);
        }

        self.set_state(TaskState::Finished);
    }

    async fn execute(&self, surface: &dyn Surface, console: &Console) -> Option<bool> {
        let name = self.record().display_name;

        let url = match surface.current_url().await {
            Ok(url) => url.unwrap_or_default(),
            Err(e) => {
                console.log(e.to_string());
                return None;
            }
        };
        if !urls::is_checker_page(&url) {
            tracing::debug!("Task {}: not on a challenge checker page ({})", self.id, url);
            return None;
        }

        tracing::debug!("Task {}: checking {}", self.id, name);
        let fill = ScriptInjector::fill_and_run_script(&name);
        if let Err(e) = ScriptInjector::evaluate(surface, &fill).await {
            console.log(format!("Checking {} failed: {}", name, e));
            return None;
        }

        // Give the checker time to run before reading its verdict
        tokio::time::sleep(self.wait).await;

        let status = match ScriptInjector::evaluate(surface, ScriptInjector::read_status_script()).await {
            Ok(value) => value,
            Err(e) => {
                console.log(format!("Reading the checker result for {} failed: {}", name, e));
                return None;
            }
        };

        match status.as_str() {
            Some(style) => {
                let fulfilled = classify(style);
                tracing::info!("{} {} the challenge", name, if fulfilled { "fulfils" } else { "does not fulfil" });
                Some(fulfilled)
            }
            None => {
                tracing::debug!("Task {}: status marker had no style ({:?})", self.id, status);
                None
            }
        }
    }

    fn set_state(&self, state: TaskState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
        if state == TaskState::Finished {
            self.finished.notify_waiters();
        }
    }
}
