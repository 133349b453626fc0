//! The check session ties the pipeline together for a front-end.
//!
//! It owns the result set, the task queue and the operational console, and
//! exposes the operations a user triggers: navigate, read logs, check one or
//! all loggers, cancel. State changes are announced as [`SessionEvent`]s on a
//! broadcast channel.

use crate::extractor::LogExtractor;
use crate::queue::TaskQueue;
use crate::surface::Surface;
use crate::task::CheckTask;
use crate::{Error, Result};
use cachecheck_core::{urls, Console, LogRecord, ResultSet, Settings};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

/// Notifications for the front-end
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new extraction replaced the result collection
    RecordsReplaced(usize),
    /// A check completed and its result was applied
    RecordUpdated(LogRecord),
    BatchStarted(usize),
    BatchFinished,
    BatchCancelled,
}

#[derive(Debug)]
struct Batch {
    id: u64,
    remaining: usize,
}

pub struct CheckSession {
    surface: Arc<dyn Surface>,
    results: ResultSet,
    queue: TaskQueue,
    console: Console,
    settings: Mutex<Settings>,
    events: broadcast::Sender<SessionEvent>,
    batch: Arc<Mutex<Option<Batch>>>,
    next_batch: AtomicU64,
}

impl CheckSession {
    /// Create a session driving `surface`. Must be called inside a tokio
    /// runtime since it starts the task queue worker.
    pub fn new(surface: Arc<dyn Surface>, console: Console, settings: Settings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let queue = TaskQueue::new(Arc::clone(&surface), console.clone());

        Self {
            surface,
            results: ResultSet::new(),
            queue,
            console,
            settings: Mutex::new(settings),
            events,
            batch: Arc::default(),
            next_batch: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current result collection in table order
    pub fn records(&self) -> Vec<LogRecord> {
        self.results.snapshot()
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn settings(&self) -> Settings {
        self.lock_settings().clone()
    }

    /// Change the settle delay used by checks submitted from now on
    pub fn set_waiting_time(&self, seconds: f64) -> Result<()> {
        self.lock_settings().set_waiting_time(seconds)?;
        Ok(())
    }

    pub fn is_batch_running(&self) -> bool {
        lock_batch(&self.batch).is_some()
    }

    /// Number of checks that haven't completed
    pub fn pending_checks(&self) -> usize {
        self.queue.pending()
    }

    /// Wait until all submitted checks have completed
    pub async fn wait_idle(&self) {
        self.queue.wait_idle().await;
    }

    /// Read the found logs from the listing page and replace the result
    /// collection with them.
    ///
    /// On failure the error goes to the console and the previous collection
    /// is kept.
    pub async fn extract(&self) -> Result<usize> {
        self.ensure_idle()?;

        match LogExtractor::extract(self.surface.as_ref()).await {
            Ok(records) => {
                let count = self.results.replace(records);
                self.emit(SessionEvent::RecordsReplaced(count));
                Ok(count)
            }
            Err(e) => {
                self.console.log(e.to_string());
                Err(e)
            }
        }
    }

    /// Queue a check for one logger. Returns `false` without queueing when
    /// the checker page isn't loaded or the id is unknown.
    pub async fn check_one(&self, identity_id: &str) -> Result<bool> {
        if !self.on_checker_page().await? {
            return Ok(false);
        }
        let Some(record) = self.results.get(identity_id) else {
            tracing::debug!("No record with id {}", identity_id);
            return Ok(false);
        };

        let results = self.results.clone();
        let events = self.events.clone();
        self.queue.submit(self.new_task(record), move |task| {
            apply_result(task, &results, &events);
        });

        Ok(true)
    }

    /// Queue a check for every logger in table order. Returns `false` when
    /// the checker page isn't loaded, there is nothing to check or a batch is
    /// already running.
    pub async fn check_all(&self) -> Result<bool> {
        if !self.on_checker_page().await? {
            return Ok(false);
        }

        let records = self.results.snapshot();
        if records.is_empty() {
            return Ok(false);
        }

        let id = self.next_batch.fetch_add(1, Ordering::Relaxed);
        {
            let mut batch = lock_batch(&self.batch);
            if batch.is_some() {
                tracing::debug!("A batch of checks is already running");
                return Ok(false);
            }
            *batch = Some(Batch {
                id,
                remaining: records.len(),
            });
        }

        tracing::info!("Checking {} loggers", records.len());
        self.emit(SessionEvent::BatchStarted(records.len()));

        for record in records {
            let results = self.results.clone();
            let events = self.events.clone();
            let batch = Arc::clone(&self.batch);

            self.queue.submit(self.new_task(record), move |task| {
                apply_result(task, &results, &events);

                let mut batch = lock_batch(&batch);
                let done = match batch.as_mut() {
                    Some(current) if current.id == id => {
                        current.remaining -= 1;
                        current.remaining == 0
                    }
                    // Cancelled or superseded
                    _ => false,
                };
                if done {
                    *batch = None;
                    let _ = events.send(SessionEvent::BatchFinished);
                }
            });
        }

        Ok(true)
    }

    /// Cancel all queued and running checks. Results of checks still in
    /// flight are discarded when they complete.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.queue.cancel_all();
        if lock_batch(&self.batch).take().is_some() {
            self.emit(SessionEvent::BatchCancelled);
        }
        cancelled
    }

    /// Load user input as a URL, adding a scheme when missing
    pub async fn navigate(&self, input: &str) -> Result<()> {
        let url = match urls::normalize(input) {
            Ok(url) => url,
            Err(e) => {
                self.console.log(format!("invalid url: {}", input));
                return Err(e.into());
            }
        };
        self.load(url.as_str()).await
    }

    /// Open the log entry of a logger
    pub async fn open_log(&self, identity_id: &str) -> Result<()> {
        let record = self.record(identity_id)?;
        self.load(&record.log_url).await
    }

    /// Open the message center for a logger
    pub async fn message_user(&self, identity_id: &str) -> Result<()> {
        let record = self.record(identity_id)?;
        self.load(&record.message_user_url()).await
    }

    pub async fn current_url(&self) -> Result<Option<String>> {
        self.surface.current_url().await
    }

    async fn load(&self, url: &str) -> Result<()> {
        self.ensure_idle()?;
        self.console.log(format!("loading {}", url));

        if let Err(e) = self.surface.navigate(url).await {
            self.console.log(e.to_string());
            return Err(e);
        }

        if let Some(loaded) = self.surface.current_url().await? {
            if !loaded.starts_with("file") {
                self.console.log(format!("finished loading {}", loaded));
            }
        }
        Ok(())
    }

    async fn on_checker_page(&self) -> Result<bool> {
        let url = self.surface.current_url().await?.unwrap_or_default();
        let on_checker = urls::is_checker_page(&url);
        if !on_checker {
            tracing::debug!("Not a challenge checker page: {}", url);
        }
        Ok(on_checker)
    }

    /// Pages may only change while no check drives the surface
    fn ensure_idle(&self) -> Result<()> {
        match self.queue.pending() {
            0 => Ok(()),
            n => Err(Error::Busy(n)),
        }
    }

    fn record(&self, identity_id: &str) -> Result<LogRecord> {
        self.results
            .get(identity_id)
            .ok_or_else(|| Error::Navigation(format!("no log record with id {}", identity_id)))
    }

    fn new_task(&self, record: LogRecord) -> CheckTask {
        CheckTask::new(record, self.lock_settings().waiting_duration())
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn lock_settings(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Store a finished task's verdict. Cancelled and failed checks change
/// nothing.
fn apply_result(task: &CheckTask, results: &ResultSet, events: &broadcast::Sender<SessionEvent>) {
    if task.was_cancelled() {
        return;
    }
    let Some(fulfilled) = task.outcome() else {
        tracing::debug!("Task {} produced no result", task.id());
        return;
    };

    let mut record = task.record();
    record.challenge_result = Some(fulfilled);
    if let Some(updated) = results.apply(&record) {
        let _ = events.send(SessionEvent::RecordUpdated(updated));
    }
}

fn lock_batch(batch: &Mutex<Option<Batch>>) -> MutexGuard<'_, Option<Batch>> {
    batch.lock().unwrap_or_else(|e| e.into_inner())
}
