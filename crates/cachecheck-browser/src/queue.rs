use crate::surface::Surface;
use crate::task::CheckTask;
use cachecheck_core::Console;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

type Completion = Box<dyn FnOnce(&CheckTask) + Send>;

struct Job {
    task: Arc<CheckTask>,
    on_complete: Completion,
}

/// Runs check tasks one at a time, in submission order, against the shared
/// surface.
///
/// A single worker drains the queue and only takes the next task once the
/// current one is finished, so two tasks never drive the page at the same
/// time.
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<Job>,
    /// Submitted tasks whose completion callback hasn't run yet
    active: Arc<Mutex<Vec<Arc<CheckTask>>>>,
    idle: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl TaskQueue {
    /// Create the queue and spawn its worker on the current tokio runtime.
    pub fn new(surface: Arc<dyn Surface>, console: Console) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let active: Arc<Mutex<Vec<Arc<CheckTask>>>> = Arc::default();
        let idle = Arc::new(Notify::new());

        let worker_active = Arc::clone(&active);
        let worker_idle = Arc::clone(&idle);
        let worker = tokio::spawn(async move {
            while let Some(Job { task, on_complete }) = receiver.recv().await {
                task.start(surface.as_ref(), &console).await;
                tracing::debug!(
                    "Task {} finished (cancelled: {})",
                    task.id(),
                    task.was_cancelled()
                );

                let callback = AssertUnwindSafe(|| on_complete(task.as_ref()));
                if panic::catch_unwind(callback).is_err() {
                    tracing::error!("Completion callback for task {} panicked", task.id());
                }

                let mut active = lock(&worker_active);
                active.retain(|t| t.id() != task.id());
                if active.is_empty() {
                    worker_idle.notify_waiters();
                }
            }
            tracing::debug!("Task queue closed");
        });

        Self {
            sender,
            active,
            idle,
            worker,
        }
    }

    /// Queue a task. `on_complete` runs on the worker once the task is
    /// finished and before the next task starts, including when the task was
    /// cancelled; it must check [`CheckTask::was_cancelled`] before using the
    /// result. A panicking callback is logged and the queue keeps going.
    pub fn submit<F>(&self, task: CheckTask, on_complete: F) -> Arc<CheckTask>
    where
        F: FnOnce(&CheckTask) + Send + 'static,
    {
        let task = Arc::new(task);
        lock(&self.active).push(Arc::clone(&task));

        let job = Job {
            task: Arc::clone(&task),
            on_complete: Box::new(on_complete),
        };
        if self.sender.send(job).is_err() {
            // Worker is gone; nothing will ever run this task.
            tracing::warn!("Task queue is closed, dropping task {}", task.id());
            task.cancel();
            lock(&self.active).retain(|t| t.id() != task.id());
        }

        task
    }

    /// Cancel every task that hasn't finished. Returns how many were flagged.
    ///
    /// Does not wait: a task already running completes its current evaluation
    /// and is then reported as cancelled.
    pub fn cancel_all(&self) -> usize {
        let active = lock(&self.active);
        for task in active.iter() {
            task.cancel();
        }
        tracing::info!("Cancelled {} queued checks", active.len());
        active.len()
    }

    /// Number of submitted tasks whose completion callback hasn't run yet
    pub fn pending(&self) -> usize {
        lock(&self.active).len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Wait until every submitted task has finished and its completion
    /// callback has run.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

fn lock(active: &Mutex<Vec<Arc<CheckTask>>>) -> MutexGuard<'_, Vec<Arc<CheckTask>>> {
    active.lock().unwrap_or_else(|e| e.into_inner())
}
