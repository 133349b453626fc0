mod common;

use cachecheck_browser::{CheckTask, Error, LogExtractor, TaskQueue, TaskState};
use cachecheck_core::{Console, LogKind, LogRecord};
use common::{log_table, FakeSurface, CHECKER_URL, LISTING_URL};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn record(name: &str, id: &str) -> LogRecord {
    LogRecord::new(name, id, LogKind::Found, format!("https://log/{}", id))
}

async fn wait_for_state(task: &CheckTask, state: TaskState) {
    while task.state() != state {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test]
async fn test_extract_filters_found_logs_in_order() {
    let surface = FakeSurface::new(LISTING_URL);
    surface.set_log_table(&log_table(&[
        ("Ann", "1", 2),
        ("Bo", "2", 3),
        ("Cy", "3", 2),
        ("Dee", "4", 46),
    ]));

    let records = LogExtractor::extract(&surface).await.unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.identity_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[tokio::test]
async fn test_extract_off_listing_page_is_noop() {
    let surface = FakeSurface::new("https://www.geocaching.com/play/search");
    surface.set_log_table(&log_table(&[("Ann", "1", 2)]));

    let records = LogExtractor::extract(&surface).await.unwrap();

    assert!(records.is_empty());
    assert!(surface.evaluations().is_empty());
}

#[tokio::test]
async fn test_extract_reports_script_error() {
    let surface = FakeSurface::new(LISTING_URL);
    surface.fail_log_table("TypeError: null is not an object");

    let err = LogExtractor::extract(&surface).await.unwrap_err();
    assert!(matches!(err, Error::Script(ref m) if m.contains("TypeError")));
}

#[tokio::test]
async fn test_extract_reports_malformed_json() {
    let surface = FakeSurface::new(LISTING_URL);
    surface.set_log_table("[{\"name\": \"Ann\"");

    let err = LogExtractor::extract(&surface).await.unwrap_err();
    assert!(matches!(err, Error::Extract(_)));
}

#[tokio::test]
async fn test_task_classifies_status() {
    let surface = FakeSurface::new(CHECKER_URL);
    surface.set_status("Ann", "display:none");
    surface.set_status("Cy", "display:block");
    let console = Console::new();

    let ann = CheckTask::new(record("Ann", "1"), Duration::ZERO);
    ann.start(&surface, &console).await;
    let cy = CheckTask::new(record("Cy", "3"), Duration::ZERO);
    cy.start(&surface, &console).await;

    assert_eq!(ann.state(), TaskState::Finished);
    assert_eq!(ann.record().challenge_result, Some(false));
    assert_eq!(cy.record().challenge_result, Some(true));
    assert_eq!(surface.evaluations(), vec!["fill:Ann", "read:Ann", "fill:Cy", "read:Cy"]);
    assert!(console.is_empty());
}

#[tokio::test]
async fn test_task_off_checker_page_leaves_result_unset() {
    let surface = FakeSurface::new(LISTING_URL);
    let console = Console::new();

    let task = CheckTask::new(record("Ann", "1"), Duration::ZERO);
    task.start(&surface, &console).await;

    assert_eq!(task.state(), TaskState::Finished);
    assert_eq!(task.record().challenge_result, None);
    assert!(surface.evaluations().is_empty());
    assert!(console.is_empty());
}

#[tokio::test]
async fn test_task_fill_error_is_logged_and_not_retried() {
    let surface = FakeSurface::new(CHECKER_URL);
    surface.fail_fill_for("Ann");
    let console = Console::new();

    let task = CheckTask::new(record("Ann", "1"), Duration::ZERO);
    task.start(&surface, &console).await;

    assert_eq!(task.state(), TaskState::Finished);
    assert_eq!(task.record().challenge_result, None);
    assert_eq!(surface.evaluations(), vec!["fill:Ann"]);

    let lines = console.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Checking Ann failed"));
}

#[tokio::test]
async fn test_task_missing_style_leaves_result_unset() {
    let surface = FakeSurface::new(CHECKER_URL);
    let task = CheckTask::new(record("Ann", "1"), Duration::ZERO);

    task.start(&surface, &Console::new()).await;

    assert_eq!(task.record().challenge_result, None);
}

#[tokio::test]
async fn test_task_cancelled_before_start_never_runs() {
    let surface = FakeSurface::new(CHECKER_URL);
    let task = CheckTask::new(record("Ann", "1"), Duration::ZERO);
    task.cancel();

    task.start(&surface, &Console::new()).await;

    assert_eq!(task.state(), TaskState::Finished);
    assert!(task.was_cancelled());
    assert!(surface.evaluations().is_empty());
}

#[tokio::test]
async fn test_queue_runs_tasks_one_at_a_time_in_order() {
    let surface = Arc::new(FakeSurface::with_eval_delay(CHECKER_URL, Duration::from_millis(5)));
    for name in ["T1", "T2", "T3"] {
        surface.set_status(name, "display: block;");
    }
    let queue = TaskQueue::new(surface.clone(), Console::new());

    let completed = Arc::new(Mutex::new(Vec::new()));
    let mut tasks = Vec::new();
    for (name, id) in [("T1", "1"), ("T2", "2"), ("T3", "3")] {
        let completed = Arc::clone(&completed);
        let task = queue.submit(
            CheckTask::new(record(name, id), Duration::from_millis(5)),
            move |task| completed.lock().unwrap().push(task.record().display_name),
        );
        tasks.push(task);
    }

    queue.wait_idle().await;

    assert_eq!(*completed.lock().unwrap(), vec!["T1", "T2", "T3"]);
    assert_eq!(
        surface.evaluations(),
        vec!["fill:T1", "read:T1", "fill:T2", "read:T2", "fill:T3", "read:T3"]
    );
    assert_eq!(surface.max_in_flight(), 1);
    assert!(tasks.iter().all(|t| t.is_finished()));
    assert!(queue.is_idle());
}

#[tokio::test]
async fn test_queue_cancel_all_skips_waiting_tasks() {
    let surface = Arc::new(FakeSurface::new(CHECKER_URL));
    for name in ["A", "B", "C"] {
        surface.set_status(name, "display: block;");
    }
    let queue = TaskQueue::new(surface.clone(), Console::new());

    let applied = Arc::new(Mutex::new(Vec::new()));
    let mut tasks = Vec::new();
    for (name, id) in [("A", "1"), ("B", "2"), ("C", "3")] {
        let applied = Arc::clone(&applied);
        let task = queue.submit(
            CheckTask::new(record(name, id), Duration::from_millis(100)),
            move |task| {
                if !task.was_cancelled() {
                    applied.lock().unwrap().push(task.record().display_name);
                }
            },
        );
        tasks.push(task);
    }

    wait_for_state(&tasks[0], TaskState::Running).await;
    assert_eq!(queue.cancel_all(), 3);

    queue.wait_idle().await;

    // The running task finishes its evaluation, the others never start
    assert_eq!(surface.evaluations(), vec!["fill:A", "read:A"]);
    assert!(applied.lock().unwrap().is_empty());
    assert!(tasks.iter().all(|t| t.was_cancelled() && t.is_finished()));
}

#[tokio::test]
async fn test_queue_failed_task_does_not_block_siblings() {
    let surface = Arc::new(FakeSurface::new(CHECKER_URL));
    surface.fail_fill_for("A");
    surface.set_status("B", "display: none;");
    let console = Console::new();
    let queue = TaskQueue::new(surface.clone(), console.clone());

    let a = queue.submit(CheckTask::new(record("A", "1"), Duration::ZERO), |_| {});
    let b = queue.submit(CheckTask::new(record("B", "2"), Duration::ZERO), |_| {});
    queue.wait_idle().await;

    assert_eq!(a.record().challenge_result, None);
    assert_eq!(a.outcome(), None);
    assert_eq!(b.record().challenge_result, Some(false));
    assert_eq!(b.outcome(), Some(false));
    assert_eq!(console.len(), 1);
}

#[tokio::test]
async fn test_queue_survives_panicking_callback() {
    let surface = Arc::new(FakeSurface::new(CHECKER_URL));
    surface.set_status("B", "display: block;");
    let queue = TaskQueue::new(surface.clone(), Console::new());

    queue.submit(CheckTask::new(record("A", "1"), Duration::ZERO), |_| {
        panic!("callback failure");
    });
    queue.wait_idle().await;
    assert!(queue.is_idle());

    let b = queue.submit(CheckTask::new(record("B", "2"), Duration::ZERO), |_| {});
    b.wait_finished().await;
    queue.wait_idle().await;

    assert_eq!(b.outcome(), Some(true));
    assert!(queue.is_idle());
}

#[tokio::test]
async fn test_task_wait_finished() {
    let surface = Arc::new(FakeSurface::new(CHECKER_URL));
    surface.set_status("A", "display: block;");
    let queue = TaskQueue::new(surface, Console::new());

    let task = queue.submit(CheckTask::new(record("A", "1"), Duration::from_millis(10)), |_| {});
    task.wait_finished().await;

    assert_eq!(task.record().challenge_result, Some(true));
}
