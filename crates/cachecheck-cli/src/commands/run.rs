//! Interactive session: launch Chrome, attach to it and drive the listing
//! and checker pages from a prompt.

use super::repl::{HELP, ReplCommand};
use anyhow::{Result, anyhow};
use cachecheck_browser::{
    CheckSession, ChromeFinder, ChromeLauncher, ChromeSurface, ProfileManager, SessionEvent,
};
use cachecheck_core::settings::presets_list;
use cachecheck_core::{Console, LogRecord, Settings};
use console::style;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

pub struct RunOptions {
    pub chrome_path: Option<PathBuf>,
    pub url: Option<String>,
    pub profile: Option<String>,
    pub temp: bool,
    pub port: u16,
}

pub fn execute(options: RunOptions) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(run(options));

    // The stdin reader is a blocking task; don't wait for it
    runtime.shutdown_timeout(std::time::Duration::from_millis(100));

    result
}

async fn run(options: RunOptions) -> Result<()> {
    println!("🔍 Locating Chrome...");
    let chrome_binary = ChromeFinder::new(options.chrome_path).find()?;
    println!("✅ Found Chrome at: {}", chrome_binary.display());

    let profile = if options.temp {
        if options.profile.is_some() {
            println!("⚠️  --temp given, ignoring --profile");
        }
        println!("📁 Using temporary profile");
        ProfileManager::temporary()?
    } else {
        let name = options.profile.as_deref().unwrap_or("default");
        let profile = ProfileManager::named(name)?;
        println!("📁 Using profile: {}", profile.path().display());
        profile
    };

    let launcher = ChromeLauncher::new(chrome_binary, profile.path().to_path_buf(), options.url)
        .with_debugging_port(options.port);

    println!("🚀 Launching Chrome...");
    let mut chrome = launcher.launch()?;

    let surface = match ChromeSurface::connect(launcher.debugging_port()).await {
        Ok(surface) => surface,
        Err(e) => {
            if let Err(kill_err) = chrome.kill() {
                tracing::debug!("Chrome already gone: {}", kill_err);
            }
            return Err(e.into());
        }
    };
    println!("✅ Chrome started successfully");

    let console = Console::with_sink(std::io::stdout());
    let session = CheckSession::new(Arc::new(surface), console, Settings::load());

    let printer = tokio::spawn(print_events(session.subscribe()));

    println!();
    println!("{}", HELP);
    let outcome = prompt_loop(&session).await;

    session.cancel_all();
    printer.abort();

    println!("🛑 Closing Chrome...");
    if let Err(e) = chrome.kill() {
        tracing::debug!("Chrome already gone: {}", e);
    }
    if let Err(e) = chrome.wait() {
        tracing::debug!("Failed to reap Chrome: {}", e);
    }
    drop(profile);

    outcome
}

async fn prompt_loop(session: &CheckSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("cachecheck> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let command = match ReplCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", style(message).yellow());
                continue;
            }
        };

        if command == ReplCommand::Quit {
            return Ok(());
        }

        // Failures are already on the console or get reported here; the
        // session stays usable either way.
        if let Err(e) = handle(session, command).await {
            println!("{}", style(e).red());
        }
    }
}

async fn handle(session: &CheckSession, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::Go(url) => session.navigate(&url).await?,
        ReplCommand::Read => {
            let count = session.extract().await?;
            if count == 0 {
                println!("No found logs read. Is a geocache listing loaded?");
            }
        }
        ReplCommand::List => print!("{}", render_table(&session.records())),
        ReplCommand::Check(row) => {
            let record = record_at(session, row)?;
            if !session.check_one(&record.identity_id).await? {
                println!("Load a project-gc challenge checker first.");
            }
        }
        ReplCommand::CheckAll => {
            if session.is_batch_running() {
                println!("A batch is already running. Use 'cancel' to stop it.");
            } else if !session.check_all().await? {
                println!("Nothing to check. Read logs and load a challenge checker first.");
            }
        }
        ReplCommand::Cancel => {
            let cancelled = session.cancel_all();
            println!("Cancelled {} checks", cancelled);
        }
        ReplCommand::OpenLog(row) => {
            let record = record_at(session, row)?;
            session.open_log(&record.identity_id).await?;
        }
        ReplCommand::Message(row) => {
            let record = record_at(session, row)?;
            session.message_user(&record.identity_id).await?;
        }
        ReplCommand::Wait(None) => {
            println!(
                "Checker waiting time: {}s (choices: {})",
                session.settings().checker_waiting_time,
                presets_list()
            );
        }
        ReplCommand::Wait(Some(seconds)) => {
            session.set_waiting_time(seconds)?;
            let path = session.settings().save()?;
            tracing::debug!("Saved waiting time to {}", path.display());
            println!("Checker waiting time set to {}s", seconds);
        }
        ReplCommand::Console => {
            for line in session.console().lines() {
                println!("{}", line);
            }
        }
        ReplCommand::Url => match session.current_url().await? {
            Some(url) => println!("{}", url),
            None => println!("No page loaded"),
        },
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit => {}
    }
    Ok(())
}

fn record_at(session: &CheckSession, row: usize) -> Result<LogRecord> {
    session
        .results()
        .get_index(row - 1)
        .ok_or_else(|| anyhow!("No logger in row {} ({} rows)", row, session.results().len()))
}

async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => println!("{}", describe(&event)),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::debug!("Event printer missed {} events", missed);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::RecordsReplaced(count) => {
            format!("📋 Read {} found logs. Type 'list' to show them.", count)
        }
        SessionEvent::RecordUpdated(record) => match record.challenge_result {
            Some(true) => format!("{} {} fulfils the challenge", style("✓").green(), record.display_name),
            Some(false) => format!("{} {} does not fulfil the challenge", style("✗").red(), record.display_name),
            None => format!("? {} could not be checked", record.display_name),
        },
        SessionEvent::BatchStarted(count) => format!("⏳ Checking {} loggers...", count),
        SessionEvent::BatchFinished => "✅ All loggers checked".to_string(),
        SessionEvent::BatchCancelled => "❌ Checks cancelled".to_string(),
    }
}

/// Numbered table of loggers with their status marker
pub fn render_table(records: &[LogRecord]) -> String {
    if records.is_empty() {
        return "No loggers. Load a geocache listing and type 'read'.\n".to_string();
    }

    let width = records
        .iter()
        .map(|r| r.display_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Logger".len());

    let mut output = format!("{:>3}  {}  {:<width$}  {}\n", "#", " ", "Logger", "Log", width = width);
    for (index, record) in records.iter().enumerate() {
        let marker = match record.challenge_result {
            Some(true) => style(record.status_marker()).green().to_string(),
            Some(false) => style(record.status_marker()).red().to_string(),
            None => record.status_marker().to_string(),
        };
        output.push_str(&format!(
            "{:>3}  {}  {:<width$}  {}\n",
            index + 1,
            marker,
            record.display_name,
            record.log_url,
            width = width
        ));
    }
    output
}
