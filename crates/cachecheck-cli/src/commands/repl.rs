//! Commands accepted at the interactive `cachecheck>` prompt.

/// Help text printed for `help` and on unknown input
pub const HELP: &str = "\
Commands:
  go <url>        Load a page (https:// is added when missing)
  read            Read the found logs from the loaded geocache listing
  list            Show the loggers and their challenge status
  check <n>       Check logger number <n> on the loaded challenge checker
  check all       Check every logger, one after the other
  cancel          Cancel all queued checks
  log <n>         Open the log written by logger <n>
  message <n>     Open a message center conversation with logger <n>
  wait [secs]     Show or set the checker waiting time
  console         Show the operational console
  url             Show the loaded page
  help            Show this help
  quit            Close the browser and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Go(String),
    Read,
    List,
    /// 1-based table row
    Check(usize),
    CheckAll,
    Cancel,
    OpenLog(usize),
    Message(usize),
    Wait(Option<f64>),
    Console,
    Url,
    Help,
    Quit,
}

impl ReplCommand {
    /// Parse one input line. Returns `Ok(None)` for blank input.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(None);
        };
        let argument = words.next();
        if words.next().is_some() {
            return Err(format!("Too many arguments for '{}'", command));
        }

        let command = match (command.to_lowercase().as_str(), argument) {
            ("go", Some(url)) => ReplCommand::Go(url.to_string()),
            ("go", None) => return Err("Usage: go <url>".to_string()),
            ("read", None) => ReplCommand::Read,
            ("list" | "ls", None) => ReplCommand::List,
            ("check", Some(arg)) if arg.eq_ignore_ascii_case("all") => ReplCommand::CheckAll,
            ("check", arg) => ReplCommand::Check(row(arg, "check")?),
            ("cancel", None) => ReplCommand::Cancel,
            ("log", arg) => ReplCommand::OpenLog(row(arg, "log")?),
            ("message" | "msg", arg) => ReplCommand::Message(row(arg, "message")?),
            ("wait", None) => ReplCommand::Wait(None),
            ("wait", Some(secs)) => ReplCommand::Wait(Some(
                secs.parse()
                    .map_err(|_| format!("Not a number of seconds: {}", secs))?,
            )),
            ("console", None) => ReplCommand::Console,
            ("url", None) => ReplCommand::Url,
            ("help" | "?", None) => ReplCommand::Help,
            ("quit" | "exit" | "q", None) => ReplCommand::Quit,
            (other, Some(_)) if is_known(other) => {
                return Err(format!("'{}' takes no argument", other));
            }
            (other, _) => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };

        Ok(Some(command))
    }
}

fn is_known(command: &str) -> bool {
    matches!(
        command,
        "read" | "list" | "ls" | "cancel" | "console" | "url" | "help" | "?" | "quit" | "exit" | "q"
    )
}

fn row(argument: Option<&str>, command: &str) -> Result<usize, String> {
    let usage = || format!("Usage: {} <n> (row number from 'list')", command);
    let n: usize = argument.ok_or_else(usage)?.parse().map_err(|_| usage())?;
    if n == 0 {
        return Err(usage());
    }
    Ok(n)
}
