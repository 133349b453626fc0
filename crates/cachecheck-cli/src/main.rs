use anyhow::Result;
use cachecheck_browser::DEFAULT_DEBUGGING_PORT;
use cachecheck_cli::OutputFormat;
use cachecheck_cli::commands;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cachecheck")]
#[command(author, version)]
#[command(
    about = "Check the finders of a challenge cache against a project-gc challenge checker",
    long_about = "cachecheck reads the \"found it\" logs of a geocache listing in a Chrome window \
                  and runs every finder through a project-gc.com challenge checker, one at a time, \
                  recording who fulfils the challenge."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch Chrome and start an interactive check session
    Run {
        /// Path to the Chrome binary
        #[arg(long, value_name = "PATH")]
        chrome_path: Option<PathBuf>,

        /// Page to open first (defaults to geocaching.com)
        #[arg(long)]
        url: Option<String>,

        /// Named Chrome profile to keep logins between runs
        #[arg(long)]
        profile: Option<String>,

        /// Use a temporary profile that is deleted on exit
        #[arg(long)]
        temp: bool,

        /// Remote debugging port for Chrome
        #[arg(long, default_value_t = DEFAULT_DEBUGGING_PORT)]
        port: u16,
    },

    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the stored settings
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Set how long the checker gets before its result is read
    SetWait {
        /// Seconds (2, 5, 10, 15, 20, 30, 40, 45, 60, 65 or 70)
        #[arg(value_name = "SECONDS", value_parser = commands::config::parse_waiting_time)]
        seconds: f64,
    },

    /// Restore default settings
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            chrome_path,
            url,
            profile,
            temp,
            port,
        } => commands::run::execute(commands::run::RunOptions {
            chrome_path,
            url,
            profile,
            temp,
            port,
        }),
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(format),
            ConfigAction::SetWait { seconds } => commands::config::set_wait(seconds),
            ConfigAction::Reset => commands::config::reset(),
        },
        Commands::Completion { shell } => commands::completion::execute(shell, &mut Cli::command()),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("cachecheck=debug,cachecheck_core=debug,cachecheck_browser=debug")
    } else {
        EnvFilter::new("cachecheck=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
