use crate::OutputFormat;
use anyhow::Result;
use cachecheck_core::Settings;
use cachecheck_core::settings::{WAITING_TIME_PRESETS, presets_list};
use console::style;
use std::path::Path;

/// Print the stored settings
pub fn show(format: OutputFormat) -> Result<()> {
    let path = Settings::default_path()?;
    let settings = Settings::load_from(&path);
    print!("{}", render(&settings, &path, format)?);
    Ok(())
}

/// Persist a new checker waiting time
pub fn set_wait(seconds: f64) -> Result<()> {
    let path = Settings::default_path()?;
    let mut settings = Settings::load_from(&path);
    settings.set_waiting_time(seconds)?;
    settings.save_to(&path)?;

    println!("Checker waiting time set to {}s", seconds);
    Ok(())
}

/// Restore default settings
pub fn reset() -> Result<()> {
    let path = Settings::default_path()?;
    Settings::default().save_to(&path)?;

    println!("Settings reset to defaults");
    Ok(())
}

fn render(settings: &Settings, path: &Path, format: OutputFormat) -> Result<String> {
    let output = match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "path": path.display().to_string(),
                "checkerWaitingTime": settings.checker_waiting_time,
                "presets": WAITING_TIME_PRESETS,
            });
            format!("{}\n", serde_json::to_string_pretty(&value)?)
        }
        OutputFormat::Pretty => format!(
            "{}\n  File: {}\n  Checker waiting time: {}s\n  Choices: {}\n",
            style("cachecheck settings").bold().cyan(),
            path.display(),
            settings.checker_waiting_time,
            presets_list()
        ),
    };
    Ok(output)
}

/// clap value parser accepting only preset waiting times
pub fn parse_waiting_time(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;

    if cachecheck_core::settings::is_preset(seconds) {
        Ok(seconds)
    } else {
        Err(format!("choose one of: {}", presets_list()))
    }
}
