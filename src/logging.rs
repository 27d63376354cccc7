use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;

/// Directory the log file lives in: `~/.local/share/pedalsyncrs/logs`.
pub fn log_directory() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("pedalsyncrs")
        .join("logs"))
}

/// Logs everything from Debug up to the log file, and warnings to stderr.
/// Returns the log file path. Fails if a logger is already installed.
pub fn init_logger() -> Result<PathBuf, Error> {
    let log_dir = log_directory()?;

    // Create the log directory if it doesn't exist
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("app.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_time_format_rfc3339()
        .build();

    CombinedLogger::init(vec![
        WriteLogger::new(LevelFilter::Debug, config.clone(), log_file),
        TermLogger::new(
            LevelFilter::Warn,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    ])
    .map_err(|e| Error::new(ErrorKind::Other, e))?;

    Ok(log_path)
}
