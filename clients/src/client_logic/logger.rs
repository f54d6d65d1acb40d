//! # Logging
//!
//! Each run of a binary gets its own timestamped file in the log directory.
//! Lines the Abacus server pushes on its log channel arrive under
//! [`SERVER_LOG_TARGET`] and, when asked for, are kept in a second file so
//! they do not interleave with the client's own trace.
//!
//! The interactive client owns stdout for its console, so it only copies
//! warnings and errors to stderr. The standings board has no console and
//! echoes everything to stdout.
//!
//! Only the newest file of each kind survives a restart.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use lib_abacus::client::SERVER_LOG_TARGET;

/// Where log lines are echoed besides the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// Everything at the configured level, on stdout.
    Stdout,
    /// Warnings and errors only, on stderr.
    StderrWarnings,
}

/// How one binary logs.
#[derive(Debug, Clone)]
pub struct LogSetup<'a> {
    /// Prefix of the log file names.
    pub app_name: &'a str,
    /// Directory the files are written to.
    pub log_dir: &'a Path,
    /// Level name from the configuration.
    pub level: &'a str,
    /// Console echo.
    pub echo: Echo,
    /// Keep server log-channel lines in their own file.
    pub server_log: bool,
}

/// The two kinds of file a run can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogKind {
    Client,
    Server,
}

fn file_prefix(app_name: &str, kind: LogKind) -> String {
    match kind {
        LogKind::Client => format!("{}_", app_name),
        LogKind::Server => format!("{}_server_", app_name),
    }
}

fn kind_of(file_name: &str, app_name: &str) -> Option<LogKind> {
    if !file_name.ends_with(".log") {
        return None;
    }
    if file_name.starts_with(&file_prefix(app_name, LogKind::Server)) {
        Some(LogKind::Server)
    } else if file_name.starts_with(&file_prefix(app_name, LogKind::Client)) {
        Some(LogKind::Client)
    } else {
        None
    }
}

fn is_server_line(metadata: &log::Metadata<'_>) -> bool {
    metadata.target() == SERVER_LOG_TARGET
}

/// Installs the global logger.
pub fn setup_logging(setup: &LogSetup<'_>) -> Result<()> {
    fs::create_dir_all(setup.log_dir)?;
    cleanup_old_logs(setup.log_dir, setup.app_name)?;

    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let file_for = |kind: LogKind| -> PathBuf {
        setup
            .log_dir
            .join(format!("{}{}.log", file_prefix(setup.app_name, kind), stamp))
    };

    let own_lines = fern::Dispatch::new()
        .filter(|m| !is_server_line(m))
        .chain(fern::log_file(file_for(LogKind::Client))?);

    let echo = match setup.echo {
        Echo::Stdout => fern::Dispatch::new()
            .filter(|m| !is_server_line(m))
            .chain(std::io::stdout()),
        Echo::StderrWarnings => fern::Dispatch::new()
            .level(log::LevelFilter::Warn)
            .chain(std::io::stderr()),
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_filter(setup.level))
        .chain(own_lines)
        .chain(echo);

    if setup.server_log {
        // The server decides what it sends; keep all of it.
        dispatch = dispatch
            .level_for(SERVER_LOG_TARGET, log::LevelFilter::Trace)
            .chain(
                fern::Dispatch::new()
                    .filter(is_server_line)
                    .chain(fern::log_file(file_for(LogKind::Server))?),
            );
    }

    dispatch.apply()?;
    Ok(())
}

/// Maps a configured level name, defaulting to info.
pub fn level_filter(log_level: &str) -> log::LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}

/// Deletes all but the newest client log and the newest server log of
/// `app_name`. Files of other binaries sharing the directory are left alone.
pub fn cleanup_old_logs(log_dir: &Path, app_name: &str) -> Result<()> {
    let mut files: Vec<(LogKind, SystemTime, PathBuf)> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .filter_map(|e| {
            let kind = kind_of(&e.file_name().to_string_lossy(), app_name)?;
            let modified = e.metadata().and_then(|m| m.modified()).ok()?;
            Some((kind, modified, e.path()))
        })
        .collect();

    files.sort_by(|a, b| b.1.cmp(&a.1));

    for kind in [LogKind::Client, LogKind::Server] {
        for (_, _, path) in files.iter().filter(|f| f.0 == kind).skip(1) {
            if let Err(e) = fs::remove_file(path) {
                eprintln!("Failed to delete old log file {:?}: {}", path, e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn classifies_file_names() {
        assert_eq!(kind_of("abacus_client_2024.log", "abacus_client"), Some(LogKind::Client));
        assert_eq!(kind_of("abacus_client_server_2024.log", "abacus_client"), Some(LogKind::Server));
        assert_eq!(kind_of("abacus_client_2024.txt", "abacus_client"), None);
        assert_eq!(kind_of("standings_board_2024.log", "abacus_client"), None);
    }

    #[test]
    fn keeps_newest_log_of_each_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name);
        fs::write(path("abacus_client_1.log"), "old").unwrap();
        fs::write(path("abacus_client_server_1.log"), "old").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        fs::write(path("abacus_client_2.log"), "new").unwrap();
        fs::write(path("abacus_client_server_2.log"), "new").unwrap();
        fs::write(path("standings_board_1.log"), "other").unwrap();

        cleanup_old_logs(dir.path(), "abacus_client").unwrap();
        assert!(!path("abacus_client_1.log").exists());
        assert!(!path("abacus_client_server_1.log").exists());
        assert!(path("abacus_client_2.log").exists());
        assert!(path("abacus_client_server_2.log").exists());
        assert!(path("standings_board_1.log").exists());
    }

    #[test]
    fn unknown_level_is_info() {
        assert_eq!(level_filter("DEBUG"), log::LevelFilter::Debug);
        assert_eq!(level_filter("fatal"), log::LevelFilter::Info);
    }
}
