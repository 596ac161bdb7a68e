//! Per-run log files and the flag that tunes the log level.
//!
//! Every run logs to `{tmp}/{prog}.log.{host}.{user}.{YYYYMMDD-HHMMSS}.{pid}`
//! and `{tmp}/{prog}.log` is pointed at the newest of those files.

use crate::app::{App, Hooks};
use chrono::{Local, NaiveDateTime};
use clap::builder::{EnumValueParser, PossibleValuesParser, TypedValueParser};
use clap::{Arg, ValueEnum};
use log::{LevelFilter, Record};
use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Names accepted by `--log-level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[value(alias = "warning")]
    Warn,
    #[value(alias = "critical")]
    Error,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }

    /// Make this the process wide minimum level.
    pub fn activate(self) -> Self {
        log::set_max_level(self.filter());
        self
    }
}

/// `-L/--log-level`. The level changes while the flag is parsed.
pub fn log_level_flag() -> Arg {
    Arg::new("log-level")
        .short('L')
        .long("log-level")
        .help("Minimal log level")
        .ignore_case(true)
        .value_parser(EnumValueParser::<LogLevel>::new().map(LogLevel::activate))
}

/// `-L/--loglevel` as offered by the standalone bootstrap.
pub(crate) fn loglevel_flag() -> Arg {
    Arg::new("loglevel")
        .short('L')
        .long("loglevel")
        .help("Log level")
        .value_parser(
            PossibleValuesParser::new(["debug", "info", "warning", "error"]).map(|name| {
                let level = match name.as_str() {
                    "debug" => LogLevel::Debug,
                    "info" => LogLevel::Info,
                    "warning" => LogLevel::Warn,
                    _ => LogLevel::Error,
                };
                level.activate()
            }),
        )
}

/// Program name used in log file names.
pub fn program_name(argv0: &str, strip_extension: bool) -> String {
    let path = Path::new(argv0);
    let name = if strip_extension {
        path.file_stem()
    } else {
        path.file_name()
    };
    name.map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "app".to_string())
}

/// The timestamped log file of one run and the stable link to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFiles {
    current: PathBuf,
    latest: PathBuf,
}

impl LogFiles {
    pub fn new(
        dir: &Path,
        program: &str,
        host: &str,
        user: &str,
        started: NaiveDateTime,
        pid: u32,
    ) -> Self {
        let short = format!("{}.log", program);
        let long = format!(
            "{}.{}.{}.{}.{}",
            short,
            host,
            user,
            started.format("%Y%m%d-%H%M%S"),
            pid
        );
        Self {
            current: dir.join(long),
            latest: dir.join(short),
        }
    }

    /// Names for this process, in the temp directory.
    pub fn for_process(program: &str) -> Self {
        Self::new(
            &env::temp_dir(),
            program,
            &hostname(),
            &username(),
            Local::now().naive_local(),
            std::process::id(),
        )
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    pub fn latest(&self) -> &Path {
        &self.latest
    }

    /// Point `latest` at `current`. Best effort.
    pub fn link_latest(&self) {
        let _ = fs::remove_file(&self.latest);
        #[cfg(unix)]
        if let Err(err) = std::os::unix::fs::symlink(&self.current, &self.latest) {
            log::debug!("Could not link {}: {}", self.latest.display(), err);
        }
    }
}

/// Owns the log configuration of the process.
#[derive(Debug, Clone)]
pub struct LogManager {
    files: LogFiles,
    level: LevelFilter,
}

impl LogManager {
    pub fn new(files: LogFiles, level: LevelFilter) -> Self {
        Self { files, level }
    }

    /// Manager for a program, starting at `Warn`.
    pub fn for_program(program: &str) -> Self {
        Self::new(LogFiles::for_process(program), LevelFilter::Warn)
    }

    pub fn files(&self) -> &LogFiles {
        &self.files
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Send all log records to the timestamped file and refresh the link.
    ///
    /// Only the first logger of a process can be installed. Later calls keep
    /// it and only adjust the level.
    pub fn initialize(&self) -> Result<(), Box<dyn Error>> {
        let file = fern::log_file(self.files.current())?;
        let installed = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}{}",
                    prefix(record, Local::now().naive_local()),
                    message
                ))
            })
            .level(LevelFilter::Trace)
            .chain(file)
            .apply();
        log::set_max_level(self.level);
        if let Err(err) = installed {
            log::debug!("Keeping the existing logger: {}", err);
        }

        self.files.link_latest();
        log::debug!("Logging to {}", self.files.current().display());
        Ok(())
    }
}

impl Hooks for LogManager {
    fn declare_global_flags(&self, app: &mut App) -> Result<(), Box<dyn Error>> {
        app.global_flags().add(log_level_flag());
        Ok(())
    }
}

// `I2024-01-02 03:04:05,000: app.rs:12(mundane::app)] {mundane::app} `
fn prefix(record: &Record, now: NaiveDateTime) -> String {
    let file = record
        .file()
        .map(|file| {
            Path::new(file)
                .file_name()
                .map_or_else(|| file.to_string(), |name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "?".to_string());
    let level = record.level().as_str();

    format!(
        "{}{}: {}:{}({})] {{{}}} ",
        &level[..1],
        now.format(TIMESTAMP_FORMAT),
        file,
        record.line().unwrap_or(0),
        record.module_path().unwrap_or("?"),
        record.target()
    )
}

fn hostname() -> String {
    ::hostname::get()
        .map(|host| host.to_string_lossy().into_owned())
        .ok()
        .filter(|host| !host.is_empty())
        .or_else(|| env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(unix)]
fn username() -> String {
    // SAFETY: getpwuid returns null or a pointer to static storage that stays
    // valid until the next getpw* call, and the name is copied right away.
    unsafe {
        let passwd = libc::getpwuid(libc::getuid());
        if !passwd.is_null() && !(*passwd).pw_name.is_null() {
            return std::ffi::CStr::from_ptr((*passwd).pw_name)
                .to_string_lossy()
                .into_owned();
        }
    }
    env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(not(unix))]
fn username() -> String {
    env::var("USERNAME").unwrap_or_else(|_| "unknown".to_string())
}
