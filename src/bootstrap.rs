//! Startup defaults for a program with a single parser.
//!
//! ```no_run
//! use mundane::clap::Arg;
//!
//! fn main() {
//!     let code = mundane::bootstrap::run(|parser| {
//!         let matches = parser
//!             .arg(Arg::new("name").long("name").default_value("world"))
//!             .try_get_matches()?;
//!         println!("hello {}", matches.get_one::<String>("name").unwrap());
//!         Ok(0)
//!     });
//!     std::process::exit(code.unwrap_or(1));
//! }
//! ```

use crate::app::{help_flag, CommandResult, GLOBAL_FLAGS};
use crate::log_mgr::{self, LogFiles, LogManager};
use crate::system;
use clap::Command;
use log::LevelFilter;

/// Parser with `-h/--help` and `-L/--loglevel` for `program`.
pub fn parser(program: &str) -> Command {
    Command::new(program.to_string())
        .disable_help_flag(true)
        .arg(help_flag())
        .arg(log_mgr::loglevel_flag().help_heading(GLOBAL_FLAGS))
}

/// Log to a per-run file at `Info`, then hand a parser to `handler`.
///
/// The program name is `argv[0]` without directory or extension.
pub fn run<F>(handler: F) -> CommandResult
where
    F: FnOnce(Command) -> CommandResult,
{
    let argv0 = std::env::args_os()
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_default();
    let program = log_mgr::program_name(&argv0, true);
    let manager = LogManager::new(LogFiles::for_process(&program), LevelFilter::Info);
    run_with(&manager, &program, handler)
}

pub fn run_with<F>(manager: &LogManager, program: &str, handler: F) -> CommandResult
where
    F: FnOnce(Command) -> CommandResult,
{
    manager.initialize()?;
    log::info!("Started.");

    let ret = handler(parser(program))?;
    log::info!("Max memory used: {}", system::max_memory_used());
    log::info!("Finished. ({})", ret);
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::Arg;

    #[test]
    fn help_is_available() {
        let err = parser("tool")
            .try_get_matches_from(["tool", "--help"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let help = parser("tool").render_help().to_string();
        assert!(help.contains("Global flags:"), "{}", help);
        assert!(help.contains("--loglevel"), "{}", help);
    }

    #[test]
    fn only_known_levels_are_accepted() {
        let err = parser("tool")
            .try_get_matches_from(["tool", "-L", "trace"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn handlers_extend_the_parser() {
        let matches = parser("tool")
            .arg(Arg::new("name").long("name"))
            .try_get_matches_from(["tool", "--name", "ada"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("name").map(String::as_str), Some("ada"));
        assert!(!matches.contains_id("loglevel"));
    }
}
