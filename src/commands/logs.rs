use colored::Colorize;
use mundane::clap::{Arg, ArgAction, ArgMatches};
use mundane::log_mgr::{self, LogFiles};
use mundane::{App, CommandResult, Hooks};
use std::error::Error;
use std::fs;

pub struct LogCommands;

impl Hooks for LogCommands {
    fn declare_commands(&self, app: &mut App) -> Result<(), Box<dyn Error>> {
        app.register_command(mundane::command!(
            /// Show where a program's log files are written.
            ///
            /// Prints the stable link that points at the newest log, the
            /// timestamped file a run started now would write to, and where
            /// the link currently points.
            log_paths
        ))
        .add(
            Arg::new("prog")
                .long("prog")
                .value_name("NAME")
                .help("Program name or path (default: mundane)"),
        )
        .add(
            Arg::new("strip-extension")
                .long("strip-extension")
                .action(ArgAction::SetTrue)
                .help("Drop the extension from NAME like the standalone bootstrap does"),
        );
        Ok(())
    }
}

fn log_paths(matches: &ArgMatches) -> CommandResult {
    let prog = matches
        .get_one::<String>("prog")
        .map_or("mundane", String::as_str);
    let program = log_mgr::program_name(prog, matches.get_flag("strip-extension"));
    let files = LogFiles::for_process(&program);

    println!("{} {}", "latest: ".bold(), files.latest().display());
    println!("{} {}", "current:".bold(), files.current().display());
    match fs::read_link(files.latest()) {
        Ok(target) => println!("{} {}", "links to:".bold(), target.display()),
        Err(err) => log::info!("No link at {}: {}", files.latest().display(), err),
    }
    Ok(0)
}
