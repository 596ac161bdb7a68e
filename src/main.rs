use colored::Colorize;
use mundane::{App, Hooks};
use std::error::Error;
mod commands;

const ABOUT: &str = "mundane CLI

Reflow documentation text to the terminal width and locate the per-run log
files written by applications built with mundane.";

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(clap_err) => clap_err.exit(),
            Err(err) => {
                log::error!("{}", err);
                eprintln!("{} {}", "error:".red().bold(), err);
                1
            }
        },
    };
    std::process::exit(code);
}

fn run() -> Result<i32, Box<dyn Error>> {
    let mut app = App::builder("mundane")
        .description(ABOUT)
        .log_bootstrap(true)
        .configure(|cmd| cmd.version(env!("CARGO_PKG_VERSION")))
        .build()?;
    log::debug!("Starting mundane CLI...");

    let text = commands::text::TextCommands;
    let logs = commands::logs::LogCommands;
    let collaborators: [&dyn Hooks; 2] = [&text, &logs];

    app.register_global_flags(&collaborators)?;
    app.register_shared_flags(&collaborators)?;
    app.register_commands(&collaborators)?;

    app.run(std::env::args_os().skip(1))
}
