//! Phased registration of flags and commands on top of a `clap::Command`.
//!
//! An [`App`] is assembled in phases:
//!
//! * global flags, added by [`Hooks::declare_global_flags`]
//! * shared flag groups, created by [`Hooks::declare_shared_flags`]
//! * commands, registered by [`Hooks::declare_commands`]
//!
//! and finally [`App::run`] parses the arguments and calls the handler of the
//! selected command.
//!
//! ```no_run
//! use mundane::clap::{Arg, ArgMatches};
//! use mundane::{App, CommandResult, Hooks};
//! use std::error::Error;
//!
//! struct Db;
//!
//! impl Hooks for Db {
//!     fn declare_shared_flags(&self, app: &mut App) -> Result<(), Box<dyn Error>> {
//!         app.new_shared_group("db")
//!             .ok_or("someone already used \"db\" as a flag group name")?
//!             .add(Arg::new("dsn").long("dsn"));
//!         Ok(())
//!     }
//!
//!     fn declare_commands(&self, app: &mut App) -> Result<(), Box<dyn Error>> {
//!         let db = app.shared_group("db").ok_or("the \"db\" flags were not shared")?.clone();
//!         app.register_command(mundane::command!(
//!             /// Copy rows into the database.
//!             sync
//!         ).parent(&db));
//!         Ok(())
//!     }
//! }
//!
//! fn sync(matches: &ArgMatches) -> CommandResult {
//!     println!("Syncing to {:?}", matches.get_one::<String>("dsn"));
//!     Ok(0)
//! }
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let mut app = App::builder("nebulous").log_bootstrap(true).build()?;
//!     app.register_shared_flags(&[&Db])?;
//!     app.register_commands(&[&Db])?;
//!     std::process::exit(app.run(std::env::args_os().skip(1))?);
//! }
//! ```

use crate::docstring::Docstring;
use crate::log_mgr::{self, LogManager};
use crate::system;
use clap::{Arg, ArgAction, ArgMatches, Command};
use once_cell::unsync::OnceCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::error::Error;
use std::ffi::OsString;

/// Heading of the flags owned by the root parser.
pub const GLOBAL_FLAGS: &str = "Global flags";

/// Exit code returned when no command was selected (sysexits `EX_USAGE`).
pub const EX_USAGE: i32 = 64;

pub type CommandResult = Result<i32, Box<dyn Error>>;

/// Function invoked with the matches of the selected command.
pub type Handler = Box<dyn Fn(&ArgMatches) -> CommandResult>;

/// Registration hooks a collaborator may provide.
///
/// Every hook is optional; the defaults do nothing.
pub trait Hooks {
    /// Add flags to [`App::global_flags`].
    fn declare_global_flags(&self, _app: &mut App) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    /// Create flag groups with [`App::new_shared_group`].
    fn declare_shared_flags(&self, _app: &mut App) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    /// Register commands with [`App::register_command`].
    fn declare_commands(&self, _app: &mut App) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}

/// A named collection of flags.
#[derive(Debug, Clone, Default)]
pub struct FlagGroup {
    name: String,
    args: Vec<Arg>,
}

impl FlagGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, arg: Arg) -> &mut Self {
        self.args.push(arg);
        self
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }
}

/// Everything needed to register one command.
///
/// The command name comes from the handler identifier with underscores
/// turned into dashes, so `do_thing` becomes `do-thing`. Help text comes from
/// the documentation unless overridden.
pub struct Registration {
    ident: String,
    doc: String,
    handler: Handler,
    parents: Vec<Arg>,
    help: Option<String>,
    description: Option<String>,
    aliases: Vec<String>,
}

impl Registration {
    pub fn new<F>(ident: &str, doc: &str, handler: F) -> Self
    where
        F: Fn(&ArgMatches) -> CommandResult + 'static,
    {
        Self {
            ident: ident.to_string(),
            doc: doc.to_string(),
            handler: Box::new(handler),
            parents: Vec::new(),
            help: None,
            description: None,
            aliases: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        command_name(&self.ident)
    }

    /// Inherit every flag of `group`.
    pub fn parent(mut self, group: &FlagGroup) -> Self {
        self.parents.extend(group.args().iter().cloned());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Build a [`Registration`] from a handler path and the doc comments written
/// in front of it.
///
/// ```ignore
/// app.register_command(mundane::command!(
///     /// Print the status.
///     ///
///     /// Reads the state file and reports what changed.
///     print_status
/// ));
/// ```
#[macro_export]
macro_rules! command {
    ($(#[doc = $doc:literal])* $handler:path) => {
        $crate::Registration::new(
            stringify!($handler),
            concat!($($doc, "\n"),*),
            $handler,
        )
    };
}

/// Command name for a handler identifier: the last path segment with `_`
/// replaced by `-`.
pub fn command_name(ident: &str) -> String {
    ident
        .rsplit("::")
        .next()
        .unwrap_or(ident)
        .trim()
        .replace('_', "-")
}

struct CommandEntry {
    name: String,
    help: String,
    description: String,
    aliases: Vec<String>,
    flags: FlagGroup,
    handler: Handler,
}

pub struct App {
    root: Command,
    global_flags: FlagGroup,
    shared: HashMap<String, FlagGroup>,
    commands: Vec<CommandEntry>,
    width: OnceCell<usize>,
    log_manager: Option<LogManager>,
}

impl App {
    /// An application without log bootstrap or description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            root: root_command(name.into()),
            global_flags: FlagGroup::new(GLOBAL_FLAGS),
            shared: HashMap::new(),
            commands: Vec::new(),
            width: OnceCell::new(),
            log_manager: None,
        }
    }

    pub fn builder(name: impl Into<String>) -> AppBuilder {
        AppBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        self.root.get_name()
    }

    /// Width used to reflow help text. Detected once, then cached.
    pub fn width(&self) -> usize {
        *self.width.get_or_init(system::terminal_width)
    }

    /// Flags of the root parser. Handlers see them in their own matches.
    pub fn global_flags(&mut self) -> &mut FlagGroup {
        &mut self.global_flags
    }

    pub fn log_manager(&self) -> Option<&LogManager> {
        self.log_manager.as_ref()
    }

    /// Create a shared flag group, unless `name` is already taken.
    ///
    /// Returns `None` for a duplicate name; the existing group is kept.
    pub fn new_shared_group(&mut self, name: &str) -> Option<&mut FlagGroup> {
        match self.shared.entry(name.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(entry) => Some(entry.insert(FlagGroup::new(name))),
        }
    }

    pub fn shared_group(&self, name: &str) -> Option<&FlagGroup> {
        self.shared.get(name)
    }

    /// Register a command and return its flag group for command specific
    /// flags. A command with the same name is replaced.
    pub fn register_command(&mut self, registration: Registration) -> &mut FlagGroup {
        let name = registration.name();
        let doc = Docstring::new(Some(registration.doc.as_str()), self.width());

        let mut flags = FlagGroup::new(name.clone());
        flags.args = registration.parents;

        let entry = CommandEntry {
            help: registration
                .help
                .unwrap_or_else(|| doc.summary().to_string()),
            description: registration
                .description
                .unwrap_or_else(|| doc.description().to_string()),
            aliases: registration.aliases,
            flags,
            handler: registration.handler,
            name,
        };

        let idx = match self.commands.iter().position(|c| c.name == entry.name) {
            Some(idx) => {
                log::debug!("Replacing command {}", entry.name);
                self.commands[idx] = entry;
                idx
            }
            None => {
                log::debug!("Registering command {}", entry.name);
                self.commands.push(entry);
                self.commands.len() - 1
            }
        };
        &mut self.commands[idx].flags
    }

    pub fn register_global_flags(
        &mut self,
        collaborators: &[&dyn Hooks],
    ) -> Result<(), Box<dyn Error>> {
        for collaborator in collaborators {
            collaborator.declare_global_flags(self)?;
        }
        Ok(())
    }

    pub fn register_shared_flags(
        &mut self,
        collaborators: &[&dyn Hooks],
    ) -> Result<(), Box<dyn Error>> {
        for collaborator in collaborators {
            collaborator.declare_shared_flags(self)?;
        }
        Ok(())
    }

    pub fn register_commands(
        &mut self,
        collaborators: &[&dyn Hooks],
    ) -> Result<(), Box<dyn Error>> {
        for collaborator in collaborators {
            collaborator.declare_commands(self)?;
        }
        Ok(())
    }

    /// The fully assembled parser.
    pub fn command(&self) -> Command {
        let mut cmd = self.root.clone();
        for arg in self.global_flags.args() {
            cmd = cmd.arg(global_arg(arg));
        }
        if self.commands.is_empty() {
            return cmd;
        }

        if cmd.get_after_help().is_none() {
            cmd = cmd.after_help(format!(
                "For more details: {} <command> --help",
                self.name()
            ));
        }
        cmd = cmd
            .subcommand_help_heading("Commands")
            .subcommand_value_name("command");

        for entry in &self.commands {
            let mut sub = Command::new(entry.name.clone())
                .visible_aliases(entry.aliases.clone())
                .args(entry.flags.args().iter().cloned());
            if !entry.help.is_empty() {
                sub = sub.about(entry.help.clone());
            }
            if !entry.description.is_empty() {
                sub = sub.long_about(entry.description.clone());
            }
            cmd = cmd.subcommand(sub);
        }
        cmd
    }

    /// Parse `argv` (without the program name) and call the selected
    /// command's handler.
    ///
    /// Parse errors, `--help` included, come back as a boxed
    /// [`clap::Error`]. Without a command the help is printed and
    /// [`EX_USAGE`] returned.
    pub fn run<I, T>(&self, argv: I) -> CommandResult
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut cmd = self.command();
        let args = std::iter::once(OsString::from(self.name()))
            .chain(argv.into_iter().map(Into::into));
        let matches = cmd.try_get_matches_from_mut(args)?;

        let selected = matches.subcommand().and_then(|(name, sub)| {
            let entry = self.commands.iter().find(|c| c.name == name)?;
            Some((entry, sub))
        });
        let Some((entry, sub_matches)) = selected else {
            cmd.print_help()?;
            return Ok(EX_USAGE);
        };

        log::debug!("Calling {} with {:?}", entry.name, sub_matches);
        let ret = (entry.handler)(sub_matches)?;
        log::debug!("Max memory used: {}", system::max_memory_used());
        log::debug!("Finished. ({})", ret);
        Ok(ret)
    }
}

pub struct AppBuilder {
    name: String,
    description: Option<String>,
    log_bootstrap: bool,
    width: Option<usize>,
    configure: Vec<Box<dyn FnOnce(Command) -> Command>>,
}

impl AppBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            log_bootstrap: false,
            width: None,
            configure: Vec::new(),
        }
    }

    /// Documentation reflowed into the description of the root parser.
    pub fn description(mut self, doc: impl Into<String>) -> Self {
        self.description = Some(doc.into());
        self
    }

    /// Add the `--log-level` flag and start logging to a per-run file.
    pub fn log_bootstrap(mut self, enabled: bool) -> Self {
        self.log_bootstrap = enabled;
        self
    }

    /// Fix the help width instead of asking the terminal.
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Adjust the root parser. Runs after the description is applied.
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Command) -> Command + 'static,
    {
        self.configure.push(Box::new(f));
        self
    }

    pub fn build(self) -> Result<App, Box<dyn Error>> {
        let mut app = App::new(self.name);
        if let Some(width) = self.width {
            let _ = app.width.set(width);
        }

        if let Some(doc) = self.description {
            let doc = Docstring::new(Some(doc.as_str()), app.width());
            if !doc.description().is_empty() {
                app.root = app.root.about(doc.description().to_string());
            }
        }
        for configure in self.configure {
            app.root = configure(app.root);
        }

        if self.log_bootstrap {
            let argv0 = std::env::args_os()
                .next()
                .map(|arg| arg.to_string_lossy().into_owned())
                .unwrap_or_else(|| app.name().to_string());
            let manager = LogManager::for_program(&log_mgr::program_name(&argv0, false));
            app.register_global_flags(&[&manager])?;
            manager.initialize()?;
            app.log_manager = Some(manager);
        }
        Ok(app)
    }
}

pub(crate) fn help_flag() -> Arg {
    Arg::new("help")
        .short('h')
        .long("help")
        .action(ArgAction::Help)
        .help("Show this help message and exit")
        .help_heading(GLOBAL_FLAGS)
}

fn root_command(name: String) -> Command {
    Command::new(name)
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .arg(help_flag())
}

fn global_arg(arg: &Arg) -> Arg {
    let mut arg = arg.clone();
    if arg.get_help_heading().is_none() {
        arg = arg.help_heading(GLOBAL_FLAGS);
    }
    // clap rejects required or positional globals.
    if !arg.is_required_set() && !arg.is_positional() {
        arg = arg.global(true);
    }
    arg
}
