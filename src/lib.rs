//! Reasonable startup defaults for `clap` based applications.
//!
//! [`App`] splits building a command line into phases: global flags, flag
//! groups shared between commands, and the commands themselves, each declared
//! by collaborators through [`Hooks`]. Command names and help text come from
//! the handler and its documentation, see [`command!`].
//!
//! [`LogManager`] logs every run to its own file in the temp directory and
//! keeps `{prog}.log` pointing at the newest one. [`bootstrap::run`] offers
//! the same logging for programs with a single parser.

pub mod app;
pub mod bootstrap;
pub mod docstring;
pub mod log_mgr;
pub mod system;

pub use app::{
    App, AppBuilder, CommandResult, FlagGroup, Handler, Hooks, Registration, EX_USAGE,
    GLOBAL_FLAGS,
};
pub use docstring::{reflow, Docstring};
pub use log_mgr::{LogFiles, LogLevel, LogManager};

pub use clap;
pub use log;
