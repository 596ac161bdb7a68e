use mundane::clap::{value_parser, Arg, ArgMatches};
use mundane::{App, CommandResult, Docstring, Hooks};
use std::error::Error;
use std::fs;
use std::io;

const INPUT_FLAGS: &str = "input";

/// Commands that reflow text read from a file or stdin.
pub struct TextCommands;

impl Hooks for TextCommands {
    fn declare_global_flags(&self, app: &mut App) -> Result<(), Box<dyn Error>> {
        app.global_flags().add(
            Arg::new("width")
                .short('w')
                .long("width")
                .value_name("COLUMNS")
                .value_parser(value_parser!(usize))
                .help("Wrap text to this many columns (default: terminal width)"),
        );
        Ok(())
    }

    fn declare_shared_flags(&self, app: &mut App) -> Result<(), Box<dyn Error>> {
        app.new_shared_group(INPUT_FLAGS)
            .ok_or("someone already used \"input\" as a flag group name")?
            .add(
                Arg::new("file")
                    .short('f')
                    .long("file")
                    .value_name("FILE")
                    .help("Read text from FILE instead of stdin"),
            );
        Ok(())
    }

    fn declare_commands(&self, app: &mut App) -> Result<(), Box<dyn Error>> {
        let input = app
            .shared_group(INPUT_FLAGS)
            .ok_or("the \"input\" flags were not shared")?
            .clone();

        app.register_command(
            mundane::command!(
                /// Reflow text into wrapped paragraphs.
                ///
                /// The first line is kept as a paragraph of its own. The lines
                /// after it are joined into paragraphs wherever blank lines
                /// separate them, and every paragraph is wrapped to the
                /// requested width.
                reflow
            )
            .parent(&input),
        );
        app.register_command(
            mundane::command!(
                /// Print the first line of text, wrapped.
                summary
            )
            .parent(&input),
        );
        Ok(())
    }
}

fn reflow(matches: &ArgMatches) -> CommandResult {
    let doc = read_doc(matches)?;
    println!("{}", doc.description());
    Ok(0)
}

fn summary(matches: &ArgMatches) -> CommandResult {
    let doc = read_doc(matches)?;
    println!("{}", doc.summary());
    Ok(0)
}

fn read_doc(matches: &ArgMatches) -> Result<Docstring, Box<dyn Error>> {
    let text = match matches.get_one::<String>("file") {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?
        }
        None => io::read_to_string(io::stdin())?,
    };
    let width = matches
        .get_one::<usize>("width")
        .copied()
        .unwrap_or_else(mundane::system::terminal_width);

    log::debug!("Reflowing {} bytes to {} columns", text.len(), width);
    Ok(Docstring::new(Some(text.as_str()), width))
}
