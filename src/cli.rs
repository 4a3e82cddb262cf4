//! Command-line parsing for `shade`.
//!
//! A small options-table parser: every option has a short and a long name, flags take no
//! value, integer options take the next argument. Short flags can be concatenated as long as
//! a value-taking option comes last (`-vw 640`).

use std::{fmt::Write, path::PathBuf};

use thiserror::Error;

use crate::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKind {
    Flag,
    Int,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionId {
    Verbose,
    Width,
    Height,
}

#[derive(Debug, Clone, Copy)]
struct OptionDef {
    id: OptionId,
    short: char,
    long: &'static str,
    description: &'static str,
    kind: OptionKind,
}

impl OptionDef {
    fn takes_value(&self) -> bool {
        self.kind != OptionKind::Flag
    }
}

const OPTIONS: [OptionDef; 3] = [
    OptionDef {
        id: OptionId::Verbose,
        short: 'v',
        long: "verbose",
        description: "output logging info",
        kind: OptionKind::Flag,
    },
    OptionDef {
        id: OptionId::Width,
        short: 'w',
        long: "width",
        description: "window width in pixels",
        kind: OptionKind::Int,
    },
    OptionDef {
        id: OptionId::Height,
        short: 'h',
        long: "height",
        description: "window height in pixels",
        kind: OptionKind::Int,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("unknown short option -{0}")]
    UnknownShort(char),
    #[error("unknown option --{0}")]
    UnknownLong(String),
    #[error("short option -{0} cannot be used in the middle of a flag list, it requires a value")]
    ValueInFlagList(char),
    #[error("option -{short}/--{long} shouldn't be specified more than once")]
    Duplicate { short: char, long: &'static str },
    #[error("option -{short}/--{long} requires a parameter")]
    MissingValue { short: char, long: &'static str },
    #[error("invalid integer value \"{value}\" specified for option -{short}/--{long}")]
    InvalidInteger {
        value: String,
        short: char,
        long: &'static str,
    },
}

/// The parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgs {
    pub config: AppConfig,
    /// Positional arguments after the shader path. Reported once logging is up.
    pub ignored: Vec<String>,
}

/// Parses the arguments following the program name.
pub fn parse<I>(args: I) -> Result<ParsedArgs, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut parser = Parser::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if let Some(long) = arg.strip_prefix("--") {
            let option = OPTIONS
                .iter()
                .find(|o| o.long == long)
                .ok_or_else(|| CliError::UnknownLong(long.to_string()))?;
            parser.apply(option, &mut args)?;
        } else if arg.len() > 1 && arg.starts_with('-') {
            let flags = arg[1..].chars().collect::<Vec<_>>();
            for (i, &short) in flags.iter().enumerate() {
                let option = OPTIONS
                    .iter()
                    .find(|o| o.short == short)
                    .ok_or(CliError::UnknownShort(short))?;
                if option.takes_value() && i + 1 < flags.len() {
                    return Err(CliError::ValueInFlagList(short));
                }
                parser.apply(option, &mut args)?;
            }
        } else {
            parser.positional.push(arg);
        }
    }

    Ok(parser.finish())
}

/// Usage banner followed by the options table.
pub fn usage() -> String {
    let mut text = String::from("Usage: shade [options] [SHADER_FILE]\n\n");
    text.push_str("    Renders the shader in a window.\n\n");
    text.push_str("Options:\n");
    for option in &OPTIONS {
        let name = match option.kind {
            OptionKind::Flag => format!("-{}, --{}", option.short, option.long),
            OptionKind::Int => format!("-{}, --{} <integer>", option.short, option.long),
        };
        let _ = writeln!(text, "  {name:<24}{}", option.description);
    }
    text
}

#[derive(Debug, Default)]
struct Parser {
    seen: Vec<OptionId>,
    verbose: bool,
    width: Option<u32>,
    height: Option<u32>,
    positional: Vec<String>,
}

impl Parser {
    fn apply(
        &mut self,
        option: &OptionDef,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<(), CliError> {
        if self.seen.contains(&option.id) {
            return Err(CliError::Duplicate {
                short: option.short,
                long: option.long,
            });
        }
        self.seen.push(option.id);

        match option.id {
            OptionId::Verbose => self.verbose = true,
            OptionId::Width => self.width = Some(int_value(option, args)?),
            OptionId::Height => self.height = Some(int_value(option, args)?),
        }
        Ok(())
    }

    fn finish(self) -> ParsedArgs {
        let defaults = AppConfig::default();
        let mut positional = self.positional.into_iter();
        let config = AppConfig {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            verbose: self.verbose,
            shader_path: positional.next().map(PathBuf::from),
            title: defaults.title,
            show_fps: defaults.show_fps,
        };
        ParsedArgs {
            config,
            ignored: positional.collect(),
        }
    }
}

fn int_value(
    option: &OptionDef,
    args: &mut impl Iterator<Item = String>,
) -> Result<u32, CliError> {
    let value = args.next().ok_or(CliError::MissingValue {
        short: option.short,
        long: option.long,
    })?;
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(CliError::InvalidInteger {
            value,
            short: option.short,
            long: option.long,
        }),
    }
}
