use crate::domain::Filter;
use std::str::FromStr;
use thiserror::Error;

/// A line typed on the console while the feed is running.
#[derive(Debug, PartialEq)]
pub enum Command {
    DeviceIds(Vec<String>),
    Codes(Vec<String>),
    Actions(Vec<String>),
    Filter(Filter),
    Expand,
    Collapse,
    Toggle(u64),
    Share,
    Choices,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list of commands")]
    Unknown(String),
    #[error("'{0}' is not a row number")]
    InvalidRow(String),
}

pub const HELP: &str = "\
devices <uuid...>    only show events of these devices, no arguments clears the filter
codes <code...>      only show events with these codes
actions <action...>  only show events with these actions
filter <query>       replace the whole filter with a shared query string
expand | collapse    show or hide the payload of every row
toggle <row>         show or hide the payload of a single row
share                print the query string of the current filter
choices              list the known event codes and actions
quit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Empty);
        };
        let arguments: Vec<String> = words.map(str::to_string).collect();

        match name {
            "devices" => Ok(Command::DeviceIds(arguments)),
            "codes" => Ok(Command::Codes(arguments)),
            "actions" => Ok(Command::Actions(arguments)),
            "filter" => Ok(Command::Filter(Filter::from_query_string(&arguments.join("&")))),
            "expand" => Ok(Command::Expand),
            "collapse" => Ok(Command::Collapse),
            "toggle" => {
                let row = arguments.first().map(String::as_str).unwrap_or_default();
                row.parse::<u64>().map(Command::Toggle).map_err(|_| CommandError::InvalidRow(row.to_string()))
            }
            "share" => Ok(Command::Share),
            "choices" => Ok(Command::Choices),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
