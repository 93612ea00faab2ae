//! Line commands for the interactive front end.
//!
//! One command per line, words separated by whitespace. Paths are the rest
//! of the line, so they may contain spaces.

use std::path::PathBuf;

use thiserror::Error;

use crate::speech::Track;

/// Help text printed by `help`.
pub const HELP: &str = "\
commands:
  open <path>            select a PDF
  summary                summarize the selected PDF
  prepare                extract the PDF's text for narration
  play full|summary      play or resume a track
  pause full|summary     pause a track
  stop [full|summary]    stop narration
  photo <path>           select a photo and list the objects in it
  status                 show the current file, results and playback
  help                   show this text
  quit                   stop narration and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Open(PathBuf),
    Summary,
    Prepare,
    Play(Track),
    Pause(Track),
    /// `None` stops everything.
    Stop(Option<Track>),
    Photo(PathBuf),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("unknown track `{0}` (expected `full` or `summary`)")]
    InvalidTrack(String),

    #[error("`{0}` takes no arguments")]
    UnexpectedArgument(&'static str),
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "open" => ShellCommand::Open(path_arg("open", rest)?),
            "photo" => ShellCommand::Photo(path_arg("photo", rest)?),
            "summary" => no_args("summary", rest, ShellCommand::Summary)?,
            "prepare" => no_args("prepare", rest, ShellCommand::Prepare)?,
            "play" => ShellCommand::Play(track_arg("play", rest)?),
            "pause" => ShellCommand::Pause(track_arg("pause", rest)?),
            "stop" if rest.is_empty() => ShellCommand::Stop(None),
            "stop" => ShellCommand::Stop(Some(parse_track(rest)?)),
            "status" => no_args("status", rest, ShellCommand::Status)?,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn path_arg(command: &'static str, rest: &str) -> Result<PathBuf, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument {
            command,
            what: "a file path",
        });
    }
    Ok(PathBuf::from(rest))
}

fn track_arg(command: &'static str, rest: &str) -> Result<Track, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument {
            command,
            what: "a track (`full` or `summary`)",
        });
    }
    parse_track(rest)
}

fn parse_track(s: &str) -> Result<Track, ParseError> {
    match s.to_ascii_lowercase().as_str() {
        "full" | "text" | "full-text" => Ok(Track::FullText),
        "summary" => Ok(Track::Summary),
        _ => Err(ParseError::InvalidTrack(s.to_string())),
    }
}

fn no_args(
    command: &'static str,
    rest: &str,
    parsed: ShellCommand,
) -> Result<ShellCommand, ParseError> {
    if rest.is_empty() {
        Ok(parsed)
    } else {
        Err(ParseError::UnexpectedArgument(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ShellCommand {
        ShellCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(ShellCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn paths_keep_their_spaces() {
        assert_eq!(
            parse("open  ~/Papers/annual report.pdf "),
            ShellCommand::Open(PathBuf::from("~/Papers/annual report.pdf"))
        );
        assert_eq!(
            parse("photo cat.jpg"),
            ShellCommand::Photo(PathBuf::from("cat.jpg"))
        );
    }

    #[test]
    fn tracks() {
        assert_eq!(parse("play full"), ShellCommand::Play(Track::FullText));
        assert_eq!(parse("PAUSE Summary"), ShellCommand::Pause(Track::Summary));
        assert_eq!(parse("stop"), ShellCommand::Stop(None));
        assert_eq!(parse("stop summary"), ShellCommand::Stop(Some(Track::Summary)));
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse("summary"), ShellCommand::Summary);
        assert_eq!(parse("prepare"), ShellCommand::Prepare);
        assert_eq!(parse("status"), ShellCommand::Status);
        assert_eq!(parse("?"), ShellCommand::Help);
        assert_eq!(parse("exit"), ShellCommand::Quit);
    }

    #[test]
    fn errors() {
        assert_eq!(
            ShellCommand::parse("dance"),
            Err(ParseError::Unknown("dance".into()))
        );
        assert!(matches!(
            ShellCommand::parse("open"),
            Err(ParseError::MissingArgument { command: "open", .. })
        ));
        assert!(matches!(
            ShellCommand::parse("play"),
            Err(ParseError::MissingArgument { command: "play", .. })
        ));
        assert_eq!(
            ShellCommand::parse("play chorus"),
            Err(ParseError::InvalidTrack("chorus".into()))
        );
        assert_eq!(
            ShellCommand::parse("summary now"),
            Err(ParseError::UnexpectedArgument("summary"))
        );
    }
}
