//! Line-oriented command surface.
//!
//! One line per request, whitespace separated:
//!
//! ```text
//! calibrate_neutral | calibrate_acid | reset_calibration_indicator
//! is_calibrated | status
//! acceptance_policy strict|permissive
//! no_reading_policy publish_default|skip
//! voltage <volts>            (sample feed from the acquisition task)
//! temperature <celsius>      (sample feed; "nan" marks a lost probe)
//! ```
//!
//! Replies are rendered as one JSON object per line.

use core::fmt;

use serde::Serialize;

use super::commands::{CommandReply, PhCommand};
use crate::calibration::AcceptancePolicy;
use crate::config::NoReadingPolicy;

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleLine {
    Command(PhCommand),
    /// New probe voltage sample, in volts.
    Voltage(f32),
    /// New water temperature sample, in °C.  May be NaN.
    Temperature(f32),
    /// Blank line or `#` comment.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidArgument(String),
    TrailingInput(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(c) => write!(f, "unknown command '{}'", c),
            Self::MissingArgument(c) => write!(f, "'{}' needs an argument", c),
            Self::InvalidArgument(a) => write!(f, "invalid argument '{}'", a),
            Self::TrailingInput(a) => write!(f, "unexpected '{}'", a),
        }
    }
}

pub fn parse(line: &str) -> Result<ConsoleLine, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ConsoleLine::Empty);
    }

    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default();
    let arg = words.next();
    if let Some(extra) = words.next() {
        return Err(ParseError::TrailingInput(extra.to_owned()));
    }

    if let Some(cmd) = PhCommand::from_name(head) {
        return match arg {
            None => Ok(ConsoleLine::Command(cmd)),
            Some(a) => Err(ParseError::TrailingInput(a.to_owned())),
        };
    }

    match head {
        "voltage" => parse_number(arg, "voltage").map(ConsoleLine::Voltage),
        "temperature" => parse_number(arg, "temperature").map(ConsoleLine::Temperature),
        "acceptance_policy" => {
            let policy = match arg.ok_or(ParseError::MissingArgument("acceptance_policy"))? {
                "strict" => AcceptancePolicy::Strict,
                "permissive" => AcceptancePolicy::Permissive,
                other => return Err(ParseError::InvalidArgument(other.to_owned())),
            };
            Ok(ConsoleLine::Command(PhCommand::SetAcceptancePolicy(policy)))
        }
        "no_reading_policy" => {
            let policy = match arg.ok_or(ParseError::MissingArgument("no_reading_policy"))? {
                "publish_default" => NoReadingPolicy::PublishDefault,
                "skip" => NoReadingPolicy::Skip,
                other => return Err(ParseError::InvalidArgument(other.to_owned())),
            };
            Ok(ConsoleLine::Command(PhCommand::SetNoReadingPolicy(policy)))
        }
        other => Err(ParseError::UnknownCommand(other.to_owned())),
    }
}

fn parse_number(arg: Option<&str>, command: &'static str) -> Result<f32, ParseError> {
    let arg = arg.ok_or(ParseError::MissingArgument(command))?;
    arg.parse::<f32>()
        .map_err(|_| ParseError::InvalidArgument(arg.to_owned()))
}

#[derive(Serialize)]
struct ErrorLine<'a> {
    reply: &'static str,
    message: &'a str,
}

/// Render a command reply as a single JSON line.
pub fn render_reply(reply: &CommandReply) -> String {
    serde_json::to_string(reply).unwrap_or_else(|e| render_error(&e.to_string()))
}

/// Render a parse or transport error as a single JSON line.
pub fn render_error(message: &str) -> String {
    let line = ErrorLine {
        reply: "error",
        message,
    };
    serde_json::to_string(&line).unwrap_or_else(|_| String::from(r#"{"reply":"error"}"#))
}
