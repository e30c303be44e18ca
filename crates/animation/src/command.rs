//! Controls surface: one command per button, slider and toggle.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AnimationCommand {
    Play,
    Stop,
    StepForward,
    StepBackward,
    Seek(i64),
    SetDisplayMode { use_local: bool },
}

impl AnimationCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Stop => "stop",
            Self::StepForward => "step_forward",
            Self::StepBackward => "step_backward",
            Self::Seek(_) => "seek",
            Self::SetDisplayMode { .. } => "set_display_mode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("unknown animation command '{0}'")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("invalid slider position '{0}'")]
    InvalidPosition(String),
}

impl FromStr for AnimationCommand {
    type Err = CommandParseError;

    /// Accepts the words typed into the interactive viewer, e.g. `play`,
    /// `+1`, `seek 12` or `local on`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let word = parts.next().unwrap_or_default().to_ascii_lowercase();
        let argument = parts.next();

        match word.as_str() {
            "play" => Ok(Self::Play),
            "stop" | "pause" => Ok(Self::Stop),
            "next" | "forward" | "+1" => Ok(Self::StepForward),
            "back" | "prev" | "-1" => Ok(Self::StepBackward),
            "seek" => {
                let raw = argument.ok_or(CommandParseError::MissingArgument {
                    command: "seek",
                    expected: "a slider position",
                })?;
                raw.parse::<i64>()
                    .map(Self::Seek)
                    .map_err(|_| CommandParseError::InvalidPosition(raw.to_string()))
            }
            "local" => match argument.map(str::to_ascii_lowercase).as_deref() {
                Some("on" | "true" | "yes") => Ok(Self::SetDisplayMode { use_local: true }),
                Some("off" | "false" | "no") => Ok(Self::SetDisplayMode { use_local: false }),
                _ => Err(CommandParseError::MissingArgument {
                    command: "local",
                    expected: "on or off",
                }),
            },
            "utc" => Ok(Self::SetDisplayMode { use_local: false }),
            _ => Err(CommandParseError::Unknown(line.trim().to_string())),
        }
    }
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
