use crate::grid::Turn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Device-independent input, delivered to the task once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalInput {
    Forward,
    TurnLeft,
    TurnRight,
    TurnAbout,
    Confirm,
}

impl LogicalInput {
    pub const ALL: [LogicalInput; 5] = [
        LogicalInput::Forward,
        LogicalInput::TurnLeft,
        LogicalInput::TurnRight,
        LogicalInput::TurnAbout,
        LogicalInput::Confirm,
    ];

    /// The rotation this input requests, if it is a turn.
    pub fn turn(self) -> Option<Turn> {
        match self {
            LogicalInput::TurnLeft => Some(Turn::Left),
            LogicalInput::TurnRight => Some(Turn::Right),
            LogicalInput::TurnAbout => Some(Turn::About),
            LogicalInput::Forward | LogicalInput::Confirm => None,
        }
    }

    /// Forward and the three turns; these hide the overview aid.
    pub fn is_directional(self) -> bool {
        !matches!(self, LogicalInput::Confirm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogicalInput::Forward => "forward",
            LogicalInput::TurnLeft => "turn_left",
            LogicalInput::TurnRight => "turn_right",
            LogicalInput::TurnAbout => "turn_about",
            LogicalInput::Confirm => "confirm",
        }
    }

    /// Map a single key character the way the terminal front-ends do.
    pub fn from_key(key: char) -> Option<LogicalInput> {
        match key.to_ascii_lowercase() {
            'w' | 'f' => Some(LogicalInput::Forward),
            'a' | 'l' => Some(LogicalInput::TurnLeft),
            'd' | 'r' => Some(LogicalInput::TurnRight),
            's' | 'b' => Some(LogicalInput::TurnAbout),
            'c' | ' ' => Some(LogicalInput::Confirm),
            _ => None,
        }
    }
}

impl FromStr for LogicalInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "up" => Ok(LogicalInput::Forward),
            "turn_left" | "left" => Ok(LogicalInput::TurnLeft),
            "turn_right" | "right" => Ok(LogicalInput::TurnRight),
            "turn_about" | "about" | "down" => Ok(LogicalInput::TurnAbout),
            "confirm" => Ok(LogicalInput::Confirm),
            other => Err(format!("unknown input '{}'", other)),
        }
    }
}
