use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the reward layout document. Always fatal: a session
/// cannot start without a complete, valid set of configurations.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layout document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("layout document defines no configurations")]
    NoConfigurations,

    #[error("configuration {index} ({name}) has {found} reward positions, expected 4")]
    PositionCount {
        index: usize,
        name: String,
        found: usize,
    },

    #[error("configuration {index} has an empty name")]
    EmptyName { index: usize },

    #[error("configuration {index} ({name}) has a non-finite reward coordinate")]
    NonFiniteCoordinate { index: usize, name: String },

    #[error("trialsPerConfig must be at least 1, got {0}")]
    TrialsPerConfig(i64),
}

/// Failure inside an event sink. Reported by the event log, never surfaced
/// to the task state machines.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event sink io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode event record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Misuse of the task controllers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("configuration index {index} out of range ({count} configurations loaded)")]
    ConfigurationOutOfRange { index: usize, count: usize },

    #[error("cannot teleport the avatar while it is moving or rotating")]
    AvatarInMotion,
}
