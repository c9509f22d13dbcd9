//! # ABCD Core
//!
//! Shared vocabulary of the sequence navigation task: grid geometry, reward
//! layouts, logical inputs, event records and the event log, the
//! presentation-adapter seam, and the TOML task configuration.
//!
//! Nothing in this crate advances time; the state machines that do live in
//! `abcd_task`.

pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod input;
pub mod layout;
pub mod log;
pub mod presentation;

pub use config::{
    LogFormat, LoggingConfig, MemorizationConfig, MovementConfig, ParticipantInfo,
    PresentationConfig, PresentationMode, RewardConfig, SessionConfig, TaskConfig,
};
pub use error::{LayoutError, SinkError, TaskError};
pub use event::{EventKind, EventRecord, EventSink, FieldValue, MemorySink, LOG_COLUMNS};
pub use grid::{ArenaBounds, GridPosition, Heading, Turn};
pub use input::LogicalInput;
pub use layout::{
    is_short_sequence_name, reward_letter, ConfigurationSet, RewardConfiguration, REWARD_SLOTS,
};
pub use log::{EventLog, TrialStamp};
pub use presentation::PresentationAdapter;
