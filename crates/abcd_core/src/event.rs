//! Event records: the flat, analysis-facing log format.
//!
//! Every domain event becomes one [`EventRecord`]: an event type tag plus an
//! ordered map of field name to scalar. Sinks decide how to persist them.

use crate::error::SinkError;
use crate::grid::GridPosition;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Event type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ConfigurationStart,
    TrialStart,
    KeyPress,
    MovementStart,
    MovementComplete,
    RotationStart,
    RotationComplete,
    RewardCheck,
    Reward,
    RewardOffset,
    CueDisplayed,
    TrialComplete,
    SessionEnd,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ConfigurationStart => "configuration_start",
            EventKind::TrialStart => "trial_start",
            EventKind::KeyPress => "key_press",
            EventKind::MovementStart => "movement_start",
            EventKind::MovementComplete => "movement_complete",
            EventKind::RotationStart => "rotation_start",
            EventKind::RotationComplete => "rotation_complete",
            EventKind::RewardCheck => "reward_check",
            EventKind::Reward => "reward",
            EventKind::RewardOffset => "reward_offset",
            EventKind::CueDisplayed => "cue_displayed",
            EventKind::TrialComplete => "trial_complete",
            EventKind::SessionEnd => "session_end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        // Go through the shortest f32 representation so 10.3f32 logs as 10.3,
        // not 10.300000190734863.
        let widened = v.to_string().parse::<f64>().unwrap_or(f64::from(v));
        FieldValue::Float(widened)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<char> for FieldValue {
    fn from(v: char) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// One row of the research log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    #[serde(rename = "event_type")]
    kind: EventKind,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl EventRecord {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Set a field only if the record does not carry it yet.
    pub fn set_default(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| value.into());
    }

    /// Write `{prefix}_x`, `{prefix}_y`, `{prefix}_z`.
    pub fn with_position(mut self, prefix: &str, position: &GridPosition) -> Self {
        self.set(&format!("{}_x", prefix), position.x);
        self.set(&format!("{}_y", prefix), position.y);
        self.set(&format!("{}_z", prefix), position.z);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        if name == "event_type" {
            return None;
        }
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render one field the way a text sink writes it; absent fields are empty.
    pub fn field_text(&self, name: &str) -> String {
        if name == "event_type" {
            return self.kind.as_str().to_string();
        }
        self.fields
            .get(name)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}

/// Fixed column order for tabular sinks. Fields outside this list are only
/// kept by sinks that write self-describing rows.
pub const LOG_COLUMNS: &[&str] = &[
    "event_type",
    "participant",
    "study_id",
    "session_id",
    "run_id",
    "date",
    "t_session",
    "round",
    "rep",
    "config_name",
    "trial_type",
    "sequence_length",
    "key_pressed",
    "key_index",
    "accepted",
    "from_x",
    "from_y",
    "from_z",
    "to_x",
    "to_y",
    "to_z",
    "from_heading",
    "to_heading",
    "direction",
    "length_step",
    "movement_index",
    "curr_loc_x",
    "curr_loc_y",
    "curr_loc_z",
    "curr_rew_x",
    "curr_rew_y",
    "curr_rew_z",
    "distance",
    "within_radius",
    "reward_letter",
    "reward_index",
    "rew_loc_x",
    "rew_loc_y",
    "rew_loc_z",
    "moves_to_find",
    "memorization_phase",
    "repetition_number",
    "cue_time",
    "start_loc_x",
    "start_loc_y",
    "start_loc_z",
    "duration",
    "moves",
    "reason",
];

/// Destination for event records.
pub trait EventSink: Send {
    fn record(&mut self, record: &EventRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-process sink. Clones share the same buffer, so a test can keep one
/// handle while the task writes through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.kind() == kind)
            .count()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<EventRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}
