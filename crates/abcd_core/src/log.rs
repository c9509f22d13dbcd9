//! The event log handle shared by the task controllers.
//!
//! One `EventLog` is built per session and cloned into every component that
//! emits events. It stamps identity and timing fields onto each record and
//! forwards it to the configured sink. A failing sink never stops the task:
//! the failure is counted and reported on the operator channel.

use crate::config::ParticipantInfo;
use crate::event::{EventKind, EventRecord, EventSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Where in the session an event happened.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialStamp {
    /// Configuration index (0-based).
    pub round: usize,
    /// Current repetition within the configuration (1-based).
    pub rep: u32,
    pub config_name: String,
}

#[derive(Clone)]
pub struct EventLog {
    sink: Arc<Mutex<Box<dyn EventSink>>>,
    participant: Arc<ParticipantInfo>,
    run_id: Uuid,
    date: String,
    written: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl EventLog {
    pub fn new(sink: Box<dyn EventSink>, participant: ParticipantInfo) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
            participant: Arc::new(participant),
            run_id: Uuid::new_v4(),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            written: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn participant(&self) -> &ParticipantInfo {
        &self.participant
    }

    /// Stamp and write one record.
    pub fn emit(&self, now: Duration, stamp: &TrialStamp, mut record: EventRecord) {
        record.set_default("participant", self.participant.participant_id.as_str());
        record.set_default("study_id", self.participant.study_id.as_str());
        record.set_default("session_id", self.participant.session_id.as_str());
        record.set_default("run_id", self.run_id.to_string());
        record.set_default("date", self.date.as_str());
        record.set_default("t_session", now.as_secs_f64());
        record.set_default("round", stamp.round);
        record.set_default("rep", stamp.rep);
        record.set_default("config_name", stamp.config_name.as_str());

        let kind = record.kind();
        let result = {
            let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
            sink.record(&record)
        };
        match result {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Logged {} at {:.3}s", kind, now.as_secs_f64());
            }
            Err(e) => self.report_failure(kind, e),
        }
    }

    pub fn flush(&self) {
        let result = {
            let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
            sink.flush()
        };
        if let Err(e) = result {
            tracing::warn!("Failed to flush event sink: {}", e);
        }
    }

    /// Records successfully handed to the sink.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Records lost to sink failures.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn report_failure(&self, kind: EventKind, error: crate::error::SinkError) {
        let previous = self.dropped.fetch_add(1, Ordering::Relaxed);
        // Loud on the first failure, then only periodically.
        if previous == 0 || (previous + 1) % 100 == 0 {
            tracing::warn!(
                "Event sink failed writing {} ({} dropped so far): {}",
                kind,
                previous + 1,
                error
            );
        }
    }
}
