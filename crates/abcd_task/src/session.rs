//! Session driver.
//!
//! Owns the clock and both controllers, walks the memorization replay,
//! routes advancements to the presentation adapter, and closes the log when
//! the session ends. Front-ends only call [`Session::start`],
//! [`Session::tick`] and [`Session::abort`].

use crate::clock::SessionClock;
use crate::movement::{AvatarState, MovementController, MovementReport};
use crate::replay::{CueAction, ReplayFrame, ReplayPlan};
use crate::sequence::{Advancement, SequenceController, SequenceRules};
use abcd_core::{
    ConfigurationSet, EventKind, EventLog, EventRecord, LogicalInput, MemorizationConfig,
    PresentationAdapter, TaskConfig, TaskError,
};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    Memorizing,
    FreePlay,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Completed,
    Aborted,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::Completed => "completed",
            EndReason::Aborted => "aborted",
        }
    }
}

enum Phase {
    NotStarted,
    Memorizing {
        started_at: Duration,
        plan: ReplayPlan,
        next_cue: usize,
    },
    FreePlay,
    Finished(EndReason),
}

/// Result of one [`Session::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub advancement: Option<Advancement>,
    pub movement: MovementReport,
    /// Memorization replay ended on this tick and free play began.
    pub replay_finished: bool,
}

/// Serializable view of the session, for status output.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub t_session: f64,
    pub phase: SessionPhase,
    pub config_index: usize,
    pub config_name: String,
    pub rep: u32,
    pub next_reward_index: usize,
    pub sequence_length: usize,
    pub visible_markers: Vec<usize>,
    pub cue_visible: bool,
    /// Present only while the memorization replay runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<ReplayFrame>,
    pub avatar: AvatarState,
}

pub struct Session {
    clock: SessionClock,
    movement: MovementController,
    sequence: SequenceController,
    presentation: Box<dyn PresentationAdapter>,
    memorization: MemorizationConfig,
    phase: Phase,
    log: EventLog,
}

impl Session {
    pub fn new(
        config: &TaskConfig,
        layouts: ConfigurationSet,
        presentation: Box<dyn PresentationAdapter>,
        log: EventLog,
    ) -> Self {
        let sequence = SequenceController::new(
            layouts,
            SequenceRules::from(&config.rewards),
            log.clone(),
        );
        let movement = MovementController::new(
            config.movement.clone(),
            config.arena,
            sequence.start_position(),
            log.clone(),
        );
        Self {
            clock: SessionClock::new(),
            movement,
            sequence,
            presentation,
            memorization: config.memorization.clone(),
            phase: Phase::NotStarted,
            log,
        }
    }

    /// Load the first configuration and begin either the replay or free play.
    pub fn start(&mut self) -> Result<(), TaskError> {
        if !matches!(self.phase, Phase::NotStarted) {
            tracing::warn!("Session already started");
            return Ok(());
        }
        let now = self.clock.now();
        tracing::info!(
            "Session {} starting for {}",
            self.log.run_id(),
            self.log.participant().participant_id
        );
        self.sequence.load_configuration(0, now)?;
        self.movement.teleport(self.sequence.start_position())?;

        if self.presentation.plays_memorization_replay() {
            self.enter_memorization(now);
        } else {
            self.enter_free_play(now);
        }
        Ok(())
    }

    /// Advance the session by `dt`, feeding this tick's inputs.
    pub fn tick(&mut self, dt: Duration, inputs: &[LogicalInput]) -> TickReport {
        let mut report = TickReport::default();
        if matches!(self.phase, Phase::NotStarted | Phase::Finished(_)) {
            return report;
        }

        let now = self.clock.advance(dt);

        if let Some(advancement) = self.sequence.poll(now) {
            report.advancement = Some(advancement);
            self.apply(advancement, now);
            if self.is_finished() {
                return report;
            }
        }

        match self.phase {
            Phase::Memorizing { .. } => {
                if !inputs.is_empty() {
                    tracing::trace!("Ignoring {} input(s) during replay", inputs.len());
                }
                report.replay_finished = self.step_replay(now);
            }
            Phase::FreePlay => {
                report.movement = self.movement.tick(dt, now, inputs, &mut self.sequence);
                if report.movement.suppress_overview {
                    self.presentation.suppress_overview();
                }
            }
            Phase::NotStarted | Phase::Finished(_) => {}
        }
        report
    }

    /// Stop early. Pending advancements are cancelled and the log is closed.
    pub fn abort(&mut self) {
        if self.is_finished() {
            return;
        }
        tracing::warn!("Session aborted at {:.2}s", self.clock.now().as_secs_f64());
        self.finish(EndReason::Aborted);
    }

    fn apply(&mut self, advancement: Advancement, now: Duration) {
        match advancement {
            Advancement::NextRepetition { .. } => self.enter_free_play(now),
            Advancement::NextConfiguration {
                config_index,
                layout_changed,
            } => {
                if let Err(e) = self.movement.teleport(self.sequence.start_position()) {
                    tracing::warn!(
                        "Could not move avatar to start of configuration {}: {}",
                        config_index,
                        e
                    );
                }
                if layout_changed && self.presentation.plays_memorization_replay() {
                    self.enter_memorization(now);
                } else {
                    self.enter_free_play(now);
                }
            }
            Advancement::SessionComplete => self.finish(EndReason::Completed),
        }
    }

    fn enter_memorization(&mut self, now: Duration) {
        let config_index = self.sequence.progress().current_config_index;
        let plan = ReplayPlan::new(&self.memorization, self.sequence.sequence_length());
        tracing::debug!(
            "Memorization replay for configuration {} ({:.1}s)",
            config_index,
            plan.duration().as_secs_f64()
        );
        self.movement.set_input_enabled(false);
        self.presentation.run_memorization_replay(config_index);
        self.phase = Phase::Memorizing {
            started_at: now,
            plan,
            next_cue: 0,
        };
        self.step_replay(now);
    }

    /// Fire every replay cue that is due. Returns true once the replay is over
    /// and free play has begun.
    fn step_replay(&mut self, now: Duration) -> bool {
        let Phase::Memorizing {
            started_at,
            ref plan,
            ref mut next_cue,
        } = self.phase
        else {
            return false;
        };

        let elapsed = now.saturating_sub(started_at);
        while let Some(cue) = plan.cues().get(*next_cue) {
            if cue.at > elapsed {
                break;
            }
            *next_cue += 1;
            let at = started_at + cue.at;
            match cue.action {
                CueAction::Show => {
                    self.sequence
                        .show_for_replay(cue.reward_index, cue.repetition, at)
                }
                CueAction::Hide => {
                    self.sequence
                        .hide_for_replay(cue.reward_index, cue.repetition, at)
                }
            }
        }

        if elapsed >= plan.duration() {
            self.enter_free_play(now);
            return true;
        }
        false
    }

    fn enter_free_play(&mut self, now: Duration) {
        let config_index = self.sequence.progress().current_config_index;
        self.phase = Phase::FreePlay;
        self.movement.begin_repetition();
        self.movement.set_input_enabled(true);
        self.sequence.begin_repetition(now, self.movement.position());
        self.presentation.begin_free_play(config_index);
    }

    fn finish(&mut self, reason: EndReason) {
        let now = self.clock.now();
        self.phase = Phase::Finished(reason);
        self.sequence.end_session();
        self.movement.set_input_enabled(false);
        self.presentation.session_end();

        let record = EventRecord::new(EventKind::SessionEnd).with("reason", reason.as_str());
        self.log.emit(now, &self.sequence.stamp(), record);
        self.log.flush();
        tracing::info!(
            "Session ended ({}): {} events written, {} dropped",
            reason.as_str(),
            self.log.written(),
            self.log.dropped()
        );
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn phase(&self) -> SessionPhase {
        match self.phase {
            Phase::NotStarted => SessionPhase::NotStarted,
            Phase::Memorizing { .. } => SessionPhase::Memorizing,
            Phase::FreePlay => SessionPhase::FreePlay,
            Phase::Finished(_) => SessionPhase::Finished,
        }
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        match self.phase {
            Phase::Finished(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// What the memorization replay shows right now, if one is running.
    pub fn replay_frame(&self) -> Option<ReplayFrame> {
        match &self.phase {
            Phase::Memorizing {
                started_at, plan, ..
            } => Some(plan.frame_at(self.clock.now().saturating_sub(*started_at))),
            _ => None,
        }
    }

    pub fn sequence(&self) -> &SequenceController {
        &self.sequence
    }

    pub fn movement(&self) -> &MovementController {
        &self.movement
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let stamp = self.sequence.stamp();
        SessionSnapshot {
            t_session: self.clock.now().as_secs_f64(),
            phase: self.phase(),
            config_index: stamp.round,
            config_name: stamp.config_name,
            rep: stamp.rep,
            next_reward_index: self.sequence.progress().next_reward_index,
            sequence_length: self.sequence.sequence_length(),
            visible_markers: self.sequence.markers().visible_indices(),
            cue_visible: self.sequence.cue_visible(),
            replay: self.replay_frame(),
            avatar: self.movement.avatar(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{FreeNavigationCamera, OverviewCamera};
    use abcd_core::{GridPosition, MemorySink, ParticipantInfo, RewardConfiguration};

    const DT: Duration = Duration::from_millis(50);

    fn p(x: f32, z: f32) -> GridPosition {
        GridPosition::new(x, 0.5, z)
    }

    fn session(adapter: Box<dyn PresentationAdapter>) -> (Session, MemorySink) {
        let sink = MemorySink::new();
        let log = EventLog::new(Box::new(sink.clone()), ParticipantInfo::default());
        let layouts = ConfigurationSet::new(
            vec![RewardConfiguration::new(
                "ABC_1",
                [p(-5.3, 5.0), p(5.0, 5.0), p(5.0, 15.3), p(0.0, 0.0)],
            )],
            1,
        )
        .unwrap();
        let session = Session::new(&TaskConfig::default(), layouts, adapter, log);
        (session, sink)
    }

    #[test]
    fn test_not_started_session_ignores_ticks() {
        let (mut s, sink) = session(Box::new(FreeNavigationCamera::new()));
        let report = s.tick(DT, &[LogicalInput::Forward]);
        assert_eq!(report, TickReport::default());
        assert_eq!(s.now(), Duration::ZERO);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_free_navigation_starts_in_free_play() {
        let (mut s, sink) = session(Box::new(FreeNavigationCamera::new()));
        s.start().unwrap();
        assert_eq!(s.phase(), SessionPhase::FreePlay);
        assert_eq!(s.movement().position(), p(5.0, 15.3));
        assert_eq!(sink.count(EventKind::ConfigurationStart), 1);
        assert_eq!(sink.count(EventKind::TrialStart), 1);
    }

    #[test]
    fn test_classic_replays_then_free_play() {
        let (mut s, sink) = session(Box::new(OverviewCamera::new()));
        s.start().unwrap();
        assert_eq!(s.phase(), SessionPhase::Memorizing);
        assert_eq!(sink.count(EventKind::TrialStart), 0);

        let mut finished = false;
        for _ in 0..400 {
            if s.tick(DT, &[LogicalInput::Forward]).replay_finished {
                finished = true;
                break;
            }
        }
        assert!(finished);
        assert_eq!(s.phase(), SessionPhase::FreePlay);

        // 2 passes over 3 rewards, every reveal paired with a hide.
        let onsets = sink.of_kind(EventKind::Reward);
        assert_eq!(onsets.len(), 6);
        assert!(onsets
            .iter()
            .all(|r| r.get("memorization_phase").and_then(|v| v.as_bool()) == Some(true)));
        assert_eq!(sink.count(EventKind::RewardOffset), 6);
        assert_eq!(sink.count(EventKind::KeyPress), 0);
        assert!(s.sequence().markers().visible_indices().is_empty());
    }

    #[test]
    fn test_abort_logs_session_end_once() {
        let (mut s, sink) = session(Box::new(FreeNavigationCamera::new()));
        s.start().unwrap();
        s.abort();
        s.abort();

        assert_eq!(s.end_reason(), Some(EndReason::Aborted));
        let ends = sink.of_kind(EventKind::SessionEnd);
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].field_text("reason"), "aborted");
        assert_eq!(s.tick(DT, &[LogicalInput::Confirm]), TickReport::default());
    }

    #[test]
    fn test_snapshot_serializes() {
        let (mut s, _) = session(Box::new(FreeNavigationCamera::new()));
        s.start().unwrap();
        let snapshot = s.snapshot();
        assert_eq!(snapshot.config_name, "ABC_1");
        assert_eq!(snapshot.sequence_length, 3);
        assert_eq!(snapshot.rep, 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["phase"], "free_play");
        assert!(json.get("replay").is_none());
    }

    #[test]
    fn test_snapshot_reports_replay_frame() {
        let (mut s, _) = session(Box::new(OverviewCamera::new()));
        s.start().unwrap();
        assert_eq!(
            s.snapshot().replay,
            Some(ReplayFrame::Showing {
                reward_index: 0,
                repetition: 1
            })
        );

        // 1.5 s display, then the gap before B.
        for _ in 0..34 {
            s.tick(DT, &[]);
        }
        assert_eq!(s.replay_frame(), Some(ReplayFrame::Gap));

        for _ in 0..10 {
            s.tick(DT, &[]);
        }
        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(json["replay"]["frame"], "showing");
        assert_eq!(json["replay"]["reward_index"], 1);

        while s.phase() == SessionPhase::Memorizing {
            s.tick(DT, &[]);
        }
        assert_eq!(s.replay_frame(), None);
    }
}
