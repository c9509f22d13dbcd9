//! Reward sequence controller
//!
//! Single source of truth for which reward is next, whether a confirm lands
//! on it, and when a repetition or configuration advances. It owns:
//! - `TrialProgress` (which configuration, which reward, how many repetitions)
//! - the reward-marker arena (four reusable slots, A..D)
//! - the mid-sequence cue
//! - the deferred trial-completion callback, guarded by a configuration epoch
//!
//! Everything it decides is written to the injected [`EventLog`].

use crate::clock::Scheduler;
use abcd_core::{
    reward_letter, ConfigurationSet, EventKind, EventLog, EventRecord, GridPosition,
    RewardConfig, RewardConfiguration, TaskError, TrialStamp, REWARD_SLOTS,
};
use serde::Serialize;
use std::time::Duration;

/// Distance and timing rules for reward evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceRules {
    /// Confirm closer than this to the next reward is a hit.
    pub hit_radius: f32,
    /// A revealed marker hides once the avatar is farther than this from it.
    pub leave_radius: f32,
    /// Delay between the last reward of a repetition and advancement.
    pub completion_delay: Duration,
    /// Tolerance when comparing consecutive layouts.
    pub layout_tolerance: f32,
}

impl Default for SequenceRules {
    fn default() -> Self {
        Self::from(&RewardConfig::default())
    }
}

impl From<&RewardConfig> for SequenceRules {
    fn from(config: &RewardConfig) -> Self {
        Self {
            hit_radius: config.hit_radius,
            leave_radius: config.leave_radius,
            completion_delay: config.completion_delay(),
            layout_tolerance: config.layout_tolerance,
        }
    }
}

/// Progress through the active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrialProgress {
    pub current_config_index: usize,
    /// `0..=sequence_length`; equal to the length once every reward of the
    /// repetition has been found.
    pub next_reward_index: usize,
    pub repetitions_completed: u32,
    /// Marker that is still showing after being found, until the avatar walks away.
    pub last_revealed_reward_index: Option<usize>,
    pub is_first_repetition_of_config: bool,
}

impl TrialProgress {
    fn at_config(index: usize) -> Self {
        Self {
            current_config_index: index,
            next_reward_index: 0,
            repetitions_completed: 0,
            last_revealed_reward_index: None,
            is_first_repetition_of_config: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RewardMarker {
    pub position: GridPosition,
    pub visible: bool,
}

/// Fixed arena of marker slots, reset in place whenever a configuration loads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardMarkers {
    slots: [RewardMarker; REWARD_SLOTS],
}

impl RewardMarkers {
    fn from_positions(positions: &[GridPosition; REWARD_SLOTS]) -> Self {
        Self {
            slots: (*positions).map(|position| RewardMarker {
                position,
                visible: false,
            }),
        }
    }

    fn reset_to(&mut self, positions: &[GridPosition; REWARD_SLOTS]) {
        for (slot, position) in self.slots.iter_mut().zip(positions.iter()) {
            slot.position = *position;
            slot.visible = false;
        }
    }

    /// Returns true if the marker was hidden before.
    fn show(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if !slot.visible => {
                slot.visible = true;
                true
            }
            _ => false,
        }
    }

    /// Returns true if the marker was visible before.
    fn hide(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.visible => {
                slot.visible = false;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&RewardMarker> {
        self.slots.get(index)
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.slots.get(index).map(|m| m.visible).unwrap_or(false)
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, m)| m.visible)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewardMarker> {
        self.slots.iter()
    }
}

/// What the session should do after a completed repetition's delay expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advancement {
    /// Same configuration again; the avatar stays where it is.
    NextRepetition { config_index: usize, repetition: u32 },
    /// A new configuration has been loaded. `layout_changed` is false when
    /// its rewards sit exactly where the previous configuration's did.
    NextConfiguration {
        config_index: usize,
        layout_changed: bool,
    },
    /// No configurations remain.
    SessionComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    CompleteTrial { epoch: u64 },
}

pub struct SequenceController {
    layouts: ConfigurationSet,
    rules: SequenceRules,
    progress: TrialProgress,
    markers: RewardMarkers,
    cue_shown_at: Option<Duration>,
    accepting_input: bool,
    /// Bumped on every configuration load; deferred callbacks from an older
    /// epoch are ignored.
    epoch: u64,
    deferred: Scheduler<Deferred>,
    moves_since_reward: u32,
    moves_this_repetition: u32,
    repetition_started_at: Duration,
    log: EventLog,
}

impl SequenceController {
    /// Create a controller positioned on the first configuration. Nothing is
    /// logged until [`load_configuration`](Self::load_configuration) runs.
    pub fn new(layouts: ConfigurationSet, rules: SequenceRules, log: EventLog) -> Self {
        let markers = RewardMarkers::from_positions(&layouts[0].reward_positions);
        Self {
            layouts,
            rules,
            progress: TrialProgress::at_config(0),
            markers,
            cue_shown_at: None,
            accepting_input: false,
            epoch: 0,
            deferred: Scheduler::new(),
            moves_since_reward: 0,
            moves_this_repetition: 0,
            repetition_started_at: Duration::ZERO,
            log,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn progress(&self) -> &TrialProgress {
        &self.progress
    }

    pub fn markers(&self) -> &RewardMarkers {
        &self.markers
    }

    pub fn layouts(&self) -> &ConfigurationSet {
        &self.layouts
    }

    pub fn rules(&self) -> &SequenceRules {
        &self.rules
    }

    pub fn current_configuration(&self) -> &RewardConfiguration {
        &self.layouts[self.progress.current_config_index]
    }

    pub fn sequence_length(&self) -> usize {
        self.current_configuration().sequence_length()
    }

    /// All rewards of the current repetition have been found.
    pub fn is_sequence_complete(&self) -> bool {
        self.progress.next_reward_index >= self.sequence_length()
    }

    /// Position of the reward the participant should confirm next.
    pub fn next_target(&self) -> Option<GridPosition> {
        if self.is_sequence_complete() {
            return None;
        }
        Some(self.current_configuration().reward_positions[self.progress.next_reward_index])
    }

    /// Where the avatar starts a configuration: on the last reward of the
    /// sequence it is about to repeat.
    pub fn start_position(&self) -> GridPosition {
        let config = self.current_configuration();
        config.reward_positions[config.sequence_length() - 1]
    }

    pub fn accepts_input(&self) -> bool {
        self.accepting_input
    }

    pub fn cue_visible(&self) -> bool {
        self.cue_shown_at.is_some()
    }

    pub fn has_pending_advancement(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn moves_this_repetition(&self) -> u32 {
        self.moves_this_repetition
    }

    /// Logging context for the current moment.
    pub fn stamp(&self) -> TrialStamp {
        let rep = if self.is_sequence_complete() {
            self.progress.repetitions_completed.max(1)
        } else {
            self.progress.repetitions_completed + 1
        };
        TrialStamp {
            round: self.progress.current_config_index,
            rep,
            config_name: self.current_configuration().name.clone(),
        }
    }

    // ========================================================================
    // Configuration and repetition lifecycle
    // ========================================================================

    /// Make `index` the active configuration: markers are re-seated and
    /// hidden, reward progress resets, and any pending advancement from the
    /// previous configuration is invalidated. Safe to call repeatedly.
    pub fn load_configuration(&mut self, index: usize, now: Duration) -> Result<(), TaskError> {
        if index >= self.layouts.len() {
            return Err(TaskError::ConfigurationOutOfRange {
                index,
                count: self.layouts.len(),
            });
        }

        let cancelled = self.deferred.cancel_all();
        if cancelled > 0 {
            tracing::debug!("Cancelled {} pending advancement(s) on configuration load", cancelled);
        }
        self.epoch += 1;

        self.progress.current_config_index = index;
        self.progress.next_reward_index = 0;
        self.progress.last_revealed_reward_index = None;
        self.progress.is_first_repetition_of_config = true;
        self.markers
            .reset_to(&self.layouts[index].reward_positions);
        self.cue_shown_at = None;
        self.accepting_input = false;
        self.moves_since_reward = 0;
        self.moves_this_repetition = 0;

        let config = self.current_configuration();
        tracing::info!(
            "Loaded configuration {} ({}, {} rewards)",
            index,
            config.name,
            config.sequence_length()
        );
        let record = EventRecord::new(EventKind::ConfigurationStart)
            .with("trial_type", config.trial_type())
            .with("sequence_length", config.sequence_length());
        self.emit(now, record);
        Ok(())
    }

    /// Open a repetition for input and log its start.
    pub fn begin_repetition(&mut self, now: Duration, start: GridPosition) {
        self.accepting_input = true;
        self.repetition_started_at = now;
        self.moves_since_reward = 0;
        self.moves_this_repetition = 0;

        let stamp = self.stamp();
        tracing::info!(
            "Starting repetition {}/{} of {}",
            stamp.rep,
            self.layouts.trials_per_config(),
            stamp.config_name
        );
        let record = EventRecord::new(EventKind::TrialStart)
            .with("trial_type", self.current_configuration().trial_type())
            .with("sequence_length", self.sequence_length())
            .with_position("start_loc", &start);
        self.log.emit(now, &stamp, record);
    }

    /// Count one completed translation toward `moves_to_find`.
    pub fn record_move(&mut self) {
        self.moves_since_reward += 1;
        self.moves_this_repetition += 1;
    }

    // ========================================================================
    // Reward evaluation
    // ========================================================================

    /// Evaluate the avatar standing at `position`.
    ///
    /// With `confirm`, checks the next expected reward and advances on a hit.
    /// Without it, only hides a previously revealed marker once the avatar
    /// has walked away from it. Returns true only for a successful confirm.
    pub fn evaluate(&mut self, position: GridPosition, confirm: bool, now: Duration) -> bool {
        if self.is_sequence_complete() {
            return false;
        }

        let target_index = self.progress.next_reward_index;
        let target = self.current_configuration().reward_positions[target_index];
        let distance = position.distance(&target);

        if confirm {
            let hit = distance < self.rules.hit_radius;
            let record = EventRecord::new(EventKind::RewardCheck)
                .with_position("curr_loc", &position)
                .with_position("curr_rew", &target)
                .with("distance", distance)
                .with("within_radius", hit)
                .with("reward_letter", reward_letter(target_index))
                .with("reward_index", target_index);
            self.emit(now, record);

            if !hit {
                tracing::debug!(
                    "Confirm missed reward {} by {:.3}",
                    reward_letter(target_index),
                    distance
                );
                return false;
            }

            self.reveal(target_index, now);
            self.progress.next_reward_index += 1;

            if self.current_configuration().is_short_sequence()
                && target_index == 2
                && self.progress.repetitions_completed + 1 < self.layouts.trials_per_config()
            {
                self.show_cue(now);
            }

            if self.is_sequence_complete() {
                self.complete_repetition(now);
            }
            return true;
        }

        if let Some(last) = self.progress.last_revealed_reward_index {
            let marker_position = self.current_configuration().reward_positions[last];
            if position.distance(&marker_position) > self.rules.leave_radius {
                self.hide_marker(last, now);
                self.progress.last_revealed_reward_index = None;
            }
        }
        false
    }

    fn reveal(&mut self, index: usize, now: Duration) {
        self.markers.show(index);
        self.progress.last_revealed_reward_index = Some(index);

        let position = self.current_configuration().reward_positions[index];
        tracing::info!(
            "Reward {} found ({}/{})",
            reward_letter(index),
            index + 1,
            self.sequence_length()
        );
        let record = EventRecord::new(EventKind::Reward)
            .with("reward_letter", reward_letter(index))
            .with("reward_index", index)
            .with_position("rew_loc", &position)
            .with("memorization_phase", false)
            .with("moves_to_find", self.moves_since_reward);
        self.emit(now, record);
        self.moves_since_reward = 0;
    }

    fn hide_marker(&mut self, index: usize, now: Duration) {
        if !self.markers.hide(index) {
            return;
        }
        let position = self.current_configuration().reward_positions[index];
        let record = EventRecord::new(EventKind::RewardOffset)
            .with("reward_letter", reward_letter(index))
            .with("reward_index", index)
            .with_position("rew_loc", &position)
            .with("memorization_phase", false);
        self.emit(now, record);
    }

    fn show_cue(&mut self, now: Duration) {
        self.cue_shown_at = Some(now);
        tracing::debug!("Cue displayed");
        let record = EventRecord::new(EventKind::CueDisplayed)
            .with("cue_time", now.as_secs_f64())
            .with("reward_letter", reward_letter(2));
        self.emit(now, record);
    }

    fn complete_repetition(&mut self, now: Duration) {
        self.accepting_input = false;
        self.progress.repetitions_completed += 1;
        self.progress.is_first_repetition_of_config = false;

        let duration = now.saturating_sub(self.repetition_started_at);
        tracing::info!(
            "Repetition {}/{} complete in {:.1}s",
            self.progress.repetitions_completed,
            self.layouts.trials_per_config(),
            duration.as_secs_f64()
        );
        let record = EventRecord::new(EventKind::TrialComplete)
            .with("duration", duration.as_secs_f64())
            .with("moves", self.moves_this_repetition);
        self.emit(now, record);

        self.deferred.schedule(
            now + self.rules.completion_delay,
            Deferred::CompleteTrial { epoch: self.epoch },
        );
    }

    // ========================================================================
    // Advancement
    // ========================================================================

    /// Fire any deferred completion that is due at `now`.
    ///
    /// Callbacks scheduled under an older configuration epoch, or arriving
    /// when the sequence is not complete, are discarded.
    pub fn poll(&mut self, now: Duration) -> Option<Advancement> {
        while let Some(deferred) = self.deferred.pop_due(now) {
            match deferred {
                Deferred::CompleteTrial { epoch } => {
                    if epoch != self.epoch || !self.is_sequence_complete() {
                        tracing::warn!(
                            "Discarding stale trial completion (epoch {}, current {})",
                            epoch,
                            self.epoch
                        );
                        continue;
                    }
                    return Some(self.advance(now));
                }
            }
        }
        None
    }

    fn advance(&mut self, now: Duration) -> Advancement {
        let current = self.progress.current_config_index;

        if self.progress.repetitions_completed < self.layouts.trials_per_config() {
            self.reset_repetition(now);
            return Advancement::NextRepetition {
                config_index: current,
                repetition: self.progress.repetitions_completed + 1,
            };
        }

        let next = current + 1;
        if next < self.layouts.len() {
            let layout_changed = self.layouts[next]
                .layout_differs(&self.layouts[current], self.rules.layout_tolerance);
            tracing::info!(
                "{} complete; moving to configuration {} (layout changed: {})",
                self.layouts[current].name,
                next,
                layout_changed
            );
            self.progress.repetitions_completed = 0;
            if let Err(e) = self.load_configuration(next, now) {
                tracing::error!("Failed to load configuration {}: {}", next, e);
                self.end_session();
                return Advancement::SessionComplete;
            }
            return Advancement::NextConfiguration {
                config_index: next,
                layout_changed,
            };
        }

        tracing::info!("All configurations completed");
        self.end_session();
        Advancement::SessionComplete
    }

    /// Hide everything and start the same configuration over.
    fn reset_repetition(&mut self, now: Duration) {
        for index in self.markers.visible_indices() {
            self.hide_marker(index, now);
        }
        self.cue_shown_at = None;
        self.progress.next_reward_index = 0;
        self.progress.last_revealed_reward_index = None;
        self.accepting_input = true;
    }

    /// Stop accepting input and drop any pending advancement.
    pub fn end_session(&mut self) {
        self.accepting_input = false;
        let cancelled = self.deferred.cancel_all();
        if cancelled > 0 {
            tracing::debug!("Cancelled {} pending advancement(s) at session end", cancelled);
        }
    }

    // ========================================================================
    // Memorization replay hooks
    // ========================================================================

    /// Show a marker as part of the overview replay.
    pub fn show_for_replay(&mut self, index: usize, repetition: u32, now: Duration) {
        if !self.markers.show(index) {
            return;
        }
        let position = self.current_configuration().reward_positions[index];
        let record = EventRecord::new(EventKind::Reward)
            .with("reward_letter", reward_letter(index))
            .with("reward_index", index)
            .with_position("rew_loc", &position)
            .with("memorization_phase", true)
            .with("repetition_number", repetition);
        self.emit(now, record);
    }

    pub fn hide_for_replay(&mut self, index: usize, repetition: u32, now: Duration) {
        if !self.markers.hide(index) {
            return;
        }
        let position = self.current_configuration().reward_positions[index];
        let record = EventRecord::new(EventKind::RewardOffset)
            .with("reward_letter", reward_letter(index))
            .with("reward_index", index)
            .with_position("rew_loc", &position)
            .with("memorization_phase", true)
            .with("repetition_number", repetition);
        self.emit(now, record);
    }

    fn emit(&self, now: Duration, record: EventRecord) {
        self.log.emit(now, &self.stamp(), record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abcd_core::{MemorySink, ParticipantInfo};

    fn p(x: f32, z: f32) -> GridPosition {
        GridPosition::new(x, 0.5, z)
    }

    fn layouts(names: &[&str], trials: u32) -> ConfigurationSet {
        let configs = names
            .iter()
            .map(|name| {
                RewardConfiguration::new(*name, [p(-5.3, 5.0), p(5.0, 15.3), p(15.3, 25.6), p(-5.3, 25.6)])
            })
            .collect();
        ConfigurationSet::new(configs, trials).unwrap()
    }

    fn controller(names: &[&str], trials: u32) -> (SequenceController, MemorySink) {
        let sink = MemorySink::new();
        let log = EventLog::new(Box::new(sink.clone()), ParticipantInfo::default());
        let mut seq = SequenceController::new(layouts(names, trials), SequenceRules::default(), log);
        seq.load_configuration(0, Duration::ZERO).unwrap();
        seq.begin_repetition(Duration::ZERO, seq.start_position());
        (seq, sink)
    }

    #[test]
    fn test_start_position_is_last_reward() {
        let (seq, _) = controller(&["ABCD_1"], 1);
        assert_eq!(seq.start_position(), p(-5.3, 25.6));

        let (short, _) = controller(&["ABC_1"], 1);
        assert_eq!(short.start_position(), p(15.3, 25.6));
    }

    #[test]
    fn test_confirm_hit_advances_and_reveals() {
        let (mut seq, sink) = controller(&["ABCD_1"], 2);
        let now = Duration::from_secs(1);

        assert!(seq.evaluate(p(-5.3, 5.0), true, now));
        assert_eq!(seq.progress().next_reward_index, 1);
        assert_eq!(seq.progress().last_revealed_reward_index, Some(0));
        assert!(seq.markers().is_visible(0));
        assert_eq!(sink.count(EventKind::RewardCheck), 1);
        assert_eq!(sink.count(EventKind::Reward), 1);
    }

    #[test]
    fn test_confirm_at_exactly_hit_radius_misses() {
        let sink = MemorySink::new();
        let log = EventLog::new(Box::new(sink.clone()), ParticipantInfo::default());
        let rules = SequenceRules {
            hit_radius: 0.5,
            ..SequenceRules::default()
        };
        let mut seq = SequenceController::new(layouts(&["ABCD_1"], 2), rules, log);
        seq.load_configuration(0, Duration::ZERO).unwrap();
        seq.begin_repetition(Duration::ZERO, seq.start_position());

        // A sits at y = 0.5; standing at y = 1.0 is exactly 0.5 away.
        let on_radius = GridPosition::new(-5.3, 1.0, 5.0);
        assert_eq!(on_radius.distance(&p(-5.3, 5.0)), 0.5);
        assert!(!seq.evaluate(on_radius, true, Duration::from_secs(1)));
        assert_eq!(seq.progress().next_reward_index, 0);
        let check = &sink.of_kind(EventKind::RewardCheck)[0];
        assert_eq!(check.get("within_radius").and_then(|v| v.as_bool()), Some(false));

        let inside = GridPosition::new(-5.3, 0.75, 5.0);
        assert!(seq.evaluate(inside, true, Duration::from_secs(2)));
        assert_eq!(seq.progress().next_reward_index, 1);
    }

    #[test]
    fn test_confirm_miss_logs_check_only() {
        let (mut seq, sink) = controller(&["ABCD_1"], 2);
        assert!(!seq.evaluate(p(5.0, 15.3), true, Duration::from_secs(1)));
        assert_eq!(seq.progress().next_reward_index, 0);
        assert_eq!(sink.count(EventKind::Reward), 0);

        let checks = sink.of_kind(EventKind::RewardCheck);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].get("within_radius").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(checks[0].field_text("reward_letter"), "A");
    }

    #[test]
    fn test_stationary_evaluation_never_advances() {
        let (mut seq, sink) = controller(&["ABCD_1"], 2);
        assert!(!seq.evaluate(p(-5.3, 5.0), false, Duration::from_secs(1)));
        assert_eq!(seq.progress().next_reward_index, 0);
        assert_eq!(sink.count(EventKind::RewardCheck), 0);
    }

    #[test]
    fn test_marker_hides_after_walking_away() {
        let (mut seq, sink) = controller(&["ABCD_1"], 2);
        seq.evaluate(p(-5.3, 5.0), true, Duration::from_secs(1));

        // Still standing on it: stays visible.
        seq.evaluate(p(-5.3, 5.0), false, Duration::from_secs(2));
        assert!(seq.markers().is_visible(0));

        // Mid-step, well away.
        seq.evaluate(p(-5.3, 8.0), false, Duration::from_secs(3));
        assert!(!seq.markers().is_visible(0));
        assert_eq!(seq.progress().last_revealed_reward_index, None);
        assert_eq!(sink.count(EventKind::RewardOffset), 1);
    }

    #[test]
    fn test_completion_schedules_and_blocks_input() {
        let (mut seq, sink) = controller(&["ABCD_1"], 2);
        for (i, pos) in [p(-5.3, 5.0), p(5.0, 15.3), p(15.3, 25.6), p(-5.3, 25.6)]
            .into_iter()
            .enumerate()
        {
            assert!(seq.evaluate(pos, true, Duration::from_secs(i as u64 + 1)));
        }
        assert_eq!(seq.progress().next_reward_index, 4);
        assert_eq!(seq.progress().repetitions_completed, 1);
        assert!(!seq.accepts_input());
        assert!(seq.has_pending_advancement());
        assert_eq!(sink.count(EventKind::TrialComplete), 1);

        // Confirming again is a no-op.
        assert!(!seq.evaluate(p(-5.3, 25.6), true, Duration::from_secs(5)));
        assert_eq!(sink.count(EventKind::RewardCheck), 4);

        // Not yet due.
        assert_eq!(seq.poll(Duration::from_secs(5)), None);
        assert_eq!(
            seq.poll(Duration::from_secs(6)),
            Some(Advancement::NextRepetition {
                config_index: 0,
                repetition: 2
            })
        );
        assert_eq!(seq.progress().next_reward_index, 0);
        assert!(seq.markers().visible_indices().is_empty());
        assert!(seq.accepts_input());
    }

    #[test]
    fn test_load_configuration_invalidates_pending() {
        let (mut seq, _) = controller(&["ABCD_1", "ABCD_2"], 1);
        for pos in [p(-5.3, 5.0), p(5.0, 15.3), p(15.3, 25.6), p(-5.3, 25.6)] {
            seq.evaluate(pos, true, Duration::from_secs(1));
        }
        assert!(seq.has_pending_advancement());

        seq.load_configuration(0, Duration::from_secs(2)).unwrap();
        assert!(!seq.has_pending_advancement());
        assert_eq!(seq.poll(Duration::from_secs(60)), None);
        assert_eq!(seq.progress().next_reward_index, 0);
    }

    #[test]
    fn test_load_configuration_out_of_range() {
        let (mut seq, _) = controller(&["ABCD_1"], 1);
        assert_eq!(
            seq.load_configuration(3, Duration::ZERO),
            Err(TaskError::ConfigurationOutOfRange { index: 3, count: 1 })
        );
    }

    #[test]
    fn test_stamp_reports_finished_repetition_during_delay() {
        let (mut seq, _) = controller(&["ABC_1"], 3);
        assert_eq!(seq.stamp().rep, 1);
        for pos in [p(-5.3, 5.0), p(5.0, 15.3), p(15.3, 25.6)] {
            seq.evaluate(pos, true, Duration::from_secs(1));
        }
        assert_eq!(seq.stamp().rep, 1);
        seq.poll(Duration::from_secs(10));
        assert_eq!(seq.stamp().rep, 2);
    }
}
