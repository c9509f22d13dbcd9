//! Discrete avatar movement.
//!
//! The avatar is always in exactly one of three states: idle on a grid cell,
//! translating one cell forward, or rotating by a quarter or half turn.
//! Motion advances only on [`MovementController::tick`], at fixed linear
//! and angular rates, and settles exactly on the target cell or heading.

use crate::sequence::SequenceController;
use abcd_core::{
    ArenaBounds, EventKind, EventLog, EventRecord, GridPosition, Heading, LogicalInput,
    MovementConfig, TaskError, Turn,
};
use serde::Serialize;
use std::time::Duration;

/// Coarse motion state, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    Idle,
    Translating,
    Rotating,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Idle,
    Translating {
        from: GridPosition,
        target: GridPosition,
        started_at: Duration,
    },
    Rotating {
        from: Heading,
        to: Heading,
        turn: Turn,
        /// Signed degrees still to turn.
        remaining: f32,
        started_at: Duration,
    },
}

/// Snapshot of the avatar, for presentation and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvatarState {
    pub position: GridPosition,
    pub heading: Heading,
    /// Current yaw including any rotation in progress.
    pub yaw: f32,
    pub motion: MotionState,
    pub input_enabled: bool,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementReport {
    /// First directional input of the repetition; hide the overview aid.
    pub suppress_overview: bool,
    pub translation_completed: bool,
    pub rotation_completed: bool,
    /// A confirm landed on the expected reward.
    pub reward_confirmed: bool,
}

pub struct MovementController {
    config: MovementConfig,
    bounds: ArenaBounds,
    position: GridPosition,
    heading: Heading,
    yaw: f32,
    motion: Motion,
    input_enabled: bool,
    overview_suppressed: bool,
    key_index: u32,
    movement_index: u32,
    log: EventLog,
}

impl MovementController {
    pub fn new(
        config: MovementConfig,
        bounds: ArenaBounds,
        start: GridPosition,
        log: EventLog,
    ) -> Self {
        Self {
            config,
            bounds,
            position: start,
            heading: Heading::North,
            yaw: 0.0,
            motion: Motion::Idle,
            input_enabled: false,
            overview_suppressed: false,
            key_index: 0,
            movement_index: 0,
            log,
        }
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.motion, Motion::Idle)
    }

    pub fn motion_state(&self) -> MotionState {
        match self.motion {
            Motion::Idle => MotionState::Idle,
            Motion::Translating { .. } => MotionState::Translating,
            Motion::Rotating { .. } => MotionState::Rotating,
        }
    }

    pub fn avatar(&self) -> AvatarState {
        AvatarState {
            position: self.position,
            heading: self.heading,
            yaw: self.yaw,
            motion: self.motion_state(),
            input_enabled: self.input_enabled,
        }
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    /// Place the avatar on `position` without animating. Refused mid-motion.
    pub fn teleport(&mut self, position: GridPosition) -> Result<(), TaskError> {
        if !self.is_idle() {
            return Err(TaskError::AvatarInMotion);
        }
        tracing::debug!("Teleporting avatar {} -> {}", self.position, position);
        self.position = position;
        Ok(())
    }

    /// Reset per-repetition counters and re-arm the overview suppression.
    pub fn begin_repetition(&mut self) {
        self.overview_suppressed = false;
        self.key_index = 0;
        self.movement_index = 0;
    }

    /// Advance one simulation step.
    ///
    /// Inputs are only consumed while idle; anything that arrives while a
    /// translation or rotation is in progress is dropped. A motion started on
    /// this tick does not advance until the next one.
    pub fn tick(
        &mut self,
        dt: Duration,
        now: Duration,
        inputs: &[LogicalInput],
        sequence: &mut SequenceController,
    ) -> MovementReport {
        let mut report = MovementReport::default();
        let mut evaluated = false;

        match self.motion {
            Motion::Translating { .. } => {
                if self.advance_translation(dt, now, sequence) {
                    report.translation_completed = true;
                    evaluated = true;
                }
                if !inputs.is_empty() {
                    tracing::trace!("Dropped {} input(s) during translation", inputs.len());
                }
            }
            Motion::Rotating { .. } => {
                report.rotation_completed = self.advance_rotation(dt, now, sequence);
                if !inputs.is_empty() {
                    tracing::trace!("Dropped {} input(s) during rotation", inputs.len());
                }
            }
            Motion::Idle => {
                if self.input_enabled && sequence.accepts_input() {
                    for input in inputs {
                        if !self.is_idle() {
                            break;
                        }
                        if input.is_directional() {
                            if !self.overview_suppressed {
                                self.overview_suppressed = true;
                                report.suppress_overview = true;
                            }
                            self.handle_directional(*input, now, sequence);
                        } else {
                            self.log_key(now, *input, true, sequence);
                            evaluated = true;
                            if sequence.evaluate(self.position, true, now) {
                                report.reward_confirmed = true;
                            }
                            if !sequence.accepts_input() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        if self.is_idle() && !evaluated {
            sequence.evaluate(self.position, false, now);
        }
        report
    }

    fn handle_directional(
        &mut self,
        input: LogicalInput,
        now: Duration,
        sequence: &SequenceController,
    ) {
        match input.turn() {
            Some(turn) => {
                self.log_key(now, input, true, sequence);
                self.start_rotation(turn, now, sequence);
            }
            None => {
                let candidate = self.position.stepped(self.heading, self.config.grid_step);
                let accepted = self.bounds.contains(&candidate);
                self.log_key(now, input, accepted, sequence);
                if accepted {
                    self.start_translation(candidate, now, sequence);
                } else {
                    tracing::debug!("Rejected move to {} (outside arena)", candidate);
                }
            }
        }
    }

    fn start_translation(
        &mut self,
        target: GridPosition,
        now: Duration,
        sequence: &SequenceController,
    ) {
        self.movement_index += 1;
        self.motion = Motion::Translating {
            from: self.position,
            target,
            started_at: now,
        };
        let mut record = EventRecord::new(EventKind::MovementStart)
            .with_position("from", &self.position)
            .with_position("to", &target)
            .with("direction", self.heading.as_str())
            .with("movement_index", self.movement_index);
        if let Some(reward) = sequence.next_target() {
            record = record.with_position("curr_rew", &reward);
        }
        self.log.emit(now, &sequence.stamp(), record);
    }

    fn start_rotation(&mut self, turn: Turn, now: Duration, sequence: &SequenceController) {
        let to = self.heading.turned(turn);
        self.motion = Motion::Rotating {
            from: self.heading,
            to,
            turn,
            remaining: turn.delta_degrees(),
            started_at: now,
        };
        let record = EventRecord::new(EventKind::RotationStart)
            .with("from_heading", self.heading.degrees())
            .with("to_heading", to.degrees())
            .with("direction", turn.as_str());
        self.log.emit(now, &sequence.stamp(), record);
    }

    /// Returns true when the translation settled on this tick.
    fn advance_translation(
        &mut self,
        dt: Duration,
        now: Duration,
        sequence: &mut SequenceController,
    ) -> bool {
        let Motion::Translating {
            from,
            target,
            started_at,
        } = self.motion
        else {
            return false;
        };

        let max_delta = self.config.move_speed * dt.as_secs_f32();
        self.position = self.position.move_towards(&target, max_delta);
        if self.position.distance(&target) >= self.config.arrival_epsilon {
            return false;
        }

        self.position = target;
        self.motion = Motion::Idle;

        let mut record = EventRecord::new(EventKind::MovementComplete)
            .with_position("from", &from)
            .with_position("to", &target)
            .with("direction", self.heading.as_str())
            .with("movement_index", self.movement_index)
            .with("length_step", now.saturating_sub(started_at).as_secs_f64());
        if let Some(reward) = sequence.next_target() {
            record = record.with_position("curr_rew", &reward);
        }
        self.log.emit(now, &sequence.stamp(), record);

        sequence.record_move();
        sequence.evaluate(self.position, false, now);
        true
    }

    /// Returns true when the rotation settled on this tick.
    fn advance_rotation(
        &mut self,
        dt: Duration,
        now: Duration,
        sequence: &SequenceController,
    ) -> bool {
        let Motion::Rotating {
            from,
            to,
            turn,
            remaining,
            started_at,
        } = self.motion
        else {
            return false;
        };

        let max_step = self.config.rotation_speed * dt.as_secs_f32();
        let step = remaining.abs().min(max_step).copysign(remaining);
        let remaining = remaining - step;
        self.yaw += step;

        if remaining.abs() >= self.config.angle_epsilon {
            self.motion = Motion::Rotating {
                from,
                to,
                turn,
                remaining,
                started_at,
            };
            return false;
        }

        self.heading = to;
        self.yaw = to.degrees();
        self.motion = Motion::Idle;

        let record = EventRecord::new(EventKind::RotationComplete)
            .with("from_heading", from.degrees())
            .with("to_heading", to.degrees())
            .with("direction", turn.as_str())
            .with("length_step", now.saturating_sub(started_at).as_secs_f64());
        self.log.emit(now, &sequence.stamp(), record);
        true
    }

    fn log_key(
        &mut self,
        now: Duration,
        input: LogicalInput,
        accepted: bool,
        sequence: &SequenceController,
    ) {
        self.key_index += 1;
        let record = EventRecord::new(EventKind::KeyPress)
            .with("key_pressed", input.as_str())
            .with("key_index", self.key_index)
            .with("accepted", accepted);
        self.log.emit(now, &sequence.stamp(), record);
    }
}
