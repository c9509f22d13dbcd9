//! Shared session driver for the integration tests.
#![allow(dead_code)]

use abcd_core::{
    ConfigurationSet, EventLog, GridPosition, Heading, LogicalInput, MemorySink, ParticipantInfo,
    PresentationAdapter, RewardConfiguration, TaskConfig, Turn,
};
use abcd_task::{Advancement, FreeNavigationCamera, Session, SessionPhase, TickReport};
use std::time::Duration;

pub const XS: [f32; 3] = [-5.3, 5.0, 15.3];
pub const ZS: [f32; 3] = [5.0, 15.3, 25.6];

/// Grid cell by column/row index.
pub fn cell(col: usize, row: usize) -> GridPosition {
    GridPosition::new(XS[col], 0.5, ZS[row])
}

pub fn layouts(configs: Vec<RewardConfiguration>, trials: u32) -> ConfigurationSet {
    ConfigurationSet::new(configs, trials).expect("valid test layouts")
}

pub struct Driver {
    pub session: Session,
    pub sink: MemorySink,
    pub dt: Duration,
}

impl Driver {
    pub fn new(layouts: ConfigurationSet) -> Self {
        Self::with_adapter(layouts, Box::new(FreeNavigationCamera::new()), Duration::from_millis(20))
    }

    pub fn with_adapter(
        layouts: ConfigurationSet,
        adapter: Box<dyn PresentationAdapter>,
        dt: Duration,
    ) -> Self {
        let sink = MemorySink::new();
        let log = EventLog::new(Box::new(sink.clone()), ParticipantInfo::default());
        let mut session = Session::new(&TaskConfig::default(), layouts, adapter, log);
        session.start().expect("session starts");
        Self { session, sink, dt }
    }

    pub fn tick(&mut self, inputs: &[LogicalInput]) -> TickReport {
        self.session.tick(self.dt, inputs)
    }

    /// Tick with no input until the avatar is idle again.
    pub fn settle(&mut self) {
        for _ in 0..10_000 {
            if self.session.movement().is_idle() {
                return;
            }
            self.tick(&[]);
        }
        panic!("avatar never settled");
    }

    pub fn press(&mut self, input: LogicalInput) -> TickReport {
        let report = self.tick(&[input]);
        self.settle();
        report
    }

    pub fn confirm(&mut self) -> bool {
        self.tick(&[LogicalInput::Confirm]).movement.reward_confirmed
    }

    /// Turn and step along x first, then z, until standing on `target`.
    pub fn walk_to(&mut self, target: GridPosition) {
        for _ in 0..64 {
            let movement = self.session.movement();
            let here = movement.position();
            let dx = target.x - here.x;
            let dz = target.z - here.z;
            let want = if dx > 0.5 {
                Heading::East
            } else if dx < -0.5 {
                Heading::West
            } else if dz > 0.5 {
                Heading::North
            } else if dz < -0.5 {
                Heading::South
            } else {
                return;
            };

            let heading = movement.heading();
            let input = if heading == want {
                LogicalInput::Forward
            } else if heading.turned(Turn::Right) == want {
                LogicalInput::TurnRight
            } else if heading.turned(Turn::Left) == want {
                LogicalInput::TurnLeft
            } else {
                LogicalInput::TurnAbout
            };
            self.press(input);
        }
        panic!("could not reach {}", target);
    }

    pub fn walk_and_confirm(&mut self, target: GridPosition) -> bool {
        self.walk_to(target);
        self.confirm()
    }

    /// Idle for `duration`, collecting any advancements.
    pub fn wait(&mut self, duration: Duration) -> Vec<Advancement> {
        let until = self.session.now() + duration;
        let mut fired = Vec::new();
        while self.session.now() < until && !self.session.is_finished() {
            if let Some(advancement) = self.tick(&[]).advancement {
                fired.push(advancement);
            }
        }
        fired
    }

    pub fn wait_for_free_play(&mut self) {
        for _ in 0..100_000 {
            if self.session.phase() != SessionPhase::Memorizing {
                return;
            }
            self.tick(&[]);
        }
        panic!("replay never finished");
    }
}
