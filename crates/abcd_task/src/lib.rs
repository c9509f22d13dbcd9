//! # ABCD Task
//!
//! The tick-driven state machines of the navigation task:
//!
//! - [`movement::MovementController`]: one grid step or one rotation at a time
//! - [`sequence::SequenceController`]: reward order, repetitions, configuration advancement
//! - [`replay::ReplayPlan`]: the memorization replay timeline
//! - [`session::Session`]: clock, phases and presentation wiring
//!
//! Nothing here sleeps or spawns. Callers advance time explicitly, so a
//! session runs identically under a real-time loop and a scripted replay.

pub mod clock;
pub mod movement;
pub mod presentation;
pub mod replay;
pub mod sequence;
pub mod session;

pub use clock::{Scheduler, SessionClock};
pub use movement::{AvatarState, MotionState, MovementController, MovementReport};
pub use presentation::{adapter_for, FreeNavigationCamera, OverviewCamera, ViewState};
pub use replay::{CueAction, ReplayCue, ReplayFrame, ReplayPlan};
pub use sequence::{Advancement, RewardMarker, RewardMarkers, SequenceController, SequenceRules, TrialProgress};
pub use session::{EndReason, Session, SessionPhase, SessionSnapshot, TickReport};
