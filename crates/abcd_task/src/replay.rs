//! Memorization replay timeline.
//!
//! Before free play on a new layout, the overview presentation shows the
//! rewards of the sequence one at a time, in order, several times over. The
//! timeline is computed up front so the session can walk it with any tick
//! size without skipping a reveal.

use abcd_core::MemorizationConfig;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueAction {
    Show,
    Hide,
}

/// One reveal or hide at a fixed offset from the start of the replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayCue {
    pub at: Duration,
    pub action: CueAction,
    pub reward_index: usize,
    /// 1-based pass through the sequence.
    pub repetition: u32,
}

/// What should be on screen at a given offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum ReplayFrame {
    Showing { reward_index: usize, repetition: u32 },
    Gap,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayPlan {
    cues: Vec<ReplayCue>,
    duration: Duration,
}

impl ReplayPlan {
    pub fn new(config: &MemorizationConfig, sequence_length: usize) -> Self {
        let display = config.reward_display();
        let between_rewards = config.pause_between_rewards();
        let between_sequences = config.pause_between_sequences();

        let mut cues = Vec::with_capacity(config.repetitions as usize * sequence_length * 2);
        let mut t = Duration::ZERO;

        for repetition in 1..=config.repetitions {
            for reward_index in 0..sequence_length {
                cues.push(ReplayCue {
                    at: t,
                    action: CueAction::Show,
                    reward_index,
                    repetition,
                });
                t += display;
                cues.push(ReplayCue {
                    at: t,
                    action: CueAction::Hide,
                    reward_index,
                    repetition,
                });
                t += between_rewards;
            }
            if repetition < config.repetitions {
                t += between_sequences;
            }
        }

        Self {
            cues,
            duration: t + config.lead_out(),
        }
    }

    pub fn cues(&self) -> &[ReplayCue] {
        &self.cues
    }

    /// Offset at which free play begins.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn frame_at(&self, elapsed: Duration) -> ReplayFrame {
        if elapsed >= self.duration {
            return ReplayFrame::Finished;
        }
        self.cues
            .chunks(2)
            .find(|pair| match pair {
                [show, hide] => show.at <= elapsed && elapsed < hide.at,
                _ => false,
            })
            .map(|pair| ReplayFrame::Showing {
                reward_index: pair[0].reward_index,
                repetition: pair[0].repetition,
            })
            .unwrap_or(ReplayFrame::Gap)
    }
}
