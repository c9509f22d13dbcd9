use crate::script::{ScriptAction, ScriptEntry};
use abcd_core::reward_letter;
use abcd_task::{Advancement, Session, SessionSnapshot};
use std::time::Duration;
use tracing::{info, warn};

/// Drive `session` from `entries` at a fixed tick and return its final state.
///
/// Stops when the session finishes on its own, on an `abort` entry, or
/// `linger` seconds after the last entry (aborting the session then).
pub fn run(
    mut session: Session,
    entries: &[ScriptEntry],
    tick: Duration,
    linger: f64,
) -> SessionSnapshot {
    if let Err(e) = session.start() {
        warn!("Session failed to start: {}", e);
        session.abort();
        return session.snapshot();
    }

    let last = entries.last().map(|e| e.at).unwrap_or_default();
    let horizon = last + Duration::from_secs_f64(linger.max(0.0));
    let mut cursor = 0;

    while !session.is_finished() {
        let tick_end = session.now() + tick;
        let mut inputs = Vec::new();
        let mut abort = false;
        while let Some(entry) = entries.get(cursor) {
            if entry.at > tick_end {
                break;
            }
            cursor += 1;
            match entry.action {
                ScriptAction::Input(input) => inputs.push(input),
                ScriptAction::Abort => abort = true,
            }
        }
        if abort {
            info!("Script requested abort at {:.2}s", session.now().as_secs_f64());
            session.abort();
            break;
        }

        let report = session.tick(tick, &inputs);
        if let Some(advancement) = report.advancement {
            describe(&session, advancement);
        }
        if report.movement.reward_confirmed {
            let progress = session.sequence().progress();
            info!(
                "Confirmed reward {} at {:.2}s",
                reward_letter(progress.next_reward_index.saturating_sub(1)),
                session.now().as_secs_f64()
            );
        }

        if cursor >= entries.len() && session.now() >= horizon && !session.is_finished() {
            info!("Script exhausted; ending session");
            session.abort();
        }
    }
    session.snapshot()
}

pub(crate) fn describe(session: &Session, advancement: Advancement) {
    match advancement {
        Advancement::NextRepetition {
            config_index,
            repetition,
        } => info!("Configuration {}: repetition {}", config_index, repetition),
        Advancement::NextConfiguration {
            config_index,
            layout_changed,
        } => info!(
            "Configuration {} ({}){}",
            config_index,
            session.sequence().current_configuration().name,
            if layout_changed { "" } else { ", same layout" }
        ),
        Advancement::SessionComplete => info!("All configurations complete"),
    }
}
