use crate::replay::describe;
use crate::script::{parse_line, LineCommand};
use abcd_core::reward_letter;
use abcd_task::{ReplayFrame, Session, SessionPhase};
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

/// Real-time loop: fixed-rate ticks, stdin lines as input, Ctrl-C aborts.
pub async fn run(mut session: Session, tick: std::time::Duration) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<LineCommand>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(parse_line(&line)).is_err() {
                break;
            }
        }
    });

    session.start()?;
    println!("Keys: w/f forward, a/l left, d/r right, s/b about, c/space confirm, q quit (Enter sends)");
    print_status(&session);

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    let mut pending = Vec::new();
    let mut phase = session.phase();
    let mut replay = session.replay_frame();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = Instant::now();
                let dt = now - last;
                last = now;

                let report = session.tick(dt, &pending);
                pending.clear();

                if let Some(advancement) = report.advancement {
                    describe(&session, advancement);
                }
                if report.movement.reward_confirmed
                    || report.movement.translation_completed
                    || report.movement.rotation_completed
                    || session.phase() != phase
                    || session.replay_frame() != replay
                {
                    phase = session.phase();
                    replay = session.replay_frame();
                    print_status(&session);
                }
                if session.is_finished() {
                    break;
                }
            }
            Some(command) = rx.recv() => match command {
                LineCommand::Inputs(inputs) => pending.extend(inputs),
                LineCommand::Quit => {
                    session.abort();
                    break;
                }
            },
            _ = &mut ctrl_c => {
                info!("Interrupted");
                session.abort();
                break;
            }
        }
    }

    print_status(&session);
    Ok(())
}

fn print_status(session: &Session) {
    let snapshot = session.snapshot();
    let target = if snapshot.next_reward_index < snapshot.sequence_length {
        reward_letter(snapshot.next_reward_index).to_string()
    } else {
        "-".to_string()
    };
    let phase = match snapshot.phase {
        SessionPhase::NotStarted => "not started",
        SessionPhase::Memorizing => "memorize",
        SessionPhase::FreePlay => "play",
        SessionPhase::Finished => "finished",
    };
    let shown = match snapshot.replay {
        Some(ReplayFrame::Showing {
            reward_index,
            repetition,
        }) => format!(" | showing {} (pass {})", reward_letter(reward_index), repetition),
        _ => String::new(),
    };
    println!(
        "[{:7.2}s] {} {} rep {} | at {} facing {} | next {}{}{}",
        snapshot.t_session,
        phase,
        snapshot.config_name,
        snapshot.rep,
        snapshot.avatar.position,
        snapshot.avatar.heading.as_str(),
        target,
        if snapshot.cue_visible { " | cue" } else { "" },
        shown
    );
}
