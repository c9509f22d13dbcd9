//! Results files written through a real session.
//!
//! Uses tempfile::TempDir for isolated output directories.

use abcd_core::{
    ConfigurationSet, EventLog, GridPosition, LogFormat, LoggingConfig, LogicalInput,
    ParticipantInfo, RewardConfiguration, TaskConfig, LOG_COLUMNS,
};
use abcd_recorder::open_sink;
use abcd_task::{FreeNavigationCamera, Session};
use std::time::Duration;

fn layouts() -> ConfigurationSet {
    let p = |x, z| GridPosition::new(x, 0.5, z);
    ConfigurationSet::new(
        vec![RewardConfiguration::new(
            "ABCD_1",
            [p(-5.3, 5.0), p(5.0, 5.0), p(5.0, 15.3), p(15.3, 25.6)],
        )],
        2,
    )
    .unwrap()
}

fn run_short_session(config: &LoggingConfig) -> std::path::PathBuf {
    let participant = ParticipantInfo::new("P01", "pilot", "001");
    let opened = open_sink(config, &participant).unwrap();
    let log = EventLog::new(opened.sink, participant);
    let mut session = Session::new(
        &TaskConfig::default(),
        layouts(),
        Box::new(FreeNavigationCamera::new()),
        log,
    );
    session.start().unwrap();

    let dt = Duration::from_millis(50);
    session.tick(dt, &[LogicalInput::TurnLeft]);
    for _ in 0..40 {
        session.tick(dt, &[]);
    }
    session.tick(dt, &[LogicalInput::Forward]);
    for _ in 0..60 {
        session.tick(dt, &[]);
    }
    session.tick(dt, &[LogicalInput::Confirm]);
    session.abort();
    opened.path
}

#[test]
fn test_csv_results_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = LoggingConfig {
        output_dir: dir.path().join("nested").join("data"),
        format: LogFormat::Csv,
    };
    let path = run_short_session(&config);

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("P01_pilot_"));
    assert!(name.ends_with("_results.csv"));

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], LOG_COLUMNS.join(","));
    assert!(lines[1].starts_with("configuration_start,P01,pilot,001,"));
    assert!(lines.iter().any(|l| l.starts_with("movement_complete,")));
    assert!(lines.iter().any(|l| l.starts_with("reward_check,")));
    assert!(lines.last().unwrap().starts_with("session_end,"));
    assert!(lines[1..]
        .iter()
        .all(|l| l.split(',').count() == LOG_COLUMNS.len()));
}

#[test]
fn test_jsonl_results_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = LoggingConfig {
        output_dir: dir.path().to_path_buf(),
        format: LogFormat::Jsonl,
    };
    let path = run_short_session(&config);
    assert!(path.to_string_lossy().ends_with("_results.jsonl"));

    let text = std::fs::read_to_string(&path).unwrap();
    let events: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events[0]["event_type"], "configuration_start");
    assert_eq!(events[0]["participant"], "P01");
    assert_eq!(events.last().unwrap()["reason"], "aborted");
}

#[test]
fn test_same_second_sessions_do_not_collide() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = LoggingConfig {
        output_dir: dir.path().to_path_buf(),
        format: LogFormat::Csv,
    };
    let participant = ParticipantInfo::new("P01", "pilot", "001");
    let a = open_sink(&config, &participant).unwrap();
    let b = open_sink(&config, &participant).unwrap();
    assert_ne!(a.path, b.path);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}
