use crate::csv::escape;
use crate::{results_file_name, CsvSink, JsonLinesSink};
use abcd_core::{
    EventKind, EventLog, EventRecord, EventSink, GridPosition, LogFormat, ParticipantInfo,
    TrialStamp, LOG_COLUMNS,
};
use chrono::{Local, TimeZone};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn stamp() -> TrialStamp {
    TrialStamp {
        round: 0,
        rep: 1,
        config_name: "ABCD_1".to_string(),
    }
}

#[test]
fn test_escape() {
    assert_eq!(escape("plain"), "plain");
    assert_eq!(escape("a,b"), "\"a,b\"");
    assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    assert_eq!(escape(""), "");
}

#[test]
fn test_csv_header_and_row_alignment() {
    let mut sink = CsvSink::new(Vec::new()).unwrap();
    let record = EventRecord::new(EventKind::RewardCheck)
        .with_position("curr_loc", &GridPosition::new(5.0, 0.5, 15.3))
        .with("within_radius", true)
        .with("reward_letter", 'B')
        .with("not_a_column", "dropped");
    sink.record(&record).unwrap();
    assert_eq!(sink.rows(), 1);

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), LOG_COLUMNS.join(","));

    let cells: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(cells.len(), LOG_COLUMNS.len());
    let cell = |name: &str| cells[LOG_COLUMNS.iter().position(|c| *c == name).unwrap()];
    assert_eq!(cell("event_type"), "reward_check");
    assert_eq!(cell("curr_loc_z"), "15.3");
    assert_eq!(cell("within_radius"), "true");
    assert_eq!(cell("reward_letter"), "B");
    assert_eq!(cell("distance"), "");
    assert!(!text.contains("dropped"));
}

#[test]
fn test_csv_through_event_log() {
    let sink = CsvSink::new(Vec::new()).unwrap();
    let log = EventLog::new(Box::new(sink), ParticipantInfo::new("P,01", "study", "003"));
    log.emit(
        Duration::from_millis(1500),
        &stamp(),
        EventRecord::new(EventKind::TrialStart),
    );
    assert_eq!(log.written(), 1);
    assert_eq!(log.dropped(), 0);
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Minimal RFC 4180 reader: quoted cells may hold commas, quotes and line breaks.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match (quoted, c) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            (true, '"') => quoted = false,
            (true, c) => cell.push(c),
            (false, '"') => quoted = true,
            (false, ',') => row.push(std::mem::take(&mut cell)),
            (false, '\r') => {}
            (false, '\n') => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            (false, c) => cell.push(c),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    rows
}

#[test]
fn test_csv_line_breaks_survive_event_log() {
    let buffer = SharedBuffer::default();
    let sink = CsvSink::new(buffer.clone()).unwrap();
    let log = EventLog::new(
        Box::new(sink),
        ParticipantInfo::new("P\r\n01", "fmri, \"wave 2\"", "003"),
    );
    log.emit(
        Duration::from_secs(2),
        &stamp(),
        EventRecord::new(EventKind::KeyPress).with("key_pressed", "line\nbreak"),
    );
    log.emit(
        Duration::from_secs(3),
        &stamp(),
        EventRecord::new(EventKind::TrialStart),
    );
    assert_eq!(log.dropped(), 0);

    let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let rows = parse_csv(&text);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], LOG_COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>());
    assert!(rows.iter().all(|r| r.len() == LOG_COLUMNS.len()));

    let col = |name: &str| LOG_COLUMNS.iter().position(|c| *c == name).unwrap();
    assert_eq!(rows[1][col("event_type")], "key_press");
    assert_eq!(rows[1][col("participant")], "P\r\n01");
    assert_eq!(rows[1][col("study_id")], "fmri, \"wave 2\"");
    assert_eq!(rows[1][col("key_pressed")], "line\nbreak");
    assert_eq!(rows[2][col("event_type")], "trial_start");
    assert_eq!(rows[2][col("session_id")], "003");
}

#[test]
fn test_jsonl_keeps_all_fields() {
    let mut sink = JsonLinesSink::new(Vec::new());
    sink.record(
        &EventRecord::new(EventKind::SessionEnd)
            .with("reason", "completed")
            .with("extra", 7i64),
    )
    .unwrap();
    sink.record(&EventRecord::new(EventKind::TrialStart)).unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["event_type"], "session_end");
    assert_eq!(first["reason"], "completed");
    assert_eq!(first["extra"], 7);
}

#[test]
fn test_results_file_name() {
    let participant = ParticipantInfo::new("P 01", "study/x", "001");
    let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    assert_eq!(
        results_file_name(&participant, LogFormat::Csv, at),
        "P_01_study_x_20240309_140507_results.csv"
    );
    assert!(results_file_name(&participant, LogFormat::Jsonl, at).ends_with("_results.jsonl"));
}
