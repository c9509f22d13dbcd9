//! Results files on disk.

use crate::{CsvSink, JsonLinesSink};
use abcd_core::{EventSink, LogFormat, LoggingConfig, ParticipantInfo};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

/// A sink writing to a freshly created results file.
pub struct OpenedSink {
    pub sink: Box<dyn EventSink>,
    pub path: PathBuf,
}

/// `{participant}_{study}_{YYYYmmdd_HHMMSS}_results.{ext}`
pub fn results_file_name(
    participant: &ParticipantInfo,
    format: LogFormat,
    at: DateTime<Local>,
) -> String {
    format!(
        "{}_{}_{}_results.{}",
        sanitize(&participant.participant_id),
        sanitize(&participant.study_id),
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Create the output directory if needed and open a new results file.
///
/// Never overwrites: if a file with the same name already exists, a numeric
/// suffix is added.
pub fn open_sink(config: &LoggingConfig, participant: &ParticipantInfo) -> Result<OpenedSink> {
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create log directory {}",
            config.output_dir.display()
        )
    })?;

    let name = results_file_name(participant, config.format, Local::now());
    let (file, path) = create_unique(&config.output_dir, &name)?;
    let writer = BufWriter::new(file);

    let sink: Box<dyn EventSink> = match config.format {
        LogFormat::Csv => Box::new(
            CsvSink::new(writer)
                .with_context(|| format!("Failed to write header to {}", path.display()))?,
        ),
        LogFormat::Jsonl => Box::new(JsonLinesSink::new(writer)),
    };
    tracing::info!("Writing events to {}", path.display());
    Ok(OpenedSink { sink, path })
}

fn create_unique(dir: &Path, name: &str) -> Result<(File, PathBuf)> {
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    for attempt in 0..100u32 {
        let candidate = if attempt == 0 {
            dir.join(name)
        } else {
            dir.join(format!("{}_{}.{}", stem, attempt, ext))
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", candidate.display()))
            }
        }
    }
    anyhow::bail!("Could not find a free file name for {} in {}", name, dir.display())
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
