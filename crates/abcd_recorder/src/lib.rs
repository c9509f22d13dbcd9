//! Durable event sinks.
//!
//! Both sinks flush after every row so a crash mid-session loses at most the
//! row being written.

pub mod csv;
pub mod file;
pub mod jsonl;

pub use csv::CsvSink;
pub use file::{open_sink, results_file_name, OpenedSink};
pub use jsonl::JsonLinesSink;

#[cfg(test)]
mod tests;
