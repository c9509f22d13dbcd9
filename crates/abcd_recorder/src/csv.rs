use abcd_core::{EventRecord, EventSink, SinkError, LOG_COLUMNS};
use std::io::Write;

/// Tabular sink with the fixed [`LOG_COLUMNS`] header.
///
/// Absent fields are written as empty cells; fields outside the schema are
/// dropped.
pub struct CsvSink<W: Write + Send> {
    writer: W,
    rows: u64,
}

impl<W: Write + Send> CsvSink<W> {
    /// Wrap `writer` and write the header row immediately.
    pub fn new(mut writer: W) -> Result<Self, SinkError> {
        writeln!(writer, "{}", LOG_COLUMNS.join(","))?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for CsvSink<W> {
    fn record(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        let row: Vec<String> = LOG_COLUMNS
            .iter()
            .map(|column| escape(&record.field_text(column)))
            .collect();
        writeln!(self.writer, "{}", row.join(","))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Quote a cell if it contains a delimiter, quote or line break.
pub(crate) fn escape(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
