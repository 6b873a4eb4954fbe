use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Serializes report or projection rows as CSV, headers included.
pub struct RowWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RowWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_rows<T: Serialize>(mut self, rows: impl IntoIterator<Item = T>) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
