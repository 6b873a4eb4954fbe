use crate::error::{OrderError, Result};
use serde::de::DeserializeOwned;
use std::io::Read;

/// Streams one record set out of a CSV snapshot.
pub struct TableReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TableReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn records<T: DeserializeOwned>(self) -> impl Iterator<Item = Result<T>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(OrderError::from))
    }
}
