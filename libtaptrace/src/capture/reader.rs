use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder, StringRecordsIntoIter, Trim};
use log::debug;

use crate::capture::SampleRecord;
use crate::error::{DecodeError, Result};

/// Anything that yields samples in capture order.
pub trait SampleSource: Iterator<Item = Result<SampleRecord>> {}

impl<T> SampleSource for T where T: Iterator<Item = Result<SampleRecord>> {}

/// Lazily parses capture rows, one sample per line.
pub struct CaptureReader<R> {
    records: StringRecordsIntoIter<R>,
    rows: usize,
}

impl CaptureReader<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening capture {}", path.display());
        let file = File::open(path)?;
        Ok(CaptureReader::new(file))
    }
}

impl<R: Read> CaptureReader<R> {
    pub fn new(reader: R) -> Self {
        // row length is checked per sample, so short rows surface as format errors
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .quote(b'|')
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);
        CaptureReader {
            records: reader.into_records(),
            rows: 0,
        }
    }

    /// Number of rows read so far.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<SampleRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.records.next()?;
        self.rows += 1;
        match next {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(self.rows);
                Some(SampleRecord::parse(line, &record))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(self.rows);
                Some(Err(match e.into_kind() {
                    ErrorKind::Io(e) => DecodeError::Io(e),
                    ErrorKind::Utf8 { err, .. } => {
                        DecodeError::format(line, format!("not valid UTF-8: {}", err))
                    }
                    kind => DecodeError::format(line, format!("{:?}", kind)),
                }))
            }
        }
    }
}
