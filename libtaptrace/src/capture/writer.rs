use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};
use log::trace;

use crate::error::Result;

/// Records raw port bytes as capture rows, so a bit-bang session can be
/// replayed through the decoder later.
pub struct CaptureWriter<W: Write> {
    out: Writer<W>,
    step: u64,
}

impl CaptureWriter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(CaptureWriter::new(file))
    }
}

impl<W: Write> CaptureWriter<W> {
    pub fn new(out: W) -> Self {
        let out = WriterBuilder::new()
            .has_headers(false)
            .quote(b'|')
            .from_writer(out);
        CaptureWriter { out, step: 1 }
    }

    pub fn write_port(&mut self, port: u8) -> Result<()> {
        trace!("capture step {}: {:#04x}", self.step, port);
        let step = self.step.to_string();
        let mut row = vec![step.as_str()];
        for i in 0..8 {
            row.push(if (port >> i) & 1 != 0 { "1" } else { "0" });
        }
        row.extend_from_slice(&["0", "0", "0"]);
        self.out.write_record(&row)?;
        self.step += 1;
        Ok(())
    }

    pub fn write_ports(&mut self, ports: &[u8]) -> Result<()> {
        for port in ports {
            self.write_port(*port)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        let out = self.out.into_inner().map_err(|e| e.into_error())?;
        Ok(out)
    }
}
