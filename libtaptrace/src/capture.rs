use bitfield::{bitfield, bitfield_bitrange, bitfield_fields};
use bitflags::bitflags;
use csv::StringRecord;

use crate::error::{DecodeError, Result};

pub mod reader;
pub mod writer;

pub use reader::{CaptureReader, SampleSource};
pub use writer::CaptureWriter;

/// Columns of one capture row: the step index, the eight port lines D0..D7
/// and three unused trailing lines.
pub const CAPTURE_COLUMNS: usize = 12;

pub const COLUMN_NAMES: [&str; CAPTURE_COLUMNS] = [
    "step", "tck", "tms", "nce", "ncs", "tdi", "led", "read", "mode", "sdr", "udr", "wr",
];

const PORT_LINES: usize = 8;
const AUX_LINES: usize = CAPTURE_COLUMNS - 1 - PORT_LINES;

bitflags! {
    /// Lines of the 8-bit parallel port, as driven by the bit-bang host.
    #[derive(Default)]
    pub struct Line: u8 {
        const TCK = 1 << 0;
        const TMS = 1 << 1;
        const NCE = 1 << 2;
        const NCS = 1 << 3;
        const TDI = 1 << 4;
        const LED = 1 << 5;
        const RD = 1 << 6;
        const MODE = 1 << 7;
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct PortByte(u8);
    impl Debug;
    pub tck, _: 0;
    pub tms, _: 1;
    pub nce, _: 2;
    pub ncs, _: 3;
    pub tdi, _: 4;
    pub led, _: 5;
    pub read, _: 6;
    pub mode, _: 7;
    // D5..D0 read back as a 6-bit count, D5 most significant
    pub byte_count, _: 5, 0;
}

/// One row of a capture: the state of the port at a half clock period boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleRecord {
    step: f64,
    port: PortByte,
    aux: [bool; AUX_LINES],
}

impl SampleRecord {
    pub fn from_port(step: f64, port: u8) -> Self {
        SampleRecord {
            step,
            port: PortByte(port),
            aux: [false; AUX_LINES],
        }
    }

    /// Parse one capture row. `line` is only used for error reporting.
    pub fn parse(line: usize, row: &StringRecord) -> Result<Self> {
        let fields: Vec<&str> = row.iter().map(str::trim).collect();
        if fields.len() < CAPTURE_COLUMNS {
            return Err(DecodeError::format(
                line,
                format!(
                    "expected {} columns, found {}",
                    CAPTURE_COLUMNS,
                    fields.len()
                ),
            ));
        }

        let step: f64 = fields[0]
            .parse()
            .map_err(|_| DecodeError::format(line, format!("bad step `{}`", fields[0])))?;
        if !step.is_finite() {
            return Err(DecodeError::format(
                line,
                format!("step `{}` is not finite", fields[0]),
            ));
        }

        let mut port = 0u8;
        for (i, field) in fields[1..=PORT_LINES].iter().enumerate() {
            match *field {
                "0" => (),
                "1" => port |= 1 << i,
                other => {
                    return Err(DecodeError::format(
                        line,
                        format!("{} is `{}`, expected 0 or 1", COLUMN_NAMES[i + 1], other),
                    ))
                }
            }
        }

        let mut aux = [false; AUX_LINES];
        for (slot, field) in aux.iter_mut().zip(&fields[PORT_LINES + 1..CAPTURE_COLUMNS]) {
            *slot = *field == "1";
        }

        Ok(SampleRecord {
            step,
            port: PortByte(port),
            aux,
        })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Samples sit on half-period boundaries, half a step before their index.
    pub fn timestamp(&self) -> f64 {
        self.step - 0.5
    }

    pub fn port(&self) -> PortByte {
        self.port
    }

    pub fn lines(&self) -> Line {
        Line::from_bits_truncate(self.port.0)
    }

    pub fn tck(&self) -> bool {
        self.port.tck()
    }

    pub fn tms(&self) -> bool {
        self.port.tms()
    }

    pub fn tdi(&self) -> bool {
        self.port.tdi()
    }

    pub fn read(&self) -> bool {
        self.port.read()
    }

    pub fn mode(&self) -> bool {
        self.port.mode()
    }

    pub fn byte_count(&self) -> u8 {
        self.port.byte_count()
    }

    /// The port lines in capture order (D0 first), shifted out serially in byte mode.
    pub fn bits(&self) -> [bool; PORT_LINES] {
        let mut bits = [false; PORT_LINES];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = (self.port.0 >> i) & 1 != 0;
        }
        bits
    }

    pub fn aux(&self) -> [bool; AUX_LINES] {
        self.aux
    }
}
