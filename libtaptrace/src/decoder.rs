//! Turns captured port samples into TCK edges.
//!
//! The bit-bang host drives the port in two conventions. In bit mode every
//! sample is one half period of TCK and edges are found by comparing each
//! sample with the one before it. A sample with the MODE line set announces a
//! byte burst: the following samples each carry a whole byte which the
//! programmable logic shifts out serially with TMS held low.

use core::fmt;
use std::collections::VecDeque;

use log::{info, trace};

use crate::capture::{SampleRecord, SampleSource};
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeEvent {
    pub direction: Direction,
    pub tms: bool,
    pub tdi: bool,
    pub read_enable: bool,
    pub timestamp: f64,
}

impl EdgeEvent {
    fn from_sample(direction: Direction, sample: &SampleRecord) -> Self {
        EdgeEvent {
            direction,
            tms: sample.tms(),
            tdi: sample.tdi(),
            read_enable: sample.read(),
            timestamp: sample.timestamp(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderMode {
    /// Wait for TCK to be seen low before looking for edges.
    Start,
    Bit,
    Byte { remaining: u8, read: bool },
}

/// Why a decode run stopped producing edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Completion {
    /// The sample source ran dry.
    Exhausted,
    /// A sample was stamped past the configured cutoff.
    Truncated { at: f64 },
    /// An error was already returned for this run.
    Aborted,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Exhausted => write!(f, "end of capture"),
            Completion::Truncated { at } => write!(f, "cutoff reached at {:.1}", at),
            Completion::Aborted => write!(f, "aborted"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    Edge(EdgeEvent),
    End(Completion),
}

pub struct EdgeDecoder<S> {
    source: S,
    mode: DecoderMode,
    cutoff: Option<f64>,
    previous: Option<SampleRecord>,
    pending: VecDeque<EdgeEvent>,
    done: Option<Completion>,
}

impl<S: SampleSource> EdgeDecoder<S> {
    pub fn new(source: S, mode: DecoderMode, cutoff: Option<f64>) -> Self {
        EdgeDecoder {
            source,
            mode,
            cutoff,
            previous: None,
            pending: VecDeque::with_capacity(16),
            done: None,
        }
    }

    pub fn mode(&self) -> DecoderMode {
        self.mode
    }

    pub fn completion(&self) -> Option<Completion> {
        self.done
    }

    /// Produce the next edge, or the reason the run ended. Once ended, every
    /// further call returns the same `Step::End`.
    pub fn next_edge(&mut self) -> Result<Step> {
        loop {
            if let Some(edge) = self.pending.pop_front() {
                trace!("{:?}", edge);
                return Ok(Step::Edge(edge));
            }
            if let Some(completion) = self.done {
                return Ok(Step::End(completion));
            }

            let sample = match self.source.next() {
                Some(Ok(sample)) => sample,
                Some(Err(e)) => {
                    self.done = Some(Completion::Aborted);
                    return Err(e);
                }
                None => {
                    info!("capture exhausted");
                    self.done = Some(Completion::Exhausted);
                    continue;
                }
            };

            if let Some(cutoff) = self.cutoff {
                if sample.timestamp() > cutoff {
                    info!("cutoff {:.1} reached at {:.1}", cutoff, sample.timestamp());
                    self.done = Some(Completion::Truncated {
                        at: sample.timestamp(),
                    });
                    continue;
                }
            }

            // the first sample only primes the lookback
            if let Some(previous) = self.previous.replace(sample) {
                self.interpret(&previous, &sample);
            }
        }
    }

    fn interpret(&mut self, previous: &SampleRecord, sample: &SampleRecord) {
        match self.mode {
            DecoderMode::Start => {
                if !sample.tck() {
                    info!("exit start at {:.1}", sample.timestamp());
                    self.mode = DecoderMode::Bit;
                }
            }
            DecoderMode::Bit => self.interpret_bit(previous, sample),
            // the sample after a burst only seeds the lookback
            DecoderMode::Byte { remaining: 0, .. } => self.mode = DecoderMode::Bit,
            DecoderMode::Byte { remaining, read } => {
                let timestamp = sample.timestamp();
                for bit in sample.bits().iter() {
                    for direction in [Direction::Rising, Direction::Falling].iter() {
                        self.pending.push_back(EdgeEvent {
                            direction: *direction,
                            tms: false,
                            tdi: *bit,
                            read_enable: read,
                            timestamp,
                        });
                    }
                }
                self.mode = DecoderMode::Byte {
                    remaining: remaining - 1,
                    read,
                };
            }
        }
    }

    fn interpret_bit(&mut self, previous: &SampleRecord, sample: &SampleRecord) {
        if sample.mode() {
            let remaining = sample.byte_count();
            let read = sample.read();
            if read {
                info!("byte shift read mode {}", remaining);
            } else {
                info!("byte shift mode {}", remaining);
            }
            self.mode = DecoderMode::Byte { remaining, read };
            return;
        }

        match (previous.tck(), sample.tck()) {
            (false, true) => self
                .pending
                .push_back(EdgeEvent::from_sample(Direction::Rising, sample)),
            (true, false) => self
                .pending
                .push_back(EdgeEvent::from_sample(Direction::Falling, sample)),
            _ => (),
        }
    }
}

impl<S: SampleSource> Iterator for EdgeDecoder<S> {
    type Item = Result<EdgeEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_edge() {
            Ok(Step::Edge(edge)) => Some(Ok(edge)),
            Ok(Step::End(_)) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
