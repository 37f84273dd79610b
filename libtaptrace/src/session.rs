use log::info;

use crate::capture::SampleSource;
use crate::decoder::{Completion, DecoderMode, EdgeDecoder, Step};
use crate::error::Result;
use crate::tap::{ShiftRegister, TapListener, TapState, TapTracker};

/// Decoder mode a session begins in. A session never starts inside a byte burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartMode {
    /// Discard samples until TCK is seen low.
    Start,
    Bit,
}

impl From<StartMode> for DecoderMode {
    fn from(mode: StartMode) -> Self {
        match mode {
            StartMode::Start => DecoderMode::Start,
            StartMode::Bit => DecoderMode::Bit,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeConfig {
    pub start_mode: StartMode,
    pub cutoff: Option<f64>,
    pub initial_state: TapState,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            start_mode: StartMode::Bit,
            cutoff: None,
            initial_state: TapState::Reset,
        }
    }
}

impl DecodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_mode(mut self, start_mode: StartMode) -> Self {
        self.start_mode = start_mode;
        self
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn with_initial_state(mut self, state: TapState) -> Self {
        self.initial_state = state;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodeSummary {
    pub completion: Completion,
    pub edges: usize,
    pub final_state: TapState,
    pub ir: ShiftRegister,
    pub dr: ShiftRegister,
}

/// Run one capture through the edge decoder and the TAP tracker.
///
/// Every call owns its own decoder and tracker, so independent captures can be
/// decoded side by side.
pub fn decode<S, L>(source: S, config: &DecodeConfig, listener: &mut L) -> Result<DecodeSummary>
where
    S: SampleSource,
    L: TapListener + ?Sized,
{
    let mut decoder = EdgeDecoder::new(source, config.start_mode.into(), config.cutoff);
    let mut tracker = TapTracker::new(config.initial_state);
    let mut edges = 0;

    let completion = loop {
        match decoder.next_edge()? {
            Step::Edge(edge) => {
                tracker.feed(&edge, listener)?;
                edges += 1;
            }
            Step::End(completion) => break completion,
        }
    };

    info!("{} edges decoded, {}", edges, completion);
    Ok(DecodeSummary {
        completion,
        edges,
        final_state: tracker.state(),
        ir: tracker.ir().clone(),
        dr: tracker.dr().clone(),
    })
}
