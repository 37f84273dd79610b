use core::fmt;
use core::str::FromStr;

use log::trace;
use rust_fsm::*;
use thiserror::Error;

use crate::tap::Register;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TapState {
    Reset,
    Idle,
    SelectDr,
    CaptureDr,
    ShiftDr,
    Exit1Dr,
    PauseDr,
    Exit2Dr,
    UpdateDr,
    SelectIr,
    CaptureIr,
    ShiftIr,
    Exit1Ir,
    PauseIr,
    Exit2Ir,
    UpdateIr,
}

impl TapState {
    pub const ALL: [TapState; 16] = [
        TapState::Reset,
        TapState::Idle,
        TapState::SelectDr,
        TapState::CaptureDr,
        TapState::ShiftDr,
        TapState::Exit1Dr,
        TapState::PauseDr,
        TapState::Exit2Dr,
        TapState::UpdateDr,
        TapState::SelectIr,
        TapState::CaptureIr,
        TapState::ShiftIr,
        TapState::Exit1Ir,
        TapState::PauseIr,
        TapState::Exit2Ir,
        TapState::UpdateIr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TapState::Reset => "reset",
            TapState::Idle => "idle",
            TapState::SelectDr => "select_dr",
            TapState::CaptureDr => "capture_dr",
            TapState::ShiftDr => "shift_dr",
            TapState::Exit1Dr => "exit1_dr",
            TapState::PauseDr => "pause_dr",
            TapState::Exit2Dr => "exit2_dr",
            TapState::UpdateDr => "update_dr",
            TapState::SelectIr => "select_ir",
            TapState::CaptureIr => "capture_ir",
            TapState::ShiftIr => "shift_ir",
            TapState::Exit1Ir => "exit1_ir",
            TapState::PauseIr => "pause_ir",
            TapState::Exit2Ir => "exit2_ir",
            TapState::UpdateIr => "update_ir",
        }
    }
}

impl fmt::Display for TapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown TAP state `{0}`")]
pub struct ParseTapStateError(String);

impl FromStr for TapState {
    type Err = ParseTapStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TapState::ALL
            .iter()
            .copied()
            .find(|state| state.name() == s)
            .ok_or_else(|| ParseTapStateError(s.to_string()))
    }
}

/// The TAP controller: TMS selects the successor, and while in a shift state
/// the clocked TDI bit goes into the matching register.
#[derive(Debug)]
pub struct TapStateMachine;

impl StateMachineImpl for TapStateMachine {
    type Input = bool;
    type State = TapState;
    type Output = Register;

    const INITIAL_STATE: Self::State = TapState::Reset;

    fn transition(state: &Self::State, input: &Self::Input) -> Option<Self::State> {
        let res = match (state, input) {
            // Reset
            (TapState::Reset, &true) => Some(TapState::Reset),
            (TapState::Reset, &false) => Some(TapState::Idle),

            // Idle
            (TapState::Idle, &true) => Some(TapState::SelectDr),
            (TapState::Idle, &false) => Some(TapState::Idle),

            // DR
            (TapState::SelectDr, &true) => Some(TapState::SelectIr),
            (TapState::SelectDr, &false) => Some(TapState::CaptureDr),
            (TapState::CaptureDr, &true) => Some(TapState::Exit1Dr),
            (TapState::CaptureDr, &false) => Some(TapState::ShiftDr),
            (TapState::ShiftDr, &true) => Some(TapState::Exit1Dr),
            (TapState::ShiftDr, &false) => Some(TapState::ShiftDr),
            (TapState::Exit1Dr, &true) => Some(TapState::UpdateDr),
            (TapState::Exit1Dr, &false) => Some(TapState::PauseDr),
            (TapState::PauseDr, &true) => Some(TapState::Exit2Dr),
            (TapState::PauseDr, &false) => Some(TapState::PauseDr),
            (TapState::Exit2Dr, &true) => Some(TapState::UpdateDr),
            (TapState::Exit2Dr, &false) => Some(TapState::ShiftDr),
            (TapState::UpdateDr, &true) => Some(TapState::SelectDr),
            (TapState::UpdateDr, &false) => Some(TapState::Idle),

            // IR
            (TapState::SelectIr, &true) => Some(TapState::Reset),
            (TapState::SelectIr, &false) => Some(TapState::CaptureIr),
            (TapState::CaptureIr, &true) => Some(TapState::Exit1Ir),
            (TapState::CaptureIr, &false) => Some(TapState::ShiftIr),
            (TapState::ShiftIr, &true) => Some(TapState::Exit1Ir),
            (TapState::ShiftIr, &false) => Some(TapState::ShiftIr),
            (TapState::Exit1Ir, &true) => Some(TapState::UpdateIr),
            (TapState::Exit1Ir, &false) => Some(TapState::PauseIr),
            (TapState::PauseIr, &true) => Some(TapState::Exit2Ir),
            (TapState::PauseIr, &false) => Some(TapState::PauseIr),
            (TapState::Exit2Ir, &true) => Some(TapState::UpdateIr),
            (TapState::Exit2Ir, &false) => Some(TapState::ShiftIr),
            (TapState::UpdateIr, &true) => Some(TapState::SelectDr),
            (TapState::UpdateIr, &false) => Some(TapState::Idle),
        };
        trace!("tap candidate: {} -> {:?}", state, res);
        res
    }

    fn output(state: &Self::State, _input: &Self::Input) -> Option<Self::Output> {
        match state {
            TapState::ShiftDr => Some(Register::Dr),
            TapState::ShiftIr => Some(Register::Ir),
            _ => None,
        }
    }
}
