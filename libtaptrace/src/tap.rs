use core::fmt;

pub mod shift_register;
pub mod state_machine;
pub mod tracker;

pub use shift_register::ShiftRegister;
pub use state_machine::{ParseTapStateError, TapState, TapStateMachine};
pub use tracker::TapTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    Ir,
    Dr,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Ir => f.write_str("ir"),
            Register::Dr => f.write_str("dr"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TapEvent {
    StateChanged {
        state: TapState,
        timestamp: f64,
    },
    RegisterUpdated {
        register: Register,
        bits: ShiftRegister,
        timestamp: f64,
    },
}

/// Receives what the tracker observes, in capture order.
pub trait TapListener {
    fn notify(&mut self, event: &TapEvent);
}

impl TapListener for Vec<TapEvent> {
    fn notify(&mut self, event: &TapEvent) {
        self.push(event.clone());
    }
}
