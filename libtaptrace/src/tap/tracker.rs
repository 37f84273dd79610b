use log::{debug, info, trace};
use rust_fsm::StateMachineImpl;

use crate::decoder::{Direction, EdgeEvent};
use crate::error::{DecodeError, Result};
use crate::tap::{Register, ShiftRegister, TapEvent, TapListener, TapState, TapStateMachine};

/// Follows the TAP controller of the captured target.
///
/// The successor state is looked up when TCK rises, using the TMS level of that
/// edge, and only takes effect on the following falling edge. TDI is clocked
/// into a register on the rising edge while the controller is still in the
/// shift state, including the edge that leaves it.
pub struct TapTracker {
    state: TapState,
    pending: Option<TapState>,
    ir_shift: ShiftRegister,
    dr_shift: ShiftRegister,
    ir: ShiftRegister,
    dr: ShiftRegister,
}

impl TapTracker {
    pub fn new(state: TapState) -> Self {
        TapTracker {
            state,
            pending: None,
            ir_shift: ShiftRegister::new(),
            dr_shift: ShiftRegister::new(),
            ir: ShiftRegister::new(),
            dr: ShiftRegister::new(),
        }
    }

    pub fn state(&self) -> TapState {
        self.state
    }

    pub fn pending(&self) -> Option<TapState> {
        self.pending
    }

    /// Last value committed by Update-IR.
    pub fn ir(&self) -> &ShiftRegister {
        &self.ir
    }

    /// Last value committed by Update-DR.
    pub fn dr(&self) -> &ShiftRegister {
        &self.dr
    }

    pub fn ir_shift(&self) -> &ShiftRegister {
        &self.ir_shift
    }

    pub fn dr_shift(&self) -> &ShiftRegister {
        &self.dr_shift
    }

    pub fn feed<L: TapListener + ?Sized>(&mut self, edge: &EdgeEvent, listener: &mut L) -> Result<()> {
        match edge.direction {
            Direction::Rising => self.rising(edge),
            Direction::Falling => {
                self.falling(edge, listener);
                Ok(())
            }
        }
    }

    fn rising(&mut self, edge: &EdgeEvent) -> Result<()> {
        let next = TapStateMachine::transition(&self.state, &edge.tms).ok_or(
            DecodeError::Invariant {
                state: self.state,
                tms: edge.tms,
            },
        )?;
        self.pending = Some(next);

        match TapStateMachine::output(&self.state, &edge.tms) {
            Some(Register::Ir) => {
                self.ir_shift.shift_in(edge.tdi);
                trace!("ir_shift: {} tms={}", self.ir_shift, edge.tms);
            }
            Some(Register::Dr) => {
                self.dr_shift.shift_in(edge.tdi);
                trace!("dr_shift: {} tms={} at {:.1}", self.dr_shift, edge.tms, edge.timestamp);
            }
            None => (),
        }
        Ok(())
    }

    fn falling<L: TapListener + ?Sized>(&mut self, edge: &EdgeEvent, listener: &mut L) {
        let next = match self.pending.take() {
            Some(next) if next != self.state => next,
            _ => return,
        };

        self.state = next;
        debug!("TAP transition to: {} at {:.1}", next, edge.timestamp);
        listener.notify(&TapEvent::StateChanged {
            state: next,
            timestamp: edge.timestamp,
        });

        match next {
            TapState::CaptureDr => self.dr_shift.clear(),
            TapState::CaptureIr => self.ir_shift.clear(),
            TapState::UpdateDr => {
                self.dr = self.dr_shift.clone();
                self.commit(Register::Dr, edge.timestamp, listener);
            }
            TapState::UpdateIr => {
                self.ir = self.ir_shift.clone();
                self.commit(Register::Ir, edge.timestamp, listener);
            }
            _ => (),
        }
    }

    fn commit<L: TapListener + ?Sized>(&self, register: Register, timestamp: f64, listener: &mut L) {
        let bits = match register {
            Register::Ir => &self.ir,
            Register::Dr => &self.dr,
        };
        info!("UPDATE {} {} bits to {}", bits.len(), register, bits);
        listener.notify(&TapEvent::RegisterUpdated {
            register,
            bits: bits.clone(),
            timestamp,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(direction: Direction, tms: bool, tdi: bool, timestamp: f64) -> EdgeEvent {
        EdgeEvent {
            direction,
            tms,
            tdi,
            read_enable: false,
            timestamp,
        }
    }

    /// One full TCK cycle with the same TMS/TDI on both edges.
    fn clock(
        tracker: &mut TapTracker,
        events: &mut Vec<TapEvent>,
        tms: bool,
        tdi: bool,
        timestamp: f64,
    ) {
        tracker
            .feed(&edge(Direction::Rising, tms, tdi, timestamp), events)
            .unwrap();
        tracker
            .feed(&edge(Direction::Falling, tms, tdi, timestamp + 1.0), events)
            .unwrap();
    }

    fn updates(events: &[TapEvent]) -> Vec<(Register, ShiftRegister)> {
        events
            .iter()
            .filter_map(|e| match e {
                TapEvent::RegisterUpdated { register, bits, .. } => Some((*register, bits.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn state_commits_on_falling_edge() {
        let mut tracker = TapTracker::new(TapState::Idle);
        let mut events: Vec<TapEvent> = Vec::new();

        tracker
            .feed(&edge(Direction::Rising, true, false, 0.5), &mut events)
            .unwrap();
        assert_eq!(tracker.state(), TapState::Idle);
        assert_eq!(tracker.pending(), Some(TapState::SelectDr));
        assert!(events.is_empty());

        tracker
            .feed(&edge(Direction::Falling, true, false, 1.5), &mut events)
            .unwrap();
        assert_eq!(tracker.state(), TapState::SelectDr);
        assert_eq!(
            events,
            vec![TapEvent::StateChanged {
                state: TapState::SelectDr,
                timestamp: 1.5
            }]
        );
    }

    #[test]
    fn self_loop_is_silent() {
        let mut tracker = TapTracker::new(TapState::Idle);
        let mut events: Vec<TapEvent> = Vec::new();
        for i in 0..4 {
            clock(&mut tracker, &mut events, false, true, i as f64);
        }
        assert_eq!(tracker.state(), TapState::Idle);
        assert!(events.is_empty());
    }

    #[test]
    fn falling_edge_without_rising_edge_is_ignored() {
        let mut tracker = TapTracker::new(TapState::Reset);
        let mut events: Vec<TapEvent> = Vec::new();
        tracker
            .feed(&edge(Direction::Falling, false, false, 0.5), &mut events)
            .unwrap();
        assert_eq!(tracker.state(), TapState::Reset);
        assert!(events.is_empty());
    }

    #[test]
    fn dr_scan_from_idle() {
        let mut tracker = TapTracker::new(TapState::Idle);
        let mut events: Vec<TapEvent> = Vec::new();
        // Idle -> Select-DR -> Capture-DR -> Shift-DR
        let mut t = 0.0;
        for tms in [true, false, false].iter() {
            clock(&mut tracker, &mut events, *tms, true, t);
            t += 2.0;
        }
        assert_eq!(tracker.state(), TapState::ShiftDr);
        assert!(tracker.dr_shift().is_empty());

        // four bits, the last one leaves Shift-DR
        let pattern = [true, false, true, true];
        for (i, bit) in pattern.iter().enumerate() {
            clock(&mut tracker, &mut events, i == pattern.len() - 1, *bit, t);
            t += 2.0;
        }
        assert_eq!(tracker.state(), TapState::Exit1Dr);

        // Exit1-DR -> Update-DR -> Idle
        clock(&mut tracker, &mut events, true, false, t);
        clock(&mut tracker, &mut events, false, false, t + 2.0);
        assert_eq!(tracker.state(), TapState::Idle);

        let visited: Vec<TapState> = events
            .iter()
            .filter_map(|e| match e {
                TapEvent::StateChanged { state, .. } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(
            visited,
            vec![
                TapState::SelectDr,
                TapState::CaptureDr,
                TapState::ShiftDr,
                TapState::Exit1Dr,
                TapState::UpdateDr,
                TapState::Idle,
            ]
        );

        let expected = ShiftRegister::from_lsb_first(&pattern);
        assert_eq!(updates(&events), vec![(Register::Dr, expected.clone())]);
        assert_eq!(tracker.dr(), &expected);
        assert_eq!(tracker.dr().to_string(), "1101");
        assert_eq!(tracker.dr().to_u64(), Some(0b1101));
    }

    #[test]
    fn dr_round_trip_through_pause() {
        let pattern = [false, true, true, false, false, true, false, true, true, true];
        let mut tracker = TapTracker::new(TapState::CaptureDr);
        let mut events: Vec<TapEvent> = Vec::new();

        clock(&mut tracker, &mut events, false, true, 0.0);
        for (i, bit) in pattern[..6].iter().enumerate() {
            clock(&mut tracker, &mut events, i == 5, *bit, 2.0);
        }
        // Exit1-DR -> Pause-DR (stay) -> Exit2-DR -> Shift-DR
        for tms in [false, false, true, false].iter() {
            clock(&mut tracker, &mut events, *tms, true, 4.0);
        }
        assert_eq!(tracker.state(), TapState::ShiftDr);
        for (i, bit) in pattern[6..].iter().enumerate() {
            clock(&mut tracker, &mut events, i == 3, *bit, 6.0);
        }
        clock(&mut tracker, &mut events, true, false, 8.0);
        assert_eq!(tracker.state(), TapState::UpdateDr);

        let expected = ShiftRegister::from_lsb_first(&pattern);
        assert_eq!(updates(&events), vec![(Register::Dr, expected)]);
        assert_eq!(tracker.dr().len(), pattern.len());
    }

    #[test]
    fn ir_scan_and_capture_clears() {
        let mut tracker = TapTracker::new(TapState::Idle);
        let mut events: Vec<TapEvent> = Vec::new();
        for tms in [true, true, false, false].iter() {
            clock(&mut tracker, &mut events, *tms, false, 0.0);
        }
        assert_eq!(tracker.state(), TapState::ShiftIr);
        for (i, bit) in [false, true, true, true].iter().enumerate() {
            clock(&mut tracker, &mut events, i == 3, *bit, 1.0);
        }
        // Exit1-IR -> Update-IR -> Select-DR -> Select-IR -> Capture-IR
        for tms in [true, true, true, false].iter() {
            clock(&mut tracker, &mut events, *tms, false, 2.0);
        }
        assert_eq!(tracker.state(), TapState::CaptureIr);
        assert!(tracker.ir_shift().is_empty());
        assert_eq!(tracker.ir().to_u64(), Some(0b1110));
        assert_eq!(
            updates(&events),
            vec![(
                Register::Ir,
                ShiftRegister::from_lsb_first(&[false, true, true, true])
            )]
        );
    }

    #[test]
    fn empty_ir_update_is_reported() {
        let mut tracker = TapTracker::new(TapState::CaptureIr);
        let mut events: Vec<TapEvent> = Vec::new();
        // Capture-IR -> Exit1-IR -> Update-IR without shifting
        clock(&mut tracker, &mut events, true, false, 0.0);
        clock(&mut tracker, &mut events, true, false, 2.0);
        assert_eq!(
            updates(&events),
            vec![(Register::Ir, ShiftRegister::new())]
        );
    }
}
