//! Signal phases and the transition table of the normal cycle.

use crate::config::SignalConfig;
use crate::types::{Lamp, Lamps, RepeatCount};

/// One step of the normal signal cycle.
///
/// `FinishGreen` is the short dark step between the green blink and the second
/// yellow; the cycle has no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Red,
    Yellow,
    Green,
    GreenBlink,
    FinishGreen,
    Yellow2,
}

/// The next phase and how long after the current firing it is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub phase: Phase,
    pub delay_ms: u32,
}

impl Phase {
    /// The phase the cycle starts and resumes from.
    pub const ENTRY: Phase = Phase::Red;

    /// Returns the phase that follows this one and its arming delay.
    ///
    /// For `GreenBlink` this is consulted only after its last repetition.
    pub fn next(self, config: &SignalConfig) -> Transition {
        let timing = &config.timing;
        let (phase, delay_ms) = match self {
            Phase::Red => (Phase::Yellow, config.lead_time(Lamp::Red)),
            Phase::Yellow => (Phase::Green, config.lead_time(Lamp::Yellow)),
            Phase::Green => (Phase::GreenBlink, config.lead_time(Lamp::Green)),
            Phase::GreenBlink => (Phase::FinishGreen, timing.finish_green_delay),
            Phase::FinishGreen => (Phase::Yellow2, timing.second_yellow_delay),
            Phase::Yellow2 => (Phase::Red, config.lead_time(Lamp::Yellow)),
        };
        Transition { phase, delay_ms }
    }

    /// How many times this phase fires per arming.
    pub fn repeat(self, config: &SignalConfig) -> RepeatCount {
        match self {
            Phase::GreenBlink => RepeatCount::Finite(config.timing.blink_count),
            _ => RepeatCount::ONCE,
        }
    }

    /// Interval between repetitions, also used when the phase is restarted.
    pub fn interval_ms(self, config: &SignalConfig) -> u32 {
        match self {
            Phase::Red => config.durations.red,
            Phase::Yellow | Phase::Yellow2 => config.durations.yellow,
            Phase::Green => config.durations.green,
            Phase::GreenBlink => config.timing.blink_period,
            Phase::FinishGreen => config.timing.finish_green_delay,
        }
    }

    /// Lamps lit while this phase is active.
    ///
    /// `blink_lit` selects the half of the green blink being shown.
    pub fn lamps(self, blink_lit: bool) -> Lamps {
        match self {
            Phase::Red => Lamps::only(Lamp::Red),
            Phase::Yellow | Phase::Yellow2 => Lamps::only(Lamp::Yellow),
            Phase::Green => Lamps::only(Lamp::Green),
            Phase::GreenBlink if blink_lit => Lamps::only(Lamp::Green),
            Phase::GreenBlink | Phase::FinishGreen => Lamps::NONE,
        }
    }

    /// The lamp this phase is reported as, if any.
    pub fn lamp(self) -> Option<Lamp> {
        match self {
            Phase::Red => Some(Lamp::Red),
            Phase::Yellow | Phase::Yellow2 => Some(Lamp::Yellow),
            Phase::Green | Phase::GreenBlink => Some(Lamp::Green),
            Phase::FinishGreen => None,
        }
    }
}
