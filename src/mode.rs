//! Override modes and their interrupt-safe publication.
//!
//! The three override buttons map to a single [`OverrideMode`] value, so two
//! overrides can never be active at once. [`ModeCell`] stores that value in
//! one atomic word next to a transition counter: interrupt handlers publish
//! complete modes with [`ModeCell::toggle`], and the main loop observes them
//! with [`ModeCell::snapshot`] on its next poll.

use core::sync::atomic::{AtomicU16, Ordering};

/// The override state of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OverrideMode {
    /// Normal cycling.
    #[default]
    Normal = 0,
    /// Red lamp held on.
    RedOverride = 1,
    /// All lamps blink together.
    BlinkOverride = 2,
    /// All lamps dark.
    PowerOff = 3,
}

impl OverrideMode {
    /// Returns true unless the signal is cycling normally.
    pub const fn is_override(self) -> bool {
        !matches!(self, OverrideMode::Normal)
    }

    /// The mode after `trigger` fires in this mode.
    ///
    /// Firing the trigger of the active override returns to `Normal`; any
    /// other trigger switches to its own override, replacing the current one.
    pub fn toggled(self, trigger: Trigger) -> OverrideMode {
        let requested = trigger.mode();
        if self == requested {
            OverrideMode::Normal
        } else {
            requested
        }
    }

    const fn from_bits(bits: u8) -> OverrideMode {
        match bits {
            1 => OverrideMode::RedOverride,
            2 => OverrideMode::BlinkOverride,
            3 => OverrideMode::PowerOff,
            _ => OverrideMode::Normal,
        }
    }
}

/// A hardware override button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Emergency red.
    Red,
    /// All-blink.
    Blink,
    /// Power off.
    PowerOff,
}

impl Trigger {
    /// The override this trigger toggles.
    pub const fn mode(self) -> OverrideMode {
        match self {
            Trigger::Red => OverrideMode::RedOverride,
            Trigger::Blink => OverrideMode::BlinkOverride,
            Trigger::PowerOff => OverrideMode::PowerOff,
        }
    }
}

/// A published mode together with the number of transitions published so
/// far.
///
/// The epoch lets the main loop notice transitions that cancelled out before
/// it polled, e.g. the same trigger firing twice between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeSnapshot {
    pub mode: OverrideMode,

    /// Transition counter. Wraps after 256 transitions.
    pub epoch: u8,
}

impl ModeSnapshot {
    const fn from_bits(bits: u16) -> Self {
        Self {
            mode: OverrideMode::from_bits(bits as u8),
            epoch: (bits >> 8) as u8,
        }
    }

    const fn to_bits(self) -> u16 {
        ((self.epoch as u16) << 8) | self.mode as u16
    }
}

/// Interrupt-safe storage for the current [`OverrideMode`].
///
/// Intended to live in a `static` shared between the button interrupt
/// handlers and the main loop. Mode and epoch share one atomic, so a reader
/// never sees one without the other.
pub struct ModeCell {
    bits: AtomicU16,
}

impl ModeCell {
    /// Creates a cell holding `Normal`.
    pub const fn new() -> Self {
        Self {
            bits: AtomicU16::new(OverrideMode::Normal as u16),
        }
    }

    /// Returns the most recently published mode.
    pub fn load(&self) -> OverrideMode {
        self.snapshot().mode
    }

    /// Returns the most recently published mode and its epoch.
    pub fn snapshot(&self) -> ModeSnapshot {
        ModeSnapshot::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Publishes `mode`, replacing the current one.
    ///
    /// The epoch only advances if the mode actually changes.
    pub fn store(&self, mode: OverrideMode) {
        self.update(|_| mode);
    }

    /// Applies `trigger` and returns the resulting mode.
    ///
    /// Every call is a transition and advances the epoch.
    pub fn toggle(&self, trigger: Trigger) -> OverrideMode {
        self.update(|current| current.toggled(trigger))
    }

    /// The read-modify-write runs inside a critical section so triggers from
    /// interrupts of different priority cannot interleave. This also works on
    /// cores without compare-and-swap atomics.
    fn update(&self, f: impl FnOnce(OverrideMode) -> OverrideMode) -> OverrideMode {
        critical_section::with(|_| {
            let current = self.snapshot();
            let mode = f(current.mode);
            if mode != current.mode {
                let next = ModeSnapshot {
                    mode,
                    epoch: current.epoch.wrapping_add(1),
                };
                self.bits.store(next.to_bits(), Ordering::Release);
            }
            mode
        })
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ModeCell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ModeCell").field(&self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_trigger_toggles_back_to_normal() {
        let cell = ModeCell::new();
        assert_eq!(cell.toggle(Trigger::Blink), OverrideMode::BlinkOverride);
        assert_eq!(cell.toggle(Trigger::Blink), OverrideMode::Normal);
        assert_eq!(cell.load(), OverrideMode::Normal);
    }

    #[test]
    fn other_trigger_replaces_active_override() {
        let cell = ModeCell::new();
        cell.toggle(Trigger::Red);
        assert_eq!(cell.toggle(Trigger::PowerOff), OverrideMode::PowerOff);
        assert_eq!(cell.toggle(Trigger::Red), OverrideMode::RedOverride);
    }

    #[test]
    fn every_toggle_advances_the_epoch() {
        let cell = ModeCell::new();
        let start = cell.snapshot();
        assert_eq!(start.mode, OverrideMode::Normal);

        cell.toggle(Trigger::PowerOff);
        cell.toggle(Trigger::PowerOff);

        let settled = cell.snapshot();
        assert_eq!(settled.mode, OverrideMode::Normal);
        assert_eq!(settled.epoch, start.epoch.wrapping_add(2));
    }

    #[test]
    fn storing_the_current_mode_is_not_a_transition() {
        let cell = ModeCell::new();
        cell.store(OverrideMode::Normal);
        assert_eq!(cell.snapshot().epoch, 0);

        cell.store(OverrideMode::RedOverride);
        assert_eq!(
            cell.snapshot(),
            ModeSnapshot {
                mode: OverrideMode::RedOverride,
                epoch: 1
            }
        );
    }

    #[test]
    fn only_normal_is_not_an_override() {
        assert!(!OverrideMode::Normal.is_override());
        assert!(OverrideMode::RedOverride.is_override());
        assert!(OverrideMode::PowerOff.is_override());
    }
}
