//! Status snapshots for the serial link and the web visualiser.

use crate::mode::OverrideMode;
use crate::phase::Phase;
use crate::types::Lamp;
use core::fmt::Write;
use palette::Srgba;

/// Longest rendering of a status line, e.g.
/// `MODE:Blink Mode, LED:Blinking, Brightness:255`.
pub const STATUS_LINE_LEN: usize = 64;

/// What the signal is showing, as reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indication {
    Red,
    Yellow,
    Green,
    Blinking,
    Off,
}

impl Indication {
    /// Derives the indication from the override mode and the active phase.
    pub fn from_state(mode: OverrideMode, phase: Option<Phase>) -> Self {
        match mode {
            OverrideMode::RedOverride => Indication::Red,
            OverrideMode::BlinkOverride => Indication::Blinking,
            OverrideMode::PowerOff => Indication::Off,
            OverrideMode::Normal => match phase.and_then(Phase::lamp) {
                Some(Lamp::Red) => Indication::Red,
                Some(Lamp::Yellow) => Indication::Yellow,
                Some(Lamp::Green) => Indication::Green,
                None => Indication::Off,
            },
        }
    }

    fn label(self) -> &'static str {
        match self {
            Indication::Red => "Red",
            Indication::Yellow => "Yellow",
            Indication::Green => "Green",
            Indication::Blinking => "Blinking",
            Indication::Off => "OFF",
        }
    }
}

fn mode_label(mode: OverrideMode) -> &'static str {
    match mode {
        OverrideMode::Normal => "NORMAL",
        OverrideMode::RedOverride => "Red Mode",
        OverrideMode::BlinkOverride => "Blink Mode",
        OverrideMode::PowerOff => "Power OFF",
    }
}

/// Read-only snapshot of the signal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub mode: OverrideMode,
    pub indication: Indication,
    pub brightness: u8,
}

impl StatusReport {
    /// Renders the report as a single text line without terminator.
    pub fn to_line(&self) -> heapless::String<STATUS_LINE_LEN> {
        let mut line = heapless::String::new();
        // Capacity covers the longest labels and a three-digit brightness.
        let _ = write!(line, "{}", self);
        line
    }

    /// Colour the visualiser paints for this report.
    ///
    /// Brightness is mapped onto an alpha of 50-255 so a dimmed lamp stays
    /// visible; a dark signal is opaque black.
    pub fn display_color(&self) -> Srgba<u8> {
        let alpha = (50 + (self.brightness as u16 * 205) / 255) as u8;
        let lamp = match self.indication {
            Indication::Red => Lamp::Red,
            Indication::Yellow | Indication::Blinking => Lamp::Yellow,
            Indication::Green => Lamp::Green,
            Indication::Off => return Srgba::new(0, 0, 0, 255),
        };
        let color = lamp.color();
        Srgba::new(color.red, color.green, color.blue, alpha)
    }
}

impl core::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "MODE:{}, LED:{}, Brightness:{}",
            mode_label(self.mode),
            self.indication.label(),
            self.brightness
        )
    }
}

/// Receives status reports.
///
/// Implemented for closures, so a sink can be as small as
/// `|report: &StatusReport| serial_write(&report.to_line())`.
pub trait StatusSink {
    /// Called on every override transition and once per status period.
    fn publish(&mut self, report: &StatusReport);
}

impl<F: FnMut(&StatusReport)> StatusSink for F {
    fn publish(&mut self, report: &StatusReport) {
        self(report)
    }
}
