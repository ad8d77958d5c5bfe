//! Core types shared by the scheduler, sequencer and output stage.

/// One of the three signal lamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lamp {
    Red,
    Yellow,
    Green,
}

impl Lamp {
    /// All lamps, top to bottom.
    pub const ALL: [Lamp; 3] = [Lamp::Red, Lamp::Yellow, Lamp::Green];

    /// Output channel index of this lamp.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Lamp::Red => 0,
            Lamp::Yellow => 1,
            Lamp::Green => 2,
        }
    }
}

/// The set of lamps that should currently be lit.
///
/// Intensity is applied separately by the output stage; a lit lamp is driven
/// at the current brightness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lamps {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl Lamps {
    /// No lamp lit.
    pub const NONE: Lamps = Lamps {
        red: false,
        yellow: false,
        green: false,
    };

    /// Every lamp lit.
    pub const ALL: Lamps = Lamps {
        red: true,
        yellow: true,
        green: true,
    };

    /// Exactly one lamp lit.
    pub const fn only(lamp: Lamp) -> Lamps {
        Lamps {
            red: matches!(lamp, Lamp::Red),
            yellow: matches!(lamp, Lamp::Yellow),
            green: matches!(lamp, Lamp::Green),
        }
    }

    /// Returns true if `lamp` is lit.
    pub const fn contains(&self, lamp: Lamp) -> bool {
        match lamp {
            Lamp::Red => self.red,
            Lamp::Yellow => self.yellow,
            Lamp::Green => self.green,
        }
    }

    /// Returns true if no lamp is lit.
    pub const fn is_empty(&self) -> bool {
        !(self.red || self.yellow || self.green)
    }
}

/// How many times a timer task fires per arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RepeatCount {
    /// Fire a specific number of times, then finish.
    Finite(u32),

    /// Fire until disabled.
    Infinite,
}

impl RepeatCount {
    /// A one-shot task.
    pub const ONCE: RepeatCount = RepeatCount::Finite(1);
}

impl Default for RepeatCount {
    fn default() -> Self {
        RepeatCount::ONCE
    }
}

/// Maps a raw ADC reading onto a 0-255 brightness level.
///
/// Readings above `full_scale` are clamped. A `full_scale` of zero yields full
/// brightness, since there is no range to map.
pub fn scale_adc(raw: u16, full_scale: u16) -> u8 {
    if full_scale == 0 {
        return u8::MAX;
    }
    let raw = raw.min(full_scale) as u32;
    ((raw * u8::MAX as u32) / full_scale as u32) as u8
}
