//! Lamp output abstraction.
//!
//! Defines the [`SignalOutput`] trait for driving the three lamp channels and
//! [`Intensities`], the per-channel levels last written to the hardware.

use crate::types::{Lamp, Lamps};
use palette::Srgb;

/// Trait for abstracting the lamp hardware.
///
/// Implement this for your PWM channels (or GPIO, for on/off lamps) to allow
/// the controller to drive them.
pub trait SignalOutput {
    /// Sets `lamp` to `level`, where 0 is off and 255 is full intensity.
    ///
    /// Handle any hardware errors internally - this method cannot fail.
    fn set_intensity(&mut self, lamp: Lamp, level: u8);
}

/// Intensity of each lamp channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Intensities([u8; 3]);

impl Intensities {
    /// Every channel off.
    pub const OFF: Intensities = Intensities([0; 3]);

    /// Levels for `lit` lamps shown at `brightness`, all others off.
    pub fn from_lamps(lit: Lamps, brightness: u8) -> Self {
        let mut levels = [0; 3];
        for lamp in Lamp::ALL {
            if lit.contains(lamp) {
                levels[lamp.index()] = brightness;
            }
        }
        Intensities(levels)
    }

    /// Level of a single lamp.
    pub fn get(&self, lamp: Lamp) -> u8 {
        self.0[lamp.index()]
    }

    /// Writes the channels that differ from `previous` to `output`.
    pub(crate) fn apply<O: SignalOutput>(&self, previous: &Intensities, output: &mut O) {
        for lamp in Lamp::ALL {
            let level = self.get(lamp);
            if level != previous.get(lamp) {
                output.set_intensity(lamp, level);
            }
        }
    }

    /// Writes every channel to `output`.
    pub(crate) fn apply_all<O: SignalOutput>(&self, output: &mut O) {
        for lamp in Lamp::ALL {
            output.set_intensity(lamp, self.get(lamp));
        }
    }
}

impl Lamp {
    /// Lens colour of the lamp at full intensity.
    pub const fn color(self) -> Srgb<u8> {
        match self {
            Lamp::Red => Srgb::new(255, 0, 0),
            Lamp::Yellow => Srgb::new(255, 255, 0),
            Lamp::Green => Srgb::new(0, 255, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::vec::Vec;

    struct Recorder(Vec<(Lamp, u8)>);

    impl SignalOutput for Recorder {
        fn set_intensity(&mut self, lamp: Lamp, level: u8) {
            self.0.push((lamp, level));
        }
    }

    #[test]
    fn lit_lamps_take_brightness() {
        let levels = Intensities::from_lamps(Lamps::only(Lamp::Green), 128);
        assert_eq!(levels.get(Lamp::Red), 0);
        assert_eq!(levels.get(Lamp::Yellow), 0);
        assert_eq!(levels.get(Lamp::Green), 128);
    }

    #[test]
    fn apply_writes_only_changed_channels() {
        let mut recorder = Recorder(Vec::new());
        let before = Intensities::from_lamps(Lamps::only(Lamp::Red), 255);
        let after = Intensities::from_lamps(Lamps::only(Lamp::Yellow), 255);

        after.apply(&before, &mut recorder);

        assert_eq!(recorder.0, [(Lamp::Red, 0), (Lamp::Yellow, 255)]);
    }

    #[test]
    fn lamp_colours_match_lenses() {
        assert_eq!(Lamp::Yellow.color(), Srgb::new(255u8, 255, 0));
    }
}
