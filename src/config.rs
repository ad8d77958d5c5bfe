//! Signal timing configuration.

use crate::types::Lamp;

/// Lamp durations in milliseconds, adjustable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Durations {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
}

impl Durations {
    /// Returns the duration configured for `lamp`.
    pub fn get(&self, lamp: Lamp) -> u32 {
        match lamp {
            Lamp::Red => self.red,
            Lamp::Yellow => self.yellow,
            Lamp::Green => self.green,
        }
    }

    fn slot(&mut self, lamp: Lamp) -> &mut u32 {
        match lamp {
            Lamp::Red => &mut self.red,
            Lamp::Yellow => &mut self.yellow,
            Lamp::Green => &mut self.green,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            red: 2000,
            yellow: 500,
            green: 2000,
        }
    }
}

/// Fixed sequencing constants, in milliseconds.
///
/// The margins are subtracted from the lamp durations when arming the next
/// phase so consecutive lamps overlap instead of leaving a dark gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    pub red_margin: u32,
    pub yellow_margin: u32,
    pub green_margin: u32,
    pub blink_count: u32,
    pub blink_period: u32,
    pub finish_green_delay: u32,
    pub second_yellow_delay: u32,
    pub all_blink_period: u32,
    pub status_period: u32,
}

impl Timing {
    /// Overlap margin subtracted from `lamp`'s duration.
    pub fn margin(&self, lamp: Lamp) -> u32 {
        match lamp {
            Lamp::Red => self.red_margin,
            Lamp::Yellow => self.yellow_margin,
            Lamp::Green => self.green_margin,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            red_margin: 100,
            yellow_margin: 10,
            green_margin: 100,
            blink_count: 6,
            blink_period: 300,
            finish_green_delay: 90,
            second_yellow_delay: 90,
            all_blink_period: 500,
            status_period: 500,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A lamp duration does not exceed its overlap margin.
    DurationTooShort { lamp: Lamp, millis: u32, min: u32 },

    /// The green blink would never fire.
    ZeroBlinkCount,

    /// A repeating period is zero.
    ZeroPeriod,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::DurationTooShort { lamp, millis, min } => {
                write!(
                    f,
                    "{:?} duration of {} ms must be at least {} ms",
                    lamp, millis, min
                )
            }
            ConfigError::ZeroBlinkCount => write!(f, "green blink count must be non-zero"),
            ConfigError::ZeroPeriod => write!(f, "repeating periods must be non-zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Complete configuration for a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalConfig {
    pub durations: Durations,
    pub timing: Timing,
}

impl SignalConfig {
    /// Creates a configuration builder seeded with the defaults.
    pub fn builder() -> SignalConfigBuilder {
        SignalConfigBuilder::new()
    }

    /// Checks a new duration for `lamp` against its overlap margin.
    pub fn validate_duration(&self, lamp: Lamp, millis: u32) -> Result<(), ConfigError> {
        let min = self.timing.margin(lamp).saturating_add(1);
        if millis < min {
            return Err(ConfigError::DurationTooShort { lamp, millis, min });
        }
        Ok(())
    }

    /// Validates and stores a new duration for `lamp`.
    ///
    /// On error the previous duration is kept.
    pub fn set_duration(&mut self, lamp: Lamp, millis: u32) -> Result<(), ConfigError> {
        self.validate_duration(lamp, millis)?;
        *self.durations.slot(lamp) = millis;
        Ok(())
    }

    /// Duration of `lamp` minus its overlap margin.
    pub fn lead_time(&self, lamp: Lamp) -> u32 {
        self.durations
            .get(lamp)
            .saturating_sub(self.timing.margin(lamp))
    }
}

/// Builder for validated [`SignalConfig`]s.
#[derive(Debug, Clone, Copy)]
pub struct SignalConfigBuilder {
    config: SignalConfig,
}

impl SignalConfigBuilder {
    /// Creates a builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            config: SignalConfig::default(),
        }
    }

    /// Sets the red duration.
    pub fn red(mut self, millis: u32) -> Self {
        self.config.durations.red = millis;
        self
    }

    /// Sets the yellow duration, shared by both yellow phases.
    pub fn yellow(mut self, millis: u32) -> Self {
        self.config.durations.yellow = millis;
        self
    }

    /// Sets the green duration.
    pub fn green(mut self, millis: u32) -> Self {
        self.config.durations.green = millis;
        self
    }

    /// Replaces the fixed sequencing constants.
    pub fn timing(mut self, timing: Timing) -> Self {
        self.config.timing = timing;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    /// * `DurationTooShort` - A lamp duration does not exceed its margin
    /// * `ZeroBlinkCount` - The green blink count is zero
    /// * `ZeroPeriod` - A blink or status period is zero
    pub fn build(self) -> Result<SignalConfig, ConfigError> {
        let config = self.config;

        for lamp in Lamp::ALL {
            config.validate_duration(lamp, config.durations.get(lamp))?;
        }

        let timing = &config.timing;
        if timing.blink_count == 0 {
            return Err(ConfigError::ZeroBlinkCount);
        }
        if timing.blink_period == 0 || timing.all_blink_period == 0 || timing.status_period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }

        Ok(config)
    }
}

impl Default for SignalConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
