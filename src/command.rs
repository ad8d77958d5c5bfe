//! Duration-override commands received over the serial link.
//!
//! One command per line, `<CHANNEL>:<milliseconds>`, e.g. `GREEN:2500`.

use crate::types::Lamp;

/// A request to change one lamp's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DurationCommand {
    pub lamp: Lamp,
    pub millis: u32,
}

/// Command parsing errors. The line is dropped and no duration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// No `:` between channel and value.
    MissingSeparator,

    /// The channel is not `RED`, `YELLOW` or `GREEN`.
    UnknownChannel,

    /// The value is empty, signed, non-numeric or too large.
    InvalidDuration,
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::MissingSeparator => write!(f, "expected <CHANNEL>:<milliseconds>"),
            CommandError::UnknownChannel => write!(f, "channel must be RED, YELLOW or GREEN"),
            CommandError::InvalidDuration => {
                write!(f, "duration must be a non-negative number of milliseconds")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

impl DurationCommand {
    /// Parses a single command line. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let (channel, value) = line
            .trim()
            .split_once(':')
            .ok_or(CommandError::MissingSeparator)?;

        let lamp = match channel {
            "RED" => Lamp::Red,
            "YELLOW" => Lamp::Yellow,
            "GREEN" => Lamp::Green,
            _ => return Err(CommandError::UnknownChannel),
        };

        let value = value.trim();
        // `u32::from_str` would accept a leading `+`.
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CommandError::InvalidDuration);
        }
        let millis = value.parse().map_err(|_| CommandError::InvalidDuration)?;

        Ok(Self { lamp, millis })
    }
}

impl core::str::FromStr for DurationCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
