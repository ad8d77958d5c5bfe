#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Scheduler`**: A fixed pool of timer tasks, polled from the main loop
//! - **`TimerTask`**: A delayed or repeated unit of work with an interval and a `RepeatCount`
//! - **`Phase`**: One step of the normal Red/Yellow/Green cycle
//! - **`SignalSequencer`**: Walks one scheduler task through the phase cycle
//! - **`OverrideMode`**: Normal cycling or one of the three button overrides
//! - **`ModeCell`**: Interrupt-safe storage for the override mode
//! - **`TrafficLight`**: Owns everything above and drives the lamps
//! - **`SignalOutput`**: Trait to implement for your lamp hardware
//! - **`StatusSink`**: Receives periodic status reports
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! Lamp levels are plain `u8` values. `Lamp::color` and
//! `StatusReport::display_color` give `palette` colours for displays that
//! mirror the signal.

// Re-export the palette colour types used in the public API
pub use palette::{Srgb, Srgba};

mod log;

pub mod command;
pub mod config;
pub mod controller;
pub mod mode;
pub mod output;
pub mod phase;
pub mod scheduler;
pub mod sequencer;
pub mod status;
pub mod time;
pub mod types;

pub use command::{CommandError, DurationCommand};
pub use config::{ConfigError, Durations, SignalConfig, SignalConfigBuilder, Timing};
pub use controller::{TASK_CAPACITY, TrafficLight, TrafficLightError};
pub use mode::{ModeCell, ModeSnapshot, OverrideMode, Trigger};
pub use output::{Intensities, SignalOutput};
pub use phase::{Phase, Transition};
pub use scheduler::{Firing, Scheduler, SchedulerError, TaskId, TimerTask};
pub use sequencer::SignalSequencer;
pub use status::{Indication, STATUS_LINE_LEN, StatusReport, StatusSink};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use types::{Lamp, Lamps, RepeatCount, scale_adc};
