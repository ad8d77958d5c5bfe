//! Shared test infrastructure for traffic-sequencer integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use traffic_sequencer::{
    Intensities, Lamp, ModeCell, Phase, SignalConfig, SignalOutput, StatusReport, StatusSink,
    TimeDuration, TimeInstant, TimeSource, TrafficLight,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }

    fn saturating_sub(self, other: Self) -> Self {
        TestDuration(self.0.saturating_sub(other.0))
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }

    fn checked_add(self, duration: Self::Duration) -> Option<Self> {
        Some(TestInstant(self.0 + duration.0))
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn millis(&self) -> u64 {
        self.current_time.get().0
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Output and Sink
// ============================================================================

/// Mock lamp output that records every channel write
pub struct MockOutput {
    levels: [u8; 3],
    writes: Vec<(Lamp, u8)>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self {
            levels: [0; 3],
            writes: Vec::new(),
        }
    }

    pub fn level(&self, lamp: Lamp) -> u8 {
        self.levels[lamp.index()]
    }

    /// Levels as `[red, yellow, green]`
    pub fn levels(&self) -> [u8; 3] {
        self.levels
    }

    pub fn writes(&self) -> &[(Lamp, u8)] {
        &self.writes
    }
}

impl SignalOutput for MockOutput {
    fn set_intensity(&mut self, lamp: Lamp, level: u8) {
        self.levels[lamp.index()] = level;
        self.writes.push((lamp, level));
    }
}

/// Status sink that keeps every published report
pub struct RecordingSink {
    reports: Vec<StatusReport>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            reports: Vec::new(),
        }
    }

    pub fn reports(&self) -> &[StatusReport] {
        &self.reports
    }

    pub fn last(&self) -> Option<&StatusReport> {
        self.reports.last()
    }
}

impl StatusSink for RecordingSink {
    fn publish(&mut self, report: &StatusReport) {
        self.reports.push(*report);
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

pub type TestLight<'a> = TrafficLight<'a, TestInstant, MockTimeSource, MockOutput, RecordingSink>;

/// Creates a stopped traffic light with the default configuration
pub fn new_light<'a>(timer: &'a MockTimeSource, mode: &'a ModeCell) -> TestLight<'a> {
    new_light_with(SignalConfig::default(), timer, mode)
}

pub fn new_light_with<'a>(
    config: SignalConfig,
    timer: &'a MockTimeSource,
    mode: &'a ModeCell,
) -> TestLight<'a> {
    TrafficLight::new(config, MockOutput::new(), RecordingSink::new(), timer, mode).unwrap()
}

/// Creates a traffic light and starts it at the current time, polling once
pub fn started_light<'a>(timer: &'a MockTimeSource, mode: &'a ModeCell) -> TestLight<'a> {
    let mut light = new_light(timer, mode);
    light.start().unwrap();
    light.poll().unwrap();
    light
}

/// Polls once per millisecond until `end`, recording each change of the
/// active phase together with the time it was first observed
pub fn run_until(
    light: &mut TestLight<'_>,
    timer: &MockTimeSource,
    end: u64,
) -> Vec<(u64, Option<Phase>)> {
    let mut changes = Vec::new();
    let mut last = light.active_phase();

    while timer.millis() < end {
        timer.advance(TestDuration(1));
        light.poll().unwrap();

        let phase = light.active_phase();
        if phase != last {
            changes.push((timer.millis(), phase));
            last = phase;
        }
    }

    changes
}

/// Lamp levels as `[red, yellow, green]`
pub fn levels(intensities: Intensities) -> [u8; 3] {
    Lamp::ALL.map(|lamp| intensities.get(lamp))
}
