//! Time abstraction traits for platform-agnostic scheduling.
//!
//! The scheduler never reads a clock itself: every operation takes `now`
//! explicitly, and the [`TrafficLight`](crate::TrafficLight) controller reads
//! it from a borrowed [`TimeSource`]. Firmware wires this to a SysTick counter,
//! tests to a mock clock.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Zero duration constant.
    const ZERO: Self;

    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;

    /// Saturating subtraction (returns ZERO on underflow).
    fn saturating_sub(self, other: Self) -> Self;
}

/// Trait abstraction for instant types.
///
/// Implementations backed by a wrapping millisecond counter should make
/// `duration_since` wrap-aware; the scheduler only ever compares elapsed
/// durations, never raw instants.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Adds duration to instant, returns None on overflow.
    fn checked_add(self, duration: Self::Duration) -> Option<Self>;
}

/// Returns true once at least `delay` has elapsed since `armed_at`.
#[inline]
pub(crate) fn has_elapsed<I: TimeInstant>(now: I, armed_at: I, delay: I::Duration) -> bool {
    now.duration_since(armed_at).as_millis() >= delay.as_millis()
}
