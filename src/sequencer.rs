//! Signal sequencer driving the normal Red/Yellow/Green cycle.
//!
//! Provides [`SignalSequencer`], which owns a single scheduler entry and walks
//! it through the [`Phase`] cycle. Each firing shows the pending phase and
//! re-arms the same entry for the phase that follows, so the whole cycle is a
//! chain of delayed re-arms on one task. The green blink reuses the scheduler's
//! repeat semantics: the entry is armed to fire several times and only its
//! last iteration moves the cycle on.

use crate::config::SignalConfig;
use crate::log::debug;
use crate::mode::OverrideMode;
use crate::phase::Phase;
use crate::scheduler::{Firing, Scheduler, SchedulerError, TaskId, TimerTask};
use crate::time::{TimeDuration, TimeInstant};
use crate::types::Lamps;

#[inline]
fn millis<D: TimeDuration>(ms: u32) -> D {
    D::from_millis(ms as u64)
}

/// Walks one scheduler entry through the signal cycle.
#[derive(Debug, Clone)]
pub struct SignalSequencer {
    task: TaskId,
    pending: Phase,
    active: Option<Phase>,
    blink_lit: bool,
}

impl SignalSequencer {
    /// Registers the sequencer's entry with `scheduler`.
    ///
    /// The entry stays idle until [`start`](Self::start) is called.
    pub fn register<I: TimeInstant, const N: usize>(
        scheduler: &mut Scheduler<I, N>,
        config: &SignalConfig,
    ) -> Result<Self, SchedulerError> {
        let entry = Phase::ENTRY;
        let task = scheduler.register(TimerTask::new(
            millis(entry.interval_ms(config)),
            entry.repeat(config),
        ))?;

        Ok(Self {
            task,
            pending: entry,
            active: None,
            blink_lit: true,
        })
    }

    /// The scheduler entry owned by this sequencer.
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// The phase currently shown, or `None` while suspended or not started.
    pub fn active_phase(&self) -> Option<Phase> {
        self.active
    }

    /// The phase the next firing will show.
    pub fn pending_phase(&self) -> Phase {
        self.pending
    }

    /// Lamps lit by the active phase.
    pub fn lamps(&self) -> Lamps {
        self.active
            .map_or(Lamps::NONE, |phase| phase.lamps(self.blink_lit))
    }

    /// Arms the entry phase to fire on the next poll.
    pub fn start<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
        config: &SignalConfig,
        now: I,
    ) -> Result<(), SchedulerError> {
        self.active = None;
        self.arm(scheduler, config, Phase::ENTRY, now, 0)
    }

    /// Stops the cycle. The pending firing is disabled and nothing is shown.
    pub fn suspend<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
    ) -> Result<(), SchedulerError> {
        scheduler.disable(self.task)?;
        self.active = None;
        Ok(())
    }

    /// Restarts the cycle from the entry phase, one entry interval from `now`.
    ///
    /// Progress through the interrupted cycle, including a partial green
    /// blink, is discarded.
    pub fn resume<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
        config: &SignalConfig,
        now: I,
    ) -> Result<(), SchedulerError> {
        let entry = Phase::ENTRY;
        self.active = None;
        self.pending = entry;
        scheduler.set_repeat(self.task, entry.repeat(config))?;
        scheduler.set_interval(self.task, millis(entry.interval_ms(config)))?;
        scheduler.restart(self.task, now)
    }

    /// Re-enables the entry if the chain has nothing pending.
    ///
    /// An in-flight firing is left exactly where it is.
    pub fn wake<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
        now: I,
    ) -> Result<(), SchedulerError> {
        if scheduler.is_pending(self.task) {
            return Ok(());
        }
        scheduler.enable(self.task, now)
    }

    /// Handles a firing of the entry.
    ///
    /// Does nothing while an override is active, so a firing that slips
    /// through before the override disables the entry cannot touch the lamps
    /// or re-arm the chain.
    pub fn on_fire<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
        config: &SignalConfig,
        mode: OverrideMode,
        firing: Firing,
        now: I,
    ) -> Result<(), SchedulerError> {
        if mode.is_override() {
            return Ok(());
        }

        let phase = self.pending;
        match phase {
            Phase::Green => self.blink_lit = true,
            Phase::GreenBlink => self.blink_lit = !self.blink_lit,
            _ => {}
        }
        self.active = Some(phase);

        if phase == Phase::GreenBlink && !firing.is_last_iteration() {
            return Ok(());
        }

        let next = phase.next(config);
        debug!("{} -> {} in {} ms", phase, next.phase, next.delay_ms);
        self.arm(scheduler, config, next.phase, now, next.delay_ms)
    }

    fn arm<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
        config: &SignalConfig,
        phase: Phase,
        now: I,
        delay_ms: u32,
    ) -> Result<(), SchedulerError> {
        self.pending = phase;
        scheduler.set_repeat(self.task, phase.repeat(config))?;
        scheduler.set_interval(self.task, millis(phase.interval_ms(config)))?;
        scheduler.restart_delayed(self.task, now, millis(delay_ms))
    }
}
