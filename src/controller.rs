//! Traffic light controller tying the scheduler, sequencer and overrides
//! together.
//!
//! Provides [`TrafficLight`], which owns the scheduler and all signal state
//! and is polled from the main loop. Override buttons either call
//! [`TrafficLight::activate_or_toggle`] from the main loop, or publish to the
//! shared [`ModeCell`] from interrupt context; published modes are applied at
//! the start of the next [`TrafficLight::poll`]. Transitions that cancel out
//! before that poll are still applied once, so a double press restarts the
//! cycle and is reported.

use crate::command::DurationCommand;
use crate::config::{ConfigError, SignalConfig};
use crate::log::{debug, info};
use crate::mode::{ModeCell, ModeSnapshot, OverrideMode, Trigger};
use crate::output::{Intensities, SignalOutput};
use crate::phase::Phase;
use crate::scheduler::{Firing, Scheduler, SchedulerError, TaskId, TimerTask};
use crate::sequencer::SignalSequencer;
use crate::status::{Indication, StatusReport, StatusSink};
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::types::{Lamp, Lamps};

/// Number of scheduler entries a traffic light uses: the signal cycle, the
/// all-blink pattern and the periodic status report.
pub const TASK_CAPACITY: usize = 3;

/// Errors that can occur during controller operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrafficLightError {
    /// A scheduler operation failed. This indicates a programming error.
    Scheduler(SchedulerError),

    /// A duration update was rejected; the previous duration is kept.
    Config(ConfigError),
}

impl core::fmt::Display for TrafficLightError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TrafficLightError::Scheduler(err) => write!(f, "scheduler error: {}", err),
            TrafficLightError::Config(err) => write!(f, "configuration error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TrafficLightError {}

impl From<SchedulerError> for TrafficLightError {
    fn from(err: SchedulerError) -> Self {
        TrafficLightError::Scheduler(err)
    }
}

impl From<ConfigError> for TrafficLightError {
    fn from(err: ConfigError) -> Self {
        TrafficLightError::Config(err)
    }
}

/// State shared by every scheduler callback and the override controller.
struct LightState<O, S> {
    config: SignalConfig,
    sequencer: SignalSequencer,
    blink_task: TaskId,
    status_task: TaskId,
    mode: OverrideMode,
    epoch: u8,
    blink_lit: bool,
    brightness: u8,
    levels: Intensities,
    output: O,
    sink: S,
}

impl<O: SignalOutput, S: StatusSink> LightState<O, S> {
    fn lit_lamps(&self) -> Lamps {
        match self.mode {
            OverrideMode::Normal => self.sequencer.lamps(),
            OverrideMode::RedOverride => Lamps::only(Lamp::Red),
            OverrideMode::BlinkOverride if self.blink_lit => Lamps::ALL,
            OverrideMode::BlinkOverride | OverrideMode::PowerOff => Lamps::NONE,
        }
    }

    /// Drives the lamps to match the current state.
    fn refresh(&mut self) {
        let levels = Intensities::from_lamps(self.lit_lamps(), self.brightness);
        levels.apply(&self.levels, &mut self.output);
        self.levels = levels;
    }

    fn report(&self) -> StatusReport {
        StatusReport {
            mode: self.mode,
            indication: Indication::from_state(self.mode, self.sequencer.active_phase()),
            brightness: self.brightness,
        }
    }

    fn publish(&mut self) {
        let report = self.report();
        self.sink.publish(&report);
    }

    fn dispatch<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
        firing: Firing,
        now: I,
    ) -> Result<(), SchedulerError> {
        if firing.task == self.sequencer.task() {
            self.sequencer
                .on_fire(scheduler, &self.config, self.mode, firing, now)?;
            self.refresh();
        } else if firing.task == self.blink_task {
            if self.mode == OverrideMode::BlinkOverride {
                self.blink_lit = !self.blink_lit;
                self.refresh();
            }
        } else if firing.task == self.status_task {
            self.publish();
        }
        Ok(())
    }

    /// Applies a published mode if anything was published since the last
    /// call.
    ///
    /// An unchanged mode with a newer epoch means the signal left and
    /// re-entered that mode between polls; it is entered again.
    fn sync_mode<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
        published: ModeSnapshot,
        now: I,
    ) -> Result<(), SchedulerError> {
        if published.epoch == self.epoch && published.mode == self.mode {
            return Ok(());
        }
        self.epoch = published.epoch;
        self.enter_mode(scheduler, published.mode, now)
    }

    fn enter_mode<I: TimeInstant, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<I, N>,
        mode: OverrideMode,
        now: I,
    ) -> Result<(), SchedulerError> {
        let previous = self.mode;
        if mode == previous {
            info!("mode {} re-entered", mode);
        } else {
            info!("mode {} -> {}", previous, mode);
        }
        self.mode = mode;

        if previous == OverrideMode::BlinkOverride {
            scheduler.disable(self.blink_task)?;
        }
        self.blink_lit = false;

        match mode {
            OverrideMode::Normal => self.sequencer.resume(scheduler, &self.config, now)?,
            OverrideMode::BlinkOverride => {
                self.sequencer.suspend(scheduler)?;
                scheduler.restart(self.blink_task, now)?;
            }
            OverrideMode::RedOverride | OverrideMode::PowerOff => {
                self.sequencer.suspend(scheduler)?;
            }
        }

        self.refresh();
        self.publish();
        Ok(())
    }
}

/// A three-lamp traffic signal with button overrides.
///
/// Owns the scheduler and every piece of signal state. Call [`poll`](Self::poll)
/// from the main loop; it dispatches due tasks and returns how long the loop
/// may sleep.
///
/// # Type Parameters
/// * `'a` - Lifetime of the time source and mode cell references
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `O` - Lamp output implementation type
/// * `S` - Status sink implementation type
pub struct TrafficLight<'a, I, T, O, S>
where
    I: TimeInstant,
    T: TimeSource<I>,
    O: SignalOutput,
    S: StatusSink,
{
    time_source: &'a T,
    mode_cell: &'a ModeCell,
    scheduler: Scheduler<I, TASK_CAPACITY>,
    state: LightState<O, S>,
}

impl<'a, I, T, O, S> TrafficLight<'a, I, T, O, S>
where
    I: TimeInstant,
    T: TimeSource<I>,
    O: SignalOutput,
    S: StatusSink,
{
    /// Creates a stopped traffic light with every lamp turned off.
    ///
    /// # Errors
    /// Only if the task pool is too small, which is a programming error.
    pub fn new(
        config: SignalConfig,
        mut output: O,
        sink: S,
        time_source: &'a T,
        mode_cell: &'a ModeCell,
    ) -> Result<Self, SchedulerError> {
        let mut scheduler = Scheduler::new();
        let sequencer = SignalSequencer::register(&mut scheduler, &config)?;
        let blink_task = scheduler.register(TimerTask::forever(I::Duration::from_millis(
            config.timing.all_blink_period as u64,
        )))?;
        let status_task = scheduler.register(TimerTask::forever(I::Duration::from_millis(
            config.timing.status_period as u64,
        )))?;

        Intensities::OFF.apply_all(&mut output);
        let epoch = mode_cell.snapshot().epoch;

        Ok(Self {
            time_source,
            mode_cell,
            scheduler,
            state: LightState {
                config,
                sequencer,
                blink_task,
                status_task,
                mode: OverrideMode::Normal,
                epoch,
                blink_lit: false,
                brightness: u8::MAX,
                levels: Intensities::OFF,
                output,
                sink,
            },
        })
    }

    /// Starts the signal cycle and the periodic status report.
    ///
    /// Red is shown on the next poll. If an override was published before
    /// starting, it is applied immediately instead.
    pub fn start(&mut self) -> Result<(), TrafficLightError> {
        let now = self.time_source.now();
        info!("starting signal cycle");

        let state = &mut self.state;
        state
            .sequencer
            .start(&mut self.scheduler, &state.config, now)?;
        self.scheduler.restart(state.status_task, now)?;

        let published = self.mode_cell.snapshot();
        state.epoch = published.epoch;
        if published.mode != state.mode {
            state.enter_mode(&mut self.scheduler, published.mode, now)?;
        }
        Ok(())
    }

    /// Services the traffic light. Call once per main loop iteration.
    ///
    /// Applies any override published to the mode cell since the last poll,
    /// then runs every due task.
    ///
    /// # Returns
    /// * `Ok(Some(duration))` - Time until the next task is due
    /// * `Ok(None)` - Nothing is scheduled; sleep until an interrupt
    /// * `Err` - A scheduler operation failed, which is a programming error
    pub fn poll(&mut self) -> Result<Option<I::Duration>, TrafficLightError> {
        let now = self.time_source.now();
        let state = &mut self.state;

        state.sync_mode(&mut self.scheduler, self.mode_cell.snapshot(), now)?;

        self.scheduler
            .poll(now, |scheduler, firing| state.dispatch(scheduler, firing, now))?;

        Ok(self.scheduler.next_wake(now))
    }

    /// Handles an override button press.
    ///
    /// Activates the trigger's override, replacing any other, or returns to
    /// normal cycling if that override was already active. Returns the new
    /// mode. Toggles published from interrupts and not yet polled are applied
    /// as well.
    pub fn activate_or_toggle(&mut self, trigger: Trigger) -> Result<OverrideMode, TrafficLightError> {
        let mode = self.mode_cell.toggle(trigger);
        let now = self.time_source.now();
        self.state
            .sync_mode(&mut self.scheduler, self.mode_cell.snapshot(), now)?;
        Ok(mode)
    }

    /// Sets the brightness of lit lamps and re-drives them.
    pub fn set_brightness(&mut self, level: u8) {
        if level == self.state.brightness {
            return;
        }
        self.state.brightness = level;
        self.state.refresh();
    }

    /// Changes a lamp duration.
    ///
    /// The new duration applies from the next time that lamp's phase is
    /// armed; a firing already scheduled keeps its time. Once started, the
    /// cycle always has a firing pending, so the re-enable only matters
    /// before [`start`](Self::start): there the update starts the cycle at
    /// Red.
    ///
    /// # Errors
    /// * `Config` - The duration is too short; the old value is kept
    pub fn set_duration(&mut self, lamp: Lamp, millis: u32) -> Result<(), TrafficLightError> {
        let state = &mut self.state;
        state.config.set_duration(lamp, millis)?;
        debug!("{} duration set to {} ms", lamp, millis);

        if state.mode == OverrideMode::Normal {
            let now = self.time_source.now();
            state.sequencer.wake(&mut self.scheduler, now)?;
        }
        Ok(())
    }

    /// Applies a parsed serial command.
    pub fn apply_command(&mut self, command: DurationCommand) -> Result<(), TrafficLightError> {
        self.set_duration(command.lamp, command.millis)
    }

    /// The override mode currently applied to the lamps.
    pub fn mode(&self) -> OverrideMode {
        self.state.mode
    }

    /// The phase currently shown, or `None` during an override.
    pub fn active_phase(&self) -> Option<Phase> {
        self.state.sequencer.active_phase()
    }

    /// The phase the cycle will show next.
    pub fn pending_phase(&self) -> Phase {
        self.state.sequencer.pending_phase()
    }

    /// A snapshot of the current state.
    pub fn status(&self) -> StatusReport {
        self.state.report()
    }

    /// Lamp levels last written to the output.
    pub fn intensities(&self) -> Intensities {
        self.state.levels
    }

    /// Current brightness level.
    pub fn brightness(&self) -> u8 {
        self.state.brightness
    }

    /// The active configuration, including run-time duration updates.
    pub fn config(&self) -> &SignalConfig {
        &self.state.config
    }

    /// The scheduler driving this traffic light.
    pub fn scheduler(&self) -> &Scheduler<I, TASK_CAPACITY> {
        &self.scheduler
    }

    /// The scheduler entry of the signal cycle.
    pub fn sequencer_task(&self) -> TaskId {
        self.state.sequencer.task()
    }

    /// The scheduler entry of the all-blink pattern.
    pub fn blink_task(&self) -> TaskId {
        self.state.blink_task
    }

    /// The lamp output.
    pub fn output(&self) -> &O {
        &self.state.output
    }

    /// The status sink.
    pub fn sink(&self) -> &S {
        &self.state.sink
    }
}
