//! Cooperative timer-task scheduler.
//!
//! Provides [`Scheduler`], a fixed pool of re-armable [`TimerTask`]s that is
//! polled from the host's main loop. Tasks never own closures; instead
//! [`Scheduler::poll`] hands each due [`Firing`] to a callback together with
//! `&mut Scheduler`, so a callback can re-arm any other task (or itself) to
//! build chains of timed actions.

use crate::log::trace;
use crate::time::{TimeDuration, TimeInstant, has_elapsed};
use crate::types::RepeatCount;
use heapless::Vec;

/// An identifier for a task within a scheduler.
///
/// Returned by [`Scheduler::register`]. Tasks are never removed, so an id
/// stays valid for the lifetime of the scheduler that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(pub usize);

impl From<TaskId> for usize {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

/// Errors that can occur during scheduler operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// The task pool is full and cannot accept more tasks.
    PoolFull { capacity: usize },

    /// The task id was not issued by this scheduler.
    InvalidTaskId(TaskId),
}

impl core::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SchedulerError::PoolFull { capacity } => {
                write!(f, "task pool is full (capacity {})", capacity)
            }
            SchedulerError::InvalidTaskId(id) => {
                write!(f, "task {} is not registered", id.0)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SchedulerError {}

/// A schedulable unit of delayed or repeated work.
///
/// Created once at startup and handed to [`Scheduler::register`]. A new task
/// is disabled and has nothing pending until it is enabled or restarted.
#[derive(Debug, Clone, Copy)]
pub struct TimerTask<I: TimeInstant> {
    interval: I::Duration,
    repeat: RepeatCount,
    enabled: bool,
    armed_at: Option<I>,
    delay: I::Duration,
    remaining: u32,
    run_count: u32,
    last_iteration: bool,
}

impl<I: TimeInstant> TimerTask<I> {
    /// Creates a task that fires `repeat` times, `interval` apart.
    pub fn new(interval: I::Duration, repeat: RepeatCount) -> Self {
        Self {
            interval,
            repeat,
            enabled: false,
            armed_at: None,
            delay: I::Duration::ZERO,
            remaining: 0,
            run_count: 0,
            last_iteration: false,
        }
    }

    /// Creates a one-shot task.
    pub fn once(interval: I::Duration) -> Self {
        Self::new(interval, RepeatCount::ONCE)
    }

    /// Creates a task that repeats until disabled.
    pub fn forever(interval: I::Duration) -> Self {
        Self::new(interval, RepeatCount::Infinite)
    }

    /// Base interval used by `restart` and between repeated firings.
    pub fn interval(&self) -> I::Duration {
        self.interval
    }

    /// Repeat count applied on the next arming.
    pub fn repeat(&self) -> RepeatCount {
        self.repeat
    }

    fn arm(&mut self, now: I, delay: I::Duration) {
        self.remaining = match self.repeat {
            RepeatCount::Finite(count) => count.max(1),
            RepeatCount::Infinite => 0,
        };
        self.run_count = 0;
        self.last_iteration = false;
        self.armed_at = Some(now);
        self.delay = delay;
        self.enabled = true;
    }

    fn due_at(&self) -> Option<I> {
        self.armed_at
            .and_then(|armed_at| armed_at.checked_add(self.delay))
    }

    fn is_due(&self, now: I) -> bool {
        match self.armed_at {
            Some(armed_at) if self.enabled => has_elapsed(now, armed_at, self.delay),
            _ => false,
        }
    }

    /// Updates repeat bookkeeping for a firing at `now`.
    ///
    /// Returns true if this firing exhausted the task.
    fn consume(&mut self, now: I) -> bool {
        self.run_count = self.run_count.saturating_add(1);

        let exhausted = match self.repeat {
            RepeatCount::Finite(_) => {
                self.remaining = self.remaining.saturating_sub(1);
                self.remaining == 0
            }
            RepeatCount::Infinite => false,
        };

        self.last_iteration = exhausted;
        if exhausted {
            self.armed_at = None;
            self.enabled = false;
        } else {
            // Count the next firing from the previous due time so repeated
            // firings do not drift with poll latency.
            self.armed_at = Some(self.due_at().unwrap_or(now));
            self.delay = self.interval;
        }
        exhausted
    }
}

/// Information about a single firing, passed to the poll callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Firing {
    /// The task that fired.
    pub task: TaskId,

    /// 1-based firing number since the task was last armed.
    pub run: u32,

    last_iteration: bool,
}

impl Firing {
    /// Returns true if this is the task's final firing before it finishes.
    ///
    /// Always false for tasks that repeat forever.
    pub fn is_last_iteration(&self) -> bool {
        self.last_iteration
    }
}

/// A fixed pool of timer tasks dispatched from a single-threaded poll loop.
///
/// # Type Parameters
/// * `I` - Time instant type
/// * `N` - Maximum number of tasks
pub struct Scheduler<I: TimeInstant, const N: usize> {
    tasks: Vec<TimerTask<I>, N>,
}

impl<I: TimeInstant, const N: usize> Scheduler<I, N> {
    /// Creates an empty scheduler.
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Adds a task to the managed set.
    ///
    /// # Errors
    /// * `PoolFull` - The scheduler already holds `N` tasks
    pub fn register(&mut self, task: TimerTask<I>) -> Result<TaskId, SchedulerError> {
        let id = TaskId(self.tasks.len());
        self.tasks
            .push(task)
            .map_err(|_| SchedulerError::PoolFull { capacity: N })?;
        Ok(id)
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut TimerTask<I>, SchedulerError> {
        self.tasks
            .get_mut(id.0)
            .ok_or(SchedulerError::InvalidTaskId(id))
    }

    /// Makes a task runnable.
    ///
    /// An already enabled task is left alone. A task that was disabled while
    /// a firing was pending resumes that firing at its original due time.
    /// A task with nothing pending is armed to fire on the next poll with a
    /// fresh repeat counter.
    pub fn enable(&mut self, id: TaskId, now: I) -> Result<(), SchedulerError> {
        let task = self.task_mut(id)?;
        if task.enabled {
            return Ok(());
        }
        if task.armed_at.is_some() {
            task.enabled = true;
        } else {
            task.arm(now, I::Duration::ZERO);
        }
        Ok(())
    }

    /// Stops a task from firing. Its pending firing time is kept.
    pub fn disable(&mut self, id: TaskId) -> Result<(), SchedulerError> {
        self.task_mut(id)?.enabled = false;
        Ok(())
    }

    /// Re-arms a task to fire one interval from `now`, resetting its repeat
    /// counter. Replaces any pending firing.
    pub fn restart(&mut self, id: TaskId, now: I) -> Result<(), SchedulerError> {
        let task = self.task_mut(id)?;
        let interval = task.interval;
        task.arm(now, interval);
        Ok(())
    }

    /// Re-arms a task to fire `delay` from `now` instead of after its
    /// interval. Later repetitions use the interval again.
    pub fn restart_delayed(
        &mut self,
        id: TaskId,
        now: I,
        delay: I::Duration,
    ) -> Result<(), SchedulerError> {
        self.task_mut(id)?.arm(now, delay);
        Ok(())
    }

    /// Changes the interval used by future `restart` calls and repetitions.
    /// An already pending firing keeps its due time.
    pub fn set_interval(&mut self, id: TaskId, interval: I::Duration) -> Result<(), SchedulerError> {
        self.task_mut(id)?.interval = interval;
        Ok(())
    }

    /// Changes the repeat count applied on the next arming.
    pub fn set_repeat(&mut self, id: TaskId, repeat: RepeatCount) -> Result<(), SchedulerError> {
        self.task_mut(id)?.repeat = repeat;
        Ok(())
    }

    /// Dispatches every enabled task whose due time has elapsed.
    ///
    /// Each due task fires exactly once per poll. Its repeat bookkeeping is
    /// updated before `callback` runs: a repeating task is re-armed for its
    /// next interval, a one-shot or exhausted task is disabled. The callback
    /// may therefore re-arm the firing task itself and override that.
    ///
    /// # Errors
    /// The first error returned by `callback` aborts the poll and is
    /// propagated; callback failures are treated as fatal by callers.
    pub fn poll<E, F>(&mut self, now: I, mut callback: F) -> Result<(), E>
    where
        F: FnMut(&mut Self, Firing) -> Result<(), E>,
    {
        for idx in 0..self.tasks.len() {
            let task = &mut self.tasks[idx];
            if !task.is_due(now) {
                continue;
            }

            let last_iteration = task.consume(now);
            let firing = Firing {
                task: TaskId(idx),
                run: task.run_count,
                last_iteration,
            };
            trace!("task {} fired (run {})", idx, firing.run);

            callback(self, firing)?;
        }
        Ok(())
    }

    /// Returns how long the host may sleep before the next firing is due.
    ///
    /// # Returns
    /// * `Some(Duration::ZERO)` - At least one task is already overdue
    /// * `Some(duration)` - Time until the earliest enabled firing
    /// * `None` - No enabled task has a pending firing
    pub fn next_wake(&self, now: I) -> Option<I::Duration> {
        let mut earliest: Option<I::Duration> = None;

        for task in self.tasks.iter().filter(|t| t.enabled) {
            let Some(armed_at) = task.armed_at else {
                continue;
            };
            let elapsed = now.duration_since(armed_at);
            let wait = task.delay.saturating_sub(elapsed);

            earliest = match earliest {
                Some(current) if current.as_millis() <= wait.as_millis() => Some(current),
                _ => Some(wait),
            };
        }

        earliest
    }

    /// Returns true if the task is runnable.
    pub fn is_enabled(&self, id: TaskId) -> bool {
        self.tasks.get(id.0).is_some_and(|t| t.enabled)
    }

    /// Returns true if the task is enabled and has a firing scheduled.
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks
            .get(id.0)
            .is_some_and(|t| t.enabled && t.armed_at.is_some())
    }

    /// Returns when the task's pending firing is due, if one is scheduled.
    ///
    /// Disabled tasks still report the firing they would resume on `enable`.
    pub fn next_due(&self, id: TaskId) -> Option<I> {
        self.tasks.get(id.0).and_then(|t| t.due_at())
    }

    /// Number of firings since the task was last armed.
    pub fn run_count(&self, id: TaskId) -> u32 {
        self.tasks.get(id.0).map_or(0, |t| t.run_count)
    }

    /// Returns true if the task's most recent firing was its last one.
    ///
    /// Meaningful while the task's callback runs; cleared when re-armed.
    pub fn is_last_iteration(&self, id: TaskId) -> bool {
        self.tasks.get(id.0).is_some_and(|t| t.last_iteration)
    }

    /// Returns the task's configuration and state.
    pub fn task(&self, id: TaskId) -> Option<&TimerTask<I>> {
        self.tasks.get(id.0)
    }

    /// Returns the number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no task has been registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<I: TimeInstant, const N: usize> Default for Scheduler<I, N> {
    fn default() -> Self {
        Self::new()
    }
}
