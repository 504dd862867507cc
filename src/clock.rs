//! Controller owning one stopwatch and one countdown timer.
//!
//! [`Clock`] keeps the stopwatch task alive for its whole life and replaces the
//! timer task whenever a new countdown is started, routing [`ClockCommand`]s to
//! whichever instance they target.

use tracing::debug;

use crate::command::{ClockCommand, Command, Target};
use crate::duration::Duration;
use crate::runner::{self, RunnerConfig, RunnerError, TimeableHandle};
use crate::timeable::{CountDown, CountUp, Status, TimeSink, Timeable, TimeableState};

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// A timer command arrived before any countdown was started.
    NoTimer,
    /// A new countdown was requested while the current one is still running.
    TimerBusy,
    /// The targeted task failed the command.
    Runner(RunnerError),
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClockError::NoTimer => write!(f, "no timer has been started"),
            ClockError::TimerBusy => write!(f, "timer is still running"),
            ClockError::Runner(err) => write!(f, "runner error: {}", err),
        }
    }
}

impl std::error::Error for ClockError {}

impl From<RunnerError> for ClockError {
    fn from(err: RunnerError) -> Self {
        ClockError::Runner(err)
    }
}

/// A stopwatch and a countdown timer, each running in its own task.
///
/// Sinks are cloned for every timer task, so `S` is usually a shared handle such
/// as `Arc<Mutex<String>>`.
pub struct Clock<S: TimeSink + Clone + Send + 'static> {
    config: RunnerConfig,
    stopwatch: TimeableHandle<CountUp, S>,
    timer: Option<TimeableHandle<CountDown, S>>,
    timer_sink: S,
}

impl<S: TimeSink + Clone + Send + 'static> Clock<S> {
    /// Spawns an idle stopwatch. No timer exists until [`start_timer`](Self::start_timer).
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(stopwatch_sink: S, timer_sink: S, config: RunnerConfig) -> Self {
        let stopwatch = runner::spawn(Timeable::stopwatch(stopwatch_sink), config);

        Self {
            config,
            stopwatch,
            timer: None,
            timer_sink,
        }
    }

    /// Handle to the stopwatch task.
    pub fn stopwatch(&self) -> &TimeableHandle<CountUp, S> {
        &self.stopwatch
    }

    /// Handle to the current timer task, if a countdown was ever started.
    pub fn timer(&self) -> Option<&TimeableHandle<CountDown, S>> {
        self.timer.as_ref()
    }

    /// Replaces the timer with a fresh one counting down from `duration` and starts it.
    ///
    /// The previous timer task is shut down first. A zero duration starts and
    /// terminates on its first tick.
    ///
    /// # Errors
    /// * [`ClockError::TimerBusy`] - the current timer is still running
    pub async fn start_timer(&mut self, duration: Duration) -> Result<Status, ClockError> {
        if let Some(timer) = &self.timer {
            if timer.status().state == TimeableState::Running {
                return Err(ClockError::TimerBusy);
            }
        }

        if let Some(previous) = self.timer.take() {
            previous.shutdown().await?;
        }

        debug!(%duration, "starting countdown");
        let timer = runner::spawn(Timeable::timer(duration, self.timer_sink.clone()), self.config);
        let status = timer.start().await?;
        self.timer = Some(timer);
        Ok(status)
    }

    /// Restores the timer's original duration and leaves it stopped.
    pub async fn reset_timer(&self) -> Result<Status, ClockError> {
        let timer = self.timer.as_ref().ok_or(ClockError::NoTimer)?;
        Ok(timer.reset_stopped().await?)
    }

    /// Routes a command to its target.
    ///
    /// A timer `Reset` goes through [`reset_timer`](Self::reset_timer) so the
    /// timer also stops.
    pub async fn handle(&self, command: ClockCommand) -> Result<Status, ClockError> {
        match (command.target, command.command) {
            (Target::Stopwatch, command) => Ok(self.stopwatch.send(command).await?),
            (Target::Timer, Command::Reset) => self.reset_timer().await,
            (Target::Timer, command) => {
                let timer = self.timer.as_ref().ok_or(ClockError::NoTimer)?;
                Ok(timer.send(command).await?)
            }
        }
    }

    /// Stops both tasks.
    pub async fn shutdown(self) -> Result<(), ClockError> {
        self.stopwatch.shutdown().await?;
        if let Some(timer) = self.timer {
            timer.shutdown().await?;
        }
        Ok(())
    }
}
