//! Background task that drives a [`Timeable`] on a fixed cadence.
//!
//! [`spawn`] moves a stopwatch or timer into its own tokio task. The task is the
//! sink's only writer: controllers send [`Command`]s over a channel and follow
//! progress through a watch channel instead of touching the sink themselves.

use std::future;
use std::time::Duration as StdDuration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::command::Command;
use crate::duration::Duration;
use crate::timeable::{Mode, Status, TickOutcome, TimeSink, Timeable, TimeableError, TimeableState};

const MIN_TICK: StdDuration = StdDuration::from_millis(1);

/// Settings for a spawned [`Timeable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Real time between ticks.
    pub tick: StdDuration,
    /// Commands that may queue before senders wait.
    pub command_buffer: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick: StdDuration::from_secs(1),
            command_buffer: 8,
        }
    }
}

impl RunnerConfig {
    /// Sets the real time between ticks.
    pub fn with_tick(mut self, tick: StdDuration) -> Self {
        self.tick = tick;
        self
    }

    /// Sets how many commands may queue before senders wait.
    pub fn with_command_buffer(mut self, command_buffer: usize) -> Self {
        self.command_buffer = command_buffer;
        self
    }
}

/// Errors returned by [`TimeableHandle`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerError {
    /// The task has stopped and no longer accepts commands.
    Closed,
    /// The task refused the command.
    Rejected(TimeableError),
    /// The task panicked or was aborted.
    Join,
}

impl core::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RunnerError::Closed => write!(f, "clock task is no longer running"),
            RunnerError::Rejected(err) => write!(f, "command rejected: {}", err),
            RunnerError::Join => write!(f, "clock task did not shut down cleanly"),
        }
    }
}

impl std::error::Error for RunnerError {}

impl From<TimeableError> for RunnerError {
    fn from(err: TimeableError) -> Self {
        RunnerError::Rejected(err)
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Command(Command),
    ResetStopped,
}

struct Request {
    action: Action,
    reply: oneshot::Sender<Result<Status, TimeableError>>,
}

/// Controller-side handle to a spawned [`Timeable`].
///
/// Dropping the handle stops the task; [`shutdown`](Self::shutdown) does the same
/// and hands the [`Timeable`] back.
pub struct TimeableHandle<M: Mode, S: TimeSink> {
    commands: mpsc::Sender<Request>,
    status: watch::Receiver<Status>,
    task: JoinHandle<Timeable<M, S>>,
}

/// Moves `timeable` into a new tokio task and returns its handle.
///
/// Must be called from within a tokio runtime. Taking the [`Timeable`] by value
/// means an instance can only ever be driven by one task.
pub fn spawn<M, S>(timeable: Timeable<M, S>, config: RunnerConfig) -> TimeableHandle<M, S>
where
    M: Mode + Send + 'static,
    S: TimeSink + Send + 'static,
{
    let (commands, requests) = mpsc::channel(config.command_buffer.max(1));
    let (status_tx, status) = watch::channel(timeable.status());
    let period = config.tick.max(MIN_TICK);

    let task = tokio::spawn(run(timeable, requests, status_tx, period));

    TimeableHandle {
        commands,
        status,
        task,
    }
}

impl<M, S> TimeableHandle<M, S>
where
    M: Mode + Send + 'static,
    S: TimeSink + Send + 'static,
{
    /// Sends a command and waits for the task to apply it.
    ///
    /// # Returns
    /// * `Ok(Status)` - Status right after the command was applied
    /// * `Err(RunnerError::Rejected)` - Invalid in the current state
    /// * `Err(RunnerError::Closed)` - Task has stopped
    pub async fn send(&self, command: Command) -> Result<Status, RunnerError> {
        self.request(Action::Command(command)).await
    }

    async fn request(&self, action: Action) -> Result<Status, RunnerError> {
        let (reply, response) = oneshot::channel();

        self.commands
            .send(Request { action, reply })
            .await
            .map_err(|_| RunnerError::Closed)?;

        let status = response.await.map_err(|_| RunnerError::Closed)??;
        Ok(status)
    }

    /// Starts counting from the reset value.
    pub async fn start(&self) -> Result<Status, RunnerError> {
        self.send(Command::Start).await
    }

    /// Stops counting and holds the current value.
    pub async fn pause(&self) -> Result<Status, RunnerError> {
        self.send(Command::Pause).await
    }

    /// Continues counting from the held value.
    pub async fn resume(&self) -> Result<Status, RunnerError> {
        self.send(Command::Resume).await
    }

    /// Restores the reset value. A running timer keeps counting.
    pub async fn reset(&self) -> Result<Status, RunnerError> {
        self.send(Command::Reset).await
    }

    /// Restores the reset value and leaves the instance stopped.
    ///
    /// Both steps are applied together, so no tick lands between them.
    pub async fn reset_stopped(&self) -> Result<Status, RunnerError> {
        self.request(Action::ResetStopped).await
    }

    /// Records a lap and returns its value.
    pub async fn lap(&self) -> Result<Duration, RunnerError> {
        Ok(self.send(Command::Lap).await?.duration)
    }

    /// Latest published status.
    pub fn status(&self) -> Status {
        *self.status.borrow()
    }

    /// Receiver that observes every published status.
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.clone()
    }

    /// Waits until the task reports `Terminated`.
    pub async fn wait_terminated(&self) -> Result<Status, RunnerError> {
        let mut status = self.status.clone();
        let terminated = status
            .wait_for(|status| status.state == TimeableState::Terminated)
            .await
            .map_err(|_| RunnerError::Closed)?;
        Ok(*terminated)
    }

    /// Stops the task and returns the [`Timeable`] it was driving.
    pub async fn shutdown(self) -> Result<Timeable<M, S>, RunnerError> {
        let Self { commands, task, .. } = self;
        drop(commands);
        task.await.map_err(|_| RunnerError::Join)
    }
}

async fn run<M: Mode, S: TimeSink>(
    mut timeable: Timeable<M, S>,
    mut requests: mpsc::Receiver<Request>,
    status: watch::Sender<Status>,
    period: StdDuration,
) -> Timeable<M, S> {
    let mut ticker: Option<Interval> = None;
    let mut next_due = Instant::now();
    // Time left until the next tick when the last pause arrived.
    let mut held: Option<StdDuration> = None;

    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(Request { action, reply }) = request else {
                    debug!("all handles dropped, stopping");
                    break;
                };

                let was_running = timeable.is_running();
                let result = match action {
                    Action::Command(command) => timeable.handle_command(command),
                    Action::ResetStopped => {
                        timeable.reset_stopped();
                        Ok(())
                    }
                }
                .map(|()| timeable.status());

                match &result {
                    Ok(applied) => debug!(?action, state = ?applied.state, duration = %applied.duration, "applied command"),
                    Err(err) => warn!(?action, %err, "rejected command"),
                }

                if timeable.is_running() && !was_running {
                    // A resume keeps the phase the pause interrupted; a start
                    // counts its first step immediately.
                    next_due = match (action, held) {
                        (Action::Command(Command::Resume), Some(remaining)) => Instant::now() + remaining,
                        _ => Instant::now(),
                    };
                    ticker = Some(ticker_at(next_due, period));
                } else if !timeable.is_running() && was_running {
                    // Honor the cleared flag now instead of at the next tick.
                    timeable.settle();
                    ticker = None;
                    held = Some(next_due.saturating_duration_since(Instant::now()));
                }

                if timeable.state() != TimeableState::Paused {
                    held = None;
                }

                status.send_replace(timeable.status());
                let _ = reply.send(result);
            }
            () = next_tick(&mut ticker) => {
                next_due = Instant::now() + period;
                match timeable.tick() {
                    Ok(TickOutcome::Advanced(duration)) => trace!(%duration, "tick"),
                    Ok(TickOutcome::Finished) => {
                        info!(duration = %timeable.duration(), "countdown finished");
                        ticker = None;
                    }
                    Ok(TickOutcome::Stopped) => ticker = None,
                    Err(err) => {
                        error!(%err, duration = %timeable.duration(), "stopping after arithmetic failure");
                        ticker = None;
                    }
                }

                status.send_replace(timeable.status());
            }
        }
    }

    timeable
}

fn ticker_at(first: Instant, period: StdDuration) -> Interval {
    let mut ticker = tokio::time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => future::pending().await,
    }
}
