//! Tick-driven state machine shared by stopwatches and timers.
//!
//! Provides [`Timeable`], which owns a [`Duration`], a running flag and a
//! [`TimeSink`], and moves the duration one step per [`tick`](Timeable::tick)
//! according to its [`Mode`]. [`CountUp`] and [`CountDown`] are the two modes;
//! [`Stopwatch`] and [`Timer`] name the resulting types.

use crate::command::Command;
use crate::duration::{Duration, InvalidDuration};
use heapless::Vec;

/// Maximum number of laps a [`Timeable`] records between resets.
pub const MAX_LAPS: usize = 64;

/// Trait for abstracting the surface a formatted time is displayed on.
///
/// Implement this for whatever shows the time (a text field, a terminal line,
/// a shared buffer). Writes cannot fail; handle display errors internally.
pub trait TimeSink {
    /// Replaces the displayed text.
    fn write(&mut self, text: &str);

    /// Returns true if the sink currently shows `text`.
    ///
    /// Consulted before the corrective write that follows a stopped loop. Sinks
    /// that cannot read back their contents keep the default.
    fn is_displaying(&self, text: &str) -> bool {
        let _ = text;
        true
    }
}

impl<S: TimeSink + ?Sized> TimeSink for &mut S {
    fn write(&mut self, text: &str) {
        (**self).write(text);
    }

    fn is_displaying(&self, text: &str) -> bool {
        (**self).is_displaying(text)
    }
}

/// Keeps as much of the text as fits. `N` of [`TEXT_CAPACITY`](crate::TEXT_CAPACITY)
/// holds any value; 8 holds every value below 100 hours.
impl<const N: usize> TimeSink for heapless::String<N> {
    fn write(&mut self, text: &str) {
        self.clear();
        for ch in text.chars() {
            if self.push(ch).is_err() {
                break;
            }
        }
    }

    fn is_displaying(&self, text: &str) -> bool {
        self.as_str() == text
    }
}

#[cfg(feature = "std")]
impl TimeSink for std::string::String {
    fn write(&mut self, text: &str) {
        self.clear();
        self.push_str(text);
    }

    fn is_displaying(&self, text: &str) -> bool {
        self == text
    }
}

/// Shares a sink between the task that writes it and the controller that shows it.
#[cfg(feature = "std")]
impl<S: TimeSink> TimeSink for std::sync::Arc<std::sync::Mutex<S>> {
    fn write(&mut self, text: &str) {
        self.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .write(text);
    }

    fn is_displaying(&self, text: &str) -> bool {
        self.lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_displaying(text)
    }
}

/// How a [`Timeable`] moves, when it stops on its own, and what it resets to.
pub trait Mode {
    /// Whether [`Timeable::reset`] also clears the running flag.
    const STOPS_ON_RESET: bool;

    /// Produces the value for the next tick.
    fn advance(&self, current: Duration) -> Result<Duration, InvalidDuration>;

    /// Returns true when the loop should stop instead of advancing.
    fn is_terminal(&self, current: &Duration) -> bool;

    /// The value a reset (or a fresh start) restores.
    fn on_reset(&self) -> Duration;
}

/// Counts up one second per tick with no upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CountUp;

impl Mode for CountUp {
    const STOPS_ON_RESET: bool = true;

    fn advance(&self, current: Duration) -> Result<Duration, InvalidDuration> {
        current.checked_add(Duration::ONE_SECOND)
    }

    fn is_terminal(&self, _current: &Duration) -> bool {
        false
    }

    fn on_reset(&self) -> Duration {
        Duration::ZERO
    }
}

/// Counts down one second per tick and stops at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CountDown {
    original: Duration,
}

impl CountDown {
    pub fn new(original: Duration) -> Self {
        Self { original }
    }

    /// The duration the countdown was created with.
    pub fn original(&self) -> Duration {
        self.original
    }
}

impl Mode for CountDown {
    // Running state is left to the controller.
    const STOPS_ON_RESET: bool = false;

    fn advance(&self, current: Duration) -> Result<Duration, InvalidDuration> {
        current.checked_sub(Duration::ONE_SECOND)
    }

    fn is_terminal(&self, current: &Duration) -> bool {
        current.is_zero()
    }

    fn on_reset(&self) -> Duration {
        self.original
    }
}

/// The lifecycle state of a [`Timeable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeableState {
    /// Constructed or reset; not counting.
    Idle,
    /// Counting once per tick.
    Running,
    /// Stopped by the controller. The duration holds its last value.
    Paused,
    /// Stopped on its own, either at the terminal value or on an arithmetic error.
    Terminated,
}

/// What a single [`Timeable::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// The duration moved and the new value was written.
    Advanced(Duration),
    /// The terminal value was reached; the loop is over.
    Finished,
    /// The running flag was off; nothing moved.
    Stopped,
}

/// Snapshot of a [`Timeable`] for controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    pub state: TimeableState,
    pub running: bool,
    pub duration: Duration,
}

/// Errors that can occur during stopwatch and timer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeableError {
    /// Operation called from an invalid state.
    InvalidState {
        /// Human-readable description of expected state(s), e.g. "Running"
        expected: &'static str,
        /// The actual current state
        actual: TimeableState,
    },
    /// [`MAX_LAPS`] laps are already recorded.
    LapsFull,
    /// The next value could not be computed.
    Duration(InvalidDuration),
}

impl core::fmt::Display for TimeableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TimeableError::InvalidState { expected, actual } => {
                write!(f, "invalid state: expected {}, but clock is {:?}", expected, actual)
            }
            TimeableError::LapsFull => write!(f, "lap capacity of {} exceeded", MAX_LAPS),
            TimeableError::Duration(err) => write!(f, "duration error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimeableError {}

impl From<InvalidDuration> for TimeableError {
    fn from(err: InvalidDuration) -> Self {
        TimeableError::Duration(err)
    }
}

/// A stopwatch: counts up from zero.
pub type Stopwatch<S> = Timeable<CountUp, S>;

/// A countdown timer: counts down to zero from its original duration.
pub type Timer<S> = Timeable<CountDown, S>;

/// A duration that moves once per tick while running, reporting every value to a sink.
///
/// The controller drives it with [`start`](Self::start), [`pause`](Self::pause),
/// [`resume`](Self::resume) and [`reset`](Self::reset); the run loop calls
/// [`tick`](Self::tick) once per interval and stops calling it once
/// [`TickOutcome::Finished`] or [`TickOutcome::Stopped`] comes back.
///
/// # Type Parameters
/// * `M` - Counting mode ([`CountUp`] or [`CountDown`])
/// * `S` - Sink implementation type
pub struct Timeable<M: Mode, S: TimeSink> {
    mode: M,
    sink: S,
    duration: Duration,
    running: bool,
    state: TimeableState,
    laps: Vec<Duration, MAX_LAPS>,
}

impl<S: TimeSink> Timeable<CountUp, S> {
    /// Creates an idle stopwatch at zero.
    pub fn stopwatch(sink: S) -> Self {
        Self::new(CountUp, sink)
    }
}

impl<S: TimeSink> Timeable<CountDown, S> {
    /// Creates an idle timer that counts down from `duration`.
    pub fn timer(duration: Duration, sink: S) -> Self {
        Self::new(CountDown::new(duration), sink)
    }

    /// The duration this timer was created with.
    pub fn original(&self) -> Duration {
        self.mode.original()
    }
}

impl<M: Mode, S: TimeSink> Timeable<M, S> {
    /// Creates an idle instance holding the mode's reset value. Nothing is written yet.
    pub fn new(mode: M, sink: S) -> Self {
        let duration = mode.on_reset();

        Self {
            mode,
            sink,
            duration,
            running: false,
            state: TimeableState::Idle,
            laps: Vec::new(),
        }
    }

    /// Handles a command by dispatching to the appropriate method.
    pub fn handle_command(&mut self, command: Command) -> Result<(), TimeableError> {
        match command {
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Reset => {
                self.reset();
                Ok(())
            }
            Command::Lap => self.lap().map(|_| ()),
        }
    }

    /// Starts counting from the reset value.
    ///
    /// Must be called from `Idle` or `Terminated` state. Clears recorded laps.
    pub fn start(&mut self) -> Result<(), TimeableError> {
        match self.state {
            TimeableState::Idle | TimeableState::Terminated => {
                self.duration = self.mode.on_reset();
                self.laps.clear();
                self.running = true;
                self.state = TimeableState::Running;
                Ok(())
            }
            _ => Err(TimeableError::InvalidState {
                expected: "Idle or Terminated",
                actual: self.state,
            }),
        }
    }

    /// Clears the running flag. The next tick observes it and does nothing.
    ///
    /// Must be called from `Running` state.
    pub fn pause(&mut self) -> Result<(), TimeableError> {
        if self.state != TimeableState::Running {
            return Err(TimeableError::InvalidState {
                expected: "Running",
                actual: self.state,
            });
        }

        self.running = false;
        self.state = TimeableState::Paused;
        Ok(())
    }

    /// Sets the running flag again, continuing from the held value.
    ///
    /// Must be called from `Paused` state.
    pub fn resume(&mut self) -> Result<(), TimeableError> {
        if self.state != TimeableState::Paused {
            return Err(TimeableError::InvalidState {
                expected: "Paused",
                actual: self.state,
            });
        }

        self.running = true;
        self.state = TimeableState::Running;
        Ok(())
    }

    /// Restores the mode's reset value, clears laps and writes the value out.
    ///
    /// A stopwatch also stops and returns to `Idle`. A timer keeps its running
    /// flag, so a running timer carries on counting down from its original
    /// duration; only a `Terminated` timer returns to `Idle`. Can be called from
    /// any state.
    pub fn reset(&mut self) {
        self.duration = self.mode.on_reset();
        self.laps.clear();

        if M::STOPS_ON_RESET {
            self.running = false;
            self.state = TimeableState::Idle;
        } else if self.state == TimeableState::Terminated {
            self.state = TimeableState::Idle;
        }

        self.sink.write(&self.duration.to_text());
    }

    /// Resets, then pauses if the reset left the instance running.
    ///
    /// A running timer ends up `Paused` at its original duration, with no tick
    /// in between.
    pub fn reset_stopped(&mut self) {
        self.reset();

        if self.running {
            self.running = false;
            self.state = TimeableState::Paused;
        }
    }

    /// Records the current value as a lap and returns it.
    pub fn lap(&mut self) -> Result<Duration, TimeableError> {
        self.laps
            .push(self.duration)
            .map_err(|_| TimeableError::LapsFull)?;
        Ok(self.duration)
    }

    /// Runs one iteration of the loop.
    ///
    /// # Returns
    /// * `Ok(TickOutcome::Stopped)` - Running flag off; the sink is settled
    /// * `Ok(TickOutcome::Finished)` - Terminal value reached before moving;
    ///   the flag is cleared and the value written
    /// * `Ok(TickOutcome::Advanced(d))` - Moved to `d` and wrote it
    /// * `Err` - The next value is not representable; transitions to `Terminated`
    pub fn tick(&mut self) -> Result<TickOutcome, TimeableError> {
        if !self.running {
            self.settle();
            return Ok(TickOutcome::Stopped);
        }

        if self.mode.is_terminal(&self.duration) {
            self.running = false;
            self.state = TimeableState::Terminated;
            self.sink.write(&self.duration.to_text());
            return Ok(TickOutcome::Finished);
        }

        match self.mode.advance(self.duration) {
            Ok(next) => {
                self.duration = next;
                self.sink.write(&next.to_text());
                Ok(TickOutcome::Advanced(next))
            }
            Err(err) => {
                self.running = false;
                self.state = TimeableState::Terminated;
                Err(err.into())
            }
        }
    }

    /// Rewrites the current value if the sink no longer shows it.
    pub fn settle(&mut self) {
        let text = self.duration.to_text();
        if !self.sink.is_displaying(&text) {
            self.sink.write(&text);
        }
    }

    /// Current value.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TimeableState {
        self.state
    }

    /// Returns true while ticks advance the value.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Laps recorded since the last start or reset, oldest first.
    pub fn laps(&self) -> &[Duration] {
        &self.laps
    }

    /// The counting mode.
    pub fn mode(&self) -> &M {
        &self.mode
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns a mutable reference to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the instance and returns its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Snapshot of state, running flag and value.
    pub fn status(&self) -> Status {
        Status {
            state: self.state,
            running: self.running,
            duration: self.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Text = heapless::String<16>;

    #[test]
    fn pause_requires_running_state() {
        let mut stopwatch = Stopwatch::stopwatch(Text::new());
        let result = stopwatch.pause();
        assert!(matches!(
            result,
            Err(TimeableError::InvalidState { actual: TimeableState::Idle, .. })
        ));
    }

    #[test]
    fn resume_requires_paused_state() {
        let mut stopwatch = Stopwatch::stopwatch(Text::new());
        assert!(stopwatch.resume().is_err());

        stopwatch.start().unwrap();
        assert!(matches!(
            stopwatch.resume(),
            Err(TimeableError::InvalidState { actual: TimeableState::Running, .. })
        ));
    }

    #[test]
    fn start_rejected_while_running_or_paused() {
        let mut stopwatch = Stopwatch::stopwatch(Text::new());
        stopwatch.start().unwrap();
        assert!(stopwatch.start().is_err());

        stopwatch.pause().unwrap();
        assert!(stopwatch.start().is_err());
    }

    #[test]
    fn new_writes_nothing() {
        let timer = Timer::timer(Duration::new(0, 0, 5).unwrap(), Text::new());
        assert_eq!(timer.sink().as_str(), "");
        assert_eq!(timer.duration(), Duration::new(0, 0, 5).unwrap());
    }

    #[test]
    fn heapless_sink_holds_latest_text() {
        let mut sink = Text::new();
        sink.write("00:00:01");
        sink.write("00:00:02");
        assert!(sink.is_displaying("00:00:02"));
        assert!(!sink.is_displaying("00:00:01"));
    }

    #[test]
    fn short_heapless_sink_keeps_a_prefix() {
        let mut sink = heapless::String::<5>::new();
        sink.write("00:00:01");
        assert_eq!(sink.as_str(), "00:00");
    }

    #[test]
    fn reset_stopped_pauses_a_running_timer_at_its_original() {
        let original = Duration::new(0, 0, 10).unwrap();
        let mut timer = Timer::timer(original, Text::new());
        timer.start().unwrap();
        timer.tick().unwrap();

        timer.reset_stopped();

        assert_eq!(timer.state(), TimeableState::Paused);
        assert!(!timer.is_running());
        assert_eq!(timer.duration(), original);
        assert_eq!(timer.tick().unwrap(), TickOutcome::Stopped);
        assert_eq!(timer.duration(), original);
    }

    #[test]
    fn reset_stopped_leaves_an_idle_timer_idle() {
        let mut timer = Timer::timer(Duration::new(0, 0, 3).unwrap(), Text::new());
        timer.reset_stopped();
        assert_eq!(timer.state(), TimeableState::Idle);
    }

    #[test]
    fn handle_command_dispatches() {
        let mut stopwatch = Stopwatch::stopwatch(Text::new());
        stopwatch.handle_command(Command::Start).unwrap();
        stopwatch.tick().unwrap();
        stopwatch.handle_command(Command::Lap).unwrap();
        stopwatch.handle_command(Command::Pause).unwrap();
        assert_eq!(stopwatch.state(), TimeableState::Paused);
        assert_eq!(stopwatch.laps(), &[Duration::ONE_SECOND]);

        stopwatch.handle_command(Command::Resume).unwrap();
        assert!(stopwatch.is_running());

        stopwatch.handle_command(Command::Reset).unwrap();
        assert_eq!(stopwatch.status().state, TimeableState::Idle);
        assert!(stopwatch.laps().is_empty());
    }
}
