//! Command-based control for stopwatches and timers.

/// Actions a controller can issue to a [`Timeable`](crate::Timeable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Start counting from the reset value.
    Start,
    /// Stop counting, keeping the current value.
    Pause,
    /// Continue counting from the current value.
    Resume,
    /// Restore the reset value.
    Reset,
    /// Record the current value as a lap.
    Lap,
}

/// Which of the clock's two instances a command is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    Stopwatch,
    Timer,
}

/// Command targeting the stopwatch or the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockCommand {
    pub target: Target,
    pub command: Command,
}

impl ClockCommand {
    /// Creates command.
    pub fn new(target: Target, command: Command) -> Self {
        Self { target, command }
    }

    /// Creates a command for the stopwatch.
    pub fn stopwatch(command: Command) -> Self {
        Self::new(Target::Stopwatch, command)
    }

    /// Creates a command for the timer.
    pub fn timer(command: Command) -> Self {
        Self::new(Target::Timer, command)
    }
}
