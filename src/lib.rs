#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Duration`**: Immutable hour/minute/second value with carry and borrow arithmetic
//! - **`TimeSink`**: Trait to implement for whatever displays the formatted time
//! - **`Mode`**: How a `Timeable` moves per tick, when it stops, and what it resets to
//! - **`Timeable`**: Tick-driven state machine owning a duration, a running flag and a sink
//! - **`Stopwatch`** / **`Timer`**: `Timeable` counting up from zero / down to zero
//! - **`Command`**: Start, pause, resume, reset and lap actions
//! - **`TimeableHandle`**: Controller side of a `Timeable` running in its own task (`runtime`)
//! - **`Clock`**: One stopwatch plus one replaceable timer (`runtime`)
//!
//! The core is `no_std` and allocation free. The `runtime` feature (default)
//! adds the tokio task runner and the clock controller.

pub mod command;
pub mod duration;
pub mod timeable;

#[cfg(feature = "runtime")]
pub mod clock;
#[cfg(feature = "runtime")]
pub mod runner;

pub use command::{ClockCommand, Command, Target};
pub use duration::{Duration, DurationText, InvalidDuration, TEXT_CAPACITY, Unit};
pub use timeable::{
    CountDown, CountUp, MAX_LAPS, Mode, Status, Stopwatch, TickOutcome, TimeSink, Timeable,
    TimeableError, TimeableState, Timer,
};

#[cfg(feature = "runtime")]
pub use clock::{Clock, ClockError};
#[cfg(feature = "runtime")]
pub use runner::{RunnerConfig, RunnerError, TimeableHandle, spawn};
