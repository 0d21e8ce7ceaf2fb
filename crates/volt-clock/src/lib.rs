// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! volt-clock: real-time drivers for Volt circuits.
//!
//! [`ClockSource`]s toggle on a fixed grid of simulated time. The
//! [`Oscillator`] turns host wall-clock ticks into refresh steps and advances
//! every registered pulse. [`Simulation`] forwards each clock toggle into the
//! input node it is bound to; that injection is the only place real time
//! touches logical evaluation.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions
)]

mod clock;
mod oscillator;
mod simulation;
mod waveform;

pub use clock::{ClockEdge, ClockError, ClockSource, Signal};
pub use oscillator::{
    Oscillator, OscillatorConfig, Pulse, PulseId, TickReport, DEFAULT_MAX_IDLE_MS,
    DEFAULT_REFRESH_RATE_MS,
};
pub use simulation::{SimTick, Simulation};
pub use waveform::{Sample, Segment, WaveformHandle, WaveformRecorder};
