// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! volt-core: tri-state discrete-event logic simulation engine.
//!
//! A [`Circuit`] owns a directed graph of [`LogicNode`]s wired by
//! [`SignalEdge`]s and a duplicate-free work queue. Values are committed one
//! node at a time by [`Circuit::advance`], which stops either when the queue
//! drains (the circuit settled) or when the configured iteration ceiling is
//! reached (the circuit did not converge).
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
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod circuit;
mod config;
mod event;
mod gate;
mod ident;
mod node;
mod value;

/// Circuit ownership, queue discipline, and advance/reset algorithms.
pub use circuit::{AdvanceOutcome, Circuit, CircuitError, NonConvergence};
/// Engine tuning knobs (iteration ceiling).
pub use config::{CircuitConfig, DEFAULT_ITERATION_LIMIT};
/// Typed listener records for node state transitions.
pub use event::{EventKind, ListenerId, NodeEvent};
/// Gate truth tables and the custom evaluator seam.
pub use gate::{Evaluate, Evaluator, GateKind};
/// Stable node handles issued by a circuit.
pub use ident::NodeId;
/// Evaluable nodes, their recorded inputs, and outbound edges.
pub use node::{InputValues, LogicNode, SignalEdge};
/// The ternary value model.
pub use value::LogicValue;
