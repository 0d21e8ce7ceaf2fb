// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Couples an [`Oscillator`] to a [`Circuit`].

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};
use volt_core::{Circuit, EventKind, LogicNode, NodeEvent, NodeId, NonConvergence};

use crate::clock::ClockSource;
use crate::oscillator::{Oscillator, Pulse, PulseId, TickReport};
use crate::waveform::WaveformHandle;

/// Result of [`Simulation::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimTick {
    /// What the oscillator did.
    pub report: TickReport,
    /// First advance during the tick that hit the iteration ceiling.
    pub non_convergence: Option<NonConvergence>,
}

/// A circuit driven by real-time clocks.
///
/// Every clock is bound to one input node. Each toggle is injected into that
/// node and the circuit is advanced before the next toggle is processed.
#[derive(Debug)]
pub struct Simulation {
    circuit: Circuit,
    oscillator: Oscillator,
    bindings: BTreeMap<PulseId, NodeId>,
}

impl Simulation {
    /// Pairs a circuit with an oscillator.
    pub fn new(circuit: Circuit, oscillator: Oscillator) -> Self {
        Self {
            circuit,
            oscillator,
            bindings: BTreeMap::new(),
        }
    }

    /// The driven circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Mutable access for graph edits between ticks.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    /// The oscillator.
    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    /// Mutable oscillator, e.g. to stop a single clock.
    pub fn oscillator_mut(&mut self) -> &mut Oscillator {
        &mut self.oscillator
    }

    /// Input node driven by `pulse`.
    pub fn binding(&self, pulse: PulseId) -> Option<NodeId> {
        self.bindings.get(&pulse).copied()
    }

    /// Registers `clock` and binds it to input node `node`, driving the node
    /// with the clock's current level right away.
    ///
    /// Returns `None` without registering anything if `node` is absent or not
    /// an input node.
    pub fn bind_clock(&mut self, clock: ClockSource, node: NodeId) -> Option<PulseId> {
        if !self.circuit.node(node).is_some_and(LogicNode::is_input) {
            return None;
        }
        let level = clock.value();
        let pulse = self.oscillator.add_clock(clock);
        self.bindings.insert(pulse, node);
        if let Some(outcome) = self.circuit.inject(node, level) {
            if let Err(err) = outcome.into_result() {
                warn!(%node, steps = err.steps, "initial clock level did not settle");
            }
        }
        Some(pulse)
    }

    /// Unregisters a clock and drops its binding. The bound node keeps its
    /// last level.
    ///
    /// Returns `None` and leaves the registry untouched if `pulse` is not a
    /// clock; recorders stay registered.
    pub fn remove_clock(&mut self, pulse: PulseId) -> Option<ClockSource> {
        self.oscillator.clock(pulse)?;
        self.bindings.remove(&pulse);
        match self.oscillator.remove_pulse(pulse)? {
            Pulse::Clock(clock) => Some(clock),
            Pulse::Recorder(_) => None,
        }
    }

    /// Starts recording the level of `node` over a trailing `window_ms`.
    /// Returns `None` if the node is absent.
    pub fn monitor(&mut self, node: NodeId, window_ms: u64) -> Option<WaveformHandle> {
        let (name, level) = {
            let n = self.circuit.node(node)?;
            (n.name().to_owned(), n.value())
        };
        let handle = WaveformHandle::new(name, window_ms, self.oscillator.time_ms_elapsed());
        handle.record(level);
        let sink = handle.clone();
        self.circuit.on(node, EventKind::Change, move |event| {
            if let NodeEvent::Change { value, .. } = event {
                sink.record(*value);
            }
        })?;
        let _ = self.oscillator.add_recorder(handle.clone());
        Some(handle)
    }

    /// See [`Oscillator::start`].
    pub fn start(&mut self, now_ms: u64) {
        self.oscillator.start(now_ms);
    }

    /// See [`Oscillator::stop`].
    pub fn stop(&mut self) {
        self.oscillator.stop();
    }

    /// Runs one oscillator tick and pushes each clock toggle into its bound
    /// node. Toggles from clocks whose node has since been removed are
    /// dropped, and so is that clock's binding.
    pub fn tick(&mut self, now_ms: u64) -> SimTick {
        let Self {
            circuit,
            oscillator,
            bindings,
        } = self;
        let mut non_convergence = None;
        let report = oscillator.tick(now_ms, |pulse, edge| {
            let Some(node) = bindings.get(&pulse).copied() else {
                return;
            };
            trace!(%node, signal = %edge.signal, at_ms = edge.at_ms, "clock drives node");
            match circuit.inject(node, edge.signal.value()) {
                Some(outcome) => {
                    if let Err(err) = outcome.into_result() {
                        non_convergence.get_or_insert(err);
                    }
                }
                None => {
                    debug!(%node, pulse = pulse.value(), "bound node removed; unbinding clock");
                    bindings.remove(&pulse);
                }
            }
        });
        SimTick {
            report,
            non_convergence,
        }
    }

    /// Splits the simulation back into its parts.
    pub fn into_parts(self) -> (Circuit, Oscillator) {
        (self.circuit, self.oscillator)
    }
}
