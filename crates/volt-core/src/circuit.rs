// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Circuit ownership and the propagation queue.
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::CircuitConfig;
use crate::event::{EventKind, ListenerId, NodeEvent};
use crate::ident::NodeId;
use crate::node::{LogicNode, SignalEdge};
use crate::value::LogicValue;

/// Errors emitted by the circuit.
///
/// Graph edits that race with deletions (wiring to a node that is already
/// gone, say) are not errors: they are ignored without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    /// A node with the same name is already part of the circuit.
    #[error("duplicate node name: {0}")]
    DuplicateName(String),
}

/// A feedback loop failed to settle within the iteration ceiling.
///
/// State is left exactly where the ceiling was hit; `pending` nodes remain
/// queued so the caller can continue with [`Circuit::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("circuit did not converge after {steps} propagations ({pending} nodes still queued)")]
pub struct NonConvergence {
    /// Propagations performed before giving up.
    pub steps: usize,
    /// Queue length at the moment the ceiling was hit.
    pub pending: usize,
}

/// Result of [`Circuit::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The queue drained: every node reached a fixed point.
    Settled {
        /// Propagations performed.
        steps: usize,
    },
    /// The iteration ceiling was reached with work still queued.
    Unsettled {
        /// Propagations performed.
        steps: usize,
        /// Nodes still queued.
        pending: usize,
    },
}

impl AdvanceOutcome {
    /// Returns `true` if the circuit reached a fixed point.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Settled { .. })
    }

    /// Propagations performed.
    pub fn steps(self) -> usize {
        match self {
            Self::Settled { steps } | Self::Unsettled { steps, .. } => steps,
        }
    }

    /// Converts into a `Result` for callers that treat non-convergence as an
    /// error.
    pub fn into_result(self) -> Result<usize, NonConvergence> {
        match self {
            Self::Settled { steps } => Ok(steps),
            Self::Unsettled { steps, pending } => Err(NonConvergence { steps, pending }),
        }
    }
}

/// Owns all nodes of a logic circuit and the queue of nodes pending
/// (re-)evaluation.
///
/// Single-threaded and non-reentrant: listeners must not call back into the
/// circuit. All queue mutation funnels through [`Circuit::enqueue`] and
/// [`Circuit::dequeue`], which keep the queue duplicate-free.
#[derive(Debug, Default)]
pub struct Circuit {
    config: CircuitConfig,
    nodes: BTreeMap<NodeId, LogicNode>,
    names: BTreeMap<String, NodeId>,
    input_nodes: BTreeSet<NodeId>,
    queue: VecDeque<NodeId>,
    queued: BTreeSet<NodeId>,
    next_id: u64,
}

impl Circuit {
    /// Creates an empty circuit with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty circuit with explicit tuning.
    pub fn with_config(config: CircuitConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the circuit's tuning.
    pub fn config(&self) -> CircuitConfig {
        self.config
    }

    /// Replaces the circuit's tuning; takes effect on the next `advance`.
    pub fn set_config(&mut self, config: CircuitConfig) {
        self.config = config;
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    /// Returns the node for `id`, if it is still part of the circuit.
    pub fn node(&self, id: NodeId) -> Option<&LogicNode> {
        self.nodes.get(&id)
    }

    /// Mutable access for value injection (`update`) and listener
    /// registration. Committed values cannot be written through it.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut LogicNode> {
        self.nodes.get_mut(&id)
    }

    /// Resolves a node name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Committed value of `id`, if present.
    pub fn value(&self, id: NodeId) -> Option<LogicValue> {
        self.nodes.get(&id).map(LogicNode::value)
    }

    /// Returns `true` if `id` is part of the circuit.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterates all nodes in handle order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &LogicNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Iterates the input nodes in handle order.
    pub fn input_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.input_nodes.iter().copied()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the circuit holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Registers a listener on `id`. Returns `None` if the node is absent.
    pub fn on<F>(&mut self, id: NodeId, kind: EventKind, callback: F) -> Option<ListenerId>
    where
        F: FnMut(&NodeEvent<'_>) + 'static,
    {
        self.nodes.get_mut(&id).map(|node| node.on(kind, callback))
    }

    // ── Node lifecycle ──────────────────────────────────────────────────

    /// Adds `node` and returns its handle. Input nodes are queued right away
    /// so they are evaluated at least once.
    ///
    /// # Errors
    /// Returns [`CircuitError::DuplicateName`] if the name is taken.
    pub fn add_node(&mut self, node: LogicNode) -> Result<NodeId, CircuitError> {
        if self.names.contains_key(node.name()) {
            return Err(CircuitError::DuplicateName(node.name().to_owned()));
        }
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        debug!(node = %id, name = node.name(), kind = node.evaluator().label(), "add node");
        let is_input = node.is_input();
        self.names.insert(node.name().to_owned(), id);
        self.nodes.insert(id, node);
        if is_input {
            self.input_nodes.insert(id);
            self.enqueue(id);
        }
        Ok(id)
    }

    /// Removes `id` together with every edge that references it, flushing
    /// the effects of the disconnection with one `advance` before the node is
    /// dropped. Returns `None` (and does nothing) if the node is absent.
    pub fn remove_node(&mut self, id: NodeId) -> Option<AdvanceOutcome> {
        if !self.nodes.contains_key(&id) {
            return None;
        }
        self.remove_node_outputs(id);
        let sources: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.outputs().iter().any(|e| e.target == id))
            .map(|(source, _)| *source)
            .collect();
        for source in sources {
            if let Some(node) = self.nodes.get_mut(&source) {
                let _ = node.take_edges_to(id);
            }
        }
        self.input_nodes.remove(&id);

        let outcome = self.advance();

        self.dequeue(id);
        if let Some(node) = self.nodes.remove(&id) {
            self.names.remove(node.name());
            debug!(node = %id, name = node.name(), "removed node");
        }
        Some(outcome)
    }

    // ── Wiring ──────────────────────────────────────────────────────────

    /// Wires `source` to `target` under the input tag `input`.
    ///
    /// The source is marked unsettled (its committed value drops to HI-Z) and
    /// queued, so its next propagation reaches the new consumer. Returns
    /// `false` without side effects if either node is absent or the exact
    /// edge already exists.
    pub fn add_connection(&mut self, source: NodeId, target: NodeId, input: &str) -> bool {
        let Some(target_name) = self.nodes.get(&target).map(|n| n.name().to_owned()) else {
            return false;
        };
        let Some(node) = self.nodes.get_mut(&source) else {
            return false;
        };
        let added = node.push_edge(SignalEdge {
            target,
            target_name,
            input: input.to_owned(),
        });
        if !added {
            return false;
        }
        node.mark_unsettled();
        debug!(%source, %target, input, "add connection");
        self.enqueue(source);
        true
    }

    /// Removes every edge from `source` to `target`.
    ///
    /// Each disconnected input on `target` immediately reads HI-Z, and
    /// `target` is queued. Returns `false` without side effects if either
    /// node is absent or no such edge exists.
    pub fn remove_connection(&mut self, source: NodeId, target: NodeId) -> bool {
        if !self.nodes.contains_key(&target) {
            return false;
        }
        let Some(node) = self.nodes.get_mut(&source) else {
            return false;
        };
        let removed = node.take_edges_to(target);
        if removed.is_empty() {
            return false;
        }
        if let Some(target_node) = self.nodes.get_mut(&target) {
            for edge in &removed {
                target_node.update(LogicValue::Unknown, &edge.input);
            }
        }
        debug!(%source, %target, edges = removed.len(), "remove connection");
        self.enqueue(target);
        true
    }

    /// Disconnects every outbound edge of `id`.
    pub fn remove_node_outputs(&mut self, id: NodeId) {
        let targets = self
            .nodes
            .get(&id)
            .map(LogicNode::downstream_ids)
            .unwrap_or_default();
        for target in targets {
            self.remove_connection(id, target);
        }
    }

    // ── Queue ───────────────────────────────────────────────────────────

    /// Appends `id` to the queue unless it is already pending.
    pub fn enqueue(&mut self, id: NodeId) {
        if self.queued.insert(id) {
            self.queue.push_back(id);
        }
    }

    /// Removes `id` from the queue, if pending.
    pub fn dequeue(&mut self, id: NodeId) {
        if self.queued.remove(&id) {
            self.queue.retain(|queued| *queued != id);
        }
    }

    /// Pending nodes, front first.
    pub fn queue(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.queue.iter().copied()
    }

    /// Returns `true` if `id` is pending evaluation.
    pub fn is_queued(&self, id: NodeId) -> bool {
        self.queued.contains(&id)
    }

    /// Returns `true` if no work is pending.
    pub fn is_settled(&self) -> bool {
        self.queue.is_empty()
    }

    fn pop_front(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        self.queued.remove(&id);
        Some(id)
    }

    // ── Evaluation ──────────────────────────────────────────────────────

    /// Commits `id`'s pending evaluation and, if its value changed (or it is
    /// force-continue), updates every downstream node through its edges.
    ///
    /// Returns the distinct downstream nodes that were updated, in edge
    /// order, or an empty list when the node had settled.
    pub fn propagate(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Vec::new();
        };
        let Some(value) = node.commit() else {
            return Vec::new();
        };
        trace!(node = %id, name = node.name(), %value, "propagate");
        let edges = node.outputs().to_vec();
        self.update_outputs(&edges, value)
    }

    fn update_outputs(&mut self, edges: &[SignalEdge], value: LogicValue) -> Vec<NodeId> {
        let mut touched = Vec::with_capacity(edges.len());
        for edge in edges {
            let Some(target) = self.nodes.get_mut(&edge.target) else {
                continue;
            };
            target.update(value, &edge.input);
            if !touched.contains(&edge.target) {
                touched.push(edge.target);
            }
        }
        touched
    }

    /// Processes exactly one queued node and re-queues its downstream nodes.
    ///
    /// Stale entries (nodes removed while queued) are skipped. Returns the
    /// processed node, or `None` when the queue is empty. This is the manual
    /// single-step mode used after [`NonConvergence`].
    pub fn step(&mut self) -> Option<NodeId> {
        while let Some(id) = self.pop_front() {
            if !self.nodes.contains_key(&id) {
                continue;
            }
            for downstream in self.propagate(id) {
                self.enqueue(downstream);
            }
            return Some(id);
        }
        None
    }

    /// Drains the queue until every node settles or the configured
    /// iteration ceiling is reached.
    pub fn advance(&mut self) -> AdvanceOutcome {
        let limit = self.config.iteration_limit;
        let mut steps = 0;
        loop {
            self.skip_stale();
            if self.queue.is_empty() {
                return AdvanceOutcome::Settled { steps };
            }
            if steps >= limit {
                let pending = self
                    .queue
                    .iter()
                    .filter(|id| self.nodes.contains_key(id))
                    .count();
                warn!(steps, pending, "circuit did not converge");
                return AdvanceOutcome::Unsettled { steps, pending };
            }
            if self.step().is_some() {
                steps += 1;
            }
        }
    }

    // Drops queued ids whose node was removed, up to the first live one.
    fn skip_stale(&mut self) {
        while let Some(id) = self.queue.front().copied() {
            if self.nodes.contains_key(&id) {
                break;
            }
            let _ = self.pop_front();
        }
    }

    /// Drives `id` with `value`: records it as the node's own input, queues
    /// the node and advances. Returns `None` if the node is absent.
    pub fn inject(&mut self, id: NodeId, value: LogicValue) -> Option<AdvanceOutcome> {
        let node = self.nodes.get_mut(&id)?;
        let source = node.name().to_owned();
        node.update(value, &source);
        self.enqueue(id);
        Some(self.advance())
    }

    // ── Reset ───────────────────────────────────────────────────────────

    /// Drops every non-input node back to HI-Z, firing `reset` and `change`
    /// on each. Input nodes keep their values. Inputs are not re-applied;
    /// see [`Circuit::reseed`].
    pub fn reset(&mut self) {
        let mut cleared = 0_usize;
        for node in self.nodes.values_mut() {
            if node.reset() {
                cleared += 1;
            }
        }
        debug!(cleared, "circuit reset");
    }

    /// Re-queues every input node with its committed value marked unsettled
    /// and advances, so the inputs' current levels flow through the circuit
    /// again after a [`Circuit::reset`].
    pub fn reseed(&mut self) -> AdvanceOutcome {
        let inputs: Vec<NodeId> = self.input_nodes.iter().copied().collect();
        for id in inputs {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.mark_unsettled();
                self.enqueue(id);
            }
        }
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitConfig;
    use crate::gate::GateKind;

    #[test]
    fn enqueue_is_duplicate_free() {
        let mut circuit = Circuit::new();
        let a = NodeId::from_raw(7);
        circuit.enqueue(a);
        circuit.enqueue(a);
        assert_eq!(circuit.queue().collect::<Vec<_>>(), [a]);
        circuit.dequeue(a);
        assert!(circuit.is_settled());
        circuit.dequeue(a);
        assert!(!circuit.is_queued(a));
    }

    #[test]
    fn stale_queue_entries_are_skipped() {
        let mut circuit = Circuit::new();
        circuit.enqueue(NodeId::from_raw(99));
        assert_eq!(circuit.step(), None);
        assert_eq!(circuit.advance(), AdvanceOutcome::Settled { steps: 0 });
    }

    #[test]
    fn ceiling_ignores_stale_entries() {
        let mut circuit = Circuit::with_config(CircuitConfig { iteration_limit: 0 });
        circuit.enqueue(NodeId::from_raw(99));
        assert_eq!(circuit.advance(), AdvanceOutcome::Settled { steps: 0 });
        assert!(circuit.is_settled());

        let live = circuit
            .add_node(LogicNode::input("in", LogicValue::True))
            .expect("add node");
        circuit.enqueue(NodeId::from_raw(98));
        assert_eq!(
            circuit.advance(),
            AdvanceOutcome::Unsettled {
                steps: 0,
                pending: 1
            }
        );
        assert!(circuit.is_queued(live));
    }

    #[test]
    fn plain_node_stays_hi_z_while_driven() {
        let mut circuit = Circuit::new();
        let a = circuit
            .add_node(LogicNode::input("a", LogicValue::True))
            .expect("add node");
        let plain = circuit
            .add_node(LogicNode::new("plain", GateKind::Plain))
            .expect("add node");
        assert!(circuit.add_connection(a, plain, "a"));
        assert!(circuit.advance().is_settled());
        assert_eq!(circuit.value(plain), Some(LogicValue::Unknown));
        assert!(circuit.inject(a, LogicValue::False).is_some_and(AdvanceOutcome::is_settled));
        assert_eq!(circuit.value(plain), Some(LogicValue::Unknown));
        let node = circuit.node(plain).expect("plain");
        assert_eq!(node.inputs().get("a"), LogicValue::False);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut circuit = Circuit::new();
        assert!(circuit.add_node(LogicNode::new("g", GateKind::And)).is_ok());
        assert_eq!(
            circuit.add_node(LogicNode::new("g", GateKind::Or)),
            Err(CircuitError::DuplicateName("g".to_owned()))
        );
    }

    #[test]
    fn input_nodes_are_queued_on_add() {
        let mut circuit = Circuit::new();
        let gate = circuit
            .add_node(LogicNode::new("gate", GateKind::Not))
            .expect("add node");
        let input = circuit
            .add_node(LogicNode::input("in", LogicValue::True))
            .expect("add node");
        assert!(!circuit.is_queued(gate));
        assert!(circuit.is_queued(input));
        assert_eq!(circuit.input_nodes().collect::<Vec<_>>(), [input]);
    }

    #[test]
    fn self_loop_inverter_hits_ceiling() {
        let mut circuit = Circuit::with_config(CircuitConfig { iteration_limit: 10 });
        let n = circuit
            .add_node(LogicNode::new("ring", GateKind::Not))
            .expect("add node");
        assert!(circuit.add_connection(n, n, "fb"));
        if let Some(node) = circuit.node_mut(n) {
            node.update(LogicValue::False, "fb");
        }
        let outcome = circuit.advance();
        assert_eq!(
            outcome,
            AdvanceOutcome::Unsettled {
                steps: 10,
                pending: 1
            }
        );
        assert_eq!(
            outcome.into_result(),
            Err(NonConvergence {
                steps: 10,
                pending: 1
            })
        );
        assert!(circuit.step().is_some(), "single-step mode keeps going");
    }
}
