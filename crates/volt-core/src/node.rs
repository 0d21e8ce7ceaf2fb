// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Logic nodes and signal edges.
use std::collections::BTreeMap;

use crate::event::{EventKind, ListenerId, Listeners, NodeEvent};
use crate::gate::{Evaluate, Evaluator, GateKind};
use crate::ident::NodeId;
use crate::value::LogicValue;

/// Directed connection from a node to one downstream node.
///
/// Invariants
/// - `target` resolves in the owning circuit for as long as the edge exists;
///   removing a node strips every edge that references it.
/// - `input` is the key written into the target's [`InputValues`]. It need not
///   equal the source's name when the target exposes several named inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalEdge {
    /// Downstream node.
    pub target: NodeId,
    /// Downstream node's name (reported in change events).
    pub target_name: String,
    /// Input tag on the downstream node.
    pub input: String,
}

/// Last level received per input tag.
///
/// A missing tag means "never received" and reads as HI-Z through
/// [`InputValues::get`]; [`InputValues::value_count`] only counts tags that
/// were actually written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputValues {
    values: BTreeMap<String, LogicValue>,
}

impl InputValues {
    /// Returns the level recorded for `input`, or HI-Z if never received.
    #[must_use]
    pub fn get(&self, input: &str) -> LogicValue {
        self.values.get(input).copied().unwrap_or_default()
    }

    /// Returns `true` if `input` has been written at least once.
    #[must_use]
    pub fn contains(&self, input: &str) -> bool {
        self.values.contains_key(input)
    }

    /// Number of recorded entries equal to `target`.
    #[must_use]
    pub fn value_count(&self, target: LogicValue) -> usize {
        self.values.values().filter(|v| **v == target).count()
    }

    /// Number of recorded inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was ever received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(tag, level)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, LogicValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn set(&mut self, input: &str, value: LogicValue) {
        if let Some(slot) = self.values.get_mut(input) {
            *slot = value;
        } else {
            self.values.insert(input.to_owned(), value);
        }
    }
}

/// The atomic evaluable unit of a circuit.
///
/// A node keeps two output levels: `value`, the last level committed and
/// pushed downstream, and `new_value`, the most recent evaluation that has not
/// been committed yet. Several inbound updates within one pass therefore
/// coalesce into a single commit.
///
/// `value` is only written by the owning [`crate::Circuit`] (commit, reset,
/// and marking a freshly wired source unsettled); collaborators have no setter.
#[derive(Debug)]
pub struct LogicNode {
    name: String,
    evaluator: Evaluator,
    value: LogicValue,
    new_value: LogicValue,
    last_received: LogicValue,
    inputs: InputValues,
    outputs: Vec<SignalEdge>,
    force_continue: bool,
    listeners: Listeners,
}

impl LogicNode {
    /// Creates a node with a built-in behaviour. All levels start at HI-Z.
    pub fn new(name: impl Into<String>, kind: GateKind) -> Self {
        Self::with_evaluator(name, Evaluator::Gate(kind))
    }

    /// Creates an input node that will drive `initial` once it is first
    /// propagated.
    pub fn input(name: impl Into<String>, initial: LogicValue) -> Self {
        let mut node = Self::new(name, GateKind::Input);
        node.last_received = initial;
        node.new_value = initial;
        node
    }

    /// Creates a node evaluated by a collaborator-supplied [`Evaluate`].
    pub fn custom(name: impl Into<String>, evaluator: Box<dyn Evaluate>) -> Self {
        Self::with_evaluator(name, Evaluator::Custom(evaluator))
    }

    fn with_evaluator(name: impl Into<String>, evaluator: Evaluator) -> Self {
        Self {
            name: name.into(),
            evaluator,
            value: LogicValue::Unknown,
            new_value: LogicValue::Unknown,
            last_received: LogicValue::Unknown,
            inputs: InputValues::default(),
            outputs: Vec::new(),
            force_continue: false,
            listeners: Listeners::default(),
        }
    }

    /// Marks the node as internal to a composed sub-circuit: it keeps
    /// propagating even when its committed value did not change.
    pub fn with_force_continue(mut self, force_continue: bool) -> Self {
        self.force_continue = force_continue;
        self
    }

    /// Stable identifier, unique within a circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last committed output level.
    pub fn value(&self) -> LogicValue {
        self.value
    }

    /// Most recent evaluation, possibly not yet committed.
    pub fn new_value(&self) -> LogicValue {
        self.new_value
    }

    /// Level passed to the most recent [`LogicNode::update`] call.
    pub fn last_received(&self) -> LogicValue {
        self.last_received
    }

    /// Returns `true` for externally driven input nodes.
    pub fn is_input(&self) -> bool {
        matches!(self.evaluator, Evaluator::Gate(GateKind::Input))
    }

    /// Returns the node's evaluation strategy.
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Levels received per input tag.
    pub fn inputs(&self) -> &InputValues {
        &self.inputs
    }

    /// Outbound edges in insertion order.
    pub fn outputs(&self) -> &[SignalEdge] {
        &self.outputs
    }

    /// Whether the node propagates past an unchanged value.
    pub fn force_continue(&self) -> bool {
        self.force_continue
    }

    /// Number of registered listeners across all event kinds.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Evaluates the node's next level from its current inputs. Pure.
    pub fn eval(&self) -> LogicValue {
        self.evaluator.eval(self)
    }

    /// Records `value` under the input tag `source`, then re-evaluates into
    /// `new_value`. Neither commits nor notifies.
    pub fn update(&mut self, value: LogicValue, source: &str) {
        self.inputs.set(source, value);
        self.last_received = value;
        self.new_value = self.eval();
    }

    /// Counts recorded inputs equal to `target`.
    pub fn value_count(&self, target: LogicValue) -> usize {
        self.inputs.value_count(target)
    }

    /// Registers `callback` for `kind`. Listeners of one kind run in
    /// registration order.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> ListenerId
    where
        F: FnMut(&NodeEvent<'_>) + 'static,
    {
        self.listeners.push(kind, Box::new(callback))
    }

    /// Unregisters a listener. Returns `false` if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Drops the node back to HI-Z and notifies `reset` then `change`
    /// listeners. Input nodes ignore resets: their external driver stays
    /// authoritative. Returns `true` if the node was reset.
    pub fn reset(&mut self) -> bool {
        if self.is_input() {
            return false;
        }
        self.value = LogicValue::Unknown;
        self.new_value = LogicValue::Unknown;
        let downstream = self.downstream_names();
        self.listeners.emit(&NodeEvent::Reset);
        self.listeners.emit(&NodeEvent::Change {
            value: self.value,
            downstream: &downstream,
        });
        true
    }

    /// Commits `new_value` if it differs from `value` (or the node is
    /// force-continue) and fires `change` when the level moved. Returns the
    /// committed level when downstream nodes must be updated.
    pub(crate) fn commit(&mut self) -> Option<LogicValue> {
        let changed = self.new_value != self.value;
        if !changed && !self.force_continue {
            return None;
        }
        self.value = self.new_value;
        if changed {
            let downstream = self.downstream_names();
            self.listeners.emit(&NodeEvent::Change {
                value: self.value,
                downstream: &downstream,
            });
        }
        Some(self.value)
    }

    pub(crate) fn mark_unsettled(&mut self) {
        self.value = LogicValue::Unknown;
    }

    pub(crate) fn push_edge(&mut self, edge: SignalEdge) -> bool {
        if self.outputs.contains(&edge) {
            return false;
        }
        self.outputs.push(edge);
        true
    }

    pub(crate) fn take_edges_to(&mut self, target: NodeId) -> Vec<SignalEdge> {
        let (removed, kept) = std::mem::take(&mut self.outputs)
            .into_iter()
            .partition(|e| e.target == target);
        self.outputs = kept;
        removed
    }

    pub(crate) fn downstream_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = Vec::with_capacity(self.outputs.len());
        for edge in &self.outputs {
            if !ids.contains(&edge.target) {
                ids.push(edge.target);
            }
        }
        ids
    }

    fn downstream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.outputs.len());
        for edge in &self.outputs {
            if !names.contains(&edge.target_name) {
                names.push(edge.target_name.clone());
            }
        }
        names
    }
}
