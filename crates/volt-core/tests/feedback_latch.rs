// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Convergence on real feedback topologies.
//!
//! A cross-coupled NOR pair (SR latch) must reach a fixed point within the
//! iteration ceiling and hold its state once both inputs return low. An
//! odd ring of inverters must not: it is reported as non-convergent.

#![allow(missing_docs)]
use volt_core::{AdvanceOutcome, Circuit, CircuitConfig, GateKind, LogicNode, LogicValue, NodeId};

use LogicValue::{False as F, True as T};

struct Latch {
    circuit: Circuit,
    s: NodeId,
    r: NodeId,
    q: NodeId,
    qn: NodeId,
}

fn build_latch() -> Latch {
    let mut circuit = Circuit::new();
    let s = circuit.add_node(LogicNode::input("S", F)).expect("S");
    let r = circuit.add_node(LogicNode::input("R", F)).expect("R");
    let q = circuit
        .add_node(LogicNode::new("Q", GateKind::Nor))
        .expect("Q");
    let qn = circuit
        .add_node(LogicNode::new("Qn", GateKind::Nor))
        .expect("Qn");

    assert!(circuit.add_connection(r, q, "R"));
    assert!(circuit.add_connection(qn, q, "Qn"));
    assert!(circuit.add_connection(s, qn, "S"));
    assert!(circuit.add_connection(q, qn, "Q"));

    Latch {
        circuit,
        s,
        r,
        q,
        qn,
    }
}

#[test]
fn sr_latch_settles_from_power_on() {
    let mut latch = build_latch();
    let outcome = latch.circuit.advance();
    assert!(outcome.is_settled(), "{outcome:?}");
    assert!(latch.circuit.is_settled());

    let q = latch.circuit.value(latch.q);
    let qn = latch.circuit.value(latch.qn);
    assert_eq!(q, Some(F));
    assert_eq!(qn, Some(T));
}

#[test]
fn sr_latch_holds_state_after_inputs_return_low() {
    let mut latch = build_latch();
    assert!(latch.circuit.advance().is_settled());

    // Set.
    let set = latch.circuit.inject(latch.s, T).expect("S present");
    assert!(set.is_settled());
    assert_eq!(latch.circuit.value(latch.q), Some(T));
    assert_eq!(latch.circuit.value(latch.qn), Some(F));

    // Release: both inputs low, the latch remembers.
    let release = latch.circuit.inject(latch.s, F).expect("S present");
    assert!(release.is_settled());
    assert!(release.steps() < CircuitConfig::default().iteration_limit);
    assert_eq!(latch.circuit.value(latch.q), Some(T));
    assert_eq!(latch.circuit.value(latch.qn), Some(F));

    // Reset, release again: the opposite state is held.
    assert!(latch.circuit.inject(latch.r, T).expect("R").is_settled());
    assert!(latch.circuit.inject(latch.r, F).expect("R").is_settled());
    assert_eq!(latch.circuit.value(latch.q), Some(F));
    assert_eq!(latch.circuit.value(latch.qn), Some(T));
}

#[test]
fn settled_latch_does_no_work_on_repeated_input() {
    let mut latch = build_latch();
    assert!(latch.circuit.advance().is_settled());
    let outcome = latch.circuit.inject(latch.r, F).expect("R present");
    // Only the input itself is dequeued; it does not change so nothing fans out.
    assert_eq!(outcome, AdvanceOutcome::Settled { steps: 1 });
}

#[test]
fn inverter_ring_reports_non_convergence() {
    let limit = 64;
    let mut circuit = Circuit::with_config(CircuitConfig {
        iteration_limit: limit,
    });
    let kick = circuit.add_node(LogicNode::input("kick", F)).expect("kick");
    let a = circuit
        .add_node(LogicNode::new("a", GateKind::Nor))
        .expect("a");
    let b = circuit
        .add_node(LogicNode::new("b", GateKind::Not))
        .expect("b");
    let c = circuit
        .add_node(LogicNode::new("c", GateKind::Not))
        .expect("c");
    assert!(circuit.add_connection(kick, a, "kick"));
    assert!(circuit.add_connection(a, b, "a"));
    assert!(circuit.add_connection(b, c, "b"));
    assert!(circuit.add_connection(c, a, "c"));

    let outcome = circuit.advance();
    let err = outcome.into_result().expect_err("odd ring must oscillate");
    assert_eq!(err.steps, limit);
    assert!(err.pending > 0);
    assert!(!circuit.is_settled(), "state is left as-is at the ceiling");
}
