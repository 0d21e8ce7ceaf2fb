// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Demo circuits driven by the CLI.

use anyhow::{Context, Result};
use volt_app_core::prefs::SimPrefs;
use volt_clock::{ClockSource, Oscillator, Simulation, WaveformHandle};
use volt_core::{AdvanceOutcome, Circuit, CircuitConfig, GateKind, LogicNode, LogicValue, NodeId};

/// Cross-coupled NOR latch.
pub struct Latch {
    pub circuit: Circuit,
    pub s: NodeId,
    pub r: NodeId,
    pub q: NodeId,
    pub qn: NodeId,
}

/// One line of the latch walkthrough.
pub struct LatchRow {
    pub label: &'static str,
    pub s: LogicValue,
    pub r: LogicValue,
    pub q: LogicValue,
    pub qn: LogicValue,
    pub outcome: AdvanceOutcome,
}

pub fn sr_latch(config: CircuitConfig) -> Result<Latch> {
    let mut circuit = Circuit::with_config(config);
    let s = circuit.add_node(LogicNode::input("S", LogicValue::False))?;
    let r = circuit.add_node(LogicNode::input("R", LogicValue::False))?;
    let q = circuit.add_node(LogicNode::new("Q", GateKind::Nor))?;
    let qn = circuit.add_node(LogicNode::new("Qn", GateKind::Nor))?;
    circuit.add_connection(r, q, "R");
    circuit.add_connection(qn, q, "Qn");
    circuit.add_connection(s, qn, "S");
    circuit.add_connection(q, qn, "Q");
    Ok(Latch {
        circuit,
        s,
        r,
        q,
        qn,
    })
}

/// Power-on, then set, hold, reset, hold.
pub fn latch_walkthrough(config: CircuitConfig) -> Result<Vec<LatchRow>> {
    let mut latch = sr_latch(config)?;
    let power_on = latch.circuit.advance();
    let mut rows = vec![row(&latch, "power-on", power_on)];

    let script = [
        ("set", latch.s, LogicValue::True),
        ("hold", latch.s, LogicValue::False),
        ("reset", latch.r, LogicValue::True),
        ("hold", latch.r, LogicValue::False),
    ];
    for (label, node, value) in script {
        let outcome = latch
            .circuit
            .inject(node, value)
            .context("latch input vanished")?;
        rows.push(row(&latch, label, outcome));
    }
    Ok(rows)
}

fn row(latch: &Latch, label: &'static str, outcome: AdvanceOutcome) -> LatchRow {
    let level = |id| latch.circuit.value(id).unwrap_or_default();
    LatchRow {
        label,
        s: level(latch.s),
        r: level(latch.r),
        q: level(latch.q),
        qn: level(latch.qn),
        outcome,
    }
}

/// Two clocks (`clk` at `interval_ms`, `clk2` at twice that) feeding an XOR
/// and an AND, with every node monitored.
pub struct ClockedGates {
    pub sim: Simulation,
    pub waves: Vec<WaveformHandle>,
}

pub fn clocked_gates(prefs: &SimPrefs, interval_ms: u64) -> Result<ClockedGates> {
    let mut circuit = Circuit::with_config(prefs.circuit);
    let clk = circuit.add_node(LogicNode::input("clk", LogicValue::False))?;
    let clk2 = circuit.add_node(LogicNode::input("clk2", LogicValue::False))?;
    let xor = circuit.add_node(LogicNode::new("xor", GateKind::Xor))?;
    let and = circuit.add_node(LogicNode::new("and", GateKind::And))?;
    for gate in [xor, and] {
        circuit.add_connection(clk, gate, "clk");
        circuit.add_connection(clk2, gate, "clk2");
    }
    circuit.advance().into_result()?;

    let oscillator = Oscillator::new(prefs.oscillator)?;
    let mut sim = Simulation::new(circuit, oscillator);
    let slow = interval_ms
        .checked_mul(2)
        .context("clock interval too large")?;
    sim.bind_clock(ClockSource::new("clk", interval_ms)?, clk)
        .context("bind clk")?;
    sim.bind_clock(ClockSource::new("clk2", slow)?, clk2)
        .context("bind clk2")?;

    let waves = [clk, clk2, xor, and]
        .into_iter()
        .map(|id| sim.monitor(id, prefs.waveform_window_ms))
        .collect::<Option<Vec<_>>>()
        .context("monitored node vanished")?;
    Ok(ClockedGates { sim, waves })
}
