// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Gate truth tables.
//!
//! Every multi-input gate resolves in two tiers: a dominant input decides the
//! output outright; otherwise any HI-Z input makes the output HI-Z; otherwise
//! the gate's default level applies. Tables are written against
//! [`LogicNode::value_count`] so they hold for any input count.

use core::fmt;

use crate::node::LogicNode;
use crate::value::LogicValue;

/// Collaborator-defined evaluation seam.
///
/// Implementations must be pure functions of the node's recorded inputs (and,
/// if they choose, its committed value): calling `eval` twice without an
/// intervening `update` must return the same level.
pub trait Evaluate: fmt::Debug {
    /// Computes the node's next output level.
    fn eval(&self, node: &LogicNode) -> LogicValue;

    /// Short label used in logs.
    fn label(&self) -> &'static str {
        "custom"
    }
}

/// Built-in node behaviours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Holds its committed value; inputs are recorded but ignored.
    ///
    /// Commits only ever store what `eval` returned, so a plain node stays
    /// HI-Z for its whole life. It is a placeholder for a node whose
    /// behaviour is attached later; use [`Evaluate`] for anything that must
    /// drive a level.
    Plain,
    /// External driver: outputs the last value written to it.
    Input,
    /// Single-input passthrough of the most recently received level.
    Buffer,
    /// Single-input inverter of the most recently received level.
    Not,
    /// FALSE dominates, default TRUE.
    And,
    /// TRUE dominates, default FALSE.
    Or,
    /// FALSE dominates to TRUE, default FALSE.
    Nand,
    /// TRUE dominates to FALSE, default TRUE.
    Nor,
    /// Odd parity of TRUE inputs.
    Xor,
    /// Even parity of TRUE inputs.
    Xnor,
}

impl GateKind {
    /// Short label used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Input => "input",
            Self::Buffer => "buffer",
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
            Self::Nand => "nand",
            Self::Nor => "nor",
            Self::Xor => "xor",
            Self::Xnor => "xnor",
        }
    }

    /// Evaluates this gate over `node`'s recorded inputs.
    #[must_use]
    pub fn eval(self, node: &LogicNode) -> LogicValue {
        match self {
            Self::Plain => node.value(),
            Self::Input | Self::Buffer => node.last_received(),
            Self::Not => !node.last_received(),
            Self::And => dominated(node, LogicValue::False, LogicValue::False, LogicValue::True),
            Self::Nand => dominated(node, LogicValue::False, LogicValue::True, LogicValue::False),
            Self::Or => dominated(node, LogicValue::True, LogicValue::True, LogicValue::False),
            Self::Nor => dominated(node, LogicValue::True, LogicValue::False, LogicValue::True),
            Self::Xor => parity(node),
            Self::Xnor => !parity(node),
        }
    }
}

fn dominated(
    node: &LogicNode,
    dominant: LogicValue,
    on_dominant: LogicValue,
    otherwise: LogicValue,
) -> LogicValue {
    if node.value_count(dominant) > 0 {
        on_dominant
    } else if node.value_count(LogicValue::Unknown) > 0 {
        LogicValue::Unknown
    } else {
        otherwise
    }
}

fn parity(node: &LogicNode) -> LogicValue {
    if node.value_count(LogicValue::Unknown) > 0 {
        return LogicValue::Unknown;
    }
    LogicValue::from_bool(node.value_count(LogicValue::True) % 2 == 1)
}

/// A node's evaluation strategy.
pub enum Evaluator {
    /// One of the built-in behaviours.
    Gate(GateKind),
    /// A collaborator-supplied evaluator.
    Custom(Box<dyn Evaluate>),
}

impl Evaluator {
    /// Evaluates `node` with this strategy.
    #[must_use]
    pub fn eval(&self, node: &LogicNode) -> LogicValue {
        match self {
            Self::Gate(kind) => kind.eval(node),
            Self::Custom(custom) => custom.eval(node),
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gate(kind) => kind.label(),
            Self::Custom(custom) => custom.label(),
        }
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gate(kind) => f.debug_tuple("Gate").field(kind).finish(),
            Self::Custom(custom) => f.debug_tuple("Custom").field(custom).finish(),
        }
    }
}

impl From<GateKind> for Evaluator {
    fn from(kind: GateKind) -> Self {
        Self::Gate(kind)
    }
}
