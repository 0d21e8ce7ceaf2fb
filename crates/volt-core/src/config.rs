// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Circuit tuning.

/// Default ceiling on node propagations per [`crate::Circuit::advance`] call.
pub const DEFAULT_ITERATION_LIMIT: usize = 1000;

/// Tuning knobs for a [`crate::Circuit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CircuitConfig {
    /// Maximum number of node propagations a single `advance` performs before
    /// reporting non-convergence. Feedback loops that never settle (an
    /// unclocked ring of inverters, say) hit this ceiling.
    pub iteration_limit: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            iteration_limit: DEFAULT_ITERATION_LIMIT,
        }
    }
}
