// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted simulation tuning.

use serde::{Deserialize, Serialize};
use volt_clock::OscillatorConfig;
use volt_core::CircuitConfig;

/// Config key the prefs are stored under.
pub const PREFS_KEY: &str = "sim";

/// Default waveform history shown for a monitored node.
pub const DEFAULT_WAVEFORM_WINDOW_MS: u64 = 5_000;

/// Engine tuning shared by every Volt front end.
///
/// Every field has a default, so partial or older files load cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimPrefs {
    /// Propagation ceiling for `advance`.
    pub circuit: CircuitConfig,
    /// Oscillator step and stall threshold.
    pub oscillator: OscillatorConfig,
    /// Trailing history kept per monitored node.
    pub waveform_window_ms: u64,
}

impl Default for SimPrefs {
    fn default() -> Self {
        Self {
            circuit: CircuitConfig::default(),
            oscillator: OscillatorConfig::default(),
            waveform_window_ms: DEFAULT_WAVEFORM_WINDOW_MS,
        }
    }
}
