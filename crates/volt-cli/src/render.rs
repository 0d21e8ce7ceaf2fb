// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Text rendering for waveforms.

use volt_clock::Segment;
use volt_core::LogicValue;

const HIGH: char = '#';
const LOW: char = '_';
const HI_Z: char = '~';
const NO_DATA: char = ' ';

/// Samples `segments` at `columns` evenly spaced points in `[from_ms, to_ms)`.
pub fn strip(segments: &[Segment], from_ms: u64, to_ms: u64, columns: usize) -> String {
    let span = u128::from(to_ms.saturating_sub(from_ms));
    let width = u128::try_from(columns).unwrap_or(u128::MAX).max(1);
    (0..columns)
        .map(|c| {
            let offset = span * u128::try_from(c).unwrap_or(0) / width;
            let t = from_ms + u64::try_from(offset).unwrap_or(u64::MAX);
            segments
                .iter()
                .find(|s| s.start_ms <= t && t < s.end_ms)
                .map_or(NO_DATA, |s| glyph(s.value))
        })
        .collect()
}

fn glyph(value: LogicValue) -> char {
    match value {
        LogicValue::True => HIGH,
        LogicValue::False => LOW,
        LogicValue::Unknown => HI_Z,
    }
}
