// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tri-state logic values.

use core::fmt;
use core::ops::Not;

/// A tri-state signal level.
///
/// `Unknown` is the high-impedance state: an undriven line or one that has not
/// settled yet. It is a value in its own right and propagates through gates;
/// it is never read as `False`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LogicValue {
    /// Driven high.
    True,
    /// Driven low.
    False,
    /// High impedance (HI-Z).
    #[default]
    Unknown,
}

impl LogicValue {
    /// All three values, in declaration order.
    pub const ALL: [LogicValue; 3] = [LogicValue::True, LogicValue::False, LogicValue::Unknown];

    /// Converts a boolean into a driven value.
    #[must_use]
    pub const fn from_bool(b: bool) -> Self {
        if b {
            Self::True
        } else {
            Self::False
        }
    }

    /// Returns the boolean level, or `None` for `Unknown`.
    #[must_use]
    pub const fn to_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unknown => None,
        }
    }

    /// Returns `true` when the value is driven (not HI-Z).
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<bool> for LogicValue {
    fn from(b: bool) -> Self {
        Self::from_bool(b)
    }
}

impl Not for LogicValue {
    type Output = Self;

    /// Inverts driven values; `Unknown` stays `Unknown`.
    fn not(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for LogicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::True => "1",
            Self::False => "0",
            Self::Unknown => "Z",
        };
        f.write_str(s)
    }
}
