// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node handles.

use core::fmt;

/// Opaque handle for a node owned by a [`crate::Circuit`].
///
/// Handles are issued by [`crate::Circuit::add_node`] in increasing order and
/// are never reused, so a handle held by a collaborator after the node was
/// removed simply stops resolving instead of aliasing a newer node.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(u64);

impl NodeId {
    /// Constructs a handle from a raw value (FFI / host index round-trips).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
