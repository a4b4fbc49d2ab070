//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into column `Vec`s via `id.0 as usize`, but callers should
//! prefer the `.index()` helpers for clarity.
//!
//! `EdgeId` is the odd one out: edge ids are **1-based** and `EdgeId(0)` is
//! the "no edge" sentinel, because vehicle columns, lookahead slots, and
//! checkpoint records all use 0 to mean "empty".  Per-edge tables therefore
//! carry a dead slot at index 0 so `id.index()` stays a direct array index.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the type's MAX.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a vehicle in column storage.  Max ~4.3 billion vehicles.
    pub struct VehicleId(u32);
}

typed_id! {
    /// Interned handle for a rail-node name.  Assigned by the graph builder.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a station in the graph's station table.
    pub struct StationId(u32);
}

typed_id! {
    /// Connected-component id of the undirected edge graph.
    pub struct RegionId(u32);
}

// ── EdgeId ────────────────────────────────────────────────────────────────────

/// Identifier of a directed rail edge.
///
/// **1-based**: real edges are numbered from 1 and `EdgeId::NONE` (= 0) means
/// "no edge".  Edge tables reserve slot 0 so `id.index()` indexes directly.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// The "no edge" sentinel.
    pub const NONE: EdgeId = EdgeId(0);

    #[inline(always)]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn is_some(self) -> bool {
        self.0 != 0
    }

    /// Direct index into 1-based edge tables (slot 0 is a dead row).
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "EdgeId(-)")
        } else {
            write!(f, "EdgeId({})", self.0)
        }
    }
}
