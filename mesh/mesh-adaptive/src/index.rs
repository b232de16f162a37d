//! Typed indices for the engine's index spaces.
//!
//! Vertices, positions, triangles, sub-meshes and edges are all addressed by
//! small integers. Each space gets its own newtype so they cannot be mixed.

use std::fmt;

macro_rules! typed_index {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw index.
            #[inline]
            #[must_use]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Wrap a slot position in the backing array.
            ///
            /// Arrays never grow past `u32::MAX` entries.
            #[inline]
            #[must_use]
            #[allow(clippy::cast_possible_truncation)]
            pub(crate) const fn from_usize(slot: usize) -> Self {
                Self(slot as u32)
            }

            /// Raw index value.
            #[inline]
            #[must_use]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Slot position in the backing array.
            #[inline]
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

typed_index!(
    /// Index into the vertex attribute array of the mesh.
    VertexIdx,
    "v"
);

typed_index!(
    /// Index into the deduplicated position table.
    PositionIdx,
    "p"
);

typed_index!(
    /// Index into the engine's triangle array.
    TriangleIdx,
    "t"
);

typed_index!(
    /// Index of the sub-mesh (index group) a triangle came from.
    MeshIdx,
    "m"
);

typed_index!(
    /// Index into the engine's edge arena.
    EdgeIdx,
    "e"
);
