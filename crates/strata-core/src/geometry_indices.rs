//! Typed element handles for [`TriangleMesh`](crate::mesh::TriangleMesh).
//!
//! Every handle is a thin `u32` wrapper. `u32::MAX` is reserved as the invalid
//! sentinel so the handles can be stored densely in adjacency arrays.

macro_rules! element_index {
    ($(#[$meta:meta])* $name:ident, $invalid:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        pub const $invalid: $name = $name(u32::MAX);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v as u32)
            }
        }

        impl From<$name> for u32 {
            fn from(v: $name) -> Self {
                v.0
            }
        }
    };
}

element_index!(
    /// A mesh vertex.
    VertexId,
    INVALID_VERTEX
);
element_index!(
    /// A mesh triangle.
    TriangleId,
    INVALID_TRIANGLE
);
element_index!(
    /// A unique (undirected) mesh edge.
    EdgeId,
    INVALID_EDGE
);

/// One side of a mesh edge, addressed as a triangle and the local edge slot
/// `0..3` inside it. Local edge `k` of triangle `[a, b, c]` runs from vertex
/// `k` to vertex `(k + 1) % 3`.
///
/// An interior edge therefore has two `TriEdge`s, a boundary edge has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriEdge {
    pub triangle: TriangleId,
    pub local: u8,
}

impl TriEdge {
    pub fn new(triangle: TriangleId, local: u8) -> Self {
        Self { triangle, local }
    }

    /// Packs into the `(triangle << 2) | local` form used by selection ids.
    #[inline]
    pub fn encode(self) -> u32 {
        (self.triangle.0 << 2) | (u32::from(self.local) & 0b11)
    }

    #[inline]
    pub fn decode(encoded: u32) -> Self {
        Self {
            triangle: TriangleId(encoded >> 2),
            local: (encoded & 0b11) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tri_edge_packing() {
        let edge = TriEdge::new(TriangleId(1234), 2);
        assert_eq!(edge.encode(), (1234 << 2) | 2);
        assert_eq!(TriEdge::decode(edge.encode()), edge);
    }

    #[test]
    fn test_invalid_sentinels() {
        assert!(!INVALID_VERTEX.is_valid());
        assert!(TriangleId(0).is_valid());
        assert_eq!(EdgeId::from(7usize).index(), 7);
    }
}
