use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("Triangle {triangle} references vertex {vertex} but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        triangle: usize,
        vertex: u32,
        vertex_count: usize,
    },
    #[error("Triangle {0} is degenerate (repeated vertex)")]
    DegenerateTriangle(usize),
    #[error("Per-triangle layer '{layer}' has {len} entries, expected {expected}")]
    LayerSizeMismatch {
        layer: &'static str,
        len: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, MeshError>;
