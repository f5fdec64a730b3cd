use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Gltf(#[from] strata_gltf::GltfError),

    #[error(transparent)]
    Mesh(#[from] strata_core::MeshError),

    #[error(transparent)]
    Selection(#[from] strata_selection::SelectionError),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mesh {mesh} has no primitive {primitive}")]
    MissingPrimitive { mesh: usize, primitive: usize },

    #[error("Primitive {primitive} of mesh {mesh} has no readable triangles")]
    NoTriangles { mesh: usize, primitive: usize },
}

pub type Result<T> = std::result::Result<T, ToolError>;
