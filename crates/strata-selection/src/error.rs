use thiserror::Error;

use crate::selection::{ElementType, TopologyType};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Expected a {expected:?} selection, got {actual:?}")]
    ElementTypeMismatch {
        expected: ElementType,
        actual: ElementType,
    },
    #[error("Expected {expected:?} topology, got {actual:?}")]
    TopologyTypeMismatch {
        expected: TopologyType,
        actual: TopologyType,
    },
    #[error("Selections differ in element or topology type")]
    IncompatibleSelections,
    #[error("Polygroup topology is required for {0}")]
    MissingGroupTopology(&'static str),
    #[error("Unsupported selection: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, SelectionError>;
