use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DracoError {
    #[error("Unexpected end of Draco data while reading {0}")]
    UnexpectedEnd(&'static str),
    #[error("Not a Draco bitstream: {0}")]
    InvalidHeader(String),
    #[error("Unsupported Draco bitstream version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },
    #[error("Unsupported Draco feature: {0}")]
    Unsupported(String),
    #[error("Corrupt Draco data: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, DracoError>;

pub(crate) fn corrupt<T>(msg: impl Into<String>) -> Result<T> {
    Err(DracoError::Corrupt(msg.into()))
}
