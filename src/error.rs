use std::io;

/// All error types for the photo-atlas packing core.
#[derive(thiserror::Error, Debug)]
pub enum AtlasError {
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),
    #[error("Texture atlas already finalized")]
    AlreadyFinalized,
    #[error("Exceeded maximum texture size ({0})")]
    CapacityExceeded(u32),
    #[error("Input error: {0}")]
    Input(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AtlasError>;
