//! Error types for the layout engine

use thiserror::Error;

/// Errors that can occur during layout computation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// A batch must contain at least one image
    #[error("invalid geometry: cannot lay out an empty batch")]
    EmptyBatch,

    /// Image dimensions must be positive
    #[error("invalid geometry: image size {width}x{height} must be positive in both dimensions")]
    InvalidImageSize { width: u32, height: u32 },
}

impl LayoutError {
    /// Create an invalid image size error
    pub fn invalid_size(width: u32, height: u32) -> Self {
        Self::InvalidImageSize { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_display() {
        assert!(LayoutError::EmptyBatch.to_string().contains("empty batch"));
    }

    #[test]
    fn test_invalid_size_display() {
        let err = LayoutError::invalid_size(0, 512);
        assert!(err.to_string().contains("0x512"));
    }
}
