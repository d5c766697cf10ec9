//! Canvas Uploader - places image generation batches on a shared canvas workspace
//!
//! This library lays out a batch of images on a grid, negotiates free space
//! for it in a remote workspace, and composes the canvas, text and image
//! elements that present the batch.
//!
//! # Example
//!
//! ```rust
//! use canvas_uploader::layout::{GridLayout, ImageSize};
//!
//! let layout = GridLayout::new(5, ImageSize::new(512, 512), false).unwrap();
//! assert_eq!(layout.columns(), 4);
//! assert_eq!(layout.canvas_bounds().width, 2298);
//! ```

pub mod color;
pub mod compose;
pub mod error;
pub mod infotext;
pub mod layout;
pub mod metadata;
pub mod placement;
pub mod remote;
pub mod settings;

pub use compose::{GeneratedImage, GenerationType, UploadBatch, UploadReport, Uploader};
pub use error::RemoteError;
pub use layout::{BoundingBox, GridLayout, ImageSize, LayoutError, Point};
pub use placement::{Direction, Placement, PlacementNegotiator, SwimlaneStrategy};
pub use remote::{CanvasService, HttpCanvasService};
pub use settings::{SettingsError, UploadSettings};

use thiserror::Error;

/// Errors that can occur during an upload
#[derive(Debug, Error)]
pub enum UploadError {
    /// The batch cannot be laid out
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// The workspace rejected or failed a request
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
}

impl UploadError {
    /// Whether the user has to sign in again before retrying
    pub fn is_authorization_expired(&self) -> bool {
        matches!(self, UploadError::Remote(e) if e.is_authorization_expired())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_authorization() {
        assert!(UploadError::from(RemoteError::AuthorizationExpired).is_authorization_expired());
        assert!(!UploadError::from(LayoutError::EmptyBatch).is_authorization_expired());
    }

    #[test]
    fn test_upload_error_display() {
        let err = UploadError::from(LayoutError::EmptyBatch);
        assert!(err.to_string().starts_with("layout error:"));
    }
}
