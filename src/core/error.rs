use crate::core::host::{ImageLoadError, LaunchError};
use thiserror::Error;

/// Everything that can go wrong on the gallery screen. None of it is fatal:
/// each variant ends up in front of the user as a notice or a prompt, or
/// falls back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GalleryError {
    #[error("failed to load the selected image: {0}")]
    ImageLoad(#[from] ImageLoadError),
    #[error("failed to open {0}")]
    Launch(#[from] LaunchError),
    #[error("media access was permanently denied")]
    PermissionPermanentlyDenied,
    #[error("invalid config: {0}")]
    Config(String),
}
