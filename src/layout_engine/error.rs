use thiserror::Error;

use crate::model::WindowId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("No geometry override for tiled window {0:?}")]
    MissingOverride(WindowId),
    #[error("Host does not know window {0:?}")]
    UnknownWindow(WindowId),
}
