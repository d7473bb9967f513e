use thiserror::Error;

use crate::layout::LayoutError;
use crate::merge::MergeError;
use crate::metadata::MetadataError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
