use std::path::PathBuf;

use thiserror::Error;

use crate::layout::GeometryError;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("required segment '{label}' is missing: {} ({reason})", path_list(.paths))]
    MissingRequiredSegment {
        label: String,
        paths: Vec<PathBuf>,
        reason: String,
    },

    #[error(
        "segment '{label}' does not fit in flash: {length} bytes @ {offset:#X} ends at {end:#X}, capacity is {capacity:#X}"
    )]
    SegmentOutOfBounds {
        label: String,
        offset: u32,
        length: usize,
        end: u64,
        capacity: u32,
    },

    #[error(
        "segment '{label}' ({offset:#X}..{end:#X}) overlaps segment '{previous}' ({previous_offset:#X}..{previous_end:#X})"
    )]
    SegmentOverlap {
        label: String,
        offset: u32,
        end: u64,
        previous: String,
        previous_offset: u32,
        previous_end: u64,
    },

    #[error("failed to write merged image {}: {source}", .path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected {expected} segment inputs for this layout, got {got}")]
    InputCount { expected: usize, got: usize },

    #[error(transparent)]
    InvalidGeometry(#[from] GeometryError),
}

fn path_list(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no source given".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Non-fatal conditions recorded during a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    MissingOptionalSegment {
        label: String,
        paths: Vec<PathBuf>,
        reason: String,
    },
}

impl std::fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOptionalSegment {
                label,
                paths,
                reason,
            } => write!(
                f,
                "segment '{label}' not found: {} ({reason}); region left erased",
                path_list(paths)
            ),
        }
    }
}
