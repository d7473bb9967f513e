mod assemble;
mod error;
mod image;

pub use assemble::{
    Assembly, MergeReport, SegmentSource, assemble, assemble_sources, merge_files,
    sources_from_build_dir, sources_from_paths,
};
pub use error::{MergeError, MergeWarning};
pub use image::{ERASED_BYTE, FlashImage, MergedImage, Placement};
