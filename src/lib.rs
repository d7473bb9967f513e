pub mod digest;
pub mod error;
pub mod io;
pub mod layout;
pub mod merge;
pub mod metadata;
pub mod segment;

pub use digest::ImageDigest;
pub use error::Error;
pub use io::{read_binary, write_binary};
pub use layout::{
    APPLICATION_OFFSET, BOOTLOADER_OFFSET, DEFAULT_CAPACITY, DEFAULT_SECTOR_SIZE, Geometry,
    GeometryError, Layout, LayoutError, PARTITION_TABLE_OFFSET, SegmentSlot,
};
pub use merge::{
    Assembly, ERASED_BYTE, FlashImage, MergeError, MergeReport, MergeWarning, MergedImage,
    Placement, SegmentSource, assemble, assemble_sources, merge_files, sources_from_build_dir,
    sources_from_paths,
};
pub use metadata::{
    BuildMetadata, Define, DefineValue, DefinesFormat, Git, MetadataError, MetadataOptions,
    Probed, SourceControl, SourceControlError, Version, describe, describe_with,
};
pub use segment::Segment;
