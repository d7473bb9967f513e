use std::path::{Path, PathBuf};

use crate::digest::ImageDigest;
use crate::io::{read_binary, write_binary};
use crate::layout::{Geometry, Layout, SegmentSlot};
use crate::merge::{FlashImage, MergeError, MergeWarning, MergedImage, Placement};
use crate::segment::Segment;

/// Where the bytes for one layout slot come from.
///
/// Candidates are tried in order; the first readable one wins. A slot with
/// no readable candidate is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSource {
    pub slot: SegmentSlot,
    pub candidates: Vec<PathBuf>,
}

impl SegmentSource {
    pub fn new(slot: SegmentSlot, path: impl Into<PathBuf>) -> Self {
        Self {
            slot,
            candidates: vec![path.into()],
        }
    }

    /// Add an alternate source tried when the earlier ones are unreadable.
    pub fn or_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.candidates.push(path.into());
        self
    }

    /// Read the first available candidate. `Err` carries the reason the
    /// last candidate could not be read.
    fn load(&self) -> Result<Segment, String> {
        let mut reason = "no source given".to_string();
        for (index, path) in self.candidates.iter().enumerate() {
            match read_binary(path) {
                Ok(data) => {
                    if index > 0 {
                        log::info!(
                            "{}: using alternate source {}",
                            self.slot.label,
                            path.display()
                        );
                    }
                    return Ok(Segment::new(self.slot.label.clone(), self.slot.offset, data));
                }
                Err(err) => {
                    log::debug!("{}: cannot read {}: {err}", self.slot.label, path.display());
                    reason = if err.kind() == std::io::ErrorKind::NotFound {
                        "not found".to_string()
                    } else {
                        err.to_string()
                    };
                }
            }
        }
        Err(reason)
    }
}

/// Pair each layout slot with one input path, in slot order.
pub fn sources_from_paths(
    layout: &Layout,
    paths: &[PathBuf],
) -> Result<Vec<SegmentSource>, MergeError> {
    if paths.len() != layout.slots.len() {
        return Err(MergeError::InputCount {
            expected: layout.slots.len(),
            got: paths.len(),
        });
    }
    Ok(layout
        .slots
        .iter()
        .zip(paths)
        .map(|(slot, path)| SegmentSource::new(slot.clone(), path))
        .collect())
}

/// Look up each slot's artifact by file name inside a build directory.
pub fn sources_from_build_dir(layout: &Layout, build_dir: &Path) -> Vec<SegmentSource> {
    layout
        .slots
        .iter()
        .map(|slot| SegmentSource::new(slot.clone(), build_dir.join(slot.file_name())))
        .collect()
}

/// Place segments into an erased image of the given geometry and trim it.
///
/// Segments are written in order. Any segment ending past the capacity, or
/// overlapping an earlier one, aborts the whole assembly.
pub fn assemble(segments: &[Segment], geometry: Geometry) -> Result<MergedImage, MergeError> {
    let mut image = FlashImage::new(geometry)?;
    for segment in segments {
        image.place(segment)?;
    }
    Ok(image.finish())
}

/// Result of reading sources and assembling them.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub image: MergedImage,
    pub warnings: Vec<MergeWarning>,
}

/// Read every source, then assemble.
///
/// Missing optional segments become warnings and leave their region erased.
/// A missing required segment fails before anything is placed.
pub fn assemble_sources(
    sources: &[SegmentSource],
    geometry: Geometry,
) -> Result<Assembly, MergeError> {
    let mut segments = Vec::with_capacity(sources.len());
    let mut warnings = Vec::new();
    let mut missing_required = None;

    for source in sources {
        match source.load() {
            Ok(segment) => segments.push(segment),
            Err(reason) if source.slot.required => {
                if missing_required.is_none() {
                    missing_required = Some(MergeError::MissingRequiredSegment {
                        label: source.slot.label.clone(),
                        paths: source.candidates.clone(),
                        reason,
                    });
                }
            }
            Err(reason) => {
                let warning = MergeWarning::MissingOptionalSegment {
                    label: source.slot.label.clone(),
                    paths: source.candidates.clone(),
                    reason,
                };
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    if let Some(err) = missing_required {
        return Err(err);
    }

    let image = assemble(&segments, geometry)?;
    Ok(Assembly { image, warnings })
}

/// Summary of a merge written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub output: PathBuf,
    pub length: usize,
    pub digest: ImageDigest,
    pub placements: Vec<Placement>,
    pub warnings: Vec<MergeWarning>,
}

/// Assemble the sources and write the trimmed image to `output`.
///
/// Nothing is written unless assembly succeeds.
pub fn merge_files(
    sources: &[SegmentSource],
    geometry: Geometry,
    output: &Path,
) -> Result<MergeReport, MergeError> {
    let Assembly { image, warnings } = assemble_sources(sources, geometry)?;

    write_binary(output, image.as_bytes()).map_err(|source| MergeError::OutputWriteFailure {
        path: output.to_path_buf(),
        source,
    })?;

    let digest = image.digest();
    log::info!(
        "Output: {} ({} bytes, {digest})",
        output.display(),
        image.len()
    );

    Ok(MergeReport {
        output: output.to_path_buf(),
        length: image.len(),
        digest,
        placements: image.placements().to_vec(),
        warnings,
    })
}
