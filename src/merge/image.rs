use crate::digest::ImageDigest;
use crate::layout::Geometry;
use crate::merge::MergeError;
use crate::segment::Segment;

/// Value flash reads back as after an erase cycle.
pub const ERASED_BYTE: u8 = 0xFF;

/// Where a segment ended up in the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub label: String,
    pub offset: u32,
    pub length: usize,
}

impl Placement {
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + self.length as u64
    }

    /// True if `segment` would write at least one byte of this placement.
    pub fn overlaps(&self, segment: &Segment) -> bool {
        if self.length == 0 || segment.is_empty() {
            return false;
        }
        u64::from(segment.offset) < self.end() && u64::from(self.offset) < segment.end()
    }
}

/// The full flash address space, erased, with segments written into it.
///
/// Segments are bounds-checked against the capacity and rejected on overlap.
#[derive(Debug)]
pub struct FlashImage {
    buffer: Vec<u8>,
    geometry: Geometry,
    placements: Vec<Placement>,
}

impl FlashImage {
    pub fn new(geometry: Geometry) -> Result<Self, MergeError> {
        geometry.validate()?;
        log::debug!(
            "Allocating {:#X} bytes of erased flash ({:#X} byte sectors)",
            geometry.capacity,
            geometry.sector_size
        );
        Ok(Self {
            buffer: vec![ERASED_BYTE; geometry.capacity as usize],
            geometry,
            placements: Vec::new(),
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Copy a segment into the buffer at its offset.
    pub fn place(&mut self, segment: &Segment) -> Result<(), MergeError> {
        let end = segment.end();
        if end > u64::from(self.geometry.capacity) {
            return Err(MergeError::SegmentOutOfBounds {
                label: segment.label.clone(),
                offset: segment.offset,
                length: segment.len(),
                end,
                capacity: self.geometry.capacity,
            });
        }

        if let Some(previous) = self.placements.iter().find(|p| p.overlaps(segment)) {
            return Err(MergeError::SegmentOverlap {
                label: segment.label.clone(),
                offset: segment.offset,
                end,
                previous: previous.label.clone(),
                previous_offset: previous.offset,
                previous_end: previous.end(),
            });
        }

        let start = segment.offset as usize;
        self.buffer[start..start + segment.len()].copy_from_slice(&segment.data);
        self.placements.push(Placement {
            label: segment.label.clone(),
            offset: segment.offset,
            length: segment.len(),
        });

        log::info!(
            "{}: {} bytes @ 0x{:08X}",
            segment.label,
            segment.len(),
            segment.offset
        );
        Ok(())
    }

    /// Length up to and including the last non-erased byte.
    pub fn content_len(&self) -> usize {
        self.buffer
            .iter()
            .rposition(|&b| b != ERASED_BYTE)
            .map_or(0, |last| last + 1)
    }

    /// Trim trailing erased bytes, keeping whole sectors.
    pub fn finish(mut self) -> MergedImage {
        let content_len = self.content_len();
        let sector = self.geometry.sector_size as usize;
        let trimmed_len = content_len.div_ceil(sector) * sector;
        log::trace!("Content ends at {content_len:#X}, trimmed to {trimmed_len:#X}");

        self.buffer.truncate(trimmed_len);
        MergedImage {
            data: self.buffer,
            content_len,
            geometry: self.geometry,
            placements: self.placements,
        }
    }
}

/// Assembled image, trimmed to the last sector holding data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedImage {
    data: Vec<u8>,
    content_len: usize,
    geometry: Geometry,
    placements: Vec<Placement>,
}

impl MergedImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn content_len(&self) -> usize {
        self.content_len
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn digest(&self) -> ImageDigest {
        ImageDigest::of(&self.data)
    }

    /// Read `len` bytes at `offset` as a device would see them after
    /// programming this image: past the end of the file is erased flash.
    pub fn read(&self, offset: u32, len: usize) -> Vec<u8> {
        let start = offset as usize;
        (start..start + len)
            .map(|i| self.data.get(i).copied().unwrap_or(ERASED_BYTE))
            .collect()
    }
}
