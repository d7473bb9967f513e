use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CAPACITY: u32 = 16 * 1024 * 1024;
pub const DEFAULT_SECTOR_SIZE: u32 = 4096;

pub const BOOTLOADER_OFFSET: u32 = 0x0;
pub const PARTITION_TABLE_OFFSET: u32 = 0x8000;
pub const APPLICATION_OFFSET: u32 = 0x10000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("flash capacity must be non-zero")]
    ZeroCapacity,

    #[error("sector size must be a non-zero power of 2, got {0}")]
    InvalidSectorSize(u32),

    #[error("flash capacity {capacity:#X} is not a multiple of the sector size {sector_size:#X}")]
    CapacityNotAligned { capacity: u32, sector_size: u32 },
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid layout: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("layout has no segment slots")]
    NoSlots,

    #[error("layout has no required segment; at least one slot must set `required = true`")]
    NoRequiredSlot,

    #[error("duplicate segment label '{0}' in layout")]
    DuplicateLabel(String),

    #[error("segment '{label}' offset {offset:#X} lies outside flash capacity {capacity:#X}")]
    SlotOutOfRange {
        label: String,
        offset: u32,
        capacity: u32,
    },
}

/// Flash size and erase granularity of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub capacity: u32,
    pub sector_size: u32,
}

impl Geometry {
    pub fn new(capacity: u32, sector_size: u32) -> Result<Self, GeometryError> {
        let geometry = Self {
            capacity,
            sector_size,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// The merged image is rounded up to whole sectors, so the capacity has
    /// to be whole sectors too or the rounding could run past the buffer.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.capacity == 0 {
            return Err(GeometryError::ZeroCapacity);
        }
        if !self.sector_size.is_power_of_two() {
            return Err(GeometryError::InvalidSectorSize(self.sector_size));
        }
        if !self.capacity.is_multiple_of(self.sector_size) {
            return Err(GeometryError::CapacityNotAligned {
                capacity: self.capacity,
                sector_size: self.sector_size,
            });
        }
        Ok(())
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sector_size: DEFAULT_SECTOR_SIZE,
        }
    }
}

/// One entry of the placement table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentSlot {
    pub label: String,
    pub offset: u32,
    #[serde(default)]
    pub required: bool,
    /// Artifact name looked up in a build directory. Defaults to `<label>.bin`.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl SegmentSlot {
    pub fn new(label: impl Into<String>, offset: u32, required: bool) -> Self {
        Self {
            label: label.into(),
            offset,
            required,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("{}.bin", self.label))
    }
}

/// Placement table plus flash geometry.
///
/// The default is the ESP32-S3 class layout: bootloader at 0x0, partition
/// table at 0x8000, application at 0x10000 on 16 MiB of flash. Other targets
/// describe themselves in TOML:
///
/// ```toml
/// capacity = 0x400000
/// sector_size = 0x1000
///
/// [[segment]]
/// label = "bootloader"
/// offset = 0x1000
///
/// [[segment]]
/// label = "application"
/// offset = 0x10000
/// required = true
/// file_name = "firmware.bin"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layout {
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_sector_size")]
    pub sector_size: u32,
    #[serde(rename = "segment", default = "default_slots")]
    pub slots: Vec<SegmentSlot>,
}

fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

fn default_sector_size() -> u32 {
    DEFAULT_SECTOR_SIZE
}

fn default_slots() -> Vec<SegmentSlot> {
    vec![
        SegmentSlot::new("bootloader", BOOTLOADER_OFFSET, false).with_file_name("bootloader.bin"),
        SegmentSlot::new("partition-table", PARTITION_TABLE_OFFSET, false)
            .with_file_name("partitions.bin"),
        SegmentSlot::new("application", APPLICATION_OFFSET, true).with_file_name("firmware.bin"),
    ]
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sector_size: DEFAULT_SECTOR_SIZE,
            slots: default_slots(),
        }
    }
}

impl Layout {
    pub fn from_toml_str(content: &str) -> Result<Self, LayoutError> {
        let layout: Layout = toml::from_str(content)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            capacity: self.capacity,
            sector_size: self.sector_size,
        }
    }

    pub fn slot(&self, label: &str) -> Option<&SegmentSlot> {
        self.slots.iter().find(|s| s.label == label)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        self.geometry().validate()?;

        if self.slots.is_empty() {
            return Err(LayoutError::NoSlots);
        }
        if !self.slots.iter().any(|s| s.required) {
            return Err(LayoutError::NoRequiredSlot);
        }

        let mut seen = HashSet::new();
        for slot in &self.slots {
            if !seen.insert(slot.label.as_str()) {
                return Err(LayoutError::DuplicateLabel(slot.label.clone()));
            }
            if slot.offset >= self.capacity {
                return Err(LayoutError::SlotOutOfRange {
                    label: slot.label.clone(),
                    offset: slot.offset,
                    capacity: self.capacity,
                });
            }
        }
        Ok(())
    }
}
