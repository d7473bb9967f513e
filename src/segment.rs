/// A labelled blob placed at a fixed offset in the flash address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub label: String,
    pub offset: u32,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn new(label: impl Into<String>, offset: u32, data: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            offset,
            data,
        }
    }

    /// Exclusive end offset. Computed in u64 so `offset + len` never wraps.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + self.data.len() as u64
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
