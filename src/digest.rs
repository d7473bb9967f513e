use std::fmt;

use sha2::{Digest, Sha256};

/// Fingerprint of a merged image, for comparing builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDigest {
    pub crc32: u32,
    pub sha256: [u8; 32],
}

impl ImageDigest {
    pub fn of(data: &[u8]) -> Self {
        Self {
            crc32: crc32_iso_hdlc(data),
            sha256: Sha256::digest(data).into(),
        }
    }

    pub fn sha256_hex(&self) -> String {
        self.sha256.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ImageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crc32 {:08X}, sha256 {}", self.crc32, self.sha256_hex())
    }
}

/// CRC-32 IEEE (ISO-HDLC).
fn crc32_iso_hdlc(data: &[u8]) -> u32 {
    const CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);
    CRC.checksum(data)
}
