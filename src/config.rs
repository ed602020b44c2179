use crate::error::{Result, SbfError};
use crate::hash::HashFamily;
use derive_builder::Builder;
use std::path::PathBuf;

/// The maximum element length in bytes accepted by insert/check. Salts
/// are generated at this length so the XOR step always has enough salt
/// bytes to cover the element.
pub const MAX_INPUT_SIZE: usize = 128;

/// Upper bound on `bit_mapping`: the filter holds at most 2^32 cells,
/// matching the 32-bit truncation of the hash digest.
pub const MAX_BIT_MAPPING: u32 = 32;

/// Byte counterpart of [`MAX_BIT_MAPPING`]: how many digest bytes feed
/// the cell index.
pub const MAX_BYTE_MAPPING: usize = (MAX_BIT_MAPPING / 8) as usize;

/// Maximum number of areas; keeps every label representable in a
/// 2-byte cell.
pub const MAX_AREA_NUMBER: u16 = 65535;

/// Maximum number of hash rounds per element.
pub const MAX_HASH_NUMBER: usize = 1024;

/// Configuration for a [`SpatialBloomFilter`](crate::SpatialBloomFilter).
///
/// `bit_mapping` fixes the filter size to `2^bit_mapping` cells; the
/// cell width (1 or 2 bytes) is derived from `area_count` at
/// construction and is not configurable directly.
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct SbfConfig {
    /// Number of index bits: the filter holds 2^bit_mapping cells
    #[builder(default = "10")]
    pub bit_mapping: u32,

    /// Digest algorithm used for index derivation
    #[builder(default = "HashFamily::Md4")]
    pub hash_family: HashFamily,

    /// Number of hash rounds (independent salted digests) per element
    #[builder(default = "3")]
    pub hash_count: usize,

    /// Number of disjoint labeled areas; labels are 1..=area_count
    #[builder(default = "1")]
    pub area_count: u16,

    /// Where salts are persisted. If the file exists it is loaded,
    /// otherwise fresh salts are generated and written there.
    pub salt_path: PathBuf,
}

impl SbfConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bit_mapping == 0 || self.bit_mapping > MAX_BIT_MAPPING {
            return Err(SbfError::InvalidConfig(format!(
                "bit_mapping must be in [1, {}], got {}",
                MAX_BIT_MAPPING, self.bit_mapping
            )));
        }
        if self.hash_count == 0 || self.hash_count > MAX_HASH_NUMBER {
            return Err(SbfError::InvalidConfig(format!(
                "hash_count must be in [1, {}], got {}",
                MAX_HASH_NUMBER, self.hash_count
            )));
        }
        if self.area_count == 0 {
            return Err(SbfError::InvalidConfig(
                "area_count must be > 0".into(),
            ));
        }
        if self.salt_path.as_os_str().is_empty() {
            return Err(SbfError::InvalidConfig(
                "salt_path must not be empty".into(),
            ));
        }
        Ok(())
    }
}
