//! Spatial Bloom Filter (SBF) implementation.
//!
//! A classical Bloom filter answers "is this element a member of the
//! set". An SBF partitions one fixed-size cell array across N disjoint
//! labeled areas and answers "which area does this element belong to,
//! if any". It was designed for privacy-preserving location queries,
//! where the filter contents may later be homomorphically encrypted,
//! so compactness and computable error probabilities matter more than
//! raw throughput.
//!
//! How it works:
//!    * Cells: the filter holds `2^bit_mapping` cells of 1 or 2 bytes
//!      (depending on how many areas must be representable), all zero
//!      at construction. A cell stores the label of the last area that
//!      claimed it, with lower labels taking priority.
//!    * Insertion: each element is XORed with a per-round secret salt,
//!      digested (SHA-1/MD4/MD5), truncated to 32 bits and shifted
//!      down to a cell index; `hash_count` rounds each write the area
//!      label under the collision policy.
//!    * Query: an element belongs to an area only if every round lands
//!      on a non-empty cell; the smallest label seen wins. False
//!      positives are possible, false negatives are not.
//!    * Statistics: occupancy counters feed closed-form estimators:
//!      sparsity, a-priori/a-posteriori false positive probability,
//!      inter-set error probability, emersion and safeness.
//!
//! Known caveats:
//!     * Elements must be inserted in non-decreasing area-label order
//!       for the self-collision statistics to be meaningful; use
//!       `insert_batch` to enforce this.
//!     * Index derivation reassembles digest bytes in host byte
//!       order, so filters are not portable across hosts of
//!       different endianness.

mod cells;
mod config;
mod error;
mod filter;
mod hash;
mod report;
mod salt;
mod stats;

pub use cells::{CellArray, CellWidth};
pub use config::{
    MAX_AREA_NUMBER, MAX_BIT_MAPPING, MAX_BYTE_MAPPING, MAX_HASH_NUMBER,
    MAX_INPUT_SIZE, SbfConfig, SbfConfigBuilder, SbfConfigBuilderError,
};
pub use error::{Result, SbfError};
pub use filter::{
    AreaCounters, CellOutcome, SpatialBloomFilter, resolve_cell,
};
pub use hash::{Endianness, HashFamily, derive_index};
pub use report::FilterSnapshot;
pub use salt::{SALT_LENGTH, SaltStore};
pub use stats::{AreaStatistics, FilterStatistics, UNDEFINED};
