use crate::cells::{CellArray, CellWidth};
use crate::config::{MAX_INPUT_SIZE, SbfConfig};
use crate::error::{Result, SbfError};
use crate::hash::{Endianness, derive_index};
use crate::salt::SaltStore;
use serde::Serialize;
use tracing::debug;

/// Per-area bookkeeping, indexed by area label (slot 0 is reserved;
/// area labels start at 1).
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct AreaCounters {
    /// Elements inserted with this area label
    pub members: usize,
    /// Cells currently holding this label
    pub cells_used: usize,
    /// Hash rounds that landed on a cell already holding this label
    pub self_collisions: usize,
}

/// Result of applying the collision policy to one cell.
///
/// Lower labels are higher priority and win ties: an incoming label
/// overwrites strictly smaller ones, bounces off its own, and is
/// shadowed by larger ones. `Shadowed` is unreachable while elements
/// are inserted in non-decreasing label order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellOutcome {
    /// Cell was empty, label written
    Filled,
    /// Cell held a smaller label, now replaced
    Overwritten { previous: u16 },
    /// Cell already held this label
    SelfCollision,
    /// Cell holds a larger label, nothing written
    Shadowed,
}

/// The collision policy as a pure function of the current cell value
/// and the incoming label, so it can be tested without any storage.
pub fn resolve_cell(current: u16, label: u16) -> CellOutcome {
    if current == 0 {
        CellOutcome::Filled
    } else if current < label {
        CellOutcome::Overwritten { previous: current }
    } else if current == label {
        CellOutcome::SelfCollision
    } else {
        CellOutcome::Shadowed
    }
}

/// A Spatial Bloom filter over `area_count` disjoint labeled sets.
///
/// Where a classical Bloom filter answers "is this element in the
/// set", an SBF answers "which labeled area does this element belong
/// to, if any", from a single fixed-size cell array. Cells hold area
/// labels; on collision the smaller (higher-priority) label survives,
/// so `check` resolves ambiguous cells toward the lowest matching
/// area.
///
/// Self-collision statistics are only meaningful when elements are
/// inserted in non-decreasing order of area label; use
/// [`insert_batch`](Self::insert_batch) to get that ordering for
/// free.
pub struct SpatialBloomFilter {
    pub(crate) config: SbfConfig,
    pub(crate) cells: CellArray,
    pub(crate) areas: Vec<AreaCounters>,
    pub(crate) total_members: usize,
    pub(crate) total_collisions: usize,
    salts: SaltStore,
    endianness: Endianness,
}

impl SpatialBloomFilter {
    /// Creates a filter, loading salts from `config.salt_path` if the
    /// file exists and generating (then persisting) them otherwise.
    pub fn new(config: SbfConfig) -> Result<Self> {
        config.validate()?;
        let salts =
            SaltStore::load_or_create(&config.salt_path, config.hash_count)?;
        Self::with_salts(config, salts)
    }

    /// Creates a filter with an already-materialized salt store,
    /// bypassing salt persistence.
    pub fn with_salts(config: SbfConfig, salts: SaltStore) -> Result<Self> {
        config.validate()?;
        if salts.len() < config.hash_count {
            return Err(SbfError::InvalidConfig(format!(
                "salt store has {} salts, hash_count is {}",
                salts.len(),
                config.hash_count
            )));
        }

        let width = CellWidth::for_area_count(config.area_count);
        let cells = CellArray::new(width, 1usize << config.bit_mapping);
        let areas =
            vec![AreaCounters::default(); config.area_count as usize + 1];
        let endianness = Endianness::detect();

        debug!(
            bit_mapping = config.bit_mapping,
            hash_count = config.hash_count,
            area_count = config.area_count,
            cell_bytes = width.bytes(),
            ?endianness,
            "constructed spatial bloom filter"
        );

        Ok(Self {
            config,
            cells,
            areas,
            total_members: 0,
            total_collisions: 0,
            salts,
            endianness,
        })
    }

    /// Maps one element to `area`. Runs `hash_count` salted hash
    /// rounds, writing the label into each derived cell under the
    /// collision policy.
    ///
    /// Elements must be inserted in non-decreasing order of area label
    /// across the whole construction; otherwise the self-collision
    /// counters (and the statistics derived from them) are not
    /// meaningful. The filter contents themselves stay correct either
    /// way.
    pub fn insert(&mut self, element: &[u8], area: u16) -> Result<()> {
        self.validate_element(element)?;
        if area == 0 || area > self.config.area_count {
            return Err(SbfError::AreaLabelOutOfRange {
                label: area as u32,
                max: self.config.area_count,
            });
        }

        for round in 0..self.config.hash_count {
            let index = derive_index(
                element,
                self.salts.get(round),
                self.config.hash_family,
                self.config.bit_mapping,
                self.endianness,
            );
            self.set_cell(index as usize, area);
        }

        self.total_members += 1;
        self.areas[area as usize].members += 1;
        Ok(())
    }

    /// Inserts a batch of `(area, element)` pairs, sorting by area
    /// label first so the ordering contract on [`insert`](Self::insert)
    /// holds regardless of input order.
    pub fn insert_batch<E: AsRef<[u8]>>(
        &mut self,
        items: &mut [(u16, E)],
    ) -> Result<()> {
        items.sort_by_key(|(area, _)| *area);
        for (area, element) in items.iter() {
            self.insert(element.as_ref(), *area)?;
        }
        Ok(())
    }

    /// Returns the area label the element maps to, or 0 if it belongs
    /// to no area. An element is a member only if every hash round
    /// lands on a non-empty cell; the smallest label seen across
    /// rounds wins.
    pub fn check(&self, element: &[u8]) -> Result<u16> {
        self.validate_element(element)?;

        let mut area = 0u16;
        for round in 0..self.config.hash_count {
            let index = derive_index(
                element,
                self.salts.get(round),
                self.config.hash_family,
                self.config.bit_mapping,
                self.endianness,
            );
            let current = self.cells.read(index as usize);
            if current == 0 {
                return Ok(0);
            }
            if area == 0 || current < area {
                area = current;
            }
        }
        Ok(area)
    }

    fn validate_element(&self, element: &[u8]) -> Result<()> {
        if element.len() > MAX_INPUT_SIZE {
            return Err(SbfError::ElementTooLong {
                size: element.len(),
                max: MAX_INPUT_SIZE,
            });
        }
        Ok(())
    }

    /// Applies the collision policy to one cell and updates the
    /// counters accordingly.
    fn set_cell(&mut self, index: usize, area: u16) {
        match resolve_cell(self.cells.read(index), area) {
            CellOutcome::Filled => {
                self.cells.write(index, area);
                self.areas[area as usize].cells_used += 1;
            }
            CellOutcome::Overwritten { previous } => {
                self.cells.write(index, area);
                self.total_collisions += 1;
                self.areas[area as usize].cells_used += 1;
                self.areas[previous as usize].cells_used -= 1;
            }
            CellOutcome::SelfCollision => {
                self.total_collisions += 1;
                self.areas[area as usize].self_collisions += 1;
            }
            CellOutcome::Shadowed => {
                self.total_collisions += 1;
            }
        }
    }

    // --- accessors -------------------------------------------------

    pub fn config(&self) -> &SbfConfig {
        &self.config
    }

    /// Number of cells in the filter (2^bit_mapping).
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_width(&self) -> CellWidth {
        self.cells.width()
    }

    /// Total size of the backing array in bytes.
    pub fn byte_size(&self) -> usize {
        self.cells.byte_size()
    }

    /// Raw backing bytes, e.g. for homomorphic encryption of the
    /// whole filter.
    pub fn as_bytes(&self) -> &[u8] {
        self.cells.as_bytes()
    }

    /// Decoded labels in cell order.
    pub fn cell_labels(&self) -> impl Iterator<Item = u16> + '_ {
        self.cells.iter()
    }

    pub fn total_members(&self) -> usize {
        self.total_members
    }

    pub fn total_collisions(&self) -> usize {
        self.total_collisions
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Per-area counters, indexed by area label (slot 0 reserved).
    pub fn area_counters(&self) -> &[AreaCounters] {
        &self.areas
    }

    pub fn area_members(&self, area: u16) -> usize {
        self.areas[area as usize].members
    }

    pub fn area_cells(&self, area: u16) -> usize {
        self.areas[area as usize].cells_used
    }

    pub fn area_self_collisions(&self, area: u16) -> usize {
        self.areas[area as usize].self_collisions
    }
}

impl std::fmt::Debug for SpatialBloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SpatialBloomFilter {{ cells: {}, cell_bytes: {}, hash_family: {:?}, \
             hash_count: {}, areas: {}, members: {}, collisions: {} }}",
            self.cell_count(),
            self.cell_width().bytes(),
            self.config.hash_family,
            self.config.hash_count,
            self.config.area_count,
            self.total_members,
            self.total_collisions
        )
    }
}
