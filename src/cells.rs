/// Width of a single cell, fixed at construction from the number of
/// areas: one byte covers labels up to 255, two bytes up to 65535.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellWidth {
    One,
    Two,
}

impl CellWidth {
    pub fn for_area_count(area_count: u16) -> Self {
        if area_count <= 255 {
            CellWidth::One
        } else {
            CellWidth::Two
        }
    }

    /// Size of one cell in bytes.
    pub fn bytes(&self) -> usize {
        match self {
            CellWidth::One => 1,
            CellWidth::Two => 2,
        }
    }

    /// Largest label representable at this width.
    pub fn max_label(&self) -> u16 {
        match self {
            CellWidth::One => u8::MAX as u16,
            CellWidth::Two => u16::MAX,
        }
    }
}

/// The backing cell array: a contiguous zero-initialized byte buffer
/// holding one area label per cell. Two-byte cells are stored
/// most-significant byte first regardless of host byte order, so a
/// raw dump of the buffer is portable.
#[derive(Clone, Debug)]
pub enum CellArray {
    Narrow(Vec<u8>),
    Wide(Vec<u8>),
}

impl CellArray {
    pub fn new(width: CellWidth, cells: usize) -> Self {
        match width {
            CellWidth::One => CellArray::Narrow(vec![0u8; cells]),
            CellWidth::Two => CellArray::Wide(vec![0u8; cells * 2]),
        }
    }

    pub fn width(&self) -> CellWidth {
        match self {
            CellArray::Narrow(_) => CellWidth::One,
            CellArray::Wide(_) => CellWidth::Two,
        }
    }

    /// Number of cells (not bytes).
    pub fn len(&self) -> usize {
        match self {
            CellArray::Narrow(bytes) => bytes.len(),
            CellArray::Wide(bytes) => bytes.len() / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the backing buffer in bytes.
    pub fn byte_size(&self) -> usize {
        match self {
            CellArray::Narrow(bytes) | CellArray::Wide(bytes) => bytes.len(),
        }
    }

    /// Raw backing bytes, e.g. for encryption of the whole filter.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            CellArray::Narrow(bytes) | CellArray::Wide(bytes) => bytes,
        }
    }

    pub fn read(&self, index: usize) -> u16 {
        match self {
            CellArray::Narrow(bytes) => bytes[index] as u16,
            CellArray::Wide(bytes) => {
                ((bytes[2 * index] as u16) << 8) | bytes[2 * index + 1] as u16
            }
        }
    }

    /// Stores `label` at `index`. Labels beyond the active width are a
    /// caller contract violation and leave the cell untouched.
    pub fn write(&mut self, index: usize, label: u16) {
        match self {
            CellArray::Narrow(bytes) => {
                if label > u8::MAX as u16 {
                    debug_assert!(false, "label {label} exceeds 1-byte cell");
                    return;
                }
                bytes[index] = label as u8;
            }
            CellArray::Wide(bytes) => {
                bytes[2 * index] = (label >> 8) as u8;
                bytes[2 * index + 1] = label as u8;
            }
        }
    }

    /// Iterates over decoded labels in cell order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.len()).map(move |index| self.read(index))
    }
}
