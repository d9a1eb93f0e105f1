/// log2 of the number of cells in a full-size page.
pub const PAGE_BITS: u32 = 12;

//===========================================================================//

/// A fixed-size block of memory cells, allocated the first time any cell
/// within it is written.
#[derive(Clone, Debug)]
pub(crate) struct Page {
    cells: Box<[u32]>,
    dirty: bool,
}

impl Page {
    /// Returns a new all-zero page with `len` cells.
    pub fn new(len: usize) -> Page {
        Page { cells: vec![0u32; len].into_boxed_slice(), dirty: false }
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn get(&self, offset: usize) -> u32 {
        self.cells[offset]
    }

    /// Stores `value` at `offset` and returns true if the cell changed.
    pub fn set(&mut self, offset: usize, value: u32) -> bool {
        let cell = &mut self.cells[offset];
        if *cell == value {
            false
        } else {
            *cell = value;
            self.dirty = true;
            true
        }
    }

    /// Returns true if every cell on this page is zero.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&cell| cell == 0)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

//===========================================================================//


//===========================================================================//
