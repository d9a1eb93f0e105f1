use super::page::{PAGE_BITS, Page};
use super::width::{AddrWidth, DataWidth};
use crate::error::{MemError, MemResult};
use std::collections::BTreeMap;

//===========================================================================//

/// A sparse memory array.  The address space is divided into fixed-size
/// pages, and a page is only allocated once a non-zero value is written to
/// it; unallocated pages read as zero.
#[derive(Clone, Debug)]
pub struct PagedStore {
    addr_width: AddrWidth,
    data_width: DataWidth,
    page_bits: u32,
    pages: BTreeMap<u32, Page>,
    // Set when allocated pages are dropped (e.g. by a clear), since the
    // dropped pages can no longer carry their own dirty flags.
    dropped_dirty: bool,
}

impl PagedStore {
    /// Returns a new, all-zero store with the given widths.
    pub fn new(addr_width: AddrWidth, data_width: DataWidth) -> PagedStore {
        PagedStore {
            addr_width,
            data_width,
            page_bits: PAGE_BITS.min(addr_width.bits()),
            pages: BTreeMap::new(),
            dropped_dirty: false,
        }
    }

    /// Returns the address width of this store.
    pub fn addr_width(&self) -> AddrWidth {
        self.addr_width
    }

    /// Returns the data width of this store.
    pub fn data_width(&self) -> DataWidth {
        self.data_width
    }

    /// Returns the number of cells in each page.
    pub fn page_cells(&self) -> usize {
        1 << self.page_bits
    }

    /// Returns the number of pages that are currently allocated.
    pub fn allocated_pages(&self) -> usize {
        self.pages.len()
    }

    /// Returns the value stored at `addr`.  Never allocates.
    pub fn get(&self, addr: u32) -> MemResult<u32> {
        self.check_range(addr.into(), 1)?;
        let (index, offset) = self.split(addr);
        Ok(self.pages.get(&index).map_or(0, |page| page.get(offset)))
    }

    /// Stores `value`, masked to the data width, at `addr`.  Returns true if
    /// the stored value changed.
    pub fn set(&mut self, addr: u32, value: u32) -> MemResult<bool> {
        self.check_range(addr.into(), 1)?;
        Ok(self.set_unchecked(addr, value & self.data_width.mask()))
    }

    /// Stores `values` at consecutive addresses starting with `start`.  The
    /// whole range is checked before any cell is written.  Returns true if
    /// any stored value changed.
    pub fn set_range(
        &mut self,
        start: u32,
        values: &[u32],
    ) -> MemResult<bool> {
        self.check_range(start.into(), values.len() as u64)?;
        let mask = self.data_width.mask();
        let mut changed = false;
        for (addr, &value) in (start..).zip(values) {
            changed |= self.set_unchecked(addr, value & mask);
        }
        Ok(changed)
    }

    /// Sets `len` cells starting at `start` to `value`.  Filling with zero
    /// releases every page that the range covers completely.  Returns true
    /// if any stored value changed.
    pub fn fill(
        &mut self,
        start: u32,
        len: u64,
        value: u32,
    ) -> MemResult<bool> {
        self.check_range(start.into(), len)?;
        let value = value & self.data_width.mask();
        let page_cells = self.page_cells() as u64;
        let end = u64::from(start) + len;
        let mut addr = u64::from(start);
        let mut changed = false;
        while addr < end {
            let index = (addr >> self.page_bits) as u32;
            let page_start = u64::from(index) << self.page_bits;
            let page_end = (page_start + page_cells).min(end);
            let first = (addr - page_start) as usize;
            let last = (page_end - page_start) as usize;
            if value == 0 && first == 0 && last == page_cells as usize {
                if let Some(page) = self.pages.remove(&index) {
                    if !page.is_blank() {
                        changed = true;
                        self.dropped_dirty = true;
                    }
                }
            } else if value != 0 || self.pages.contains_key(&index) {
                let len = self.page_cells();
                let page =
                    self.pages.entry(index).or_insert_with(|| Page::new(len));
                for offset in first..last {
                    changed |= page.set(offset, value);
                }
            }
            addr = page_end;
        }
        Ok(changed)
    }

    /// Releases every page, returning the store to all zeros.  Returns true
    /// if any stored value changed.
    pub fn clear_all(&mut self) -> bool {
        let changed = self.pages.values().any(|page| !page.is_blank());
        self.dropped_dirty |= changed;
        self.pages.clear();
        changed
    }

    /// Returns a copy of `len` cells starting at `start`.  Unallocated pages
    /// within the range read as zero and stay unallocated.
    pub fn copy_range(&self, start: u32, len: u64) -> MemResult<Vec<u32>> {
        self.check_range(start.into(), len)?;
        let page_cells = self.page_cells() as u64;
        let end = u64::from(start) + len;
        let mut values = Vec::with_capacity(len as usize);
        let mut addr = u64::from(start);
        while addr < end {
            let index = (addr >> self.page_bits) as u32;
            let page_start = u64::from(index) << self.page_bits;
            let page_end = (page_start + page_cells).min(end);
            let first = (addr - page_start) as usize;
            let last = (page_end - page_start) as usize;
            match self.pages.get(&index) {
                Some(page) => {
                    values.extend_from_slice(&page.cells()[first..last])
                }
                None => values.resize(values.len() + (last - first), 0),
            }
            addr = page_end;
        }
        Ok(values)
    }

    /// Returns the allocated pages in ascending address order, as pairs of
    /// (first address of page, page contents).
    pub fn pages(&self) -> impl Iterator<Item = (u32, &[u32])> + '_ {
        self.pages
            .iter()
            .map(|(&index, page)| (index << self.page_bits, page.cells()))
    }

    /// Returns the first address of each page modified since the last call
    /// to [`PagedStore::mark_clean`].
    pub fn dirty_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages
            .iter()
            .filter(|(_, page)| page.is_dirty())
            .map(|(&index, _)| index << self.page_bits)
    }

    /// Returns true if any cell has changed since the last call to
    /// [`PagedStore::mark_clean`].
    pub fn is_dirty(&self) -> bool {
        self.dropped_dirty || self.pages.values().any(Page::is_dirty)
    }

    /// Clears the dirty state of the store and all of its pages.
    pub fn mark_clean(&mut self) {
        self.dropped_dirty = false;
        for page in self.pages.values_mut() {
            page.mark_clean();
        }
    }

    fn split(&self, addr: u32) -> (u32, usize) {
        let offset = (addr as usize) & (self.page_cells() - 1);
        (addr >> self.page_bits, offset)
    }

    fn check_range(&self, start: u64, len: u64) -> MemResult<()> {
        let limit = self.addr_width.cells();
        let in_range = match start.checked_add(len) {
            Some(end) => end <= limit && (start < limit || len == 0),
            None => false,
        };
        if in_range {
            Ok(())
        } else {
            Err(MemError::OutOfRange { start, len, limit })
        }
    }

    fn set_unchecked(&mut self, addr: u32, value: u32) -> bool {
        let (index, offset) = self.split(addr);
        match self.pages.get_mut(&index) {
            Some(page) => page.set(offset, value),
            None if value == 0 => false,
            None => {
                let mut page = Page::new(self.page_cells());
                page.set(offset, value);
                self.pages.insert(index, page);
                true
            }
        }
    }
}

//===========================================================================//


//===========================================================================//
