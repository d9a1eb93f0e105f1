//! Facilities for inspecting and editing a memory device's contents
//! interactively, outside of the simulation.

use crate::device::MemDevice;
use crate::error::{MemError, MemResult};
use crate::mem::{EditorId, ListenerId, MemEvent, SharedStore, WeakStore};

//===========================================================================//

/// An interactive view of one device's memory.
///
/// The view holds only a weak reference to the device's store, so it never
/// keeps the memory alive; once the device is gone (or its widths change,
/// which replaces its store), every operation fails with
/// [`MemError::Detached`].  Edits made through the view bypass chip-select
/// and propagation delay, but go through the same store entry point as
/// simulated writes, and are ordered against them by the store lock.
///
/// Any number of views may read the same store, but only one at a time may
/// edit it.  A view claims the store on its first write and keeps the claim
/// until [`LiveEditState::release`] is called or the view is dropped.
pub struct LiveEditState {
    store: WeakStore,
    id: EditorId,
    cursor: Option<u32>,
    dirty: bool,
}

impl LiveEditState {
    /// Returns a new view of the given device's memory.
    pub fn new(device: &MemDevice) -> LiveEditState {
        LiveEditState::for_store(device.store())
    }

    /// Returns a new view of the given store.
    pub fn for_store(store: &SharedStore) -> LiveEditState {
        LiveEditState {
            store: store.downgrade(),
            id: EditorId::create(),
            cursor: None,
            dirty: false,
        }
    }

    fn store(&self) -> MemResult<SharedStore> {
        self.store.upgrade().ok_or(MemError::Detached)
    }

    /// Returns true if the memory this view is bound to still exists.
    pub fn is_attached(&self) -> bool {
        self.store.upgrade().is_some()
    }

    /// Returns the value stored at `addr`.
    pub fn read(&self, addr: u32) -> MemResult<u32> {
        self.store()?.get(addr)
    }

    /// Returns `len` cells starting at `start`, for display.
    pub fn window(&self, start: u32, len: u64) -> MemResult<Vec<u32>> {
        self.store()?.copy_range(start, len)
    }

    /// Stores `value` at `addr`, claiming the store for editing if no other
    /// view holds the claim.  Returns true if the stored value changed.
    pub fn write(&mut self, addr: u32, value: u32) -> MemResult<bool> {
        let store = self.store()?;
        if !store.try_claim_editor(self.id) {
            return Err(MemError::EditorBusy);
        }
        let changed = store.set(addr, value)?;
        self.dirty |= changed;
        Ok(changed)
    }

    /// Returns true if this view currently holds the edit claim.
    pub fn is_editing(&self) -> bool {
        match self.store.upgrade() {
            Some(store) => store.editor() == Some(self.id),
            None => false,
        }
    }

    /// Gives up the edit claim, so that another view may edit.
    pub fn release(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.release_editor(self.id);
        }
    }

    /// Returns the address currently selected for editing, if any.
    pub fn cursor(&self) -> Option<u32> {
        self.cursor
    }

    /// Selects an address for editing, or clears the selection.
    pub fn set_cursor(&mut self, cursor: Option<u32>) -> MemResult<()> {
        if let Some(addr) = cursor {
            let addr_width = self.store()?.addr_width();
            if addr > addr_width.max_addr() {
                return Err(MemError::OutOfRange {
                    start: addr.into(),
                    len: 1,
                    limit: addr_width.cells(),
                });
            }
        }
        self.cursor = cursor;
        Ok(())
    }

    /// Handles a key typed while the view has focus.  A hex digit shifts
    /// into the low end of the value at the cursor, backspace shifts the
    /// value back out, and space or enter advances the cursor, wrapping at
    /// the end of memory.  Returns false if the key was ignored.
    pub fn key_typed(&mut self, key: char) -> MemResult<bool> {
        let Some(addr) = self.cursor else {
            return Ok(false);
        };
        let store = self.store()?;
        match key {
            ' ' | '\n' | '\r' => {
                let max_addr = store.addr_width().max_addr();
                let next = if addr >= max_addr { 0 } else { addr + 1 };
                self.cursor = Some(next);
            }
            '\u{8}' => {
                let value = store.get(addr)?;
                self.write(addr, value >> 4)?;
            }
            _ => match key.to_digit(16) {
                Some(digit) => {
                    let value = store.get(addr)?;
                    self.write(addr, (value << 4) | digit)?;
                }
                None => return Ok(false),
            },
        }
        Ok(true)
    }

    /// Returns true if this view has changed the contents since it was
    /// created or last marked clean.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears this view's dirty flag.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Registers a function to be called after each change to the memory,
    /// whether made by this view, another view, or the simulation.
    pub fn subscribe<F>(&self, listener: F) -> MemResult<ListenerId>
    where
        F: FnMut(&MemEvent) + Send + 'static,
    {
        Ok(self.store()?.subscribe(listener))
    }

    /// Removes a previously subscribed listener.
    pub fn unsubscribe(&self, id: ListenerId) -> MemResult<bool> {
        Ok(self.store()?.unsubscribe(id))
    }
}

impl Drop for LiveEditState {
    fn drop(&mut self) {
        self.release();
    }
}

//===========================================================================//


//===========================================================================//
