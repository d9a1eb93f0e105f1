use super::store::PagedStore;
use super::width::{AddrWidth, DataWidth};
use crate::error::MemResult;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

//===========================================================================//

fn next_tag() -> u64 {
    static NEXT_TAG: AtomicU64 = AtomicU64::new(0);
    NEXT_TAG.fetch_add(1, Ordering::Relaxed)
}

/// Unique identifier for a change listener subscribed to a store.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Creates a new [ListenerId] that is different from any other created
    /// so far.
    pub fn create() -> ListenerId {
        ListenerId(next_tag())
    }
}

/// Unique identifier for an editing view that may claim a store.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EditorId(u64);

impl EditorId {
    /// Creates a new [EditorId] that is different from any other created so
    /// far.
    pub fn create() -> EditorId {
        EditorId(next_tag())
    }
}

//===========================================================================//

/// A change to the contents of a store, as reported to listeners.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MemEvent {
    /// The cells starting at `start` now hold `values`.
    Changed {
        /// The first changed address.
        start: u32,
        /// The new contents, one per address.
        values: Vec<u32>,
    },
    /// `len` cells starting at `start` were all set to `value`.
    Filled {
        /// The first changed address.
        start: u32,
        /// The number of cells filled.
        len: u64,
        /// The new contents of every filled cell.
        value: u32,
    },
    /// Every cell in the store was reset to zero.
    Cleared,
}

impl MemEvent {
    /// Returns the first address and number of cells affected by this event,
    /// or `None` if the whole address space was affected.
    pub fn range(&self) -> Option<(u32, u64)> {
        match self {
            MemEvent::Changed { start, values } => {
                Some((*start, values.len() as u64))
            }
            MemEvent::Filled { start, len, .. } => Some((*start, *len)),
            MemEvent::Cleared => None,
        }
    }
}

type Listener = Box<dyn FnMut(&MemEvent) + Send>;

//===========================================================================//

struct Shared {
    addr_width: AddrWidth,
    data_width: DataWidth,
    store: Mutex<PagedStore>,
    // Filled only while `store` is locked, so events queue in mutation order.
    pending: Mutex<VecDeque<MemEvent>>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    editor: Mutex<Option<EditorId>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A handle to a [PagedStore] that may be shared between the simulation and
/// interactive editors.  All mutation goes through this handle, which
/// serializes access and notifies subscribed listeners of each change.
///
/// Listeners are invoked after the store lock has been released, so a
/// listener may read from the store, but must not modify it, nor subscribe
/// or unsubscribe listeners, from within its callback.  Listeners see
/// events in the same order as the changes were made to the store, even
/// when several threads write at once.
#[derive(Clone)]
pub struct SharedStore {
    shared: Arc<Shared>,
}

impl SharedStore {
    /// Returns a handle to a new, all-zero store.
    pub fn new(addr_width: AddrWidth, data_width: DataWidth) -> SharedStore {
        SharedStore {
            shared: Arc::new(Shared {
                addr_width,
                data_width,
                store: Mutex::new(PagedStore::new(addr_width, data_width)),
                pending: Mutex::new(VecDeque::new()),
                listeners: Mutex::new(Vec::new()),
                editor: Mutex::new(None),
            }),
        }
    }

    /// Returns the address width of the store.
    pub fn addr_width(&self) -> AddrWidth {
        self.shared.addr_width
    }

    /// Returns the data width of the store.
    pub fn data_width(&self) -> DataWidth {
        self.shared.data_width
    }

    /// Returns the value stored at `addr`.
    pub fn get(&self, addr: u32) -> MemResult<u32> {
        lock(&self.shared.store).get(addr)
    }

    /// Returns a copy of `len` cells starting at `start`.
    pub fn copy_range(&self, start: u32, len: u64) -> MemResult<Vec<u32>> {
        lock(&self.shared.store).copy_range(start, len)
    }

    /// Stores `value` at `addr`, notifying listeners if the cell changed.
    pub fn set(&self, addr: u32, value: u32) -> MemResult<bool> {
        let value = value & self.data_width().mask();
        let mut store = lock(&self.shared.store);
        let changed = store.set(addr, value)?;
        if changed {
            self.queue(MemEvent::Changed { start: addr, values: vec![value] });
            drop(store);
            self.notify();
        }
        Ok(changed)
    }

    /// Stores `values` at consecutive addresses starting with `start`,
    /// notifying listeners if any cell changed.
    pub fn set_range(&self, start: u32, values: &[u32]) -> MemResult<bool> {
        let mut store = lock(&self.shared.store);
        let changed = store.set_range(start, values)?;
        if changed {
            let mask = self.data_width().mask();
            let values = values.iter().map(|&value| value & mask).collect();
            self.queue(MemEvent::Changed { start, values });
            drop(store);
            self.notify();
        }
        Ok(changed)
    }

    /// Sets `len` cells starting at `start` to `value`, notifying listeners
    /// if any cell changed.
    pub fn fill(&self, start: u32, len: u64, value: u32) -> MemResult<bool> {
        let value = value & self.data_width().mask();
        let mut store = lock(&self.shared.store);
        let changed = store.fill(start, len, value)?;
        if changed {
            self.queue(MemEvent::Filled { start, len, value });
            drop(store);
            self.notify();
        }
        Ok(changed)
    }

    /// Resets every cell to zero, notifying listeners if anything changed.
    pub fn clear(&self) -> bool {
        let mut store = lock(&self.shared.store);
        let changed = store.clear_all();
        if changed {
            self.queue(MemEvent::Cleared);
            drop(store);
            self.notify();
        }
        changed
    }

    /// Calls `func` with read access to the underlying store, holding the
    /// store lock for the duration of the call.
    pub fn with_store<R>(&self, func: impl FnOnce(&PagedStore) -> R) -> R {
        let store = lock(&self.shared.store);
        func(&store)
    }

    /// Returns true if any cell has changed since the store was last marked
    /// clean.
    pub fn is_dirty(&self) -> bool {
        lock(&self.shared.store).is_dirty()
    }

    /// Marks the store as matching its last loaded or saved image.
    pub fn mark_clean(&self) {
        lock(&self.shared.store).mark_clean();
    }

    /// Registers a function to be called after each change to the store.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&MemEvent) + Send + 'static,
    {
        let id = ListenerId::create();
        lock(&self.shared.listeners).push((id, Box::new(listener)));
        id
    }

    /// Removes a previously subscribed listener.  Returns false if no such
    /// listener was subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.shared.listeners);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Claims the right to make interactive edits to this store.  Returns
    /// true if `editor` now holds the claim (including if it already did).
    pub fn try_claim_editor(&self, editor: EditorId) -> bool {
        let mut current = lock(&self.shared.editor);
        match *current {
            Some(holder) => holder == editor,
            None => {
                *current = Some(editor);
                true
            }
        }
    }

    /// Gives up the edit claim, if `editor` holds it.
    pub fn release_editor(&self, editor: EditorId) {
        let mut current = lock(&self.shared.editor);
        if *current == Some(editor) {
            *current = None;
        }
    }

    /// Returns the editor currently holding the edit claim, if any.
    pub fn editor(&self) -> Option<EditorId> {
        *lock(&self.shared.editor)
    }

    /// Returns a weak handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakStore {
        WeakStore { shared: Arc::downgrade(&self.shared) }
    }

    /// Returns true if both handles refer to the same store.
    pub fn ptr_eq(&self, other: &SharedStore) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Must be called with the store lock held.
    fn queue(&self, event: MemEvent) {
        lock(&self.shared.pending).push_back(event);
    }

    fn next_pending(&self) -> Option<MemEvent> {
        lock(&self.shared.pending).pop_front()
    }

    /// Delivers every queued event, oldest first.  Whichever writer holds
    /// the listener lock drains the queue on behalf of all of them.
    fn notify(&self) {
        let mut listeners = lock(&self.shared.listeners);
        while let Some(event) = self.next_pending() {
            log::trace!("store changed: {event:?}");
            for (_, listener) in listeners.iter_mut() {
                listener(&event);
            }
        }
    }
}

//===========================================================================//

/// A non-owning reference to a [SharedStore].
#[derive(Clone)]
pub struct WeakStore {
    shared: Weak<Shared>,
}

impl WeakStore {
    /// Returns a strong handle to the store, or `None` if it has been
    /// dropped.
    pub fn upgrade(&self) -> Option<SharedStore> {
        self.shared.upgrade().map(|shared| SharedStore { shared })
    }
}

//===========================================================================//


//===========================================================================//
