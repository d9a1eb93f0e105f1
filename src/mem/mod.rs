//! Facilities for storing the contents of a sparse, paged memory array.

mod page;
mod shared;
mod store;
mod width;

pub use page::PAGE_BITS;
pub use shared::{EditorId, ListenerId, MemEvent, SharedStore, WeakStore};
pub use store::PagedStore;
pub use width::{AddrWidth, DataWidth};

//===========================================================================//
