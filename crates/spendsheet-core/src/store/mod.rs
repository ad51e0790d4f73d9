//! Record store and synchronization policy.
//!
//! `SyncedStore` owns a page's record list and keeps the local cache and the
//! remote sheet in step with it; `WriteQueue` is the background writer it
//! uses for the remote side.

pub mod sync;
pub mod writer;

pub use sync::{LoadOutcome, LoadSource, SyncedStore};
pub use writer::{SyncEvent, WriteQueue};
