//! Core primitives for the PinkLock TVL indexer.
//!
//! Everything in here is free of I/O: lock and valuation records, the fixed-point
//! valuation math, page and block window arithmetic, and the checkpoint key namespace.

/// Checkpoint key namespace
pub mod checkpoint;
/// Lock records, events and valuation entries
pub mod lock;
/// Fixed-size page arithmetic
pub mod paging;
/// Fixed-point reserve valuation
pub mod valuation;
/// Block window selection for incremental log scans
pub mod window;

pub use checkpoint::CheckpointKey;
pub use lock::{
    CumulativeLock, LockInfo, LockKind, LockRecord, LockRemovedEvent, LockVersion,
    LockVestedEvent, TvlEntry,
};
pub use paging::PageRange;
pub use window::BlockWindow;
