//! Paged memory: physical pages, and the 64K map the CPU sees.
//!
//! The address space is split into eight 8K slots. Each slot has a read
//! view and a write view, both holding a [`PageRef`] into the
//! [`PageStore`]. Banking policies rebuild the map; nothing else writes it.

mod map;
mod page;

pub use map::{MemoryMap, View};
pub use page::{PageDescriptor, PageRef, PageStore, PoolSizes, Source};

/// Bytes per page (and per map slot).
pub const PAGE_SIZE: usize = 0x2000;

/// Slots in the 64K address space.
pub const SLOTS: usize = 8;

/// `addr >> PAGE_SHIFT` is the slot index.
pub const PAGE_SHIFT: u32 = 13;
