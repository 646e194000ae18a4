//! The CPU-visible memory map.

use super::{PAGE_SHIFT, PAGE_SIZE, PageRef, SLOTS};

/// Which half of the map a mapping applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Read,
    Write,
    Both,
}

/// Eight slots, each with an independent read and write page.
///
/// Read and write views differ when, for example, ROM is visible for reads
/// while writes to the same addresses must go nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMap {
    read: [PageRef; SLOTS],
    write: [PageRef; SLOTS],
}

impl MemoryMap {
    /// A map with every slot unmapped.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            read: [PageRef::UNMAPPED; SLOTS],
            write: [PageRef::UNMAPPED; SLOTS],
        }
    }

    /// Slot index for an address. Identical for every model.
    #[must_use]
    pub const fn slot(addr: u16) -> usize {
        (addr >> PAGE_SHIFT) as usize
    }

    /// Offset of an address within its page.
    #[must_use]
    pub const fn offset(addr: u16) -> usize {
        addr as usize & (PAGE_SIZE - 1)
    }

    /// Page and offset for a read at `addr`.
    #[must_use]
    pub const fn map_read(&self, addr: u16) -> (PageRef, usize) {
        (self.read[Self::slot(addr)], Self::offset(addr))
    }

    /// Page and offset for a write at `addr`.
    #[must_use]
    pub const fn map_write(&self, addr: u16) -> (PageRef, usize) {
        (self.write[Self::slot(addr)], Self::offset(addr))
    }

    /// Install `page` at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is 8 or more.
    pub fn set_mapping(&mut self, slot: usize, page: PageRef, view: View) {
        match view {
            View::Read => self.read[slot] = page,
            View::Write => self.write[slot] = page,
            View::Both => {
                self.read[slot] = page;
                self.write[slot] = page;
            }
        }
    }

    /// Map a 16K RAM bank into a 16K window (0-3), both views.
    pub fn map_ram_bank(&mut self, window: usize, bank: u8) {
        self.set_mapping(window * 2, PageRef::ram_bank(bank, 0), View::Both);
        self.set_mapping(window * 2 + 1, PageRef::ram_bank(bank, 1), View::Both);
    }

    /// Map a 16K ROM (two consecutive ROM pages) into a 16K window, both
    /// views. Writes reach the ROM page and are absorbed there.
    pub fn map_rom(&mut self, window: usize, rom: u8) {
        let first = u16::from(rom) * 2;
        self.set_mapping(window * 2, PageRef::rom(first), View::Both);
        self.set_mapping(window * 2 + 1, PageRef::rom(first + 1), View::Both);
    }

    #[must_use]
    pub const fn read_slots(&self) -> &[PageRef; SLOTS] {
        &self.read
    }

    #[must_use]
    pub const fn write_slots(&self) -> &[PageRef; SLOTS] {
        &self.write
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry per slot: the read page, then `/` and the write page when the
/// views differ.
impl std::fmt::Display for MemoryMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (slot, (read, write)) in self.read.iter().zip(&self.write).enumerate() {
            if slot > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{read}")?;
            if read != write {
                write!(f, "/{write}")?;
            }
        }
        Ok(())
    }
}
