//! Physical memory pages and the store that owns them.

use serde::{Deserialize, Serialize};

use super::PAGE_SIZE;

/// Where a page's backing storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Rom,
    Ram,
    /// Timex dock (cartridge) bank.
    Dock,
    /// Timex extension ROM bank.
    Exrom,
    /// Nothing decoded: reads float high, writes vanish.
    Unmapped,
}

/// Index-based reference to a page: which pool, and which page in it.
///
/// The memory map stores these rather than pointers, so a bank switch can
/// never leave a slot referring to storage that has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRef {
    pub source: Source,
    pub page_num: u16,
}

impl PageRef {
    pub const UNMAPPED: Self = Self {
        source: Source::Unmapped,
        page_num: 0,
    };

    #[must_use]
    pub const fn rom(page_num: u16) -> Self {
        Self {
            source: Source::Rom,
            page_num,
        }
    }

    #[must_use]
    pub const fn ram(page_num: u16) -> Self {
        Self {
            source: Source::Ram,
            page_num,
        }
    }

    #[must_use]
    pub const fn dock(page_num: u16) -> Self {
        Self {
            source: Source::Dock,
            page_num,
        }
    }

    #[must_use]
    pub const fn exrom(page_num: u16) -> Self {
        Self {
            source: Source::Exrom,
            page_num,
        }
    }

    /// One half of a 16K RAM bank. `half` 0 is the lower 8K.
    #[must_use]
    pub const fn ram_bank(bank: u8, half: u8) -> Self {
        Self::ram(bank as u16 * 2 + half as u16)
    }
}

impl std::fmt::Display for PageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.source {
            Source::Rom => write!(f, "rom:{}", self.page_num),
            Source::Ram => write!(f, "ram:{}", self.page_num),
            Source::Dock => write!(f, "dock:{}", self.page_num),
            Source::Exrom => write!(f, "exrom:{}", self.page_num),
            Source::Unmapped => write!(f, "unmapped"),
        }
    }
}

/// An 8K block of backing storage plus its metadata.
pub struct PageDescriptor {
    data: Box<[u8; PAGE_SIZE]>,
    pub source: Source,
    pub page_num: u16,
    /// Accesses are subject to ULA contention.
    pub contended: bool,
    /// CPU writes land here. Writes to a read-only page are absorbed.
    pub writable: bool,
}

impl PageDescriptor {
    fn new(source: Source, page_num: u16, writable: bool) -> Self {
        Self {
            data: Box::new([0; PAGE_SIZE]),
            source,
            page_num,
            contended: false,
            writable,
        }
    }

    #[must_use]
    pub fn page_ref(&self) -> PageRef {
        PageRef {
            source: self.source,
            page_num: self.page_num,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }
}

/// Page counts for each pool, fixed per machine model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSizes {
    pub rom: u16,
    pub ram: u16,
    pub dock: u16,
    pub exrom: u16,
}

/// Owner of every page a machine has. Pages are created once and live as
/// long as the store; reset clears content, never storage.
pub struct PageStore {
    rom: Vec<PageDescriptor>,
    ram: Vec<PageDescriptor>,
    dock: Vec<PageDescriptor>,
    exrom: Vec<PageDescriptor>,
    unmapped: PageDescriptor,
}

impl PageStore {
    #[must_use]
    pub fn new(sizes: PoolSizes) -> Self {
        let pool = |source, count: u16, writable| -> Vec<PageDescriptor> {
            (0..count)
                .map(|n| PageDescriptor::new(source, n, writable))
                .collect()
        };
        let mut unmapped = PageDescriptor::new(Source::Unmapped, 0, false);
        unmapped.fill(0xFF);
        Self {
            rom: pool(Source::Rom, sizes.rom, false),
            ram: pool(Source::Ram, sizes.ram, true),
            dock: pool(Source::Dock, sizes.dock, false),
            exrom: pool(Source::Exrom, sizes.exrom, false),
            unmapped,
        }
    }

    #[must_use]
    pub fn sizes(&self) -> PoolSizes {
        PoolSizes {
            rom: self.rom.len() as u16,
            ram: self.ram.len() as u16,
            dock: self.dock.len() as u16,
            exrom: self.exrom.len() as u16,
        }
    }

    /// Resolve a reference. References outside a pool resolve to the
    /// unmapped page, so lookups are total.
    #[must_use]
    pub fn page(&self, page: PageRef) -> &PageDescriptor {
        self.pool(page.source)
            .get(usize::from(page.page_num))
            .unwrap_or(&self.unmapped)
    }

    /// Mutable access to a real page. `None` for the unmapped page.
    pub fn page_mut(&mut self, page: PageRef) -> Option<&mut PageDescriptor> {
        self.pool_mut(page.source)
            .get_mut(usize::from(page.page_num))
    }

    #[must_use]
    pub fn pool(&self, source: Source) -> &[PageDescriptor] {
        match source {
            Source::Rom => &self.rom,
            Source::Ram => &self.ram,
            Source::Dock => &self.dock,
            Source::Exrom => &self.exrom,
            Source::Unmapped => std::slice::from_ref(&self.unmapped),
        }
    }

    /// Mutable pool. The unmapped page is deliberately not reachable here.
    pub fn pool_mut(&mut self, source: Source) -> &mut [PageDescriptor] {
        match source {
            Source::Rom => &mut self.rom,
            Source::Ram => &mut self.ram,
            Source::Dock => &mut self.dock,
            Source::Exrom => &mut self.exrom,
            Source::Unmapped => &mut [],
        }
    }

    /// Copy `bytes` into consecutive pages of `source` starting at
    /// `first_page`. Returns the number of bytes actually stored; anything
    /// past the end of the pool is dropped.
    pub fn load(&mut self, source: Source, first_page: u16, bytes: &[u8]) -> usize {
        let mut stored = 0;
        let pages = self
            .pool_mut(source)
            .iter_mut()
            .skip(usize::from(first_page));
        for (page, chunk) in pages.zip(bytes.chunks(PAGE_SIZE)) {
            page.data_mut()[..chunk.len()].copy_from_slice(chunk);
            stored += chunk.len();
        }
        stored
    }

    /// Fill every page of a pool with `value`.
    pub fn fill_pool(&mut self, source: Source, value: u8) {
        for page in self.pool_mut(source) {
            page.fill(value);
        }
    }

    /// Set `writable` on every page of a pool.
    pub fn set_pool_writable(&mut self, source: Source, writable: bool) {
        for page in self.pool_mut(source) {
            page.writable = writable;
        }
    }

    /// Flag the pages backing the given 16K RAM banks as contended and
    /// every other page in every pool as uncontended.
    pub fn set_contended_banks(&mut self, banks: &[u8]) {
        for source in [Source::Rom, Source::Ram, Source::Dock, Source::Exrom] {
            for page in self.pool_mut(source) {
                page.contended = source == Source::Ram
                    && banks.iter().any(|&b| u16::from(b) == page.page_num / 2);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PageStore {
        PageStore::new(PoolSizes {
            rom: 4,
            ram: 16,
            dock: 8,
            exrom: 8,
        })
    }

    #[test]
    fn ram_bank_pages() {
        assert_eq!(PageRef::ram_bank(5, 0), PageRef::ram(10));
        assert_eq!(PageRef::ram_bank(5, 1), PageRef::ram(11));
        assert_eq!(PageRef::ram_bank(0, 1), PageRef::ram(1));
    }

    #[test]
    fn out_of_range_resolves_to_unmapped() {
        let store = store();
        let page = store.page(PageRef::ram(99));
        assert_eq!(page.source, Source::Unmapped);
        assert_eq!(page.data()[0], 0xFF);
        assert!(!page.writable);
    }

    #[test]
    fn unmapped_page_is_not_mutable() {
        let mut store = store();
        assert!(store.page_mut(PageRef::UNMAPPED).is_none());
        assert!(store.pool_mut(Source::Unmapped).is_empty());
    }

    #[test]
    fn load_spans_pages() {
        let mut store = store();
        let image: Vec<u8> = (0..0x4000u32).map(|i| (i >> 8) as u8).collect();
        assert_eq!(store.load(Source::Rom, 2, &image), 0x4000);
        assert_eq!(store.page(PageRef::rom(2)).data()[0x100], 0x01);
        assert_eq!(store.page(PageRef::rom(3)).data()[0x100], 0x21);
        assert_eq!(store.page(PageRef::rom(0)).data()[0x100], 0x00);
    }

    #[test]
    fn load_past_pool_end_is_truncated() {
        let mut store = store();
        assert_eq!(store.load(Source::Rom, 3, &[0xAA; 0x4000]), PAGE_SIZE);
    }

    #[test]
    fn contended_banks_flag_both_halves() {
        let mut store = store();
        store.set_contended_banks(&[1, 5]);
        assert!(store.page(PageRef::ram_bank(1, 0)).contended);
        assert!(store.page(PageRef::ram_bank(1, 1)).contended);
        assert!(store.page(PageRef::ram_bank(5, 1)).contended);
        assert!(!store.page(PageRef::ram_bank(2, 0)).contended);
        assert!(!store.page(PageRef::rom(1)).contended);
        assert!(!store.page(PageRef::dock(2)).contended);
    }

    #[test]
    fn pool_defaults() {
        let store = store();
        assert!(store.page(PageRef::ram(0)).writable);
        assert!(!store.page(PageRef::rom(0)).writable);
        assert!(!store.page(PageRef::dock(0)).writable);
        assert_eq!(store.page(PageRef::ram(3)).page_ref(), PageRef::ram(3));
    }
}
