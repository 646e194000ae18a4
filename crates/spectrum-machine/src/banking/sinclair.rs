//! Sinclair-era banking: the fixed 16K/48K layouts and the 128K $7FFD port
//! (also used by the +2 and the Pentagon).

use super::{BankingPolicy, BankingState, is_port_7ffd, map_128k, map_48k, write_7ffd};
use crate::contention::ContentionModel;
use crate::memory::{MemoryMap, PageRef, PoolSizes, View};

/// 16K and 48K machines. No paging ports.
#[derive(Debug, Clone, Copy)]
pub struct Sinclair48 {
    /// Only the 16K of RAM at $4000 is fitted; $8000-$FFFF float.
    ram_16k: bool,
}

impl Sinclair48 {
    #[must_use]
    pub const fn spectrum_16k() -> Self {
        Self { ram_16k: true }
    }

    #[must_use]
    pub const fn spectrum_48k() -> Self {
        Self { ram_16k: false }
    }
}

impl BankingPolicy for Sinclair48 {
    fn name(&self) -> &'static str {
        if self.ram_16k { "Spectrum 16K" } else { "Spectrum 48K" }
    }

    fn pools(&self) -> PoolSizes {
        // Bank numbering follows the 128K so bank 5 is always the screen.
        PoolSizes {
            rom: 2,
            ram: 12,
            dock: 0,
            exrom: 0,
        }
    }

    fn contention(&self) -> ContentionModel {
        ContentionModel::SPECTRUM_48K
    }

    fn contended_banks(&self) -> &'static [u8] {
        &[5]
    }

    fn port_write(&self, _state: &mut BankingState, _port: u16, _value: u8) -> bool {
        false
    }

    fn recompute(&self, _state: &BankingState, map: &mut MemoryMap) {
        map_48k(map);
        if self.ram_16k {
            for slot in 4..8 {
                map.set_mapping(slot, PageRef::UNMAPPED, View::Both);
            }
        }
    }
}

/// 128K, +2 and Pentagon 128: $7FFD selects ROM, screen and the bank at
/// $C000. The Pentagon differs only in timing.
#[derive(Debug, Clone, Copy)]
pub struct Paged128 {
    timing: ContentionModel,
}

impl Paged128 {
    #[must_use]
    pub const fn new(timing: ContentionModel) -> Self {
        Self { timing }
    }
}

impl BankingPolicy for Paged128 {
    fn name(&self) -> &'static str {
        if self.timing.pattern.is_none() { "Pentagon 128" } else { "Spectrum 128K" }
    }

    fn pools(&self) -> PoolSizes {
        PoolSizes {
            rom: 4,
            ram: 16,
            dock: 0,
            exrom: 0,
        }
    }

    fn contention(&self) -> ContentionModel {
        self.timing
    }

    fn contended_banks(&self) -> &'static [u8] {
        if self.timing.pattern.is_none() { &[] } else { &[1, 3, 5, 7] }
    }

    fn port_write(&self, state: &mut BankingState, port: u16, value: u8) -> bool {
        is_port_7ffd(port) && write_7ffd(state, value)
    }

    fn recompute(&self, state: &BankingState, map: &mut MemoryMap) {
        map_128k(state, map);
    }
}
