//! Timex SCLD banking (TC2048, TC2068).
//!
//! The SCLD overlays the 48K layout: bit *n* of the horizontal select
//! register (port $F4) pages 8K chunk *n* of the dock or EXROM over slot
//! *n*. Bit 7 of the decode register (port $FF) picks EXROM over dock.

use super::{BankingPolicy, BankingState, map_48k};
use crate::contention::ContentionModel;
use crate::memory::{MemoryMap, PAGE_SIZE, PageRef, PageStore, PoolSizes, SLOTS, Source, View};

pub(crate) const fn is_port_hsr(port: u16) -> bool {
    port & 0xFF == 0xF4
}

pub(crate) const fn is_port_dec(port: u16) -> bool {
    port & 0xFF == 0xFF
}

/// Latch an SCLD register write. Returns `true` if the port is an SCLD port.
pub(crate) fn write_scld(state: &mut BankingState, port: u16, value: u8) -> bool {
    if is_port_hsr(port) {
        state.hsr = value;
        true
    } else if is_port_dec(port) {
        state.dec = value;
        true
    } else {
        false
    }
}

/// SCLD registers read back as written.
pub(crate) fn read_scld(state: &BankingState, port: u16) -> Option<u8> {
    if is_port_hsr(port) {
        Some(state.hsr)
    } else if is_port_dec(port) {
        Some(state.dec)
    } else {
        None
    }
}

/// Dock or EXROM page `chunk`, per `altmembank`. Short pools are mirrored.
pub(crate) fn overlay_page(state: &BankingState, pools: PoolSizes, chunk: usize) -> PageRef {
    let chunk = chunk as u16;
    if state.altmembank() {
        PageRef::exrom(chunk % pools.exrom.max(1))
    } else {
        PageRef::dock(chunk % pools.dock.max(1))
    }
}

/// Apply the HSR overlay over whatever base layout is already in `map`.
pub(crate) fn apply_overlay(state: &BankingState, pools: PoolSizes, map: &mut MemoryMap) {
    for slot in (0..SLOTS).filter(|slot| state.hsr & (1 << slot) != 0) {
        map.set_mapping(slot, overlay_page(state, pools, slot), View::Both);
    }
}

/// TC2048 and TC2068.
#[derive(Debug, Clone, Copy)]
pub struct Timex {
    /// TC2068: 8K EXROM image after the home ROM, NTSC timing.
    tc2068: bool,
}

impl Timex {
    #[must_use]
    pub const fn tc2048() -> Self {
        Self { tc2068: false }
    }

    #[must_use]
    pub const fn tc2068() -> Self {
        Self { tc2068: true }
    }
}

impl BankingPolicy for Timex {
    fn name(&self) -> &'static str {
        if self.tc2068 { "Timex TC2068" } else { "Timex TC2048" }
    }

    fn pools(&self) -> PoolSizes {
        PoolSizes {
            rom: 2,
            ram: 12,
            dock: 8,
            // The TC2068 EXROM is one 8K chip, mirrored in every chunk.
            exrom: if self.tc2068 { 1 } else { 8 },
        }
    }

    fn contention(&self) -> ContentionModel {
        if self.tc2068 {
            ContentionModel::TIMEX_NTSC
        } else {
            ContentionModel::SPECTRUM_48K
        }
    }

    fn contended_banks(&self) -> &'static [u8] {
        &[5]
    }

    fn reset(&self, state: &mut BankingState, store: &mut PageStore, rom: &[u8]) {
        *state = BankingState::default();
        store.fill_pool(Source::Ram, 0);
        // Empty dock slot and absent EXROM float high.
        store.fill_pool(Source::Dock, 0xFF);
        store.fill_pool(Source::Exrom, 0xFF);
        let (home, exrom) = rom.split_at(rom.len().min(2 * PAGE_SIZE));
        store.load(Source::Rom, 0, home);
        store.load(Source::Exrom, 0, exrom);
        store.set_contended_banks(self.contended_banks());
    }

    fn port_write(&self, state: &mut BankingState, port: u16, value: u8) -> bool {
        write_scld(state, port, value)
    }

    fn port_read(&self, state: &BankingState, port: u16) -> Option<u8> {
        read_scld(state, port)
    }

    fn recompute(&self, state: &BankingState, map: &mut MemoryMap) {
        map_48k(map);
        apply_overlay(state, self.pools(), map);
    }
}
