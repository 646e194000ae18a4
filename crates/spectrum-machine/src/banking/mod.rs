//! Per-model banking.
//!
//! Every model keeps its paging registers in one [`BankingState`]. A
//! [`BankingPolicy`] decides which ports it owns, how writes change the
//! state, and how the state becomes a [`MemoryMap`]. The bus doesn't need to
//! know which model is active.

mod plus3;
mod scld;
mod se;
mod sinclair;

pub use plus3::PagedPlus3;
pub use scld::Timex;
pub use se::SpectrumSe;
pub use sinclair::{Paged128, Sinclair48};

use serde::{Deserialize, Serialize};

use crate::contention::ContentionModel;
use crate::memory::{MemoryMap, PageStore, PoolSizes, Source};

/// Paging registers, shared by all models. Unused fields stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankingState {
    /// Last value written to the 128K paging port ($7FFD).
    pub last_7ffd: u8,
    /// Last value written to the +2A/+3 paging port ($1FFD).
    pub last_1ffd: u8,
    /// Timex SCLD horizontal select register (port $F4).
    pub hsr: u8,
    /// Timex SCLD decode register (port $FF).
    pub dec: u8,
    /// Set by $7FFD bit 5. Cleared only by reset.
    pub locked: bool,
}

impl BankingState {
    /// RAM bank paged in at $C000 (bits 0-2 of $7FFD).
    #[must_use]
    pub const fn paged_bank(&self) -> u8 {
        self.last_7ffd & 0x07
    }

    /// RAM bank the ULA displays: 7 when $7FFD bit 3 is set, else 5.
    #[must_use]
    pub const fn screen_bank(&self) -> u8 {
        if self.last_7ffd & 0x08 != 0 { 7 } else { 5 }
    }

    /// ROM selected by $7FFD bit 4.
    #[must_use]
    pub const fn rom_128(&self) -> u8 {
        (self.last_7ffd >> 4) & 1
    }

    /// +2A/+3 ROM: $1FFD bit 2 is the high bit, $7FFD bit 4 the low bit.
    #[must_use]
    pub const fn rom_plus3(&self) -> u8 {
        ((self.last_1ffd >> 1) & 0x02) | self.rom_128()
    }

    /// +2A/+3 all-RAM mode ($1FFD bit 0).
    #[must_use]
    pub const fn special_paging(&self) -> bool {
        self.last_1ffd & 0x01 != 0
    }

    /// +3 disk motor ($1FFD bit 3).
    #[must_use]
    pub const fn disk_motor(&self) -> bool {
        self.last_1ffd & 0x08 != 0
    }

    /// SCLD `altmembank`: overlays come from the EXROM instead of the dock.
    #[must_use]
    pub const fn altmembank(&self) -> bool {
        self.dec & 0x80 != 0
    }
}

/// Banking scheme for one machine model.
///
/// Policies are stateless; all paging state lives in [`BankingState`] so it
/// can be snapshotted and restored as a value.
pub trait BankingPolicy {
    /// Human-readable model name.
    fn name(&self) -> &'static str;

    /// How many pages each pool needs.
    fn pools(&self) -> PoolSizes;

    /// Frame timing and contention pattern.
    fn contention(&self) -> ContentionModel;

    /// 16K RAM banks whose pages are contended.
    fn contended_banks(&self) -> &'static [u8];

    /// Power-on state: clear RAM, install ROM images, reset registers.
    ///
    /// `rom` is the concatenation of the model's ROM images, already
    /// validated against its expected size.
    fn reset(&self, state: &mut BankingState, store: &mut PageStore, rom: &[u8]) {
        *state = BankingState::default();
        store.fill_pool(Source::Ram, 0);
        store.load(Source::Rom, 0, rom);
        store.set_contended_banks(self.contended_banks());
    }

    /// Handle a port write. Returns `true` if the port belongs to this
    /// model's banking decode and the state was updated, in which case the
    /// caller must [`recompute`](Self::recompute) the map.
    fn port_write(&self, state: &mut BankingState, port: u16, value: u8) -> bool;

    /// Paging registers that read back. `None` if the port isn't decoded.
    fn port_read(&self, _state: &BankingState, _port: u16) -> Option<u8> {
        None
    }

    /// Rebuild every slot of the map from the state. Total: any register
    /// combination yields a complete map.
    fn recompute(&self, state: &BankingState, map: &mut MemoryMap);
}

/// 128K paging port decode: A15 and A1 low.
pub(crate) const fn is_port_7ffd(port: u16) -> bool {
    port & 0x8002 == 0
}

/// Latch a $7FFD write unless paging is locked. Returns `true` if accepted.
pub(crate) fn write_7ffd(state: &mut BankingState, value: u8) -> bool {
    if state.locked {
        log::debug!("$7FFD write {value:#04X} ignored: paging locked");
        return false;
    }
    state.last_7ffd = value;
    state.locked = value & 0x20 != 0;
    true
}

/// 48K-compatible layout: ROM 0 and banks 5, 2, 0.
pub(crate) fn map_48k(map: &mut MemoryMap) {
    map.map_rom(0, 0);
    map.map_ram_bank(1, 5);
    map.map_ram_bank(2, 2);
    map.map_ram_bank(3, 0);
}

/// 128K layout for the current $7FFD value.
pub(crate) fn map_128k(state: &BankingState, map: &mut MemoryMap) {
    map.map_rom(0, state.rom_128());
    map.map_ram_bank(1, 5);
    map.map_ram_bank(2, 2);
    map.map_ram_bank(3, state.paged_bank());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_decodes_register_bits() {
        let state = BankingState {
            last_7ffd: 0x1B,
            last_1ffd: 0x0D,
            dec: 0x80,
            ..BankingState::default()
        };
        assert_eq!(state.paged_bank(), 3);
        assert_eq!(state.screen_bank(), 7);
        assert_eq!(state.rom_128(), 1);
        assert_eq!(state.rom_plus3(), 3);
        assert!(state.special_paging());
        assert!(state.disk_motor());
        assert!(state.altmembank());
        assert_eq!(BankingState::default().screen_bank(), 5);
    }

    #[test]
    fn port_7ffd_partial_decode() {
        assert!(is_port_7ffd(0x7FFD));
        assert!(is_port_7ffd(0x0001));
        assert!(is_port_7ffd(0x3FFD));
        assert!(!is_port_7ffd(0xFFFD));
        assert!(!is_port_7ffd(0x7FFF));
    }

    #[test]
    fn lock_holds_until_reset() {
        let mut state = BankingState::default();
        assert!(write_7ffd(&mut state, 0x23));
        assert!(state.locked);
        assert!(!write_7ffd(&mut state, 0x04));
        assert_eq!(state.paged_bank(), 3);
    }
}
