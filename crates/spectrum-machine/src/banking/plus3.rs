//! Amstrad +2A/+3 banking: $7FFD plus $1FFD, four ROMs and the all-RAM
//! special modes.

use super::{BankingPolicy, BankingState, map_128k, write_7ffd};
use crate::contention::ContentionModel;
use crate::memory::{MemoryMap, PoolSizes};

/// Banks at $0000, $4000, $8000, $C000 for each special mode
/// ($1FFD bits 1-2).
const SPECIAL_CONFIGS: [[u8; 4]; 4] = [[0, 1, 2, 3], [4, 5, 6, 7], [4, 5, 6, 3], [4, 7, 6, 3]];

const fn is_port_7ffd(port: u16) -> bool {
    port & 0xC002 == 0x4000
}

const fn is_port_1ffd(port: u16) -> bool {
    port & 0xF002 == 0x1000
}

/// +2A and +3. The gate array contends banks 4-7.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagedPlus3;

impl BankingPolicy for PagedPlus3 {
    fn name(&self) -> &'static str {
        "Spectrum +2A/+3"
    }

    fn pools(&self) -> PoolSizes {
        PoolSizes {
            rom: 8,
            ram: 16,
            dock: 0,
            exrom: 0,
        }
    }

    fn contention(&self) -> ContentionModel {
        ContentionModel::SPECTRUM_PLUS3
    }

    fn contended_banks(&self) -> &'static [u8] {
        &[4, 5, 6, 7]
    }

    fn port_write(&self, state: &mut BankingState, port: u16, value: u8) -> bool {
        if is_port_7ffd(port) {
            write_7ffd(state, value)
        } else if is_port_1ffd(port) {
            if state.locked {
                log::debug!("$1FFD write {value:#04X} ignored: paging locked");
                return false;
            }
            state.last_1ffd = value;
            true
        } else {
            false
        }
    }

    fn recompute(&self, state: &BankingState, map: &mut MemoryMap) {
        if state.special_paging() {
            let config = SPECIAL_CONFIGS[usize::from((state.last_1ffd >> 1) & 0x03)];
            for (window, bank) in config.into_iter().enumerate() {
                map.map_ram_bank(window, bank);
            }
        } else {
            map_128k(state, map);
            map.map_rom(0, state.rom_plus3());
        }
    }
}
