//! ZX Spectrum SE: 128K paging with the Timex SCLD on top.

use super::scld::{apply_overlay, overlay_page, read_scld, write_scld};
use super::{BankingPolicy, BankingState, map_128k, write_7ffd};
use crate::contention::ContentionModel;
use crate::memory::{MemoryMap, PageStore, PoolSizes, Source, View};

/// The SE fully decodes $7FFD, unlike the 128K.
const PORT_7FFD: u16 = 0x7FFD;

/// Spectrum SE. Dock and EXROM are extra RAM rather than cartridge ROM.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectrumSe;

impl BankingPolicy for SpectrumSe {
    fn name(&self) -> &'static str {
        "Spectrum SE"
    }

    fn pools(&self) -> PoolSizes {
        PoolSizes {
            rom: 4,
            ram: 16,
            dock: 8,
            exrom: 8,
        }
    }

    fn contention(&self) -> ContentionModel {
        ContentionModel::SPECTRUM_128K
    }

    fn contended_banks(&self) -> &'static [u8] {
        &[5, 7]
    }

    fn reset(&self, state: &mut BankingState, store: &mut PageStore, rom: &[u8]) {
        *state = BankingState::default();
        for source in [Source::Ram, Source::Dock, Source::Exrom] {
            store.fill_pool(source, 0);
            store.set_pool_writable(source, true);
        }
        store.load(Source::Rom, 0, rom);
        store.set_contended_banks(self.contended_banks());
    }

    fn port_write(&self, state: &mut BankingState, port: u16, value: u8) -> bool {
        if port == PORT_7FFD {
            write_7ffd(state, value)
        } else {
            write_scld(state, port, value)
        }
    }

    fn port_read(&self, state: &BankingState, port: u16) -> Option<u8> {
        read_scld(state, port)
    }

    fn recompute(&self, state: &BankingState, map: &mut MemoryMap) {
        let pools = self.pools();
        map_128k(state, map);
        apply_overlay(state, pools, map);

        // With an odd bank at $C000, HSR bits 2 and 3 also page dock/EXROM
        // chunks 6 and 7 over $C000 and $E000.
        if state.paged_bank() & 1 != 0 {
            for (bit, slot) in [(2, 6), (3, 7)] {
                if state.hsr & (1 << bit) != 0 {
                    map.set_mapping(slot, overlay_page(state, pools, slot), View::Both);
                }
            }
        }
    }
}
