//! Spectrum bus: paged memory and banking-port routing.
//!
//! Every access resolves through the [`MemoryMap`] and is timed by the
//! model's [`ContentionModel`]. Port writes go to the model's
//! [`BankingPolicy`]; an accepted write rebuilds the map before the next
//! access.
//!
//! While the debugger is watching, memory and port accesses are queued as
//! [`DebugEvent`]s. The machine drains the queue after each instruction.

use emu_core::{Bus, ReadResult};

use crate::banking::{BankingPolicy, BankingState};
use crate::contention::ContentionModel;
use crate::debugger::DebugEvent;
use crate::memory::{MemoryMap, PageStore};

/// The Spectrum bus, implementing `emu_core::Bus`.
pub struct SpectrumBus {
    pub store: PageStore,
    pub map: MemoryMap,
    pub banking: BankingState,
    policy: Box<dyn BankingPolicy>,
    contention: ContentionModel,
    watching: bool,
    events: Vec<DebugEvent>,
}

impl SpectrumBus {
    /// Allocate the model's pages. Call [`reset`](Self::reset) to load ROM
    /// and build the map.
    #[must_use]
    pub fn new(policy: Box<dyn BankingPolicy>) -> Self {
        let store = PageStore::new(policy.pools());
        let contention = policy.contention();
        Self {
            store,
            map: MemoryMap::new(),
            banking: BankingState::default(),
            policy,
            contention,
            watching: false,
            events: Vec::new(),
        }
    }

    /// Power-on: clear RAM, reload ROM, reset paging registers.
    pub fn reset(&mut self, rom: &[u8]) {
        self.policy.reset(&mut self.banking, &mut self.store, rom);
        self.events.clear();
        self.recompute();
    }

    /// Rebuild the map from the current banking state.
    pub fn recompute(&mut self) {
        self.map = MemoryMap::new();
        self.policy.recompute(&self.banking, &mut self.map);
        log::trace!("{} map: {}", self.policy.name(), self.map);
    }

    #[must_use]
    pub fn policy(&self) -> &dyn BankingPolicy {
        self.policy.as_ref()
    }

    #[must_use]
    pub fn contention(&self) -> ContentionModel {
        self.contention
    }

    /// Queue memory and port events for the debugger.
    pub fn set_watching(&mut self, watching: bool) {
        self.watching = watching;
        if !watching {
            self.events.clear();
        }
    }

    /// Events queued since the last call.
    pub fn take_events(&mut self) -> Vec<DebugEvent> {
        std::mem::take(&mut self.events)
    }

    /// Store `value` in the page mapped for reading at `addr`, even if it is
    /// ROM. No contention, no events, no banking side effects.
    pub fn poke(&mut self, addr: u16, value: u8) {
        let (page, offset) = self.map.map_read(addr);
        if let Some(desc) = self.store.page_mut(page) {
            desc.data_mut()[offset] = value;
        }
    }

    /// Offer a port write to the banking policy. No events, no timing.
    pub fn port_write(&mut self, port: u16, value: u8) {
        if self.policy.port_write(&mut self.banking, port, value) {
            log::debug!(
                "{}: port {port:#06X} <- {value:#04X}",
                self.policy.name()
            );
            self.recompute();
        }
    }

    fn queue(&mut self, event: DebugEvent) {
        if self.watching {
            self.events.push(event);
        }
    }

    fn timed_read(&self, addr: u16, cycle: u32) -> ReadResult {
        let (page, offset) = self.map.map_read(addr);
        let desc = self.store.page(page);
        ReadResult::with_wait(
            desc.data()[offset],
            self.contention.delay(desc.contended, cycle),
        )
    }
}

impl Bus for SpectrumBus {
    fn fetch(&mut self, addr: u16, cycle: u32) -> ReadResult {
        // Execute breakpoints are checked by the machine before the fetch.
        self.timed_read(addr, cycle)
    }

    fn read(&mut self, addr: u16, cycle: u32) -> ReadResult {
        self.queue(DebugEvent::Read(addr));
        self.timed_read(addr, cycle)
    }

    fn write(&mut self, addr: u16, value: u8, cycle: u32) -> u8 {
        self.queue(DebugEvent::Write(addr));
        let (page, offset) = self.map.map_write(addr);
        let contended = self.store.page(page).contended;
        if let Some(desc) = self.store.page_mut(page)
            && desc.writable
        {
            desc.data_mut()[offset] = value;
        }
        self.contention.delay(contended, cycle)
    }

    fn io_read(&mut self, port: u16, _cycle: u32) -> ReadResult {
        self.queue(DebugEvent::PortRead(port));
        ReadResult::new(self.policy.port_read(&self.banking, port).unwrap_or(0xFF))
    }

    fn io_write(&mut self, port: u16, value: u8, _cycle: u32) -> u8 {
        self.queue(DebugEvent::PortWrite(port));
        self.port_write(port, value);
        0
    }

    fn peek(&self, addr: u16) -> u8 {
        let (page, offset) = self.map.map_read(addr);
        self.store.page(page).data()[offset]
    }
}
