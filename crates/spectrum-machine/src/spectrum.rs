//! Top-level Spectrum system.
//!
//! Owns the CPU, the paged bus and the debugger controller, and drives them
//! one instruction at a time.
//!
//! # Instruction loop
//!
//! While the debugger is watching:
//!
//! 1. the execute event for the PC is checked before the instruction runs
//! 2. memory and port events raised during the instruction are queued by
//!    the bus
//! 3. after the instruction, the queue and the frame T-state are checked
//!    with the new CPU state visible to conditions
//!
//! A trigger halts the machine; [`Spectrum::run_frame`] returns early.

use emu_core::{Bus, Cpu, Observable, Value};

use crate::bus::SpectrumBus;
use crate::config::{SpectrumConfig, SpectrumModel};
use crate::controller::{DebuggerUi, ExecutionController, ExecutionMode};
use crate::debugger::{
    BreakpointKind, BreakpointSpec, DebugEvent, Debugger, EvalContext, Life, Variable,
};
use crate::disasm::instruction_length;
use crate::error::{DebuggerError, MachineError};
use crate::memory::{MemoryMap, Source};
use crate::snapshot::Snapshot;

/// Why [`Spectrum::run_frame`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    FrameComplete,
    /// A breakpoint triggered, or the machine was already halted.
    Halted,
}

/// ZX Spectrum system, generic over the Z80 implementation.
pub struct Spectrum<C: Cpu> {
    cpu: C,
    bus: SpectrumBus,
    model: SpectrumModel,
    rom: Vec<u8>,
    controller: ExecutionController,
    /// Completed frame counter.
    frame_count: u64,
    /// Resuming from a halt at an execute breakpoint: don't stop at this PC
    /// again before executing it.
    resume_pc: Option<u16>,
}

impl<C: Cpu> Spectrum<C> {
    /// Create a Spectrum and bring it to its power-on state.
    pub fn new(config: &SpectrumConfig, cpu: C) -> Result<Self, MachineError> {
        config.validate()?;
        let mut bus = SpectrumBus::new(config.model.banking_policy());
        bus.reset(&config.rom);
        let frame_length = bus.contention().frame_length;
        log::info!("{} ready", bus.policy().name());

        let mut spectrum = Self {
            cpu,
            bus,
            model: config.model,
            rom: config.rom.clone(),
            controller: ExecutionController::new(frame_length),
            frame_count: 0,
            resume_pc: None,
        };
        spectrum.cpu.reset();
        Ok(spectrum)
    }

    /// Hard reset: RAM cleared, paging and CPU reset, breakpoints removed.
    pub fn reset(&mut self) {
        self.bus.reset(&self.rom);
        self.bus.set_watching(false);
        self.cpu.reset();
        self.controller.reset();
        self.frame_count = 0;
        self.resume_pc = None;
    }

    /// Shutdown: remove all breakpoints and stop watching.
    pub fn end(&mut self) {
        self.controller.end();
        self.bus.set_watching(false);
        self.resume_pc = None;
    }

    #[must_use]
    pub fn model(&self) -> SpectrumModel {
        self.model
    }

    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &SpectrumBus {
        &self.bus
    }

    #[must_use]
    pub fn memory_map(&self) -> &MemoryMap {
        &self.bus.map
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.controller.mode()
    }

    #[must_use]
    pub fn debugger(&self) -> &Debugger {
        self.controller.debugger()
    }

    pub fn set_ui(&mut self, ui: Box<dyn DebuggerUi>) {
        self.controller.set_ui(ui);
    }

    // Breakpoints

    pub fn add_breakpoint(
        &mut self,
        kind: BreakpointKind,
        target: u32,
        life: Life,
        condition: Option<&str>,
    ) -> Result<u32, DebuggerError> {
        let mut spec = BreakpointSpec::new(kind, target).life(life);
        spec.condition = condition.map(str::to_string);
        self.controller.add_breakpoint(spec)
    }

    pub fn add_breakpoint_with(&mut self, spec: BreakpointSpec) -> Result<u32, DebuggerError> {
        self.controller.add_breakpoint(spec)
    }

    pub fn remove_breakpoint(&mut self, id: u32) -> bool {
        self.controller.debugger_mut().remove(id)
    }

    pub fn remove_all_breakpoints(&mut self) {
        self.controller.debugger_mut().remove_all();
    }

    pub fn set_breakpoint_ignore(&mut self, id: u32, count: u32) -> bool {
        self.controller.debugger_mut().set_ignore(id, count)
    }

    pub fn set_breakpoint_condition(
        &mut self,
        id: u32,
        condition: Option<&str>,
    ) -> Result<bool, DebuggerError> {
        self.controller.debugger_mut().set_condition(id, condition)
    }

    // Execution control

    /// Resume. Runs watched if any breakpoint remains.
    pub fn run(&mut self) {
        if self.controller.mode() == ExecutionMode::Halted {
            self.resume_pc = Some(self.cpu.pc());
        }
        self.controller.run();
    }

    /// Execute exactly one instruction and halt. Memory, port and time
    /// breakpoints still trigger during the step.
    pub fn step(&mut self) {
        self.controller.step();
        self.resume_pc = None;
        if !self.execute_instruction() {
            self.controller.halt();
        }
    }

    /// Run until the instruction after the current one, stepping over
    /// calls, restarts and block instructions.
    pub fn step_over(&mut self) -> Result<u32, DebuggerError> {
        let pc = self.cpu.pc();
        let length = instruction_length(|addr| self.bus.peek(addr), pc);
        let target = pc.wrapping_add(length);
        let id = self.add_breakpoint(BreakpointKind::Execute, u32::from(target), Life::OneShot, None)?;
        self.run();
        Ok(id)
    }

    /// Run until the current subroutine returns to the address on top of
    /// the stack.
    pub fn finish_subroutine(&mut self) -> Result<u32, DebuggerError> {
        let sp = self.cpu.sp();
        let target = u16::from_le_bytes([self.bus.peek(sp), self.bus.peek(sp.wrapping_add(1))]);
        let id = self.add_breakpoint(BreakpointKind::Execute, u32::from(target), Life::OneShot, None)?;
        self.run();
        Ok(id)
    }

    /// Ask the UI to show the debugger.
    pub fn trap(&mut self) {
        self.controller.trap();
    }

    /// Patch memory: store into whatever page is mapped for reading at
    /// `addr`, ROM included.
    pub fn poke(&mut self, addr: u16, value: u8) {
        self.bus.poke(addr, value);
    }

    /// Write a port through the model's normal decode.
    pub fn port_write(&mut self, port: u16, value: u8) {
        self.bus.port_write(port, value);
    }

    /// Run to the end of the frame, or until the machine halts.
    pub fn run_frame(&mut self) -> RunOutcome {
        let frame_length = self.bus.contention().frame_length;
        while self.cpu.frame_cycle() < frame_length {
            if self.controller.mode() == ExecutionMode::Halted || self.execute_instruction() {
                return RunOutcome::Halted;
            }
        }
        self.cpu.start_frame(frame_length);
        self.frame_count += 1;
        self.controller.frame_boundary();
        RunOutcome::FrameComplete
    }

    /// Run up to `max_frames` frames, stopping early on a halt.
    pub fn run_until_halt(&mut self, max_frames: u32) -> RunOutcome {
        for _ in 0..max_frames {
            if self.run_frame() == RunOutcome::Halted {
                return RunOutcome::Halted;
            }
        }
        RunOutcome::FrameComplete
    }

    /// One instruction with debugger checks. Returns `true` if a breakpoint
    /// triggered, in which case the instruction may not have run.
    fn execute_instruction(&mut self) -> bool {
        let watching = self.controller.is_watching();
        self.bus.set_watching(watching);

        let resume_pc = self.resume_pc.take();
        if watching && self.controller.mode() != ExecutionMode::Halted {
            let pc = self.cpu.pc();
            if resume_pc != Some(pc) {
                let state = MachineState {
                    cpu: &self.cpu,
                    bus: &self.bus,
                    frame_count: self.frame_count,
                };
                if self.controller.offer(DebugEvent::Execute(pc), &state) {
                    return true;
                }
            }
        }

        self.cpu.step(&mut self.bus);

        if !watching {
            return false;
        }
        let mut events = self.bus.take_events();
        events.push(DebugEvent::Time(self.cpu.frame_cycle()));
        let state = MachineState {
            cpu: &self.cpu,
            bus: &self.bus,
            frame_count: self.frame_count,
        };
        self.controller.offer_all(events, &state)
    }

    // Snapshots

    /// Capture paging state, RAM and registers.
    #[must_use]
    pub fn save_snapshot(&self) -> Snapshot {
        Snapshot {
            model: self.model,
            banking: self.bus.banking,
            registers: self.cpu.registers(),
            frame_count: self.frame_count,
            ram: Snapshot::capture_pages(&self.bus.store, Source::Ram),
            dock: Snapshot::capture_pages(&self.bus.store, Source::Dock),
            exrom: Snapshot::capture_pages(&self.bus.store, Source::Exrom),
        }
    }

    /// Restore a snapshot taken from the same model. On error the machine
    /// is unchanged.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), MachineError> {
        if snapshot.model != self.model {
            return Err(MachineError::ModelMismatch {
                expected: self.model,
                found: snapshot.model,
            });
        }
        let pools = [
            (Source::Ram, &snapshot.ram),
            (Source::Dock, &snapshot.dock),
            (Source::Exrom, &snapshot.exrom),
        ];
        for (source, pages) in pools {
            Snapshot::check_pages(&self.bus.store, source, pages)?;
        }
        for (source, pages) in pools {
            Snapshot::restore_pages(&mut self.bus.store, source, pages);
        }
        self.bus.banking = snapshot.banking;
        self.bus.recompute();
        self.cpu.set_registers(&snapshot.registers);
        self.frame_count = snapshot.frame_count;
        self.resume_pc = None;
        Ok(())
    }
}

/// Read-only view handed to breakpoint conditions.
struct MachineState<'a, C> {
    cpu: &'a C,
    bus: &'a SpectrumBus,
    frame_count: u64,
}

impl<C: Cpu> EvalContext for MachineState<'_, C> {
    fn variable(&self, var: Variable) -> u32 {
        let regs = self.cpu.registers();
        let value = match var {
            Variable::A => u16::from(regs.a()),
            Variable::F => u16::from(regs.f()),
            Variable::B => u16::from(regs.b()),
            Variable::C => u16::from(regs.c()),
            Variable::D => u16::from(regs.d()),
            Variable::E => u16::from(regs.e()),
            Variable::H => u16::from(regs.h()),
            Variable::L => u16::from(regs.l()),
            Variable::Af => regs.af.get(),
            Variable::Bc => regs.bc.get(),
            Variable::De => regs.de.get(),
            Variable::Hl => regs.hl.get(),
            Variable::AfAlt => regs.af_alt.get(),
            Variable::BcAlt => regs.bc_alt.get(),
            Variable::DeAlt => regs.de_alt.get(),
            Variable::HlAlt => regs.hl_alt.get(),
            Variable::Ix => regs.ix,
            Variable::Iy => regs.iy,
            Variable::Sp => regs.sp,
            Variable::Pc => regs.pc,
            Variable::I => u16::from(regs.i),
            Variable::R => u16::from(regs.r),
            Variable::Iff1 => u16::from(regs.iff1),
            Variable::Iff2 => u16::from(regs.iff2),
            Variable::Im => u16::from(regs.im),
            Variable::Tstates => return self.cpu.frame_cycle(),
            Variable::Frame => return frame_variable(self.frame_count),
        };
        u32::from(value)
    }

    fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }
}

impl<C: Cpu> Observable for Spectrum<C> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            match rest {
                "frame_cycle" => Some(self.cpu.frame_cycle().into()),
                _ => self.cpu.registers().query(rest),
            }
        } else if let Some(rest) = path.strip_prefix("paging.") {
            self.query_paging(rest)
        } else if let Some(rest) = path.strip_prefix("debugger.") {
            match rest {
                "mode" => Some(self.mode().to_string().into()),
                "breakpoints" => Some((self.debugger().breakpoints().len() as u32).into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|addr| Value::U8(self.bus.peek(addr)))
        } else {
            match path {
                "model" => Some(self.model.id().into()),
                "frame_count" => Some(self.frame_count.into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<z80_paths>",
            "cpu.frame_cycle",
            "paging.map",
            "paging.slot.<0-7>",
            "paging.slot.<0-7>.write",
            "paging.7ffd",
            "paging.1ffd",
            "paging.hsr",
            "paging.dec",
            "paging.locked",
            "paging.screen_bank",
            "paging.disk_motor",
            "debugger.mode",
            "debugger.breakpoints",
            "memory.<address>",
            "model",
            "frame_count",
        ]
    }
}

impl<C: Cpu> Spectrum<C> {
    fn query_paging(&self, path: &str) -> Option<Value> {
        let banking = &self.bus.banking;
        let value = match path {
            "map" => self.bus.map.to_string().into(),
            "7ffd" => banking.last_7ffd.into(),
            "1ffd" => banking.last_1ffd.into(),
            "hsr" => banking.hsr.into(),
            "dec" => banking.dec.into(),
            "locked" => banking.locked.into(),
            "screen_bank" => banking.screen_bank().into(),
            "disk_motor" => banking.disk_motor().into(),
            _ => {
                let slot = path.strip_prefix("slot.")?;
                let (slot, write) = match slot.strip_suffix(".write") {
                    Some(slot) => (slot, true),
                    None => (slot, false),
                };
                let slot: usize = slot.parse().ok().filter(|&s| s < 8)?;
                let addr = (slot as u16) << 13;
                let (page, _) = if write {
                    self.bus.map.map_write(addr)
                } else {
                    self.bus.map.map_read(addr)
                };
                page.to_string().into()
            }
        };
        Some(value)
    }
}

/// The frame counter as seen by conditions.
fn frame_variable(frame_count: u64) -> u32 {
    u32::try_from(frame_count).unwrap_or(u32::MAX)
}

/// `$C000`, `0xC000` or decimal.
fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
    {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}
