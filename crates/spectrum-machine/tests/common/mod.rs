//! Shared fixtures: a scripted Z80 subset and machine builders.

#![allow(dead_code)]

use emu_core::{Bus, Cpu, Registers, Step};
use spectrum_machine::{Spectrum, SpectrumConfig, SpectrumModel};

/// Where test programs are loaded.
pub const ORG: u16 = 0x8000;

/// Just enough Z80 to drive the paging core: loads, stores, jumps, calls,
/// port I/O and HALT. Unknown opcodes behave as NOP.
#[derive(Debug, Default)]
pub struct ScriptCpu {
    pub regs: Registers,
    pub cycle: u32,
}

impl ScriptCpu {
    fn fetch<B: Bus>(&mut self, bus: &mut B, step: &mut Step) -> u8 {
        let result = bus.fetch(self.regs.pc, self.cycle);
        self.advance(4 + u32::from(result.wait), step);
        result.data
    }

    fn operand<B: Bus>(&mut self, bus: &mut B, step: &mut Step) -> u8 {
        let result = bus.read(self.regs.pc, self.cycle);
        self.advance(3 + u32::from(result.wait), step);
        result.data
    }

    fn operand16<B: Bus>(&mut self, bus: &mut B, step: &mut Step) -> u16 {
        let lo = self.operand(bus, step);
        let hi = self.operand(bus, step);
        u16::from_le_bytes([lo, hi])
    }

    fn advance(&mut self, cycles: u32, step: &mut Step) {
        self.cycle += cycles;
        step.cycles += cycles;
        if step.bytes < 4 {
            step.bytes += 1;
        }
        self.regs.pc = self.regs.pc.wrapping_add(1);
    }

    fn read<B: Bus>(&mut self, bus: &mut B, addr: u16, step: &mut Step) -> u8 {
        let result = bus.read(addr, self.cycle);
        self.tick(3 + u32::from(result.wait), step);
        result.data
    }

    fn write<B: Bus>(&mut self, bus: &mut B, addr: u16, value: u8, step: &mut Step) {
        let wait = bus.write(addr, value, self.cycle);
        self.tick(3 + u32::from(wait), step);
    }

    fn tick(&mut self, cycles: u32, step: &mut Step) {
        self.cycle += cycles;
        step.cycles += cycles;
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u16, step: &mut Step) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, hi, step);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, lo, step);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B, step: &mut Step) -> u16 {
        let lo = self.read(bus, self.regs.sp, step);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read(bus, self.regs.sp, step);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }
}

impl Cpu for ScriptCpu {
    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn sp(&self) -> u16 {
        self.regs.sp
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn set_registers(&mut self, regs: &Registers) {
        self.regs = *regs;
    }

    fn frame_cycle(&self) -> u32 {
        self.cycle
    }

    fn start_frame(&mut self, frame_length: u32) {
        self.cycle = self.cycle.saturating_sub(frame_length);
    }

    fn step<B: Bus>(&mut self, bus: &mut B) -> Step {
        let mut step = Step::default();
        if self.regs.halted {
            self.tick(4, &mut step);
            return step;
        }
        match self.fetch(bus, &mut step) {
            // LD BC,nn
            0x01 => {
                let value = self.operand16(bus, &mut step);
                self.regs.bc.set(value);
            }
            // JR e
            0x18 => {
                let offset = self.operand(bus, &mut step) as i8;
                self.regs.pc = self.regs.pc.wrapping_add_signed(i16::from(offset));
                self.tick(5, &mut step);
            }
            // LD HL,nn
            0x21 => {
                let value = self.operand16(bus, &mut step);
                self.regs.hl.set(value);
            }
            // LD SP,nn
            0x31 => self.regs.sp = self.operand16(bus, &mut step),
            // LD (nn),A
            0x32 => {
                let addr = self.operand16(bus, &mut step);
                self.write(bus, addr, self.regs.a(), &mut step);
            }
            // LD A,(nn)
            0x3A => {
                let addr = self.operand16(bus, &mut step);
                let value = self.read(bus, addr, &mut step);
                self.regs.af.set_hi(value);
            }
            // INC A
            0x3C => self.regs.af.set_hi(self.regs.a().wrapping_add(1)),
            // LD A,n
            0x3E => {
                let value = self.operand(bus, &mut step);
                self.regs.af.set_hi(value);
            }
            // HALT
            0x76 => self.regs.halted = true,
            // LD (HL),A
            0x77 => self.write(bus, self.regs.hl.get(), self.regs.a(), &mut step),
            // JP nn
            0xC3 => self.regs.pc = self.operand16(bus, &mut step),
            // RET
            0xC9 => self.regs.pc = self.pop(bus, &mut step),
            // CALL nn
            0xCD => {
                let target = self.operand16(bus, &mut step);
                self.push(bus, self.regs.pc, &mut step);
                self.regs.pc = target;
            }
            // OUT (n),A
            0xD3 => {
                let port = u16::from_be_bytes([self.regs.a(), self.operand(bus, &mut step)]);
                let wait = bus.io_write(port, self.regs.a(), self.cycle);
                self.tick(4 + u32::from(wait), &mut step);
            }
            // IN A,(n)
            0xDB => {
                let port = u16::from_be_bytes([self.regs.a(), self.operand(bus, &mut step)]);
                let result = bus.io_read(port, self.cycle);
                self.tick(4 + u32::from(result.wait), &mut step);
                self.regs.af.set_hi(result.data);
            }
            0xED => {
                // OUT (C),A
                if self.fetch(bus, &mut step) == 0x79 {
                    let wait = bus.io_write(self.regs.bc.get(), self.regs.a(), self.cycle);
                    self.tick(4 + u32::from(wait), &mut step);
                }
            }
            _ => {}
        }
        step
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A ROM image of the right size for `model`, each 16K bank filled with
/// its own index so tests can tell which one is paged in.
pub fn rom_for(model: SpectrumModel) -> Vec<u8> {
    let mut rom = Vec::with_capacity(model.rom_len());
    for (index, &size) in model.rom_sizes().iter().enumerate() {
        rom.extend(std::iter::repeat_n(index as u8, size));
    }
    rom
}

pub fn machine(model: SpectrumModel) -> Spectrum<ScriptCpu> {
    let config = SpectrumConfig {
        model,
        rom: rom_for(model),
    };
    match Spectrum::new(&config, ScriptCpu::default()) {
        Ok(spectrum) => spectrum,
        Err(err) => panic!("{model} failed to start: {err}"),
    }
}

/// Load `code` at [`ORG`] and point the CPU at it, with the stack at the
/// top of RAM.
pub fn load_program(spectrum: &mut Spectrum<ScriptCpu>, code: &[u8]) {
    for (offset, &byte) in code.iter().enumerate() {
        spectrum.poke(ORG + offset as u16, byte);
    }
    let regs = &mut spectrum.cpu_mut().regs;
    regs.pc = ORG;
    regs.sp = 0xFF00;
}

pub fn query(spectrum: &Spectrum<ScriptCpu>, path: &str) -> String {
    use emu_core::Observable;
    spectrum
        .query(path)
        .map(|value| match value {
            emu_core::Value::String(text) => text,
            other => other.to_string(),
        })
        .unwrap_or_default()
}
