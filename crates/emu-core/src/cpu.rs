//! CPU core trait.

use crate::{Bus, Registers};

/// What one executed instruction cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step {
    /// T-states consumed, including wait states returned by the bus.
    pub cycles: u32,
    /// Bytes of instruction stream consumed (opcode, prefixes, operands).
    pub bytes: u16,
}

/// A CPU core, driven one instruction at a time.
///
/// The machine treats the CPU as an opaque stepping primitive: it asks for
/// one instruction, gets back the elapsed cycles, and inspects registers
/// between instructions. The CPU owns the frame T-state counter.
pub trait Cpu {
    /// Current program counter.
    fn pc(&self) -> u16;

    /// Current stack pointer.
    fn sp(&self) -> u16;

    /// Snapshot of all registers for inspection.
    fn registers(&self) -> Registers;

    /// Load every register at once (snapshot restore).
    fn set_registers(&mut self, regs: &Registers);

    /// T-state position within the current frame.
    fn frame_cycle(&self) -> u32;

    /// Frame boundary: rebase the counter by subtracting `frame_length`.
    ///
    /// Instructions that straddle the boundary leave the remainder in the
    /// counter, so this must not simply zero it.
    fn start_frame(&mut self, frame_length: u32);

    /// Execute exactly one instruction.
    fn step<B: Bus>(&mut self, bus: &mut B) -> Step;

    /// Reset to power-on state.
    fn reset(&mut self);
}
