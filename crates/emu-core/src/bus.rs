//! Memory and I/O bus interface.

/// Outcome of a bus read: the byte on the data bus and the wait states the
/// access cost (contended memory, slow peripherals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadResult {
    pub data: u8,
    pub wait: u8,
}

impl ReadResult {
    /// A read with no wait states.
    #[must_use]
    pub const fn new(data: u8) -> Self {
        Self { data, wait: 0 }
    }

    /// A read that stalled the CPU for `wait` T-states.
    #[must_use]
    pub const fn with_wait(data: u8, wait: u8) -> Self {
        Self { data, wait }
    }
}

/// Memory and I/O bus seen by the CPU.
///
/// Every access carries `cycle`, the CPU's T-state position within the
/// current frame at the moment of the access. The bus uses it for contention
/// and returns the resulting wait states; it never keeps its own clock.
pub trait Bus {
    /// Opcode fetch (M1 cycle).
    ///
    /// Separate from [`Bus::read`] so that a debugger can tell instruction
    /// fetches from data reads.
    fn fetch(&mut self, addr: u16, cycle: u32) -> ReadResult;

    /// Data read.
    fn read(&mut self, addr: u16, cycle: u32) -> ReadResult;

    /// Data write. Returns wait states.
    fn write(&mut self, addr: u16, value: u8, cycle: u32) -> u8;

    /// Port read.
    fn io_read(&mut self, port: u16, cycle: u32) -> ReadResult;

    /// Port write. Returns wait states.
    fn io_write(&mut self, port: u16, value: u8, cycle: u32) -> u8;

    /// Read a byte with no side effects and no timing.
    ///
    /// Used by disassemblers, debuggers and screen fetches.
    fn peek(&self, addr: u16) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_result_constructors() {
        assert_eq!(ReadResult::new(0x42), ReadResult { data: 0x42, wait: 0 });
        assert_eq!(
            ReadResult::with_wait(0x42, 6),
            ReadResult { data: 0x42, wait: 6 }
        );
    }
}
