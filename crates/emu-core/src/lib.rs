//! Core traits and types for the Spectrum paging and debugger core.
//!
//! The processor and the bus are collaborators: the machine crate owns the
//! memory map and the debugger, and drives any CPU that implements [`Cpu`]
//! through a [`Bus`] it provides.

mod bus;
mod cpu;
mod observable;
mod registers;

pub use bus::{Bus, ReadResult};
pub use cpu::{Cpu, Step};
pub use observable::{Observable, Value};
pub use registers::{RegisterPair, Registers};
