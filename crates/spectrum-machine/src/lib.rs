//! ZX Spectrum family paging and debugger core.
//!
//! Models the memory banking of the 16K, 48K, 128K, +2, +2A, +3, Pentagon
//! 128, Timex TC2048/TC2068 and Spectrum SE, with contended-memory timing,
//! and a breakpoint debugger that controls execution. The Z80 itself is a
//! collaborator: any [`emu_core::Cpu`] can drive a [`Spectrum`].
//!
//! Memory is addressed through eight 8K slots, each with separate read and
//! write views. Per-model [`BankingPolicy`] implementations turn paging port
//! writes into slot mappings.

pub mod banking;
mod bus;
mod config;
pub mod contention;
pub mod controller;
pub mod debugger;
pub mod disasm;
mod error;
pub mod memory;
mod snapshot;
mod spectrum;

pub use banking::{BankingPolicy, BankingState};
pub use bus::SpectrumBus;
pub use config::{SpectrumConfig, SpectrumModel};
pub use contention::ContentionModel;
pub use controller::{DebuggerUi, ExecutionMode, NullUi};
pub use debugger::{BreakpointKind, BreakpointSpec, DebugEvent, Life};
pub use error::{DebuggerError, MachineError};
pub use snapshot::Snapshot;
pub use spectrum::{RunOutcome, Spectrum};
