//! Error types.

use thiserror::Error;

use crate::config::SpectrumModel;
use crate::debugger::BreakpointKind;

/// Breakpoint registration failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DebuggerError {
    #[error("invalid condition: {0}")]
    InvalidCondition(String),
    #[error("target {target:#06X} out of range for {kind} breakpoint")]
    InvalidTarget { kind: BreakpointKind, target: u32 },
    #[error("no breakpoint ids left")]
    IdsExhausted,
}

/// Machine construction and snapshot failures.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("unknown machine model `{0}`")]
    UnknownModel(String),
    #[error("{model} needs {expected} bytes of ROM, got {actual}")]
    RomSize {
        model: SpectrumModel,
        expected: usize,
        actual: usize,
    },
    #[error("snapshot is for {found}, machine is {expected}")]
    ModelMismatch {
        expected: SpectrumModel,
        found: SpectrumModel,
    },
    #[error("bad snapshot: {0}")]
    Snapshot(String),
    #[error("snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}
