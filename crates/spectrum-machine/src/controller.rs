//! Debugger execution control.
//!
//! Three modes:
//!
//! - `Inactive`: no breakpoints to honour, the machine runs unwatched
//! - `Active`: running, every event is offered to the breakpoints
//! - `Halted`: the host loop returns control to its caller
//!
//! A trigger while active halts the machine. The UI hook hears about every
//! transition that hands control to or from the user.

use std::fmt;

use crate::debugger::{BreakpointSpec, DebugEvent, Debugger, EvalContext};
use crate::error::DebuggerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Inactive,
    Active,
    Halted,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Halted => "halted",
        })
    }
}

/// Front-end hook for handing control to and from the user.
pub trait DebuggerUi {
    /// Show the debugger: the machine has stopped or a trap was requested.
    fn activate(&mut self);

    /// Hide the debugger. `resume` is true when emulation is about to run
    /// freely rather than single-step.
    fn deactivate(&mut self, resume: bool);
}

/// UI hook that ignores everything (headless use, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUi;

impl DebuggerUi for NullUi {
    fn activate(&mut self) {}

    fn deactivate(&mut self, _resume: bool) {}
}

/// Mode state machine plus the breakpoints it acts on.
pub struct ExecutionController {
    mode: ExecutionMode,
    debugger: Debugger,
    ui: Box<dyn DebuggerUi>,
}

impl ExecutionController {
    #[must_use]
    pub fn new(frame_length: u32) -> Self {
        Self {
            mode: ExecutionMode::Inactive,
            debugger: Debugger::new(frame_length),
            ui: Box::new(NullUi),
        }
    }

    pub fn set_ui(&mut self, ui: Box<dyn DebuggerUi>) {
        self.ui = ui;
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    #[must_use]
    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    /// Breakpoint edits that don't change the mode (remove, ignore
    /// counts, conditions).
    pub fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }

    /// Whether bus events need to be collected.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.mode != ExecutionMode::Inactive
    }

    /// Register a breakpoint. An inactive debugger becomes active so the
    /// new breakpoint is honoured straight away.
    pub fn add_breakpoint(&mut self, spec: BreakpointSpec) -> Result<u32, DebuggerError> {
        let id = self.debugger.add_with(spec)?;
        if self.mode == ExecutionMode::Inactive {
            self.set_mode(ExecutionMode::Active);
        }
        Ok(id)
    }

    /// Machine reset: forget all breakpoints, stop watching.
    pub fn reset(&mut self) {
        self.debugger.remove_all();
        self.set_mode(ExecutionMode::Inactive);
    }

    /// Shutdown: forget all breakpoints, stop watching.
    pub fn end(&mut self) {
        self.debugger.remove_all();
        self.set_mode(ExecutionMode::Inactive);
    }

    /// Resume free running. Active if any breakpoint remains.
    pub fn run(&mut self) {
        let mode = if self.debugger.is_empty() {
            ExecutionMode::Inactive
        } else {
            ExecutionMode::Active
        };
        self.set_mode(mode);
        self.ui.deactivate(true);
    }

    /// Prepare to execute exactly one instruction, halting after it.
    pub fn step(&mut self) {
        self.set_mode(ExecutionMode::Halted);
        self.ui.deactivate(false);
    }

    /// Stop and hand control to the user.
    pub fn halt(&mut self) {
        self.set_mode(ExecutionMode::Halted);
        self.ui.activate();
    }

    /// Ask the UI to show the debugger without changing the mode.
    pub fn trap(&mut self) {
        self.ui.activate();
    }

    /// Offer an event to the breakpoints. Halts and returns `true` on a
    /// trigger. Nothing is checked while inactive.
    pub fn offer(&mut self, event: DebugEvent, ctx: &dyn EvalContext) -> bool {
        self.offer_all([event], ctx)
    }

    /// Offer every event in turn, halting at most once however many
    /// breakpoints trigger.
    pub fn offer_all(
        &mut self,
        events: impl IntoIterator<Item = DebugEvent>,
        ctx: &dyn EvalContext,
    ) -> bool {
        if !self.is_watching() {
            return false;
        }
        let mut triggered = false;
        for event in events {
            triggered |= self.debugger.check(event, ctx);
        }
        if triggered {
            self.halt();
        }
        triggered
    }

    pub fn frame_boundary(&mut self) {
        self.debugger.frame_boundary();
    }

    fn set_mode(&mut self, mode: ExecutionMode) {
        if self.mode != mode {
            log::info!("debugger {} -> {mode}", self.mode);
            self.mode = mode;
        }
    }
}
