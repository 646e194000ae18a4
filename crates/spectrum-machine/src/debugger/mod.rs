//! Breakpoint registry.
//!
//! The machine offers every instruction fetch, memory access, port access
//! and frame-time advance to [`Debugger::check`] while the debugger is
//! active. Breakpoints match in registration order; if any of them
//! triggers, `check` returns `true` and the machine halts once.

mod expr;

pub use expr::{BinaryOp, EvalContext, Expr, UnaryOp, Variable};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DebuggerError;

/// What a breakpoint watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakpointKind {
    /// Opcode fetch at an address.
    Execute,
    /// Memory read at an address.
    Read,
    /// Memory write at an address.
    Write,
    PortRead,
    PortWrite,
    /// Frame T-state reached.
    Time,
}

impl fmt::Display for BreakpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Execute => "execute",
            Self::Read => "read",
            Self::Write => "write",
            Self::PortRead => "port read",
            Self::PortWrite => "port write",
            Self::Time => "time",
        })
    }
}

/// Whether a breakpoint survives triggering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Life {
    Permanent,
    /// Removed the first time it triggers.
    OneShot,
}

/// Something the machine did that a breakpoint might care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugEvent {
    Execute(u16),
    Read(u16),
    Write(u16),
    PortRead(u16),
    PortWrite(u16),
    /// Current frame T-state.
    Time(u32),
}

impl DebugEvent {
    #[must_use]
    pub const fn kind(self) -> BreakpointKind {
        match self {
            Self::Execute(_) => BreakpointKind::Execute,
            Self::Read(_) => BreakpointKind::Read,
            Self::Write(_) => BreakpointKind::Write,
            Self::PortRead(_) => BreakpointKind::PortRead,
            Self::PortWrite(_) => BreakpointKind::PortWrite,
            Self::Time(_) => BreakpointKind::Time,
        }
    }
}

/// Everything needed to register a breakpoint.
///
/// ```
/// use spectrum_machine::debugger::{BreakpointKind, BreakpointSpec};
///
/// let spec = BreakpointSpec::new(BreakpointKind::PortWrite, 0x00FE)
///     .port_mask(0x00FF)
///     .condition("a & 7 == 2")
///     .ignore(3);
/// assert_eq!(spec.ignore_count, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointSpec {
    pub kind: BreakpointKind,
    pub target: u32,
    pub life: Life,
    pub condition: Option<String>,
    pub ignore_count: u32,
    pub port_mask: u16,
}

impl BreakpointSpec {
    #[must_use]
    pub fn new(kind: BreakpointKind, target: u32) -> Self {
        Self {
            kind,
            target,
            life: Life::Permanent,
            condition: None,
            ignore_count: 0,
            port_mask: 0xFFFF,
        }
    }

    #[must_use]
    pub fn life(mut self, life: Life) -> Self {
        self.life = life;
        self
    }

    #[must_use]
    pub fn one_shot(self) -> Self {
        self.life(Life::OneShot)
    }

    #[must_use]
    pub fn condition(mut self, source: &str) -> Self {
        self.condition = Some(source.to_string());
        self
    }

    /// Skip the first `count` matches.
    #[must_use]
    pub fn ignore(mut self, count: u32) -> Self {
        self.ignore_count = count;
        self
    }

    /// Port address bits that must match. Ignored for other kinds.
    #[must_use]
    pub fn port_mask(mut self, mask: u16) -> Self {
        self.port_mask = mask;
        self
    }
}

/// A registered breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub id: u32,
    pub kind: BreakpointKind,
    pub target: u32,
    pub life: Life,
    /// Condition as the user wrote it.
    pub condition: Option<String>,
    pub ignore_count: u32,
    pub port_mask: u16,
    expr: Option<Expr>,
    /// Time breakpoints fire at most once per frame.
    armed: bool,
}

impl Breakpoint {
    fn matches(&self, event: DebugEvent) -> bool {
        let target = self.target;
        match event {
            DebugEvent::Execute(addr) | DebugEvent::Read(addr) | DebugEvent::Write(addr) => {
                self.kind == event.kind() && u32::from(addr) == target
            }
            DebugEvent::PortRead(port) | DebugEvent::PortWrite(port) => {
                self.kind == event.kind()
                    && u32::from(port & self.port_mask) == target & u32::from(self.port_mask)
            }
            DebugEvent::Time(cycle) => self.kind == BreakpointKind::Time && self.armed && cycle >= target,
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.kind)?;
        match self.kind {
            BreakpointKind::Time => write!(f, " @{}", self.target)?,
            _ => write!(f, " ${:04X}", self.target)?,
        }
        if self.life == Life::OneShot {
            f.write_str(" (once)")?;
        }
        if let Some(condition) = &self.condition {
            write!(f, " if {condition}")?;
        }
        Ok(())
    }
}

/// Breakpoint registry and matcher.
#[derive(Debug, Clone)]
pub struct Debugger {
    breakpoints: Vec<Breakpoint>,
    next_id: u32,
    frame_length: u32,
}

impl Debugger {
    /// `frame_length` bounds the targets of time breakpoints.
    #[must_use]
    pub fn new(frame_length: u32) -> Self {
        Self {
            breakpoints: Vec::new(),
            next_id: 1,
            frame_length,
        }
    }

    /// Register a breakpoint and return its id.
    pub fn add(
        &mut self,
        kind: BreakpointKind,
        target: u32,
        life: Life,
        condition: Option<&str>,
    ) -> Result<u32, DebuggerError> {
        let mut spec = BreakpointSpec::new(kind, target).life(life);
        spec.condition = condition.map(str::to_string);
        self.add_with(spec)
    }

    pub fn add_with(&mut self, spec: BreakpointSpec) -> Result<u32, DebuggerError> {
        let limit = match spec.kind {
            BreakpointKind::Time => self.frame_length,
            _ => 0x1_0000,
        };
        if spec.target >= limit {
            return Err(DebuggerError::InvalidTarget {
                kind: spec.kind,
                target: spec.target,
            });
        }
        let expr = spec.condition.as_deref().map(Expr::parse).transpose()?;

        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(DebuggerError::IdsExhausted)?;
        let breakpoint = Breakpoint {
            id,
            kind: spec.kind,
            target: spec.target,
            life: spec.life,
            condition: spec.condition,
            ignore_count: spec.ignore_count,
            port_mask: spec.port_mask,
            expr,
            armed: true,
        };
        log::debug!("breakpoint added: {breakpoint}");
        self.breakpoints.push(breakpoint);
        Ok(id)
    }

    /// Remove a breakpoint. `false` if no breakpoint has that id.
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.breakpoints.len();
        self.breakpoints.retain(|bp| bp.id != id);
        let removed = self.breakpoints.len() != before;
        if removed {
            log::debug!("breakpoint #{id} removed");
        }
        removed
    }

    pub fn remove_all(&mut self) {
        self.breakpoints.clear();
    }

    /// Change a breakpoint's ignore count. `false` if the id is unknown.
    pub fn set_ignore(&mut self, id: u32, count: u32) -> bool {
        let Some(bp) = self.find_mut(id) else {
            return false;
        };
        bp.ignore_count = count;
        true
    }

    /// Replace (or with `None`, clear) a breakpoint's condition.
    /// `Ok(false)` if the id is unknown.
    pub fn set_condition(&mut self, id: u32, condition: Option<&str>) -> Result<bool, DebuggerError> {
        let expr = condition.map(Expr::parse).transpose()?;
        let Some(bp) = self.find_mut(id) else {
            return Ok(false);
        };
        bp.condition = condition.map(str::to_string);
        bp.expr = expr;
        Ok(true)
    }

    fn find_mut(&mut self, id: u32) -> Option<&mut Breakpoint> {
        self.breakpoints.iter_mut().find(|bp| bp.id == id)
    }

    /// Offer an event to every breakpoint. Returns `true` if at least one
    /// triggered.
    pub fn check(&mut self, event: DebugEvent, ctx: &dyn EvalContext) -> bool {
        let mut triggered = false;
        self.breakpoints.retain_mut(|bp| {
            if !bp.matches(event) {
                return true;
            }
            if bp.expr.as_ref().is_some_and(|expr| !expr.is_true(ctx)) {
                return true;
            }
            if bp.kind == BreakpointKind::Time {
                bp.armed = false;
            }
            if bp.ignore_count > 0 {
                bp.ignore_count -= 1;
                return true;
            }
            log::info!("breakpoint hit: {bp}");
            triggered = true;
            bp.life == Life::Permanent
        });
        triggered
    }

    /// Re-arm time breakpoints for the next frame.
    pub fn frame_boundary(&mut self) {
        for bp in &mut self.breakpoints {
            bp.armed = true;
        }
    }

    #[must_use]
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    #[must_use]
    pub fn frame_length(&self) -> u32 {
        self.frame_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        a: u32,
    }

    impl EvalContext for Ctx {
        fn variable(&self, var: Variable) -> u32 {
            if var == Variable::A { self.a } else { 0 }
        }

        fn peek(&self, _addr: u16) -> u8 {
            0
        }
    }

    const CTX: Ctx = Ctx { a: 0 };

    fn debugger() -> Debugger {
        Debugger::new(69_888)
    }

    #[test]
    fn ids_are_monotonic() {
        let mut dbg = debugger();
        let a = dbg.add(BreakpointKind::Execute, 0x8000, Life::Permanent, None);
        let b = dbg.add(BreakpointKind::Read, 0x4000, Life::Permanent, None);
        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(2));
        assert!(dbg.remove(1));
        assert!(!dbg.remove(1));
        assert_eq!(dbg.add(BreakpointKind::Write, 0, Life::Permanent, None), Ok(3));
    }

    #[test]
    fn ids_never_wrap() {
        let mut dbg = debugger();
        dbg.next_id = u32::MAX - 1;
        assert_eq!(
            dbg.add(BreakpointKind::Execute, 0, Life::Permanent, None),
            Ok(u32::MAX - 1)
        );
        assert_eq!(
            dbg.add(BreakpointKind::Execute, 1, Life::Permanent, None),
            Err(DebuggerError::IdsExhausted)
        );
        assert_eq!(dbg.breakpoints().len(), 1);
    }

    #[test]
    fn rejects_invalid_targets_and_conditions() {
        let mut dbg = debugger();
        assert_eq!(
            dbg.add(BreakpointKind::Execute, 0x1_0000, Life::Permanent, None),
            Err(DebuggerError::InvalidTarget {
                kind: BreakpointKind::Execute,
                target: 0x1_0000
            })
        );
        assert!(matches!(
            dbg.add(BreakpointKind::Time, 69_888, Life::Permanent, None),
            Err(DebuggerError::InvalidTarget { .. })
        ));
        assert!(matches!(
            dbg.add(BreakpointKind::Execute, 0, Life::Permanent, Some("pc ==")),
            Err(DebuggerError::InvalidCondition(_))
        ));
        assert!(dbg.is_empty());
    }

    #[test]
    fn one_shot_is_removed_after_trigger() {
        let mut dbg = debugger();
        dbg.add(BreakpointKind::Execute, 0x8000, Life::OneShot, None).ok();
        assert!(!dbg.check(DebugEvent::Execute(0x8001), &CTX));
        assert!(dbg.check(DebugEvent::Execute(0x8000), &CTX));
        assert!(dbg.is_empty());
        assert!(!dbg.check(DebugEvent::Execute(0x8000), &CTX));
    }

    #[test]
    fn kinds_do_not_cross_match() {
        let mut dbg = debugger();
        dbg.add(BreakpointKind::Write, 0x4000, Life::Permanent, None).ok();
        assert!(!dbg.check(DebugEvent::Read(0x4000), &CTX));
        assert!(!dbg.check(DebugEvent::Execute(0x4000), &CTX));
        assert!(dbg.check(DebugEvent::Write(0x4000), &CTX));
    }

    #[test]
    fn ignore_count_skips_matches() {
        let mut dbg = debugger();
        let spec = BreakpointSpec::new(BreakpointKind::Execute, 0x38).ignore(2);
        let id = dbg.add_with(spec).unwrap_or_default();
        assert!(!dbg.check(DebugEvent::Execute(0x38), &CTX));
        assert!(!dbg.check(DebugEvent::Execute(0x38), &CTX));
        assert!(dbg.check(DebugEvent::Execute(0x38), &CTX));
        assert!(dbg.check(DebugEvent::Execute(0x38), &CTX));
        assert!(dbg.set_ignore(id, 1));
        assert!(!dbg.check(DebugEvent::Execute(0x38), &CTX));
        assert!(!dbg.set_ignore(99, 1));
    }

    #[test]
    fn condition_gates_trigger() {
        let mut dbg = debugger();
        let id = dbg
            .add(BreakpointKind::Execute, 0x8000, Life::Permanent, Some("a == 5"))
            .unwrap_or_default();
        assert!(!dbg.check(DebugEvent::Execute(0x8000), &Ctx { a: 4 }));
        assert!(dbg.check(DebugEvent::Execute(0x8000), &Ctx { a: 5 }));

        assert_eq!(dbg.set_condition(id, None), Ok(true));
        assert!(dbg.check(DebugEvent::Execute(0x8000), &Ctx { a: 4 }));
        assert!(dbg.set_condition(id, Some("(")).is_err());
        assert_eq!(dbg.breakpoints()[0].condition, None);
        assert_eq!(dbg.set_condition(42, Some("a")), Ok(false));
    }

    #[test]
    fn port_mask_matches_partial_decode() {
        let mut dbg = debugger();
        let spec = BreakpointSpec::new(BreakpointKind::PortWrite, 0x00FE).port_mask(0x00FF);
        dbg.add_with(spec).ok();
        assert!(dbg.check(DebugEvent::PortWrite(0x12FE), &CTX));
        assert!(!dbg.check(DebugEvent::PortWrite(0x12FF), &CTX));
        assert!(!dbg.check(DebugEvent::PortRead(0x00FE), &CTX));

        dbg.add(BreakpointKind::PortRead, 0x7FFD, Life::Permanent, None).ok();
        assert!(!dbg.check(DebugEvent::PortRead(0xFFFD), &CTX));
        assert!(dbg.check(DebugEvent::PortRead(0x7FFD), &CTX));
    }

    #[test]
    fn time_breakpoint_fires_once_per_frame() {
        let mut dbg = debugger();
        dbg.add(BreakpointKind::Time, 1000, Life::Permanent, None).ok();
        assert!(!dbg.check(DebugEvent::Time(999), &CTX));
        assert!(dbg.check(DebugEvent::Time(1004), &CTX));
        assert!(!dbg.check(DebugEvent::Time(1010), &CTX));
        dbg.frame_boundary();
        assert!(!dbg.check(DebugEvent::Time(4), &CTX));
        assert!(dbg.check(DebugEvent::Time(1000), &CTX));
    }

    #[test]
    fn all_matches_are_processed() {
        let mut dbg = debugger();
        dbg.add(BreakpointKind::Execute, 0x8000, Life::OneShot, None).ok();
        dbg.add(BreakpointKind::Execute, 0x8000, Life::Permanent, None).ok();
        dbg.add(BreakpointKind::Execute, 0x8000, Life::OneShot, None).ok();
        assert!(dbg.check(DebugEvent::Execute(0x8000), &CTX));
        let left: Vec<u32> = dbg.breakpoints().iter().map(|bp| bp.id).collect();
        assert_eq!(left, [2]);
    }

    #[test]
    fn display() {
        let mut dbg = debugger();
        dbg.add_with(
            BreakpointSpec::new(BreakpointKind::Execute, 0x8000)
                .one_shot()
                .condition("a == 1"),
        )
        .ok();
        assert_eq!(dbg.breakpoints()[0].to_string(), "#1 execute $8000 (once) if a == 1");
    }
}
