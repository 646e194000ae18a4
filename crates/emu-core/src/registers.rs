//! Z80 register set.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

use crate::{Observable, Value};

/// A 16-bit register pair with explicit high/low byte access.
///
/// Z80 code freely mixes `HL` with `H` and `L`; this type keeps one 16-bit
/// value and derives the halves, so there is no byte aliasing to get wrong.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterPair(u16);

impl RegisterPair {
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn from_bytes(hi: u8, lo: u8) -> Self {
        Self((hi as u16) << 8 | lo as u16)
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// High byte (`A` of `AF`, `H` of `HL`).
    #[must_use]
    pub const fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Low byte (`F` of `AF`, `L` of `HL`).
    #[must_use]
    pub const fn lo(self) -> u8 {
        self.0 as u8
    }

    pub fn set(&mut self, value: u16) {
        self.0 = value;
    }

    pub fn set_hi(&mut self, value: u8) {
        self.0 = (self.0 & 0x00FF) | (u16::from(value) << 8);
    }

    pub fn set_lo(&mut self, value: u8) {
        self.0 = (self.0 & 0xFF00) | u16::from(value);
    }
}

impl From<u16> for RegisterPair {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<RegisterPair> for u16 {
    fn from(pair: RegisterPair) -> Self {
        pair.0
    }
}

/// Z80 registers snapshot for observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    // Main registers
    pub af: RegisterPair,
    pub bc: RegisterPair,
    pub de: RegisterPair,
    pub hl: RegisterPair,

    // Alternate registers
    pub af_alt: RegisterPair,
    pub bc_alt: RegisterPair,
    pub de_alt: RegisterPair,
    pub hl_alt: RegisterPair,

    // Index registers
    pub ix: u16,
    pub iy: u16,

    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,

    // Interrupt state
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,

    pub halted: bool,
}

impl Registers {
    #[must_use]
    pub const fn a(&self) -> u8 {
        self.af.hi()
    }

    #[must_use]
    pub const fn f(&self) -> u8 {
        self.af.lo()
    }

    #[must_use]
    pub const fn b(&self) -> u8 {
        self.bc.hi()
    }

    #[must_use]
    pub const fn c(&self) -> u8 {
        self.bc.lo()
    }

    #[must_use]
    pub const fn d(&self) -> u8 {
        self.de.hi()
    }

    #[must_use]
    pub const fn e(&self) -> u8 {
        self.de.lo()
    }

    #[must_use]
    pub const fn h(&self) -> u8 {
        self.hl.hi()
    }

    #[must_use]
    pub const fn l(&self) -> u8 {
        self.hl.lo()
    }
}

impl Observable for Registers {
    fn query(&self, path: &str) -> Option<Value> {
        let value = match path {
            "pc" => self.pc.into(),
            "sp" => self.sp.into(),
            "ix" => self.ix.into(),
            "iy" => self.iy.into(),
            "af" => self.af.get().into(),
            "bc" => self.bc.get().into(),
            "de" => self.de.get().into(),
            "hl" => self.hl.get().into(),
            "a" => self.a().into(),
            "f" => self.f().into(),
            "b" => self.b().into(),
            "c" => self.c().into(),
            "d" => self.d().into(),
            "e" => self.e().into(),
            "h" => self.h().into(),
            "l" => self.l().into(),
            "i" => self.i.into(),
            "r" => self.r.into(),
            "im" => self.im.into(),
            "iff1" => self.iff1.into(),
            "iff2" => self.iff2.into(),
            "halted" => self.halted.into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "sp", "ix", "iy", "af", "bc", "de", "hl", "a", "f", "b", "c", "d", "e", "h",
            "l", "i", "r", "im", "iff1", "iff2", "halted",
        ]
    }
}
