//! Z80 instruction lengths.
//!
//! Only as much decoding as step-over needs: how many bytes the instruction
//! at an address occupies. Opcodes are split into the usual `x/y/z/p/q`
//! fields (`x = op >> 6`, `y = (op >> 3) & 7`, `z = op & 7`, `p = y >> 1`,
//! `q = y & 1`).

/// Length in bytes (1-4) of the instruction at `addr`, reading through
/// `peek`. Addresses wrap at $FFFF.
pub fn instruction_length(peek: impl Fn(u16) -> u8, addr: u16) -> u16 {
    let op = peek(addr);
    match op {
        0xCB => 2,
        0xED => ed_length(peek(addr.wrapping_add(1))),
        0xDD | 0xFD => indexed_length(peek(addr.wrapping_add(1))),
        _ => base_length(op),
    }
}

/// Unprefixed opcode.
fn base_length(op: u8) -> u16 {
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let q = y & 1;
    let p = y >> 1;
    match (x, z) {
        (0, 0) => {
            if y < 2 {
                1
            } else {
                // DJNZ, JR, JR cc
                2
            }
        }
        (0, 1) => {
            if q == 0 {
                3
            } else {
                1
            }
        }
        // LD (nn),HL / LD (nn),A / LD HL,(nn) / LD A,(nn)
        (0, 2) => {
            if p >= 2 {
                3
            } else {
                1
            }
        }
        (0, 6) | (3, 6) => 2,
        (3, 2) | (3, 4) => 3,
        (3, 3) => match y {
            0 => 3,
            // OUT (n),A / IN A,(n)
            2 | 3 => 2,
            _ => 1,
        },
        // CALL nn
        (3, 5) if y == 1 => 3,
        _ => 1,
    }
}

fn ed_length(op: u8) -> u16 {
    // LD (nn),rp / LD rp,(nn)
    if op & 0xC7 == 0x43 { 4 } else { 2 }
}

/// DD/FD-prefixed: IX/IY replace HL, and `(HL)` becomes `(IX+d)`.
fn indexed_length(op: u8) -> u16 {
    match op {
        // Displacement then opcode.
        0xCB => 4,
        // A second prefix: this one behaves as a lone NOP.
        0xDD | 0xED | 0xFD => 1,
        _ => 1 + base_length(op) + u16::from(has_displacement(op)),
    }
}

/// Opcodes that address `(HL)`, and so take a displacement when indexed.
fn has_displacement(op: u8) -> bool {
    let z = op & 7;
    let y = (op >> 3) & 7;
    match op >> 6 {
        // INC (HL), DEC (HL), LD (HL),n
        0 => y == 6 && (4..=6).contains(&z),
        // LD r,(HL) and LD (HL),r, but not HALT
        1 => op != 0x76 && (z == 6 || y == 6),
        2 => z == 6,
        _ => false,
    }
}
