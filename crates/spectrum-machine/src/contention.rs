//! Contended memory timing.
//!
//! While the ULA (or the +2A/+3 gate array) fetches the screen it holds the
//! bus, and the CPU waits when it touches a contended page. The delay depends
//! only on where in the frame the access happens:
//!
//! - 192 screen lines, starting at `first_contended`
//! - 128 contended T-states at the start of each line
//! - within those, an 8 T-state repeating pattern
//!
//! The model holds constants only. The frame counter belongs to the CPU.

/// Sinclair ULA pattern (16K/48K/128K/+2, also Timex SCLD and the SE).
pub const ULA_PATTERN: [u8; 8] = [6, 5, 4, 3, 2, 1, 0, 0];

/// Amstrad gate array pattern (+2A/+3).
pub const GATE_ARRAY_PATTERN: [u8; 8] = [1, 0, 7, 6, 5, 4, 3, 2];

/// Screen lines that see contention.
const SCREEN_LINES: u32 = 192;

/// T-states per line during which the screen is fetched.
const CONTENDED_TSTATES_PER_LINE: u32 = 128;

/// Frame timing and contention pattern for one machine model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentionModel {
    /// T-states per frame.
    pub frame_length: u32,
    /// T-states per scanline.
    pub tstates_per_line: u32,
    /// T-state of the first contended access in the frame.
    pub first_contended: u32,
    /// Repeating delay pattern, `None` for machines without contention.
    pub pattern: Option<[u8; 8]>,
}

impl ContentionModel {
    pub const SPECTRUM_48K: Self = Self {
        frame_length: 69_888,
        tstates_per_line: 224,
        first_contended: 14_335,
        pattern: Some(ULA_PATTERN),
    };

    pub const SPECTRUM_128K: Self = Self {
        frame_length: 70_908,
        tstates_per_line: 228,
        first_contended: 14_361,
        pattern: Some(ULA_PATTERN),
    };

    pub const SPECTRUM_PLUS3: Self = Self {
        frame_length: 70_908,
        tstates_per_line: 228,
        first_contended: 14_361,
        pattern: Some(GATE_ARRAY_PATTERN),
    };

    /// Pentagon: no contention at all.
    pub const PENTAGON: Self = Self {
        frame_length: 71_680,
        tstates_per_line: 224,
        first_contended: 0,
        pattern: None,
    };

    /// TS2068 runs 60 Hz NTSC timing: 262 lines of 228 T-states.
    pub const TIMEX_NTSC: Self = Self {
        frame_length: 59_736,
        tstates_per_line: 228,
        first_contended: 9_119,
        pattern: Some(ULA_PATTERN),
    };

    /// Extra T-states for an access to a page with the given `contended`
    /// flag at `frame_cycle`.
    #[must_use]
    pub const fn delay(&self, contended: bool, frame_cycle: u32) -> u8 {
        let Some(pattern) = self.pattern else {
            return 0;
        };
        if !contended || frame_cycle < self.first_contended {
            return 0;
        }
        let since = frame_cycle - self.first_contended;
        let line = since / self.tstates_per_line;
        let line_cycle = since % self.tstates_per_line;
        if line >= SCREEN_LINES || line_cycle >= CONTENDED_TSTATES_PER_LINE {
            return 0;
        }
        pattern[(line_cycle % 8) as usize]
    }
}
