//! Spectrum model configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::banking::{BankingPolicy, Paged128, PagedPlus3, Sinclair48, SpectrumSe, Timex};
use crate::contention::ContentionModel;
use crate::error::MachineError;

/// Supported Spectrum models.
///
/// The machine uses a trait object (`Box<dyn BankingPolicy>`) internally,
/// selected by this enum at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectrumModel {
    // Sinclair
    Spectrum16K,
    Spectrum48K,
    Spectrum128K,
    SpectrumPlus2,
    // Amstrad gate array
    SpectrumPlus2A,
    SpectrumPlus3,
    // Russian
    Pentagon128,
    // Timex
    TimexTC2048,
    TimexTC2068,
    // Modern
    SpectrumSE,
}

impl SpectrumModel {
    pub const ALL: [Self; 10] = [
        Self::Spectrum16K,
        Self::Spectrum48K,
        Self::Spectrum128K,
        Self::SpectrumPlus2,
        Self::SpectrumPlus2A,
        Self::SpectrumPlus3,
        Self::Pentagon128,
        Self::TimexTC2048,
        Self::TimexTC2068,
        Self::SpectrumSE,
    ];

    /// Short identifier, also accepted by `FromStr`.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Spectrum16K => "16k",
            Self::Spectrum48K => "48k",
            Self::Spectrum128K => "128k",
            Self::SpectrumPlus2 => "plus2",
            Self::SpectrumPlus2A => "plus2a",
            Self::SpectrumPlus3 => "plus3",
            Self::Pentagon128 => "pentagon",
            Self::TimexTC2048 => "tc2048",
            Self::TimexTC2068 => "tc2068",
            Self::SpectrumSE => "se",
        }
    }

    /// Sizes of the ROM images the model expects, in the order they are
    /// concatenated in [`SpectrumConfig::rom`].
    ///
    /// The TC2068's second image is its 8K extension ROM.
    #[must_use]
    pub const fn rom_sizes(self) -> &'static [usize] {
        match self {
            Self::Spectrum16K | Self::Spectrum48K | Self::TimexTC2048 => &[0x4000],
            Self::Spectrum128K | Self::SpectrumPlus2 | Self::Pentagon128 | Self::SpectrumSE => {
                &[0x4000, 0x4000]
            }
            Self::SpectrumPlus2A | Self::SpectrumPlus3 => &[0x4000, 0x4000, 0x4000, 0x4000],
            Self::TimexTC2068 => &[0x4000, 0x2000],
        }
    }

    /// Total ROM bytes the model expects.
    #[must_use]
    pub fn rom_len(self) -> usize {
        self.rom_sizes().iter().sum()
    }

    /// The banking policy for this model.
    #[must_use]
    pub fn banking_policy(self) -> Box<dyn BankingPolicy> {
        match self {
            Self::Spectrum16K => Box::new(Sinclair48::spectrum_16k()),
            Self::Spectrum48K => Box::new(Sinclair48::spectrum_48k()),
            Self::Spectrum128K | Self::SpectrumPlus2 => {
                Box::new(Paged128::new(ContentionModel::SPECTRUM_128K))
            }
            Self::Pentagon128 => Box::new(Paged128::new(ContentionModel::PENTAGON)),
            Self::SpectrumPlus2A | Self::SpectrumPlus3 => Box::new(PagedPlus3),
            Self::TimexTC2048 => Box::new(Timex::tc2048()),
            Self::TimexTC2068 => Box::new(Timex::tc2068()),
            Self::SpectrumSE => Box::new(SpectrumSe),
        }
    }
}

impl fmt::Display for SpectrumModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SpectrumModel {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|model| model.id() == wanted)
            .ok_or_else(|| MachineError::UnknownModel(s.to_string()))
    }
}

/// Configuration for creating a Spectrum instance.
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    pub model: SpectrumModel,
    /// ROM images, concatenated in the order given by
    /// [`SpectrumModel::rom_sizes`].
    pub rom: Vec<u8>,
}

impl SpectrumConfig {
    /// Check the ROM length against the model.
    pub fn validate(&self) -> Result<(), MachineError> {
        let expected = self.model.rom_len();
        if self.rom.len() == expected {
            Ok(())
        } else {
            Err(MachineError::RomSize {
                model: self.model,
                expected,
                actual: self.rom.len(),
            })
        }
    }
}
