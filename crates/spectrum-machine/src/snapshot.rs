//! Machine state snapshots.
//!
//! A snapshot holds what the paging core owns: the model, the banking
//! registers, the CPU registers and the contents of every writable pool.
//! ROM is not stored; it comes from the machine's configuration. The JSON
//! form carries each page as a base64 string.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use emu_core::Registers;
use serde::{Deserialize, Serialize};

use crate::banking::BankingState;
use crate::config::SpectrumModel;
use crate::error::MachineError;
use crate::memory::{PAGE_SIZE, PageStore, Source};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub model: SpectrumModel,
    pub banking: BankingState,
    pub registers: Registers,
    pub frame_count: u64,
    #[serde(with = "pages")]
    pub ram: Vec<Vec<u8>>,
    #[serde(default, with = "pages")]
    pub dock: Vec<Vec<u8>>,
    #[serde(default, with = "pages")]
    pub exrom: Vec<Vec<u8>>,
}

impl Snapshot {
    /// Pages a snapshot carries for `source`: the whole pool if it is
    /// writable, none if it is ROM-like (part of the configuration).
    fn expected_pages(store: &PageStore, source: Source) -> usize {
        let pool = store.pool(source);
        if pool.iter().all(|page| page.writable) {
            pool.len()
        } else {
            0
        }
    }

    pub(crate) fn capture_pages(store: &PageStore, source: Source) -> Vec<Vec<u8>> {
        if Self::expected_pages(store, source) == 0 {
            return Vec::new();
        }
        store
            .pool(source)
            .iter()
            .map(|page| page.data().to_vec())
            .collect()
    }

    /// Check that `pages` fits the pool: right count, every page full size.
    pub(crate) fn check_pages(
        store: &PageStore,
        source: Source,
        pages: &[Vec<u8>],
    ) -> Result<(), MachineError> {
        let expected = Self::expected_pages(store, source);
        if pages.len() != expected {
            return Err(MachineError::Snapshot(format!(
                "{source:?} needs {expected} pages, snapshot has {}",
                pages.len()
            )));
        }
        if let Some(bad) = pages.iter().position(|page| page.len() != PAGE_SIZE) {
            return Err(MachineError::Snapshot(format!(
                "{source:?} page {bad} is {} bytes",
                pages[bad].len()
            )));
        }
        Ok(())
    }

    /// Copy pages already accepted by [`check_pages`](Self::check_pages).
    pub(crate) fn restore_pages(store: &mut PageStore, source: Source, pages: &[Vec<u8>]) {
        for (desc, data) in store.pool_mut(source).iter_mut().zip(pages) {
            desc.data_mut().copy_from_slice(data);
        }
    }

    pub fn to_json(&self) -> Result<String, MachineError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, MachineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Pages as a list of base64 strings.
mod pages {
    use super::{Engine, STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error, ser::SerializeSeq};

    pub fn serialize<S: Serializer>(pages: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(pages.len()))?;
        for page in pages {
            seq.serialize_element(&STANDARD.encode(page))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|text| STANDARD.decode(text).map_err(D::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{PageRef, PoolSizes};

    fn store() -> PageStore {
        PageStore::new(PoolSizes {
            rom: 2,
            ram: 4,
            dock: 2,
            exrom: 0,
        })
    }

    #[test]
    fn read_only_pools_are_skipped() {
        let store = store();
        assert_eq!(Snapshot::capture_pages(&store, Source::Ram).len(), 4);
        assert!(Snapshot::capture_pages(&store, Source::Dock).is_empty());
    }

    #[test]
    fn check_validates_shape() {
        let mut store = store();
        let short = vec![vec![0u8; PAGE_SIZE]; 3];
        assert!(matches!(
            Snapshot::check_pages(&store, Source::Ram, &short),
            Err(MachineError::Snapshot(_))
        ));
        let mut pages = vec![vec![0u8; PAGE_SIZE]; 4];
        pages[1] = vec![0; 10];
        assert!(Snapshot::check_pages(&store, Source::Ram, &pages).is_err());

        pages[1] = vec![0x5A; PAGE_SIZE];
        assert!(Snapshot::check_pages(&store, Source::Ram, &pages).is_ok());
        Snapshot::restore_pages(&mut store, Source::Ram, &pages);
        assert_eq!(store.page(PageRef::ram(1)).data()[100], 0x5A);

        assert!(Snapshot::check_pages(&store, Source::Dock, &[]).is_ok());
        assert!(Snapshot::check_pages(&store, Source::Dock, &pages[..2]).is_err());
    }

    fn sample() -> Snapshot {
        Snapshot {
            model: SpectrumModel::Spectrum48K,
            banking: BankingState::default(),
            registers: Registers::default(),
            frame_count: 7,
            ram: vec![vec![0xFF; PAGE_SIZE]],
            dock: Vec::new(),
            exrom: Vec::new(),
        }
    }

    #[test]
    fn json_carries_pages_as_base64() {
        let snapshot = sample();
        let json = snapshot.to_json().unwrap_or_default();
        assert!(json.contains("\"////"));
        let back = Snapshot::from_json(&json).ok();
        assert_eq!(back.as_ref(), Some(&snapshot));
    }

    #[test]
    fn rejects_bad_base64() {
        let mut snapshot = sample();
        snapshot.ram = vec![vec![0xFF; 3]];
        let json = snapshot.to_json().unwrap_or_default().replace("////", "!!!!");
        assert!(matches!(Snapshot::from_json(&json), Err(MachineError::Json(_))));
    }
}
