use crate::config::MatchPolicy;
use crate::instrument::{InstrumentNumber, InstrumentParser};
use crate::pattern::dense_key;
use crate::registry::{Registry, RegistryRecord};

/// Maps canonical phrases and instrument numbers to registry records.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r Registry,
    policy: MatchPolicy,
    marker: &'r str,
    instruments: Option<&'r InstrumentParser>,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry, policy: MatchPolicy, marker: &'r str, instruments: Option<&'r InstrumentParser>) -> Self {
        Resolver { registry, policy, marker, instruments }
    }

    pub fn resolve_standard(&self, phrase: &str) -> Option<&'r RegistryRecord> {
        let dense = dense_key(phrase);
        if dense.is_empty() {
            return None;
        }
        match self.policy {
            MatchPolicy::Exact => self.registry.get(&dense),
            MatchPolicy::Substring => self.registry.find_contained_in(&dense),
        }
    }

    /// Exact instrument number, exact canonical phrase, then a registry key
    /// citing the same number, year, type and agency. A shared leading number
    /// alone never resolves.
    pub fn resolve_decree(&self, canonical: &str, instrument: Option<&InstrumentNumber>) -> Option<&'r RegistryRecord> {
        if let Some(record) = instrument.and_then(|inst| self.registry.get(&dense_key(&inst.code()))) {
            return Some(record);
        }
        let dense = dense_key(canonical);
        if let Some(record) = self.registry.get(&dense) {
            return Some(record);
        }
        let inst = instrument?;
        let parser = self.instruments?;
        self.registry
            .records()
            .iter()
            .find(|record| parser.parse_all(&record.key).any(|cited| cited == *inst))
    }

    pub fn is_expired(&self, record: &RegistryRecord) -> bool {
        record.status().map_or(false, |status| status.contains(self.marker))
    }
}
