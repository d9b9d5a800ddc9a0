use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, ContextPolicy, MatchPolicy, ScanConfig, WindowSizes};
use crate::instrument::InstrumentParser;
use crate::normalize::{Normalizer, Rewrite};
use crate::pattern::{FamilyTable, RawMatch};
use crate::registry::{Registry, RegistryRecord};
use crate::resolve::Resolver;
use crate::segment::{segments, Segment};

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// One reference found in the document, resolved or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Match text with whitespace collapsed.
    pub matched_text: String,
    pub canonical_phrase: String,
    pub page: usize,
    pub line: usize,
    pub base_token: String,
    pub context_text: String,
    pub class: ContextPolicy,
    pub instrument_number: Option<String>,
    /// Trimmed registry key that matched.
    pub registry_match: Option<String>,
    /// Registry key cell as stored.
    pub registry_key_raw: Option<String>,
    /// One slot per registry status column; all `None` when unresolved.
    pub registry_fields: Vec<Option<String>>,
    pub is_expired: bool,
    pub numeric_part: String,
}

impl ResolvedReference {
    pub fn standard_type(&self) -> &str {
        &self.base_token
    }

    pub fn full_reference(&self) -> String {
        format!("{} {}", self.base_token, self.context_text).trim().to_string()
    }

    pub fn is_resolved(&self) -> bool {
        self.registry_match.is_some()
    }
}

/// Serialized entries besides the `matching_result_N` slots.
pub const FIXED_ENTRIES: usize = 14;

impl Serialize for ResolvedReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let width = self.registry_fields.len();
        let mut map = serializer.serialize_map(Some(FIXED_ENTRIES + width))?;
        map.serialize_entry("phrase", &self.canonical_phrase)?;
        map.serialize_entry("matched_text", &self.matched_text)?;
        map.serialize_entry("page", &self.page)?;
        map.serialize_entry("line", &self.line)?;
        map.serialize_entry("base_text", &self.base_token)?;
        map.serialize_entry("after_text", &self.context_text)?;
        map.serialize_entry("updated_phrase", &self.canonical_phrase)?;
        map.serialize_entry("matching_check_phrase", &self.registry_match)?;
        map.serialize_entry("first_col_value", &self.registry_key_raw)?;
        // field 0 is the highest-numbered slot: matching_result_3 for a 3-wide registry
        for (i, field) in self.registry_fields.iter().enumerate() {
            map.serialize_entry(&format!("matching_result_{}", width - i), field)?;
        }
        map.serialize_entry("standard_type", self.standard_type())?;
        map.serialize_entry("numeric_part", &self.numeric_part)?;
        map.serialize_entry("full_reference", &self.full_reference())?;
        map.serialize_entry("instrument_number", &self.instrument_number)?;
        map.serialize_entry("is_het_hieu_luc", &self.is_expired)?;
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub results: Vec<ResolvedReference>,
    #[serde(rename = "het_hieu_luc_count")]
    pub expired_count: usize,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("BinaryInput: NUL byte at offset {offset}, text was not extracted")]
    BinaryInput { offset: usize },
}

#[derive(Debug, Default)]
struct SegmentOutcome {
    references: Vec<ResolvedReference>,
    expired: usize,
}

/// Compiled engine: family table, normalizer and a bounded worker pool.
pub struct Scanner {
    table: FamilyTable,
    normalizer: Normalizer,
    instruments: Option<InstrumentParser>,
    windows: WindowSizes,
    policy: MatchPolicy,
    marker: String,
    rewrite_tokens: Vec<String>,
    pool: rayon::ThreadPool,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let table = FamilyTable::compile(&config.families())?;
        let decree_tokens = table.tokens_of(ContextPolicy::Decree);
        let instruments = if decree_tokens.is_empty() { None } else { Some(InstrumentParser::new(&decree_tokens)?) };
        let workers = config
            .workers
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("refcheck-scan-{}", i))
            .build()?;
        Ok(Scanner {
            normalizer: Normalizer::new(table.tokens(), config.windows),
            table,
            instruments,
            windows: config.windows,
            policy: config.match_policy(),
            marker: config.expired_marker.clone(),
            rewrite_tokens: config.rewrite_tokens.clone(),
            pool,
        })
    }

    pub fn table(&self) -> &FamilyTable {
        &self.table
    }

    /// Scan every segment on the worker pool. Results come back in segment
    /// order; expired counts are summed from per-segment tallies after the join.
    pub fn scan(&self, text: &str, registry: &Registry) -> Result<ScanReport, ScanError> {
        if let Some(offset) = text.find('\0') {
            return Err(ScanError::BinaryInput { offset });
        }
        let resolver = Resolver::new(registry, self.policy, &self.marker, self.instruments.as_ref());
        let width = registry.shape().width();
        let segs: Vec<Segment<'_>> = segments(text).collect();

        let outcomes: Vec<SegmentOutcome> =
            self.pool.install(|| segs.par_iter().map(|seg| self.scan_segment(seg, &resolver, width)).collect());

        let mut report = ScanReport::default();
        for outcome in outcomes {
            report.expired_count += outcome.expired;
            report.results.extend(outcome.references);
        }
        tracing::info!(
            segments = segs.len(),
            references = report.results.len(),
            expired = report.expired_count,
            "scan finished"
        );
        Ok(report)
    }

    fn scan_segment(&self, segment: &Segment<'_>, resolver: &Resolver<'_>, width: usize) -> SegmentOutcome {
        let mut outcome = SegmentOutcome::default();
        for raw in self.table.find_matches(segment) {
            let reference = self.resolve_match(segment, &raw, resolver, width);
            if reference.is_expired {
                outcome.expired += 1;
            }
            outcome.references.push(reference);
        }
        tracing::debug!(segment = segment.index, references = outcome.references.len(), "segment scanned");
        outcome
    }

    fn resolve_match(&self, segment: &Segment<'_>, raw: &RawMatch, resolver: &Resolver<'_>, width: usize) -> ResolvedReference {
        let normalized = self.normalizer.normalize(segment.text, raw);
        let mut instrument_number = None;

        let record: Option<&RegistryRecord> = match raw.class {
            ContextPolicy::Standard => Rewrite::plan(&raw.dense, &self.rewrite_tokens)
                .into_iter()
                .find_map(|rewrite| resolver.resolve_standard(&rewrite.apply(&normalized.canonical))),
            ContextPolicy::Decree => {
                let instrument = self.instruments.as_ref().and_then(|parser| {
                    parser
                        .find_near(segment.text, raw.start, self.windows.number_before, self.windows.number_after)
                        .or_else(|| parser.parse(&normalized.canonical))
                });
                let record = resolver.resolve_decree(&normalized.canonical, instrument.as_ref());
                instrument_number = instrument.map(|i| i.code());
                record
            }
        };

        if record.is_none() {
            tracing::debug!(phrase = %normalized.canonical, page = segment.index, "reference unresolved");
        }

        let numeric_part = DIGITS
            .find(&raw.dense)
            .or_else(|| DIGITS.find(&normalized.canonical))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        ResolvedReference {
            matched_text: raw.text.split_whitespace().collect::<Vec<_>>().join(" "),
            canonical_phrase: normalized.canonical,
            page: segment.index,
            line: segment.line_of(raw.start),
            base_token: normalized.base_token,
            context_text: normalized.context,
            class: raw.class,
            instrument_number,
            registry_match: record.map(|r| r.key.clone()),
            registry_key_raw: record.map(|r| r.raw_key.clone()),
            registry_fields: record.map(|r| r.fields.clone()).unwrap_or_else(|| vec![None; width]),
            is_expired: record.map_or(false, |r| resolver.is_expired(r)),
            numeric_part,
        }
    }
}

/// One-shot entry point: compile `config` and scan `text` against `registry`.
pub fn scan(text: &str, registry: &Registry, config: &ScanConfig) -> Result<ScanReport, ScanError> {
    Scanner::new(config)?.scan(text, registry)
}
