//! Citation audit engine: finds standard and decree references in extracted
//! document text, normalizes them and resolves each against a status registry.

pub mod config;
pub mod files;
pub mod instrument;
pub mod normalize;
pub mod pattern;
pub mod registry;
pub mod resolve;
pub mod scan;
pub mod segment;

pub use config::{load_config, ConfigError, ContextPolicy, FamilySpec, MatchPolicy, ScanConfig, Variant, WindowSizes, EXPIRED_MARKER};
pub use files::{document_id, emit_report, enumerate_documents, read_document, report_fingerprint, sha256_hex, DocumentError, EmitError};
pub use instrument::{InstrumentNumber, InstrumentParser};
pub use normalize::{Normalized, Normalizer, Rewrite};
pub use pattern::{dense_key, FamilyTable, RawMatch};
pub use registry::{Registry, RegistryError, RegistryRecord, RegistryShape};
pub use resolve::Resolver;
pub use scan::{scan, ResolvedReference, ScanError, ScanReport, Scanner};
pub use segment::{segments, Segment, Segments};
