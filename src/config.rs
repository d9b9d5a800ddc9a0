use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status text marking an instrument that is no longer in force.
pub const EXPIRED_MARKER: &str = "Hết hiệu lực";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Standard codes resolve by exact key; decree families enabled.
    #[default]
    DecreeAware,
    /// Standard families only; registry key substring matching.
    Legacy,
}

impl Variant {
    pub fn match_policy(self) -> MatchPolicy {
        match self {
            Variant::DecreeAware => MatchPolicy::Exact,
            Variant::Legacy => MatchPolicy::Substring,
        }
    }
}

/// How a standard-code phrase is compared with registry keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    Exact,
    Substring,
}

/// Context capture rule attached to a family's token.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContextPolicy {
    /// Code follows the token: `TCVN 1234:2020`.
    #[default]
    Standard,
    /// Number precedes the token: `12/2021/NĐ-CP`.
    Decree,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamilySpec {
    pub name: String,
    pub pattern: String,
    pub token: String,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub class: ContextPolicy,
}

/// Character budgets (chars, not bytes) used by the normalizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WindowSizes {
    pub forward: usize,
    pub fallback: usize,
    pub preceding: usize,
    pub number_before: usize,
    pub number_after: usize,
}

impl Default for WindowSizes {
    fn default() -> Self {
        WindowSizes { forward: 50, fallback: 24, preceding: 20, number_before: 20, number_after: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrySource {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_shape")]
    pub shape: usize,
    #[serde(default = "default_key_column")]
    pub key_column: usize,
}

impl Default for RegistrySource {
    fn default() -> Self {
        RegistrySource { path: None, shape: default_shape(), key_column: default_key_column() }
    }
}

fn default_shape() -> usize {
    3
}

fn default_key_column() -> usize {
    1
}

fn default_marker() -> String {
    EXPIRED_MARKER.to_string()
}

fn default_rewrite_tokens() -> Vec<String> {
    vec!["TCVN".to_string(), "QCVN".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanConfig {
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub registry: RegistrySource,
    #[serde(default)]
    pub windows: WindowSizes,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_marker")]
    pub expired_marker: String,
    #[serde(default = "default_rewrite_tokens")]
    pub rewrite_tokens: Vec<String>,
    #[serde(default)]
    pub families: Option<Vec<FamilySpec>>, // None = built-in table for the variant
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            variant: Variant::default(),
            registry: RegistrySource::default(),
            windows: WindowSizes::default(),
            workers: None,
            expired_marker: default_marker(),
            rewrite_tokens: default_rewrite_tokens(),
            families: None,
        }
    }
}

impl ScanConfig {
    pub fn legacy() -> Self {
        ScanConfig { variant: Variant::Legacy, ..ScanConfig::default() }
    }

    /// Family table in declaration order, explicit or built-in.
    pub fn families(&self) -> Vec<FamilySpec> {
        match &self.families {
            Some(list) => list.clone(),
            None => default_families(self.variant),
        }
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.variant.match_policy()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.shape != 3 && self.registry.shape != 5 {
            return Err(ConfigError::Invalid(format!("registry.shape must be 3 or 5, got {}", self.registry.shape)));
        }
        if self.windows.fallback > self.windows.forward {
            return Err(ConfigError::Invalid("windows.fallback exceeds windows.forward".into()));
        }
        if self.expired_marker.trim().is_empty() {
            return Err(ConfigError::Invalid("missing expired_marker".into()));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        let families = self.families();
        if families.is_empty() {
            return Err(ConfigError::Invalid("no pattern families".into()));
        }
        for family in &families {
            if family.token.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("family {} has an empty token", family.name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Invalid pattern for family {family}: {message}")]
    Pattern { family: String, message: String },
}

/// Read and validate a YAML scan config.
pub fn load_config(path: &Path) -> Result<ScanConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    let config: ScanConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

const STANDARD_TOKENS: [&str; 14] = [
    "TCVN", "QCVN", "TCXDVN", "TCXD", "TCN", "ACI", "ASTM", "BHT", "IEC", "IEEE", "TCCS", "NFPA", "TC", "ITU",
];

const DECREE_TOKENS: [&str; 6] = ["TTLT", "NĐ", "TT", "QĐ", "NQ", "CT"];

/// Built-in family table. Standard families come first, decree families
/// only for the decree-aware variant.
pub fn default_families(variant: Variant) -> Vec<FamilySpec> {
    let mut families: Vec<FamilySpec> = STANDARD_TOKENS
        .iter()
        .map(|token| FamilySpec {
            name: token.to_lowercase(),
            pattern: standard_pattern(token),
            token: token.to_string(),
            case_insensitive: true,
            class: ContextPolicy::Standard,
        })
        .collect();

    if variant == Variant::DecreeAware {
        families.extend(DECREE_TOKENS.iter().map(|token| FamilySpec {
            name: token.to_lowercase(),
            pattern: format!(r"\b{}\s*-\s*[A-ZĐ][A-Za-zĐ]*(?:-[A-ZĐ][A-Za-zĐ]*)*", token),
            token: token.to_string(),
            case_insensitive: false,
            class: ContextPolicy::Decree,
        }));
    }
    families
}

fn standard_pattern(token: &str) -> String {
    match token {
        "QCVN" => r"QCVN(?:\s+[A-Za-z0-9Đ-]+)?(?:[-:]\d+)?(?:\s*:\s*\d+(?:\s*[A-Z]+)?)?".to_string(),
        "ASTM" => r"ASTM\s*[A-Z]?\d+(?:[-:]\d+)?(?:[-:]\d+)?(?:\s*:\s*\d+(?:\s*\d+)?)?".to_string(),
        "ITU" => r"ITU(?:-[TR])?\s*\d+(?:[-:]\d+)?(?:[-:]\d+)?(?:\s*:\s*\d+(?:\s*\d+)?)?".to_string(),
        other => format!(r"{}\s*\d+(?:[-:]\d+)?(?:[-:]\d+)?(?:\s*:\s*\d+(?:\s*\d+)?)?", other),
    }
}
