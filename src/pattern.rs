use regex::{Regex, RegexBuilder};

use crate::config::{ConfigError, ContextPolicy, FamilySpec};
use crate::segment::Segment;

#[derive(Debug, Clone)]
struct Family {
    name: String,
    regex: Regex,
}

/// One regex hit that passed the base-token filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub segment: usize,
    pub text: String,
    /// Byte offsets within the segment text.
    pub start: usize,
    pub end: usize,
    /// Match text with all whitespace removed.
    pub dense: String,
    pub base_token: String,
    pub class: ContextPolicy,
}

/// Compiled, ordered family table plus the recognized token list.
#[derive(Debug, Clone)]
pub struct FamilyTable {
    families: Vec<Family>,
    tokens: Vec<(String, ContextPolicy)>,
}

impl FamilyTable {
    pub fn compile(specs: &[FamilySpec]) -> Result<Self, ConfigError> {
        let mut families = Vec::with_capacity(specs.len());
        let mut tokens: Vec<(String, ContextPolicy)> = Vec::new();
        for spec in specs {
            let regex = RegexBuilder::new(&spec.pattern)
                .case_insensitive(spec.case_insensitive)
                .build()
                .map_err(|e| ConfigError::Pattern { family: spec.name.clone(), message: e.to_string() })?;
            families.push(Family { name: spec.name.clone(), regex });
            if !tokens.iter().any(|(t, _)| t == &spec.token) {
                tokens.push((spec.token.clone(), spec.class));
            }
        }
        Ok(FamilyTable { families, tokens })
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn tokens_of(&self, class: ContextPolicy) -> Vec<String> {
        self.tokens.iter().filter(|(_, c)| *c == class).map(|(t, _)| t.clone()).collect()
    }

    /// First token in declaration order that prefixes the dense key.
    /// Case-sensitive, so lowercase hits from case-insensitive families fall out here.
    pub fn base_token(&self, dense: &str) -> Option<(&str, ContextPolicy)> {
        self.tokens
            .iter()
            .find(|(token, _)| dense.starts_with(token.as_str()))
            .map(|(token, class)| (token.as_str(), *class))
    }

    /// All accepted matches of a segment, family-major then by position.
    pub fn find_matches(&self, segment: &Segment<'_>) -> Vec<RawMatch> {
        let mut out = Vec::new();
        for family in &self.families {
            for m in family.regex.find_iter(segment.text) {
                let dense = dense_key(m.as_str());
                let Some((token, class)) = self.base_token(&dense) else {
                    tracing::trace!(family = %family.name, text = m.as_str(), "discarded match without base token");
                    continue;
                };
                out.push(RawMatch {
                    segment: segment.index,
                    text: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                    base_token: token.to_string(),
                    class,
                    dense,
                });
            }
        }
        out
    }
}

/// Remove every whitespace character.
pub fn dense_key(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
