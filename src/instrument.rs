use std::fmt;

use regex::{Captures, Regex};

use crate::config::ConfigError;
use crate::normalize::{last_chars, take_chars};

/// Parsed `<number>/[<year>/]<KIND>-<AGENCY>` instrument number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentNumber {
    pub number: String,
    pub year: Option<String>,
    pub kind: String,
    pub agency: String,
}

impl InstrumentNumber {
    /// Digit-and-type core, e.g. `12/2021/NĐ`.
    pub fn core(&self) -> String {
        match &self.year {
            Some(year) => format!("{}/{}/{}", self.number, year, self.kind),
            None => format!("{}/{}", self.number, self.kind),
        }
    }

    pub fn code(&self) -> String {
        format!("{}-{}", self.core(), self.agency)
    }
}

impl fmt::Display for InstrumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentParser {
    regex: Regex,
}

impl InstrumentParser {
    /// Build for the given type markers; alternation keeps their order, so
    /// `TTLT` has to precede `TT`.
    pub fn new(kinds: &[String]) -> Result<Self, ConfigError> {
        if kinds.is_empty() {
            return Err(ConfigError::Invalid("instrument parser needs at least one type marker".into()));
        }
        let alternation = kinds.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
        let pattern = format!(
            r"(?P<number>\d+)\s*/\s*(?:(?P<year>\d{{2,4}})\s*/\s*)?(?P<kind>{})\s*-\s*(?P<agency>[A-ZĐ][A-Za-zĐ]*(?:\s*-\s*[A-ZĐ][A-Za-zĐ]*)*)",
            alternation
        );
        let regex = Regex::new(&pattern)
            .map_err(|e| ConfigError::Pattern { family: "instrument-number".into(), message: e.to_string() })?;
        Ok(InstrumentParser { regex })
    }

    /// First instrument number anywhere in `s`.
    pub fn parse(&self, s: &str) -> Option<InstrumentNumber> {
        self.regex.captures(s).map(|caps| from_captures(&caps))
    }

    /// Every instrument number cited in `s`, left to right.
    pub fn parse_all<'t>(&'t self, s: &'t str) -> impl Iterator<Item = InstrumentNumber> + 't {
        self.regex.captures_iter(s).map(|caps| from_captures(&caps))
    }

    /// Instrument number covering byte offset `at`, searched from `before`
    /// chars ahead of it to `after` chars past it.
    pub fn find_near(&self, text: &str, at: usize, before: usize, after: usize) -> Option<InstrumentNumber> {
        let lo = at - last_chars(&text[..at], before).len();
        let hi = at + take_chars(&text[at..], after).len();
        let anchor = at - lo;
        self.regex
            .captures_iter(&text[lo..hi])
            .find(|caps| caps.get(0).map_or(false, |m| m.start() <= anchor && anchor < m.end()))
            .map(|caps| from_captures(&caps))
    }
}

fn from_captures(caps: &Captures<'_>) -> InstrumentNumber {
    let get = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
    InstrumentNumber {
        number: get("number").unwrap_or_default(),
        year: get("year"),
        kind: get("kind").unwrap_or_default(),
        agency: get("agency").map(|a| a.chars().filter(|c| !c.is_whitespace()).collect()).unwrap_or_default(),
    }
}
