use crate::config::{ContextPolicy, WindowSizes};
use crate::pattern::RawMatch;

/// Phrase built for one raw match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub base_token: String,
    /// Trailing context after the token, truncated and trimmed.
    pub context: String,
    /// Number captured before a decree token; empty for standard codes.
    pub preceding: String,
    pub canonical: String,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    tokens: Vec<String>,
    windows: WindowSizes,
}

impl Normalizer {
    pub fn new(tokens: Vec<String>, windows: WindowSizes) -> Self {
        Normalizer { tokens, windows }
    }

    pub fn normalize(&self, text: &str, raw: &RawMatch) -> Normalized {
        let token = raw.base_token.as_str();
        let Some(rel) = text[raw.start..].find(token) else {
            return Normalized {
                base_token: token.to_string(),
                context: String::new(),
                preceding: String::new(),
                canonical: token.to_string(),
            };
        };
        let token_at = raw.start + rel;
        let context = self.forward_context(&text[token_at + token.len()..]);

        match raw.class {
            ContextPolicy::Standard => Normalized {
                base_token: token.to_string(),
                canonical: format!("{} {}", token, context).trim().to_string(),
                context,
                preceding: String::new(),
            },
            ContextPolicy::Decree => {
                let before = last_chars(&text[..token_at], self.windows.preceding);
                let preceding = citation_number_tail(before).to_string();
                let canonical = tighten_separators(&format!("{}{}{}", preceding, token, context));
                Normalized { base_token: token.to_string(), context, preceding, canonical }
            }
        }
    }

    /// Forward window after a token: cut before the next recognized token,
    /// or to the fallback budget when none occurs, then trimmed to the code.
    pub fn forward_context(&self, after: &str) -> String {
        let window = take_chars(after, self.windows.forward).trim();
        let cut = match next_token_offset(window, &self.tokens) {
            Some(offset) => &window[..offset],
            None => take_chars(window, self.windows.fallback),
        };
        trim_to_code(cut)
    }
}

/// Ordered phrase rewrites tried until one resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    Identity,
    /// `-` → `:` for the standard/year separator.
    SeparatorColon,
}

impl Rewrite {
    pub fn apply(self, phrase: &str) -> String {
        match self {
            Rewrite::Identity => phrase.to_string(),
            Rewrite::SeparatorColon => phrase.replace('-', ":"),
        }
    }

    /// Identity always; the colon rewrite only when the dense match key
    /// carries one of the rewrite tokens.
    pub fn plan(dense: &str, rewrite_tokens: &[String]) -> Vec<Rewrite> {
        let mut plan = vec![Rewrite::Identity];
        if rewrite_tokens.iter().any(|t| dense.contains(t.as_str())) {
            plan.push(Rewrite::SeparatorColon);
        }
        plan
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Earliest standalone token occurrence in the window. A standalone token is
/// not glued to a preceding word or citation separator and is not followed
/// by a letter, so `BTC`, `-TC` and `TTg` do not count.
pub fn next_token_offset(window: &str, tokens: &[String]) -> Option<usize> {
    tokens.iter().filter_map(|token| standalone_occurrence(window, token)).min()
}

fn standalone_occurrence(window: &str, token: &str) -> Option<usize> {
    if token.is_empty() {
        return None;
    }
    window.match_indices(token).map(|(i, _)| i).find(|&i| {
        let before_ok = window[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric() && !is_separator(c) && c != '.');
        let after_ok = window[i + token.len()..].chars().next().map_or(true, |c| !c.is_alphabetic());
        before_ok && after_ok
    })
}

/// Keep the leading citation-shaped words of a context.
pub fn trim_to_code(context: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for word in context.split_whitespace() {
        let stripped = word.trim_end_matches(&[',', ';', ')', '.'][..]);
        let closes = stripped.len() != word.len();
        if stripped.is_empty() || stripped.starts_with('(') || !is_code_word(stripped) {
            break;
        }
        kept.push(stripped);
        if closes {
            break;
        }
    }
    kept.join(" ")
}

fn is_code_word(word: &str) -> bool {
    if word.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    let mut letters = word.chars().filter(|c| c.is_alphabetic()).peekable();
    if letters.peek().is_none() {
        return word.chars().all(is_separator);
    }
    letters.all(|c| c.is_uppercase())
}

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '/' | ':')
}

/// Trailing run of instrument-number characters, trimmed.
pub fn citation_number_tail(before: &str) -> &str {
    let start = before
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_ascii_digit() || c.is_whitespace() || matches!(c, '/' | '.' | '-')))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    before[start..].trim()
}

/// Collapse whitespace, drop spaces around `- / :` and fold doubled separators.
pub fn tighten_separators(s: &str) -> String {
    let collapsed = collapse_whitespace(s);
    let mut out = String::with_capacity(collapsed.len());
    for c in collapsed.chars() {
        if is_separator(c) {
            while out.ends_with(' ') {
                out.pop();
            }
            if out.ends_with(c) {
                continue;
            }
            out.push(c);
        } else if c == ' ' && out.chars().next_back().map_or(false, is_separator) {
            continue;
        } else {
            out.push(c);
        }
    }
    out
}

/// Prefix of at most `n` chars.
pub fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Suffix of at most `n` chars.
pub fn last_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}
