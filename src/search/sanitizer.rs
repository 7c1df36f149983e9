//! Translation of raw user input into safe query-grammar syntax
//!
//! The policy is evaluated in a fixed order, and the order decides whether an
//! awkward query becomes a literal phrase (which may match nothing) or a bag
//! of plain terms:
//!
//! 1. Input containing any of `- * " ( )` is wrapped in double quotes as a
//!    literal phrase, with embedded quotes escaped.
//! 2. Input made only of digits is quoted too.
//! 3. Anything else keeps only alphanumerics and whitespace, collapsed to
//!    single spaces. If nothing survives, rule 1's quoting applies to the
//!    original input.

use serde::{Deserialize, Serialize};
use std::fmt;

const PHRASE_TRIGGERS: [char; 5] = ['-', '*', '"', '(', ')'];

/// Which rule produced a sanitized query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SanitizeRule {
    LiteralPhrase,
    Numeric,
    Terms,
    Fallback,
}

/// Query text that is safe to hand to the index query parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeQuery {
    text: String,
    rule: SanitizeRule,
}

impl SafeQuery {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn rule(&self) -> SanitizeRule {
        self.rule
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for SafeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Normalizes raw user input into safe query-grammar syntax
#[derive(Debug, Clone, Copy, Default)]
pub struct QuerySanitizer;

impl QuerySanitizer {
    pub fn sanitize(raw: &str) -> SafeQuery {
        if raw.contains(&PHRASE_TRIGGERS[..]) {
            return SafeQuery {
                text: quote_literal(raw),
                rule: SanitizeRule::LiteralPhrase,
            };
        }

        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            return SafeQuery {
                text: format!("\"{}\"", raw),
                rule: SanitizeRule::Numeric,
            };
        }

        let kept: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        let terms = kept.split_whitespace().collect::<Vec<_>>().join(" ");

        if terms.is_empty() {
            SafeQuery {
                text: quote_literal(raw),
                rule: SanitizeRule::Fallback,
            }
        } else {
            SafeQuery {
                text: terms,
                rule: SanitizeRule::Terms,
            }
        }
    }
}

/// Wrap in double quotes; `"` becomes `\"`.
///
/// Backslashes are dropped first so the only escapes in the output are the
/// ones escaping quotes. They never carry searchable text.
fn quote_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => {}
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(raw: &str) -> String {
        QuerySanitizer::sanitize(raw).into_string()
    }

    #[test]
    fn test_parentheses_force_literal_phrase() {
        let safe = QuerySanitizer::sanitize("it's a test (maybe)");
        assert_eq!(safe.as_str(), "\"it's a test (maybe)\"");
        assert_eq!(safe.rule(), SanitizeRule::LiteralPhrase);
    }

    #[test]
    fn test_embedded_quotes_escaped() {
        assert_eq!(sanitize("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(sanitize("a-b\\"), "\"a-b\"");
    }

    #[test]
    fn test_trigger_chars() {
        assert_eq!(sanitize("rust-lang"), "\"rust-lang\"");
        assert_eq!(sanitize("pyth*"), "\"pyth*\"");
        assert_eq!(sanitize("(x)"), "\"(x)\"");
    }

    #[test]
    fn test_digits_only_quoted() {
        let safe = QuerySanitizer::sanitize("2024");
        assert_eq!(safe.as_str(), "\"2024\"");
        assert_eq!(safe.rule(), SanitizeRule::Numeric);
    }

    #[test]
    fn test_punctuation_stripped_and_whitespace_collapsed() {
        let safe = QuerySanitizer::sanitize("  hello,   world! what's up?  ");
        assert_eq!(safe.as_str(), "hello world whats up");
        assert_eq!(safe.rule(), SanitizeRule::Terms);
        assert_eq!(sanitize("python 3"), "python 3");
        assert_eq!(sanitize("title:rust"), "titlerust");
    }

    #[test]
    fn test_nothing_left_falls_back_to_quoting() {
        let safe = QuerySanitizer::sanitize("!!! ???");
        assert_eq!(safe.as_str(), "\"!!! ???\"");
        assert_eq!(safe.rule(), SanitizeRule::Fallback);
    }

    #[test]
    fn test_unicode_alphanumerics_kept() {
        assert_eq!(sanitize("café über"), "café über");
    }
}
