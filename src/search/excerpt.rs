//! Excerpt selection and term highlighting

use crate::search::config::SearchConfig;
use crate::search::text::normalize_html;
use regex::{Captures, RegexBuilder};
use std::ops::Range;

const ELLIPSIS: &str = "...";

/// Terms shorter than this are scored but never highlighted
const MIN_HIGHLIGHT_CHARS: usize = 3;

/// Picks the most term-dense window of a text and highlights query terms.
///
/// This is a heuristic "most relevant window", not relevance ranking: windows
/// are scored by how many distinct query terms they contain and the first
/// window with the best score wins.
#[derive(Debug, Clone)]
pub struct ExcerptHighlighter {
    stride: usize,
    open: String,
    close: String,
}

impl ExcerptHighlighter {
    pub fn new(stride: usize, open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            stride: stride.max(1),
            open: open.into(),
            close: close.into(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.excerpt_stride,
            config.highlight_open.clone(),
            config.highlight_close.clone(),
        )
    }

    /// Best window of at most `max_length` characters from `content`, highlighted
    pub fn excerpt(&self, content: &str, query: &str, max_length: usize) -> String {
        let text = normalize_html(content);
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        if len == 0 {
            return String::new();
        }

        let max_length = max_length.max(1);
        let terms = query_terms(query);

        let window_end = |start: usize| (start + max_length).min(len);
        let (mut best_start, mut best_score) = (0, None);

        let mut start = 0;
        while start < len {
            let window: String = chars[start..window_end(start)].iter().collect();
            let window = window.to_lowercase();
            let score = terms.iter().filter(|t| window.contains(t.as_str())).count();

            if best_score.map_or(true, |best| score > best) {
                best_start = start;
                best_score = Some(score);
            }
            start += self.stride;
        }

        let end = window_end(best_start);
        let window: String = chars[best_start..end].iter().collect();

        let mut excerpt = String::with_capacity(window.len() + 2 * ELLIPSIS.len());
        if best_start > 0 {
            excerpt.push_str(ELLIPSIS);
        }
        excerpt.push_str(&self.highlight(&window, query));
        if end < len {
            excerpt.push_str(ELLIPSIS);
        }
        excerpt
    }

    /// Wrap case-insensitive occurrences of every query term longer than two characters
    pub fn highlight(&self, text: &str, query: &str) -> String {
        let mut terms: Vec<String> = query_terms(query)
            .into_iter()
            .filter(|t| t.chars().count() >= MIN_HIGHLIGHT_CHARS)
            .collect();
        if terms.is_empty() {
            return text.to_string();
        }

        // Longest first so overlapping terms prefer the longer match
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let pattern = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");

        // One pass, so markers are never themselves highlighted
        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => re
                .replace_all(text, |caps: &Captures| {
                    format!("{}{}{}", self.open, &caps[0], self.close)
                })
                .into_owned(),
            Err(e) => {
                tracing::warn!(error = %e, "Highlight pattern rejected, returning plain text");
                text.to_string()
            }
        }
    }

    /// Render a fragment with the given byte ranges wrapped in markers
    pub fn mark_ranges(&self, fragment: &str, ranges: &[Range<usize>]) -> String {
        let mut out = String::with_capacity(fragment.len() + ranges.len() * 16);
        let mut cursor = 0;

        for range in ranges {
            if range.start < cursor
                || range.end > fragment.len()
                || !fragment.is_char_boundary(range.start)
                || !fragment.is_char_boundary(range.end)
            {
                continue;
            }
            out.push_str(&fragment[cursor..range.start]);
            out.push_str(&self.open);
            out.push_str(&fragment[range.start..range.end]);
            out.push_str(&self.close);
            cursor = range.end;
        }

        out.push_str(&fragment[cursor..]);
        out
    }
}

/// Lowercased, de-duplicated query tokens with surrounding punctuation trimmed
fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in query.to_lowercase().split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric());
        if !token.is_empty() && !terms.iter().any(|t| t == token) {
            terms.push(token.to_string());
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighter() -> ExcerptHighlighter {
        ExcerptHighlighter::new(50, "<mark>", "</mark>")
    }

    #[test]
    fn test_short_text_no_ellipsis() {
        let excerpt = highlighter().excerpt("<p>Learn Python today</p>", "python", 200);
        assert_eq!(excerpt, "Learn <mark>Python</mark> today");
    }

    #[test]
    fn test_picks_densest_window() {
        let filler = "lorem ipsum dolor sit amet ".repeat(10);
        let content = format!("{}rust ownership and borrowing explained {}", filler, filler);

        let excerpt = highlighter().excerpt(&content, "ownership borrowing", 100);
        assert!(excerpt.starts_with("..."));
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.contains("<mark>ownership</mark>"));
        assert!(excerpt.contains("<mark>borrowing</mark>"));
    }

    #[test]
    fn test_first_window_wins_ties() {
        let content = "alpha beta gamma delta ".repeat(20);
        let excerpt = highlighter().excerpt(&content, "zeta", 40);
        assert!(!excerpt.starts_with("..."));
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_short_terms_not_highlighted() {
        let highlighted = highlighter().highlight("Go is an OS language", "go os language");
        assert_eq!(highlighted, "Go is an OS <mark>language</mark>");
    }

    #[test]
    fn test_highlight_is_case_insensitive_and_keeps_casing() {
        let highlighted = highlighter().highlight("PYTHON and python", "Python");
        assert_eq!(highlighted, "<mark>PYTHON</mark> and <mark>python</mark>");
    }

    #[test]
    fn test_markers_not_rehighlighted() {
        let highlighted = highlighter().highlight("mark my words", "mark words");
        assert_eq!(highlighted, "<mark>mark</mark> my <mark>words</mark>");
    }

    #[test]
    fn test_regex_metacharacters_in_terms() {
        let highlighted = highlighter().highlight("c++ and (rust)", "(rust)");
        assert_eq!(highlighted, "c++ and (<mark>rust</mark>)");
    }

    #[test]
    fn test_multibyte_text_windows() {
        let content = "日本語のテキスト ".repeat(30);
        let excerpt = highlighter().excerpt(&content, "テキスト", 20);
        assert!(excerpt.contains("<mark>テキスト</mark>"));
    }

    #[test]
    fn test_mark_ranges() {
        let rendered = highlighter().mark_ranges("Learn Python today", &[6..12]);
        assert_eq!(rendered, "Learn <mark>Python</mark> today");
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(highlighter().excerpt("<br/>", "anything", 50), "");
    }
}
