//! Plain-text helpers shared by the text-based readers.

use super::SearchHit;
use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<(?:script|style)\b[^>]*/>|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>",
    )
    .expect("script/style pattern is valid")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static HEADING: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("h1, h2, h3, title").ok());

/// Characters of context kept on each side of a search match.
const CONTEXT_CHARS: usize = 50;

/// Flattens an (X)HTML document to a single line of text.
///
/// Script and style blocks are dropped with their contents, every other tag becomes a
/// space, entities are decoded and runs of whitespace collapse to one space.
pub fn html_to_text(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, "");
    let without_tags = TAG.replace_all(&without_code, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    collapse_whitespace(&decoded)
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// First `h1`/`h2`/`h3`/`title` text in document order, if any is non-empty.
pub fn chapter_heading(html: &str) -> Option<String> {
    let selector = HEADING.as_ref()?;
    let doc = Html::parse_document(html);
    doc.select(selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|title| !title.is_empty())
}

/// Re-flows `text` into pages of at most `page_size` bytes, breaking only between
/// words. A single word longer than `page_size` gets a page of its own.
pub fn chunk_words(text: &str, page_size: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > page_size {
            pages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

/// Case-insensitive literal matcher used by `find`.
pub struct Matcher {
    re: Regex,
}

impl Matcher {
    /// `None` for a blank query.
    pub fn new(query: &str) -> Option<Self> {
        if query.trim().is_empty() {
            return None;
        }
        RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .ok()
            .map(|re| Self { re })
    }

    pub fn find(&self, page: usize, text: &str) -> Option<SearchHit> {
        let m = self.re.find(text)?;
        let position = text[..m.start()].chars().count();

        let start = text[..m.start()]
            .char_indices()
            .rev()
            .nth(CONTEXT_CHARS - 1)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let end = text[m.end()..]
            .char_indices()
            .nth(CONTEXT_CHARS)
            .map(|(i, _)| m.end() + i)
            .unwrap_or(text.len());

        Some(SearchHit {
            page,
            position,
            context: text[start..end].to_string(),
        })
    }
}
