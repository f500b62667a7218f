//! Relevance-ranked context extraction
//!
//! Narrows a document's full text down to the paragraphs that mention the
//! most distinct query words, bounded by a character budget. The output is
//! the only document text a question-answering request gets to see.
//!
//! Lengths and budgets count Unicode scalar values (`char`s).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Default character budget for extracted context
pub const DEFAULT_CONTEXT_BUDGET: usize = 8000;

/// Query words must be longer than this many characters
const MIN_WORD_CHARS: usize = 2;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SEPARATOR_CHARS: usize = 2;

/// Blank-line boundary: newline, any whitespace, newline
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n").expect("paragraph break pattern is valid")
});

/// A paragraph of the source text with its relevance score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph<'a> {
    /// Position in the document, 0-based
    pub index: usize,
    pub text: &'a str,
    pub score: usize,
}

/// How the context was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// Highest scoring paragraphs, in rank order
    Ranked { paragraphs: usize },
    /// No usable query words or no matching paragraph fit: text prefix
    Prefix,
}

/// Bounded excerpt of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContext {
    pub text: String,
    pub source: ContextSource,
}

impl ExtractedContext {
    fn prefix(full_text: &str, budget: usize) -> Self {
        Self {
            text: char_prefix(full_text, budget).to_string(),
            source: ContextSource::Prefix,
        }
    }
}

/// Distinct lower-cased query words longer than two characters
pub fn query_words(query: &str) -> HashSet<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_WORD_CHARS)
        .map(str::to_string)
        .collect()
}

/// Split into paragraphs and score each against `words`.
///
/// Lower-cases the text once; the lower-cased copy splits at the same
/// boundaries because case mapping never creates or removes whitespace.
pub fn score_paragraphs<'a>(full_text: &'a str, words: &HashSet<String>) -> Vec<Paragraph<'a>> {
    let lowered = full_text.to_lowercase();

    PARAGRAPH_BREAK
        .split(full_text)
        .zip(PARAGRAPH_BREAK.split(&lowered))
        .enumerate()
        .map(|(index, (text, lower))| Paragraph {
            index,
            text,
            score: words.iter().filter(|word| lower.contains(word.as_str())).count(),
        })
        .collect()
}

/// Extract at most `budget` characters of context relevant to `query`
pub fn extract_context(full_text: &str, query: &str, budget: usize) -> ExtractedContext {
    let words = query_words(query);
    if words.is_empty() {
        return ExtractedContext::prefix(full_text, budget);
    }

    let mut ranked: Vec<Paragraph<'_>> = score_paragraphs(full_text, &words)
        .into_iter()
        .filter(|paragraph| paragraph.score > 0)
        .collect();
    // Stable: equal scores keep document order
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    let mut context = String::new();
    let mut context_chars = 0usize;
    let mut included = 0usize;
    for paragraph in &ranked {
        let paragraph_chars = paragraph.text.chars().count();
        if context_chars + paragraph_chars > budget {
            break;
        }
        context.push_str(paragraph.text);
        context.push_str(PARAGRAPH_SEPARATOR);
        context_chars += paragraph_chars + SEPARATOR_CHARS;
        included += 1;
    }

    let trimmed = context.trim_end();
    if trimmed.is_empty() {
        tracing::debug!(query = %query, "No matching paragraphs, using text prefix");
        return ExtractedContext::prefix(full_text, budget);
    }

    ExtractedContext {
        text: trimmed.to_string(),
        source: ContextSource::Ranked { paragraphs: included },
    }
}

/// Convenience wrapper returning only the text
pub fn find_relevant_context(full_text: &str, query: &str, budget: usize) -> String {
    extract_context(full_text, query, budget).text
}

/// First `max_chars` characters of `text`
fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
