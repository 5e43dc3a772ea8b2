// Corpus builder: one cleaned line per post, joined and cut to a budget.
//
// Input order is kept as-is: the listing is already ranked by the source,
// and the budget cut should drop the lowest-ranked posts first.

use tracing::debug;

use super::normalize::normalize;
use crate::source::traits::RawDocument;

/// Default character budget for the corpus embedded in the prompt.
pub const DEFAULT_MAX_CHARS: usize = 40_000;

/// Build the corpus for one pipeline run.
///
/// Each document becomes `"{normalized title} {normalized body}"`; lines are
/// joined with `\n` and the whole string is cut at `max_chars` characters.
/// The cut is a hard character cut (it can land mid-word or mid-line) and
/// never splits a multi-byte character.
///
/// An empty batch yields an empty string. Deciding whether an empty or
/// blank corpus is fatal is the caller's job.
pub fn build_corpus(documents: &[RawDocument], max_chars: usize) -> String {
    let joined = documents
        .iter()
        .map(|doc| format!("{} {}", normalize(&doc.title), normalize(&doc.body)))
        .collect::<Vec<_>>()
        .join("\n");

    let corpus = truncate_to_chars(joined, max_chars);

    debug!(
        documents = documents.len(),
        chars = corpus.chars().count(),
        max_chars,
        "Built corpus"
    );

    corpus
}

/// Cut `text` to at most `max_chars` characters, respecting UTF-8 boundaries.
fn truncate_to_chars(mut text: String, max_chars: usize) -> String {
    if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_idx);
    }
    text
}
