//! "Is this page probably an article?"

use super::Queries;
use crate::dom::Document;

/// Minimum number of `<p>` elements before paragraph statistics count.
const MIN_PARAGRAPHS: usize = 5;
/// A paragraph longer than this (trimmed, in characters) is substantial.
const LONG_PARAGRAPH: usize = 100;
const MIN_LONG_PARAGRAPHS: usize = 3;
/// Combined length the substantial paragraphs must exceed.
const MIN_LONG_TEXT: usize = 500;
/// Paragraphs a content container needs to count.
const MIN_CONTAINER_PARAGRAPHS: usize = 3;

/// Short-circuit OR of three signals, cheapest first.
pub(crate) fn is_probably_readerable(doc: &Document, queries: &Queries) -> bool {
    if doc.select_first(&queries.article_containers).is_some() {
        tracing::trace!("readerable: article container present");
        return true;
    }

    if has_substantial_paragraphs(doc, queries) {
        tracing::trace!("readerable: enough long paragraphs");
        return true;
    }

    let container = doc
        .select(&queries.content_containers)
        .into_iter()
        .any(|c| doc.count_within(c, &queries.paragraphs) >= MIN_CONTAINER_PARAGRAPHS);
    if container {
        tracing::trace!("readerable: content container with paragraphs");
    }
    container
}

fn has_substantial_paragraphs(doc: &Document, queries: &Queries) -> bool {
    let paragraphs = doc.select(&queries.paragraphs);
    if paragraphs.len() < MIN_PARAGRAPHS {
        return false;
    }

    let (count, total) = paragraphs
        .iter()
        .map(|&p| doc.text_len(p))
        .filter(|&len| len > LONG_PARAGRAPH)
        .fold((0, 0), |(count, total), len| (count + 1, total + len));

    count >= MIN_LONG_PARAGRAPHS && total > MIN_LONG_TEXT
}
