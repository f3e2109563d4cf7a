//! Segmentation of extracted article text.

use readaloud::segment::{Sentence, join, segment};
use readaloud::extract_html;

#[test]
fn test_segment_extracted_paragraphs() {
    let html = "<article><p>It rained all night.</p><p>By morning? The river rose!</p></article>";
    let article = extract_html(html, None).unwrap();
    let sentences = segment(&article.text_content);

    let texts: Vec<_> = sentences.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["It rained all night.", "By morning?", "The river rose!"]);
}

#[test]
fn test_sentences_serialize_for_hosts() {
    let sentences = segment("Hi there.");
    let json = serde_json::to_value(&sentences).unwrap();
    assert_eq!(json[0]["text"], "Hi there.");
    assert_eq!(json[0]["words"][1]["text"], "there.");
    assert_eq!(json[0]["words"][1]["start"], 3);
    assert_eq!(json[0]["words"][1]["len"], 6);
}

#[test]
fn test_join_then_segment() {
    let sentences = segment("One!  Two?\n\nThree.");
    assert_eq!(join(&sentences), "One! Two? Three.");
    assert_eq!(segment(&join(&sentences)), sentences);
}

#[test]
fn test_multiline_whitespace_inside_sentence() {
    let sentences = segment("A  sentence\nspread over\tlines.");
    assert_eq!(sentences.len(), 1);
    let words: Vec<_> = sentences[0].words.iter().map(|w| (w.text.as_str(), w.start)).collect();
    assert_eq!(
        words,
        [("A", 0), ("sentence", 3), ("spread", 12), ("over", 19), ("lines.", 24)]
    );
}

#[test]
fn test_word_lookup_from_engine_offsets() {
    let sentence = Sentence::new("Hello world.");
    assert_eq!(sentence.word_at_char(6), Some(1));
    assert_eq!(sentence.word_at_char(0), Some(0));
}
