//! Sentence and word segmentation.
//!
//! Sentences end at runs of `.`, `!` or `?`; words are runs of
//! non-whitespace with punctuation attached. Word offsets count characters
//! (Unicode scalar values), not bytes, so they line up with the character
//! indices speech engines report in boundary events.
//!
//! ```
//! use readaloud::segment::segment;
//!
//! let sentences = segment("Hello world. This is a test!");
//! assert_eq!(sentences[0].text, "Hello world.");
//! assert_eq!(sentences[1].text, "This is a test!");
//!
//! let world = &sentences[0].words[1];
//! assert_eq!((world.text.as_str(), world.start, world.len), ("world.", 6, 6));
//! ```

use serde::Serialize;

/// One word of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Word {
    pub text: String,
    /// Character offset into the sentence text.
    pub start: usize,
    /// Length in characters.
    pub len: usize,
}

/// A trimmed sentence and its words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sentence {
    pub text: String,
    pub words: Vec<Word>,
}

impl Sentence {
    /// Build a sentence from already-trimmed text, splitting it into words.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let words = split_words(&text);
        Self { text, words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Map a character index reported by a speech engine to a word.
    ///
    /// Walks the words adding each one's length plus one for the separating
    /// space; the first word whose running total passes `char_index` wins.
    /// An index beyond every word falls back to the first word. Returns
    /// `None` only for a sentence without words.
    pub fn word_at_char(&self, char_index: usize) -> Option<usize> {
        let mut consumed = 0;
        for (i, word) in self.words.iter().enumerate() {
            consumed += word.len + 1;
            if consumed > char_index {
                return Some(i);
            }
        }
        (!self.words.is_empty()).then_some(0)
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split `text` into sentences.
///
/// A sentence is a run of other characters followed by its run of
/// terminators. Terminators at the very start have nothing to end and are
/// dropped, as is unterminated text after the last sentence. Text without
/// any terminator is read as a single sentence. Every sentence is trimmed
/// and empty ones are discarded, so whitespace-only input gives no
/// sentences at all.
pub fn segment(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut push = |raw: &str| {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            sentences.push(Sentence::new(trimmed));
        }
    };

    let mut start: Option<usize> = None;
    let mut in_terminators = false;
    let mut terminated = false;

    for (i, c) in text.char_indices() {
        if is_terminator(c) {
            terminated = true;
            if start.is_some() {
                in_terminators = true;
            }
            continue;
        }
        match start {
            Some(s) if in_terminators => {
                push(&text[s..i]);
                start = Some(i);
                in_terminators = false;
            }
            Some(_) => {}
            None => start = Some(i),
        }
    }
    match start {
        Some(s) if in_terminators => push(&text[s..]),
        _ if !terminated => push(text),
        _ => {}
    }

    sentences
}

/// Words of `text` with character offsets, in one pass.
fn split_words(text: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<(usize, usize)> = None; // (byte, char) start

    let mut finish = |from: (usize, usize), end_byte: usize, end_char: usize| {
        words.push(Word {
            text: text[from.0..end_byte].to_string(),
            start: from.1,
            len: end_char - from.1,
        });
    };

    let mut char_count = 0;
    for (byte, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(from) = current.take() {
                finish(from, byte, char_count);
            }
        } else if current.is_none() {
            current = Some((byte, char_count));
        }
        char_count += 1;
    }
    if let Some(from) = current {
        finish(from, text.len(), char_count);
    }

    words
}

/// Sentence texts joined with single spaces.
pub fn join(sentences: &[Sentence]) -> String {
    sentences
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_basic_sentences() {
        let sentences = segment("Hello world. This is a test!");
        assert_eq!(texts(&sentences), ["Hello world.", "This is a test!"]);

        let words: Vec<_> = sentences[0].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(words, ["Hello", "world."]);
        assert_eq!(sentences[0].words[1].start, 6);
        assert_eq!(sentences[0].words[1].len, 6);
    }

    #[test]
    fn test_terminator_runs_stay_together() {
        let sentences = segment("Wait... What?! Yes.");
        assert_eq!(texts(&sentences), ["Wait...", "What?!", "Yes."]);
    }

    #[test]
    fn test_no_terminator_is_one_sentence() {
        assert_eq!(texts(&segment("  just a fragment  ")), ["just a fragment"]);
    }

    #[test]
    fn test_unterminated_tail_is_dropped() {
        assert_eq!(texts(&segment("Done. And then")), ["Done."]);
        assert_eq!(texts(&segment("One! Two? and")), ["One!", "Two?"]);
        assert!(segment("... and nothing else").is_empty());
    }

    #[test]
    fn test_leading_terminators_are_dropped() {
        assert_eq!(texts(&segment("?! Start here.")), ["Start here."]);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("").is_empty());
        assert!(segment(" \n\t ").is_empty());
        assert!(segment("...").is_empty());
    }

    #[test]
    fn test_unicode_offsets_are_characters() {
        let sentences = segment("Ça va très bien.");
        let bien = &sentences[0].words[3];
        assert_eq!(bien.text, "bien.");
        assert_eq!(bien.start, 11);
        assert_eq!(bien.len, 5);
    }

    #[test]
    fn test_word_at_char() {
        let sentence = Sentence::new("Hello world.");
        assert_eq!(sentence.word_at_char(0), Some(0));
        assert_eq!(sentence.word_at_char(5), Some(0));
        assert_eq!(sentence.word_at_char(6), Some(1));
        assert_eq!(sentence.word_at_char(12), Some(1));
        assert_eq!(sentence.word_at_char(13), Some(0));
        assert_eq!(sentence.word_at_char(500), Some(0));
        assert_eq!(Sentence::new("").word_at_char(0), None);
    }

    fn sentence_strategy() -> impl Strategy<Value = String> {
        (
            prop::collection::vec("[a-zA-Z']{1,8}", 1..6),
            prop::sample::select(vec![".", "!", "?", "...", "?!"]),
        )
            .prop_map(|(words, end)| format!("{}{}", words.join(" "), end))
    }

    proptest! {
        #[test]
        fn prop_word_offsets_are_valid(text in "\\PC{0,80}") {
            for sentence in segment(&text) {
                let chars: Vec<char> = sentence.text.chars().collect();
                let mut last_end = 0;
                for word in &sentence.words {
                    prop_assert!(word.start >= last_end);
                    prop_assert!(word.start + word.len <= chars.len());
                    let slice: String = chars[word.start..word.start + word.len].iter().collect();
                    prop_assert_eq!(&slice, &word.text);
                    last_end = word.start + word.len;
                }
            }
        }

        #[test]
        fn prop_sentences_are_trimmed_and_non_empty(text in "\\PC{0,80}") {
            for sentence in segment(&text) {
                prop_assert!(!sentence.text.is_empty());
                prop_assert_eq!(sentence.text.trim(), sentence.text.as_str());
            }
        }

        #[test]
        fn prop_resegmenting_joined_text_is_stable(
            parts in prop::collection::vec(sentence_strategy(), 1..8),
            gap in "[ \\t\\n]{1,3}",
        ) {
            let text = parts.join(&gap);
            let first = segment(&text);
            prop_assert_eq!(texts(&first), parts.iter().map(String::as_str).collect::<Vec<_>>());

            let again = segment(&join(&first));
            prop_assert_eq!(texts(&again), texts(&first));
        }

        #[test]
        fn prop_boundary_maps_inside_sentence(
            sentence in sentence_strategy(),
            index in 0usize..200,
        ) {
            let sentence = Sentence::new(sentence);
            let word = sentence.word_at_char(index);
            prop_assert!(word.is_some_and(|w| w < sentence.words.len()));
        }
    }
}
