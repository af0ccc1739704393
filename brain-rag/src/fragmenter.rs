//! Word-preserving document fragmentation.
//!
//! [`fragment`] is the pure splitting routine. [`Fragmenter`] applies it to a
//! [`Document`] and produces [`Fragment`]s with ids and sequence numbers but
//! no embeddings; embeddings are attached later by the pipeline.

use chrono::Utc;

use crate::document::{Document, Fragment};

/// Default target fragment length in characters.
pub const DEFAULT_FRAGMENT_SIZE: usize = 500;

/// Split `text` into fragments of roughly `target_size` characters.
///
/// Tokens are whitespace-delimited and never split. Each token contributes
/// its character count plus one separator to the running length; once that
/// length reaches `target_size` the buffered tokens are emitted, joined by
/// single spaces. A fragment may therefore overshoot `target_size` by up to
/// one token. The trailing buffer is emitted whatever its size.
///
/// Returns an empty `Vec` for empty or whitespace-only input.
///
/// # Example
///
/// ```rust
/// use brain_rag::fragmenter::fragment;
///
/// let fragments = fragment("alpha beta gamma delta", 11);
/// assert_eq!(fragments, vec!["alpha beta", "gamma delta"]);
/// ```
pub fn fragment(text: &str, target_size: usize) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut length = 0;

    for token in text.split_whitespace() {
        buffer.push(token);
        length += token.chars().count() + 1;
        if length >= target_size {
            fragments.push(buffer.join(" "));
            buffer.clear();
            length = 0;
        }
    }

    if !buffer.is_empty() {
        fragments.push(buffer.join(" "));
    }

    fragments
}

/// Splits documents into sequenced [`Fragment`]s.
///
/// Fragment IDs are generated as `{document_id}_{sequence}`.
///
/// # Example
///
/// ```rust,ignore
/// use brain_rag::Fragmenter;
///
/// let fragmenter = Fragmenter::new(500);
/// let fragments = fragmenter.fragment_document(&document);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fragmenter {
    target_size: usize,
}

impl Default for Fragmenter {
    fn default() -> Self {
        Self::new(DEFAULT_FRAGMENT_SIZE)
    }
}

impl Fragmenter {
    /// Create a new `Fragmenter` with the given target size in characters.
    pub fn new(target_size: usize) -> Self {
        Self { target_size }
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Split a document into fragments with empty embedding vectors.
    pub fn fragment_document(&self, document: &Document) -> Vec<Fragment> {
        let created_at = Utc::now();
        fragment(&document.text, self.target_size)
            .into_iter()
            .enumerate()
            .map(|(sequence, text)| Fragment {
                id: format!("{}_{sequence}", document.id),
                document_id: document.id.clone(),
                sequence,
                text,
                embedding: Vec::new(),
                created_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NewDocument;

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        assert!(fragment("", 10).is_empty());
        assert!(fragment(" \n\t  ", 10).is_empty());
    }

    #[test]
    fn short_text_is_a_single_fragment() {
        let text = "The sky is blue. The grass is green.";
        assert_eq!(fragment(text, DEFAULT_FRAGMENT_SIZE), vec![text.to_string()]);
    }

    #[test]
    fn whitespace_is_normalized() {
        assert_eq!(fragment("  one\n\ntwo\tthree  ", 100), vec!["one two three"]);
    }

    #[test]
    fn flush_happens_after_the_triggering_token() {
        // "aaaa" -> 5, "bbbbbbbb" -> 14 >= 10: flush with both tokens.
        let fragments = fragment("aaaa bbbbbbbb cc", 10);
        assert_eq!(fragments, vec!["aaaa bbbbbbbb", "cc"]);
    }

    #[test]
    fn long_token_is_never_split() {
        let word = "x".repeat(40);
        let fragments = fragment(&format!("{word} tail"), 10);
        assert_eq!(fragments, vec![word, "tail".to_string()]);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Each "ééé" is 3 chars (6 bytes) + separator = 4.
        let fragments = fragment("ééé ééé ééé", 8);
        assert_eq!(fragments, vec!["ééé ééé", "ééé"]);
    }

    #[test]
    fn fragment_document_assigns_ids_and_sequence() {
        let document = Document::from_new(NewDocument::new("one two three four five six"));
        let fragments = Fragmenter::new(8).fragment_document(&document);

        assert_eq!(fragments.len(), 3);
        for (i, f) in fragments.iter().enumerate() {
            assert_eq!(f.sequence, i);
            assert_eq!(f.id, format!("{}_{i}", document.id));
            assert_eq!(f.document_id, document.id);
            assert!(f.embedding.is_empty());
        }
        assert_eq!(fragments[0].text, "one two");
        assert_eq!(fragments[2].text, "five six");
    }
}
