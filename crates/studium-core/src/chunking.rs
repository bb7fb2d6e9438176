//! Word-boundary text chunking for batched embedding generation.
//!
//! Splits text into segments that never exceed `max_chunk_size` characters,
//! except when a single word alone is longer than the limit; that word
//! becomes its own chunk rather than being split mid-word. Joining the
//! chunks with single spaces reconstructs the whitespace-collapsed input.

/// Lazy iterator over word-boundary chunks of `text`.
///
/// The iterator is finite and restartable: calling [`WordChunks::new`] on
/// the same input again yields the same sequence.
pub struct WordChunks<'a> {
    words: std::str::SplitWhitespace<'a>,
    /// Word read from the source but not yet emitted (overflowed the
    /// current chunk).
    pending: Option<&'a str>,
    max_chunk_size: usize,
}

impl<'a> WordChunks<'a> {
    /// Create a chunk iterator. A zero `max_chunk_size` is clamped to 1.
    pub fn new(text: &'a str, max_chunk_size: usize) -> Self {
        Self {
            words: text.split_whitespace(),
            pending: None,
            max_chunk_size: max_chunk_size.max(1),
        }
    }
}

impl Iterator for WordChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let first = self.pending.take().or_else(|| self.words.next())?;
        let mut chunk = String::from(first);

        for word in &mut self.words {
            // +1 for the joining space.
            if chunk.chars().count() + 1 + word.chars().count() <= self.max_chunk_size {
                chunk.push(' ');
                chunk.push_str(word);
            } else {
                self.pending = Some(word);
                break;
            }
        }

        Some(chunk)
    }
}

/// Split `text` into word-boundary chunks of at most `max_chunk_size`
/// characters each.
pub fn chunk_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    WordChunks::new(text, max_chunk_size).collect()
}
