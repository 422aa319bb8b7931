//! Iterators for streaming entries in and out of a dictionary.
//!
//! - [`GroupedDefinitions`] folds a flat, word-ordered stream of
//!   `(word, content type, payload)` rows into [`WordDefinition`]s, ready for
//!   [`DictionaryBuilder::add_words`](crate::DictionaryBuilder::add_words).
//! - [`DefinitionIterator`] walks an opened dictionary in index order.
//!
//! # Example
//! ```no_run
//! # use stardict_codec::{DictionaryPaths, DictionaryReader};
//! # let reader = DictionaryReader::open(DictionaryPaths::new("words")).unwrap();
//! for result in reader.iter_definitions() {
//!     let word = result.unwrap();
//!     println!("{}: {} entries", word.word, word.definitions.len());
//! }
//! ```

use std::iter::Peekable;

use super::reader::DictionaryReader;
use super::types::content_type::ContentType;
use super::types::error::Result;
use super::types::models::{DefinitionEntry, WordDefinition};

/// One rendered definition row as produced upstream.
pub type DefinitionRow = (String, ContentType, Vec<u8>);

/// Groups consecutive rows sharing a word into one [`WordDefinition`].
///
/// Rows for the same word must be adjacent; a word that reappears later
/// starts a new group, which the builder then rejects as a duplicate.
pub struct GroupedDefinitions<I: Iterator<Item = DefinitionRow>> {
    rows: Peekable<I>,
}

impl<I: Iterator<Item = DefinitionRow>> GroupedDefinitions<I> {
    pub fn new(rows: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            rows: rows.into_iter().peekable(),
        }
    }
}

impl<I: Iterator<Item = DefinitionRow>> Iterator for GroupedDefinitions<I> {
    type Item = WordDefinition;

    fn next(&mut self) -> Option<Self::Item> {
        let (word, content_type, payload) = self.rows.next()?;
        let mut definitions = vec![DefinitionEntry::new(content_type, payload)];
        while let Some((_, content_type, payload)) =
            self.rows.next_if(|(next_word, _, _)| *next_word == word)
        {
            definitions.push(DefinitionEntry::new(content_type, payload));
        }
        Some(WordDefinition::new(word, definitions))
    }
}

/// Every headword with its decoded definitions, in index order.
///
/// Created by [`DictionaryReader::iter_definitions()`].
pub struct DefinitionIterator<'a> {
    reader: &'a DictionaryReader,
    position: usize,
}

impl<'a> DefinitionIterator<'a> {
    pub(super) fn new(reader: &'a DictionaryReader) -> Self {
        Self {
            reader,
            position: 0,
        }
    }
}

impl<'a> Iterator for DefinitionIterator<'a> {
    type Item = Result<WordDefinition>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.reader.num_entries() {
            return None;
        }
        let result = self.reader.read_definition(self.position);
        self.position += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.reader.num_entries().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}
