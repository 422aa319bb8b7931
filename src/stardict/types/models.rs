//! Core data structures for StarDict dictionary components.
//!
//! This module defines the fundamental types used throughout the library:
//! - Definition entries and per-word definitions
//! - Index and synonym records
//! - Dictionary-wide metadata and layout settings

use std::fmt;

use chrono::NaiveDate;

use super::content_type::{ContentType, TypeSequence};
use super::error::{Result, StardictError};

/// Format version written when the caller does not choose one.
pub const DEFAULT_VERSION: &str = "2.4.2";

/// Format version that third-party readers require before honouring
/// `idxoffsetbits=64`.
pub const OFFSET_BITS_VERSION: &str = "3.0.0";

/// One typed payload inside a word's definition block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionEntry {
    pub content_type: ContentType,
    pub payload: Vec<u8>,
}

impl DefinitionEntry {
    pub fn new(content_type: ContentType, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type,
            payload: payload.into(),
        }
    }

    /// The payload as UTF-8 text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

impl fmt::Display for DefinitionEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.content_type.is_string_like() {
            write!(f, "{};{}", self.content_type, String::from_utf8_lossy(&self.payload))
        } else {
            write!(f, "{};<{} bytes>", self.content_type, self.payload.len())
        }
    }
}

/// All definition entries belonging to one headword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDefinition {
    pub word: String,
    pub definitions: Vec<DefinitionEntry>,
}

impl WordDefinition {
    pub fn new(word: impl Into<String>, definitions: Vec<DefinitionEntry>) -> Self {
        Self {
            word: word.into(),
            definitions,
        }
    }

    /// Drops exact `(type, payload)` repeats, keeping the first occurrence.
    pub fn dedup_definitions(&mut self) {
        let mut kept: Vec<DefinitionEntry> = Vec::with_capacity(self.definitions.len());
        for entry in self.definitions.drain(..) {
            if !kept.contains(&entry) {
                kept.push(entry);
            }
        }
        self.definitions = kept;
    }
}

/// Location of one word's block inside the `.dict` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub word: String,
    /// Byte offset of the block in the `.dict` file.
    pub offset: u64,
    /// Byte length of the block.
    pub size: u32,
}

impl fmt::Display for IndexRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{};{};{}", self.word, self.offset, self.size)
    }
}

/// An alternate headword pointing at a word in the sorted index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymRecord {
    pub alt_word: String,
    /// Ordinal position of the target in the sorted `.idx` sequence.
    pub target_index: u32,
}

impl fmt::Display for SynonymRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{};{}", self.alt_word, self.target_index)
    }
}

/// Width of the offset field in `.idx` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetWidth {
    #[default]
    Bits32,
    Bits64,
}

impl OffsetWidth {
    pub fn bits(self) -> u32 {
        match self {
            OffsetWidth::Bits32 => 32,
            OffsetWidth::Bits64 => 64,
        }
    }

    /// Returns the byte width, as used by `utils::read_number`.
    pub fn number_width(self) -> usize {
        match self {
            OffsetWidth::Bits32 => 4,
            OffsetWidth::Bits64 => 8,
        }
    }

    /// Largest offset representable at this width.
    pub fn max_offset(self) -> u64 {
        match self {
            OffsetWidth::Bits32 => u32::MAX as u64,
            OffsetWidth::Bits64 => u64::MAX,
        }
    }
}

impl TryFrom<u32> for OffsetWidth {
    type Error = StardictError;
    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            _ => Err(StardictError::UnsupportedOffsetWidth(bits)),
        }
    }
}

/// How blocks in the `.dict` file are framed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefinitionMode {
    /// Every entry carries its own type marker.
    #[default]
    SelfDescribing,
    /// Types are declared once in the `.ifo`; blocks carry no markers.
    Uniform(TypeSequence),
}

impl DefinitionMode {
    pub fn from_sequence(sequence: Option<&TypeSequence>) -> Self {
        match sequence {
            Some(sequence) => DefinitionMode::Uniform(sequence.clone()),
            None => DefinitionMode::SelfDescribing,
        }
    }
}

/// The `dicttype=` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictType {
    WordNet,
    Other(String),
}

impl DictType {
    pub fn as_str(&self) -> &str {
        match self {
            DictType::WordNet => "wordnet",
            DictType::Other(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "wordnet" => DictType::WordNet,
            other => DictType::Other(other.to_string()),
        }
    }
}

/// Parsed contents of a `.ifo` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DictionaryMetadata {
    /// `version=`; `DEFAULT_VERSION` is written when `None`.
    pub version: Option<String>,
    /// `bookname=`
    pub title: String,
    pub word_count: u64,
    pub synonym_count: u64,
    /// Total byte length of the `.idx` file.
    pub index_file_size: u64,
    pub offset_width: OffsetWidth,
    pub author: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub same_type_sequence: Option<TypeSequence>,
    pub dict_type: Option<DictType>,
}

impl DictionaryMetadata {
    /// The format version that will be written.
    pub fn version_or_default(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// The block framing implied by `same_type_sequence`.
    pub fn definition_mode(&self) -> DefinitionMode {
        DefinitionMode::from_sequence(self.same_type_sequence.as_ref())
    }
}
