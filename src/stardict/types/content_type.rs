//! Definition content types and the uniform type sequence.
//!
//! Every definition entry in a `.dict` file is tagged with a single ASCII
//! marker. The marker's case decides how the payload is framed on disk:
//! lowercase markers are text terminated by `\0`, uppercase markers are
//! binary data preceded by a 32-bit big-endian length.

use std::fmt;
use std::str::FromStr;

use super::error::{Result, StardictError};

/// The kind of data carried by one definition entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    /// Plain text meaning (`m`).
    Meaning,
    /// Meaning in the user's locale (`l`).
    LocalizedMeaning,
    /// Pango text markup (`g`).
    Pango,
    /// English phonetic string (`t`).
    EnglishPhonetic,
    /// XDXF markup (`x`).
    Xdxf,
    /// Chinese YinBiao or Japanese kana (`y`).
    YinBiao,
    /// Kingsoft PowerWord markup (`k`).
    Kingsoft,
    /// MediaWiki markup (`w`).
    MediaWiki,
    /// HTML (`h`).
    Html,
    /// WordNet data (`n`).
    WordNet,
    /// Newline separated list of resource files (`r`).
    ResourceList,
    /// WAV audio (`W`).
    Wav,
    /// Picture (`P`).
    Picture,
    /// Reserved for experimental extensions (`X`).
    Experimental,
    /// IPA phonetic string (`p`).
    Phonetic,
}

/// Marker table. This is the only place markers are spelled out.
const MARKERS: [(ContentType, u8); 15] = [
    (ContentType::Meaning, b'm'),
    (ContentType::LocalizedMeaning, b'l'),
    (ContentType::Pango, b'g'),
    (ContentType::EnglishPhonetic, b't'),
    (ContentType::Xdxf, b'x'),
    (ContentType::YinBiao, b'y'),
    (ContentType::Kingsoft, b'k'),
    (ContentType::MediaWiki, b'w'),
    (ContentType::Html, b'h'),
    (ContentType::WordNet, b'n'),
    (ContentType::ResourceList, b'r'),
    (ContentType::Wav, b'W'),
    (ContentType::Picture, b'P'),
    (ContentType::Experimental, b'X'),
    (ContentType::Phonetic, b'p'),
];

impl ContentType {
    /// All known content types, in marker table order.
    pub fn all() -> impl Iterator<Item = ContentType> {
        MARKERS.iter().map(|(content_type, _)| *content_type)
    }

    /// The on-disk marker byte.
    pub fn marker(self) -> u8 {
        MARKERS
            .iter()
            .find(|(content_type, _)| *content_type == self)
            .map(|(_, marker)| *marker)
            .unwrap_or(b'?')
    }

    /// Resolves a marker byte back to its content type.
    pub fn from_marker(marker: u8) -> Result<Self> {
        MARKERS
            .iter()
            .find(|(_, m)| *m == marker)
            .map(|(content_type, _)| *content_type)
            .ok_or(StardictError::UnknownContentType(marker))
    }

    /// String-like payloads are null-terminated; everything else is length-prefixed.
    pub fn is_string_like(self) -> bool {
        self.marker().is_ascii_lowercase()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.marker() as char)
    }
}

/// A dictionary-wide declaration that every block carries the same ordered
/// list of content types (the `.ifo` `sametypesequence` key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSequence(Vec<ContentType>);

impl TypeSequence {
    /// Creates a sequence. An empty sequence is rejected.
    pub fn new(types: Vec<ContentType>) -> Result<Self> {
        if types.is_empty() {
            return Err(StardictError::SchemaMismatch(
                "A uniform type sequence needs at least one content type".to_string(),
            ));
        }
        Ok(Self(types))
    }

    pub fn types(&self) -> &[ContentType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TypeSequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for content_type in &self.0 {
            write!(f, "{}", content_type)?;
        }
        Ok(())
    }
}

impl FromStr for TypeSequence {
    type Err = StardictError;

    fn from_str(s: &str) -> Result<Self> {
        let types = s
            .bytes()
            .map(ContentType::from_marker)
            .collect::<Result<Vec<_>>>()?;
        TypeSequence::new(types)
            .map_err(|_| StardictError::InvalidFormat("Empty sametypesequence".to_string()))
    }
}
