//! # stardict-codec
//!
//! Reads and writes StarDict dictionaries (`.ifo`, `.idx`, `.syn`, `.dict`
//! and `.dict.dz`), with both self-describing and `sametypesequence` blocks
//! and 32 or 64 bit index offsets.
pub mod stardict;

// Re-export the main types for convenience
pub use stardict::{
    default_title,
    models::{
        DefinitionEntry,
        DefinitionMode,
        DictType,
        DictionaryMetadata,
        IndexRecord,
        OffsetWidth,
        SynonymRecord,
        WordDefinition,
    },
    BuildOptions,
    BuildSummary,
    ContentType,
    DictionaryBuilder,
    DictionaryPaths,
    DictionaryReader,
    GroupedDefinitions,
    Result,
    StardictError,
    TypeSequence,
};
