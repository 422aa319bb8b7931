//! Core StarDict codec module.
//!
//! A dictionary is four files sharing one path prefix:
//!
//! ```text
//! words.ifo   metadata (key=value text)
//! words.idx   sorted headwords → block location in words.dict
//! words.syn   alternate headwords → ordinal in words.idx   (optional)
//! words.dict  concatenated definition blocks               (or words.dict.dz)
//! ```

pub mod builder;
pub mod format;
pub mod iter;
pub mod layout;
pub mod reader;
pub mod types;
pub mod utils;

pub use builder::{BuildOptions, BuildSummary, DictionaryBuilder};
pub use iter::{DefinitionIterator, DefinitionRow, GroupedDefinitions};
pub use layout::{default_title, DictionaryPaths};
pub use reader::DictionaryReader;
pub use types::content_type::{ContentType, TypeSequence};
pub use types::error::{Result, StardictError};
pub use types::models;
