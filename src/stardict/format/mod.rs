//! File format layer for StarDict dictionaries.
//!
//! One dictionary is four files sharing a path prefix. Each submodule owns
//! the byte layout of one of them:
//!
//! - [`definition`]: `.dict`, the concatenated definition blocks
//! - [`index`]: `.idx`, sorted headword → block location records
//! - [`synonym`]: `.syn`, sorted alternate headword → index ordinal records
//! - [`info`]: `.ifo`, the text descriptor with counts and layout flags
//!
//! # Architecture
//!
//! ```text
//!   .ifo ──────────── wordcount, idxfilesize, idxoffsetbits, sametypesequence
//!    │
//!   .idx  [word\0 offset size] ... ──┐
//!    ▲                               │ offset/size
//!   .syn  [alt\0 ordinal] ...        ▼
//!                              .dict [block][block][block] ...
//! ```

pub mod definition;
pub mod index;
pub mod info;
pub mod synonym;
