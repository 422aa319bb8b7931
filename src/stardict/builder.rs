//! Single-pass construction of a complete dictionary.
//!
//! A [`DictionaryBuilder`] moves through four states and never goes back:
//!
//! ```text
//! Empty ──begin──▶ Streaming ──sort──▶ Sorted ──finalize──▶ Finalized
//!                  (add_word)
//! ```
//!
//! Any error other than `InvalidState` moves the builder to a terminal
//! `Failed` state. The files it has produced so far are then incomplete and
//! must be rebuilt from scratch.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};

use chrono::NaiveDate;
use log::{debug, info};

use super::format::definition::DefinitionWriter;
use super::format::{index, info as ifo, synonym};
use super::layout::{default_title, DictionaryPaths};
use super::types::content_type::TypeSequence;
use super::types::error::{ResultExt, Result, StardictError};
use super::types::models::*;
use super::utils;

/// Dictionary-wide settings chosen by the caller.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub title: String,
    pub offset_width: OffsetWidth,
    pub same_type_sequence: Option<TypeSequence>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub date: Option<NaiveDate>,
    pub dict_type: Option<DictType>,
    /// Source and target language codes; names the dictionary when `title` is blank.
    pub language_pair: Option<(String, String)>,
}

impl BuildOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn offset_width(mut self, width: OffsetWidth) -> Self {
        self.offset_width = width;
        self
    }

    /// Switches the `.dict` file to uniform blocks.
    pub fn same_type_sequence(mut self, sequence: TypeSequence) -> Self {
        self.same_type_sequence = Some(sequence);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn dict_type(mut self, dict_type: DictType) -> Self {
        self.dict_type = Some(dict_type);
        self
    }

    pub fn language_pair(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.language_pair = Some((from.into(), to.into()));
        self
    }

    /// The `bookname` to write: the title, or the language-pair default when blank.
    pub fn resolved_title(&self) -> Result<String> {
        let title = ifo::sanitize(&self.title);
        if !title.is_empty() {
            return Ok(title);
        }
        match &self.language_pair {
            Some((from, to)) => Ok(default_title(from, to)),
            None => Err(StardictError::SchemaMismatch(
                "Dictionary needs a title or a language pair".to_string(),
            )),
        }
    }
}

/// Counts reported once a dictionary is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub word_count: u64,
    pub synonym_count: u64,
    pub index_file_size: u64,
    pub dict_file_size: u64,
}

enum BuildState {
    Empty,
    Streaming(DefinitionWriter<BufWriter<File>>),
    Sorted,
    Finalized,
    Failed,
}

impl BuildState {
    fn name(&self) -> &'static str {
        match self {
            BuildState::Empty => "empty",
            BuildState::Streaming(_) => "streaming",
            BuildState::Sorted => "sorted",
            BuildState::Finalized => "finalized",
            BuildState::Failed => "failed",
        }
    }
}

/// Writes one dictionary. Single use.
pub struct DictionaryBuilder {
    paths: DictionaryPaths,
    options: BuildOptions,
    state: BuildState,
    records: Vec<IndexRecord>,
    seen_words: HashSet<String>,
    pending_synonyms: Vec<(String, String)>,
    synonyms: Vec<SynonymRecord>,
    dict_file_size: u64,
}

impl DictionaryBuilder {
    pub fn new(paths: DictionaryPaths, options: BuildOptions) -> Self {
        Self {
            paths,
            options,
            state: BuildState::Empty,
            records: Vec::new(),
            seen_words: HashSet::new(),
            pending_synonyms: Vec::new(),
            synonyms: Vec::new(),
            dict_file_size: 0,
        }
    }

    /// Runs every stage over `words` and returns the final counts.
    pub fn build(mut self, words: impl IntoIterator<Item = WordDefinition>) -> Result<BuildSummary> {
        self.begin()?;
        self.add_words(words)?;
        self.sort()?;
        self.finalize()
    }

    pub fn paths(&self) -> &DictionaryPaths {
        &self.paths
    }

    /// Name of the current state, for diagnostics.
    pub fn state(&self) -> &'static str {
        self.state.name()
    }

    /// Index records collected so far; in write order until `sort`, sorted after.
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Synonym records; empty until `sort`.
    pub fn synonyms(&self) -> &[SynonymRecord] {
        &self.synonyms
    }

    fn invalid_state(&self, operation: &'static str) -> StardictError {
        StardictError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }

    /// Moves to `Failed` on any error except an out-of-order call.
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !matches!(e, StardictError::InvalidState { .. }) {
                self.state = BuildState::Failed;
            }
        }
        result
    }

    /// `Empty → Streaming`: creates the `.dict` file.
    pub fn begin(&mut self) -> Result<()> {
        if !matches!(self.state, BuildState::Empty) {
            return Err(self.invalid_state("begin"));
        }
        let title = self.options.resolved_title();
        self.options.title = self.guard(title)?;
        let path = self.paths.dict();
        info!("Creating StarDict definitions: {}", path.display());
        let file = File::create(&path).map_err(StardictError::from).in_file(&path);
        let file = self.guard(file)?;
        let mode = DefinitionMode::from_sequence(self.options.same_type_sequence.as_ref());
        debug!("Definition blocks: {:?}", mode);
        self.state = BuildState::Streaming(DefinitionWriter::new(BufWriter::new(file), mode));
        Ok(())
    }

    /// Records an alternate headword for `target`. Resolved during `sort`.
    pub fn add_synonym(&mut self, alt_word: impl Into<String>, target: impl Into<String>) -> Result<()> {
        match self.state {
            BuildState::Empty | BuildState::Streaming(_) => {
                let (alt_word, target) = (alt_word.into(), target.into());
                let checked = check_headword(&alt_word).and_then(|_| check_headword(&target));
                self.guard(checked)?;
                self.pending_synonyms.push((alt_word, target));
                Ok(())
            }
            _ => Err(self.invalid_state("add a synonym")),
        }
    }

    pub fn add_synonyms<A, T>(&mut self, synonyms: impl IntoIterator<Item = (A, T)>) -> Result<()>
    where
        A: Into<String>,
        T: Into<String>,
    {
        for (alt_word, target) in synonyms {
            self.add_synonym(alt_word, target)?;
        }
        Ok(())
    }

    /// Appends the word's block to `.dict`, first dropping repeated entries
    /// when blocks are self-describing.
    pub fn add_word(&mut self, mut word: WordDefinition) -> Result<IndexRecord> {
        let result = self.write_word(&mut word);
        self.guard(result)
    }

    fn write_word(&mut self, word: &mut WordDefinition) -> Result<IndexRecord> {
        let BuildState::Streaming(writer) = &mut self.state else {
            return Err(self.invalid_state("add a word"));
        };
        check_headword(&word.word)?;
        if self.seen_words.contains(&word.word) {
            return Err(StardictError::SchemaMismatch(format!(
                "Headword {:?} was already written",
                word.word
            )));
        }
        // Uniform blocks are positional; dropping a repeat would break the sequence.
        if *writer.mode() == DefinitionMode::SelfDescribing {
            word.dedup_definitions();
        }

        let record = writer.write_block(&word.word, &word.definitions).in_file(&self.paths.dict())?;
        if record.offset > self.options.offset_width.max_offset() {
            return Err(StardictError::SchemaMismatch(format!(
                "Offset {} of {:?} needs 64-bit index offsets",
                record.offset, record.word
            )));
        }
        self.seen_words.insert(word.word.clone());
        self.records.push(record.clone());
        Ok(record)
    }

    /// Streams every word in `words`; returns how many were written.
    pub fn add_words(&mut self, words: impl IntoIterator<Item = WordDefinition>) -> Result<u64> {
        let mut count = 0u64;
        for word in words {
            self.add_word(word)?;
            count += 1;
        }
        Ok(count)
    }

    /// `Streaming → Sorted`: closes `.dict`, sorts the index and resolves synonyms.
    pub fn sort(&mut self) -> Result<()> {
        let mut writer = match std::mem::replace(&mut self.state, BuildState::Failed) {
            BuildState::Streaming(writer) => writer,
            other => {
                self.state = other;
                return Err(self.invalid_state("sort"));
            }
        };

        let dict_path = self.paths.dict();
        self.dict_file_size = writer.cursor();
        writer.flush().in_file(&dict_path)?;
        drop(writer);
        info!(
            "Wrote {} definition blocks ({} bytes) to {}",
            self.records.len(),
            self.dict_file_size,
            dict_path.display()
        );

        self.records.sort_by(|a, b| a.word.cmp(&b.word));
        self.synonyms = resolve_synonyms(&self.records, std::mem::take(&mut self.pending_synonyms))?;
        debug!("Resolved {} synonyms", self.synonyms.len());

        self.state = BuildState::Sorted;
        Ok(())
    }

    /// `Sorted → Finalized`: writes `.idx`, `.syn` and `.ifo`.
    pub fn finalize(&mut self) -> Result<BuildSummary> {
        if !matches!(self.state, BuildState::Sorted) {
            return Err(self.invalid_state("finalize"));
        }
        let result = self.write_tables();
        let summary = self.guard(result)?;
        self.state = BuildState::Finalized;
        info!(
            "StarDict dictionary finalized: {} words, {} synonyms, idx {} bytes, dict {} bytes",
            summary.word_count, summary.synonym_count, summary.index_file_size, summary.dict_file_size
        );
        Ok(summary)
    }

    fn write_tables(&self) -> Result<BuildSummary> {
        let width = self.options.offset_width;

        let idx_path = self.paths.idx();
        let index_file_size = write_file(&idx_path, |w| index::write(w, &self.records, width))?;

        let syn_path = self.paths.syn();
        if self.synonyms.is_empty() {
            if syn_path.exists() {
                debug!("Removing stale {}", syn_path.display());
                fs::remove_file(&syn_path).map_err(StardictError::from).in_file(&syn_path)?;
            }
        } else {
            write_file(&syn_path, |w| synonym::write(w, &self.synonyms))?;
        }

        let metadata = self.metadata(index_file_size);
        write_file(&self.paths.ifo(), |w| ifo::write(w, &metadata))?;

        Ok(BuildSummary {
            word_count: metadata.word_count,
            synonym_count: metadata.synonym_count,
            index_file_size,
            dict_file_size: self.dict_file_size,
        })
    }

    fn metadata(&self, index_file_size: u64) -> DictionaryMetadata {
        let options = &self.options;
        let version = options.version.clone().or_else(|| {
            (options.offset_width == OffsetWidth::Bits64).then(|| OFFSET_BITS_VERSION.to_string())
        });
        DictionaryMetadata {
            version,
            title: options.title.clone(),
            word_count: self.records.len() as u64,
            synonym_count: self.synonyms.len() as u64,
            index_file_size,
            offset_width: options.offset_width,
            author: options.author.clone(),
            email: options.email.clone(),
            website: options.website.clone(),
            description: options.description.clone(),
            date: options.date,
            same_type_sequence: options.same_type_sequence.clone(),
            dict_type: options.dict_type.clone(),
        }
    }
}

/// Creates `path`, runs `body` against a buffered writer and flushes it.
fn write_file<T>(
    path: &std::path::Path,
    body: impl FnOnce(&mut BufWriter<File>) -> Result<T>,
) -> Result<T> {
    let run = || -> Result<T> {
        let mut writer = BufWriter::new(File::create(path)?);
        let value = body(&mut writer)?;
        writer.flush()?;
        Ok(value)
    };
    let value = run().in_file(path)?;
    debug!("Wrote {}", path.display());
    Ok(value)
}

/// Headwords are written NUL-terminated, so they cannot contain NUL.
fn check_headword(word: &str) -> Result<()> {
    utils::encode_cstring(word).map(|_| ())
}

/// Maps each `(alt, target)` pair to the target's ordinal in the sorted index.
fn resolve_synonyms(
    sorted: &[IndexRecord],
    pending: Vec<(String, String)>,
) -> Result<Vec<SynonymRecord>> {
    let mut synonyms = Vec::with_capacity(pending.len());
    for (alt_word, target) in pending {
        let position = sorted
            .binary_search_by(|record| record.word.as_str().cmp(target.as_str()))
            .map_err(|_| {
                StardictError::SchemaMismatch(format!(
                    "Synonym {:?} points at unknown headword {:?}",
                    alt_word, target
                ))
            })?;
        let target_index = u32::try_from(position).map_err(|_| {
            StardictError::SchemaMismatch(format!("Index ordinal {} exceeds 32 bits", position))
        })?;
        synonyms.push(SynonymRecord {
            alt_word,
            target_index,
        });
    }
    synonyms.sort_by(|a, b| {
        a.alt_word
            .cmp(&b.alt_word)
            .then(a.target_index.cmp(&b.target_index))
    });
    synonyms.dedup();
    if let Some(pair) = synonyms.windows(2).find(|p| p[0].alt_word == p[1].alt_word) {
        return Err(StardictError::SchemaMismatch(format!(
            "Synonym {:?} points at both {} and {}",
            pair[0].alt_word, pair[0].target_index, pair[1].target_index
        )));
    }
    Ok(synonyms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stardict::types::content_type::ContentType;

    fn record(word: &str) -> IndexRecord {
        IndexRecord {
            word: word.to_string(),
            offset: 0,
            size: 0,
        }
    }

    #[test]
    fn synonyms_resolve_to_sorted_ordinals() {
        let sorted = vec![record("apple"), record("banana"), record("orange")];
        let pending = vec![
            ("plantain".to_string(), "banana".to_string()),
            ("malus".to_string(), "apple".to_string()),
            ("citrus".to_string(), "orange".to_string()),
            ("malus".to_string(), "apple".to_string()),
        ];
        let synonyms = resolve_synonyms(&sorted, pending).unwrap();
        let flat: Vec<(&str, u32)> = synonyms
            .iter()
            .map(|s| (s.alt_word.as_str(), s.target_index))
            .collect();
        assert_eq!(flat, vec![("citrus", 2), ("malus", 0), ("plantain", 1)]);
    }

    #[test]
    fn synonym_with_two_targets_is_rejected() {
        let sorted = vec![record("apple"), record("banana")];
        let pending = vec![
            ("fruit".to_string(), "apple".to_string()),
            ("fruit".to_string(), "banana".to_string()),
        ];
        let err = resolve_synonyms(&sorted, pending).unwrap_err();
        assert!(err.is_schema_mismatch(), "{}", err);
    }

    #[test]
    fn nul_in_headword_fails_the_call_that_received_it() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DictionaryPaths::new(dir.path().join("d"));
        let mut builder = DictionaryBuilder::new(paths.clone(), BuildOptions::new("t"));
        builder.begin().unwrap();
        let bad = WordDefinition::new("a\0b", vec![DefinitionEntry::new(ContentType::Meaning, "x")]);
        assert!(builder.add_word(bad).unwrap_err().is_schema_mismatch());
        assert_eq!(builder.state(), "failed");
        assert!(builder.records().is_empty());

        let mut builder = DictionaryBuilder::new(paths, BuildOptions::new("t"));
        assert!(builder.add_synonym("x\0y", "a").unwrap_err().is_schema_mismatch());
        assert_eq!(builder.state(), "failed");
        let mut builder = DictionaryBuilder::new(DictionaryPaths::new(dir.path().join("e")), BuildOptions::new("t"));
        assert!(builder.add_synonym("x", "a\0").unwrap_err().is_schema_mismatch());
    }

    #[test]
    fn blank_title_falls_back_to_language_pair() {
        let options = BuildOptions::new(" \n").language_pair("cs", "en");
        assert_eq!(options.resolved_title().unwrap(), "kaikki.org cs to en dictionary");
        assert_eq!(BuildOptions::new("Mine").language_pair("cs", "en").resolved_title().unwrap(), "Mine");
        assert!(BuildOptions::default().resolved_title().unwrap_err().is_schema_mismatch());
    }

    #[test]
    fn unknown_synonym_target_is_rejected() {
        let err = resolve_synonyms(&[record("apple")], vec![("x".into(), "pear".into())]).unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder =
            DictionaryBuilder::new(DictionaryPaths::new(dir.path().join("d")), BuildOptions::new("t"));
        let word = WordDefinition::new("a", vec![DefinitionEntry::new(ContentType::Meaning, "x")]);
        assert!(matches!(
            builder.add_word(word.clone()),
            Err(StardictError::InvalidState { state: "empty", .. })
        ));
        assert!(builder.finalize().is_err());
        builder.begin().unwrap();
        assert!(builder.begin().is_err());
        builder.add_word(word).unwrap();
        builder.sort().unwrap();
        assert!(builder.add_synonym("b", "a").is_err());
        builder.finalize().unwrap();
        assert_eq!(builder.state(), "finalized");
        assert!(builder.sort().is_err());
    }
}
