use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Seek};
use std::sync::Mutex;

use flate2::read::GzDecoder;
use log::{debug, info, warn};

use super::format::{definition, index, info as ifo, synonym};
use super::iter::DefinitionIterator;
use super::layout::DictionaryPaths;
use super::types::error::{Result, ResultExt, StardictError};
use super::types::models::*;

/// Seekable source of definition blocks: a `.dict` file or an inflated `.dict.dz`.
trait DefinitionSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> DefinitionSource for T {}

/// Random-access reader over a complete dictionary.
///
/// The `.ifo`, `.idx` and `.syn` files are loaded and validated up front.
/// Definition blocks are read on demand from the `.dict` file; a `.dict.dz`
/// is inflated into memory when no plain `.dict` exists.
pub struct DictionaryReader {
    paths: DictionaryPaths,
    metadata: DictionaryMetadata,
    index: Vec<IndexRecord>,
    synonyms: Vec<SynonymRecord>,
    index_sorted: bool,
    synonyms_sorted: bool,
    definitions: Mutex<Box<dyn DefinitionSource>>,
    definitions_len: u64,
}

impl std::fmt::Debug for DictionaryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryReader")
            .field("paths", &self.paths)
            .field("metadata", &self.metadata)
            .field("entries", &self.index.len())
            .field("synonyms", &self.synonyms.len())
            .field("definitions_len", &self.definitions_len)
            .finish()
    }
}

impl DictionaryReader {
    /// Opens the dictionary whose files share `paths`' prefix.
    ///
    /// # Errors
    /// Returns an error if:
    /// - the `.ifo`, `.idx` or definitions file cannot be opened
    /// - any file is malformed or truncated
    /// - `wordcount`, `synwordcount` or `idxfilesize` disagree with the files
    /// - a synonym or index record points outside its target
    pub fn open(paths: DictionaryPaths) -> Result<Self> {
        info!("Opening StarDict dictionary: {}", paths.prefix().display());

        let ifo_path = paths.ifo();
        let metadata = File::open(&ifo_path)
            .map_err(StardictError::from)
            .and_then(|file| ifo::read(&mut BufReader::new(file)))
            .in_file(&ifo_path)?;

        let idx_path = paths.idx();
        let index = read_index(&idx_path, &metadata).in_file(&idx_path)?;

        let syn_path = paths.syn();
        let synonyms = if syn_path.exists() {
            read_synonyms(&syn_path, &metadata).in_file(&syn_path)?
        } else if metadata.synonym_count > 0 {
            return Err(StardictError::CountMismatch {
                item_type: "synonyms",
                expected: metadata.synonym_count,
                found: 0,
            }
            .in_file(&syn_path));
        } else {
            Vec::new()
        };

        let (definitions, definitions_len) = open_definitions(&paths)?;
        let dict_path = paths.dict();
        check_blocks(&index, definitions_len).in_file(&dict_path)?;

        let index_sorted = index.windows(2).all(|w| w[0].word < w[1].word);
        if !index_sorted {
            warn!("Index is not sorted byte-wise; headword lookups fall back to a linear scan");
        }
        let synonyms_sorted = synonyms.windows(2).all(|w| w[0].alt_word <= w[1].alt_word);

        info!(
            "Loaded '{}': {} words, {} synonyms, {} definition bytes",
            metadata.title,
            index.len(),
            synonyms.len(),
            definitions_len
        );

        Ok(Self {
            paths,
            metadata,
            index,
            synonyms,
            index_sorted,
            synonyms_sorted,
            definitions: Mutex::new(definitions),
            definitions_len,
        })
    }

    pub fn paths(&self) -> &DictionaryPaths {
        &self.paths
    }

    pub fn metadata(&self) -> &DictionaryMetadata {
        &self.metadata
    }

    /// Index records in file order.
    pub fn index(&self) -> &[IndexRecord] {
        &self.index
    }

    pub fn synonyms(&self) -> &[SynonymRecord] {
        &self.synonyms
    }

    /// Number of headwords. O(1).
    pub fn num_entries(&self) -> usize {
        self.index.len()
    }

    /// Size in bytes of the (inflated) definitions blob.
    pub fn definitions_len(&self) -> u64 {
        self.definitions_len
    }

    /// Ordinal of `word` in the index.
    pub fn find_word(&self, word: &str) -> Option<usize> {
        if self.index_sorted {
            self.index
                .binary_search_by(|record| record.word.as_str().cmp(word))
                .ok()
        } else {
            self.index.iter().position(|record| record.word == word)
        }
    }

    /// Index ordinals that `alt_word` is a synonym for.
    pub fn find_synonym_targets(&self, alt_word: &str) -> Vec<usize> {
        if self.synonyms_sorted {
            let start = self
                .synonyms
                .partition_point(|s| s.alt_word.as_str() < alt_word);
            let end = self
                .synonyms
                .partition_point(|s| s.alt_word.as_str() <= alt_word);
            self.synonyms[start..end]
                .iter()
                .map(|s| s.target_index as usize)
                .collect()
        } else {
            self.synonyms
                .iter()
                .filter(|s| s.alt_word == alt_word)
                .map(|s| s.target_index as usize)
                .collect()
        }
    }

    /// Decodes the block of the `i`-th headword.
    pub fn read_definition(&self, i: usize) -> Result<WordDefinition> {
        let record = self.index.get(i).ok_or_else(|| {
            StardictError::InvalidFormat(format!(
                "Entry {} is out of bounds ({} entries)",
                i,
                self.index.len()
            ))
        })?;
        let definitions = self.read_record(record)?;
        Ok(WordDefinition::new(record.word.clone(), definitions))
    }

    /// Decodes the block an index record points at.
    pub fn read_record(&self, record: &IndexRecord) -> Result<Vec<DefinitionEntry>> {
        let mode = self.metadata.definition_mode();
        let mut source = self
            .definitions
            .lock()
            .map_err(|_| StardictError::LockPoisoned)?;
        definition::read_block(&mut *source, record.offset, record.size, &mode)
    }

    /// Definitions for `word`: the headword itself first, then every
    /// headword it is a synonym for. Empty when nothing matches.
    pub fn lookup(&self, word: &str) -> Result<Vec<WordDefinition>> {
        let direct = self.find_word(word);
        let mut ordinals: Vec<usize> = direct.into_iter().collect();
        for target in self.find_synonym_targets(word) {
            if !ordinals.contains(&target) {
                ordinals.push(target);
            }
        }
        debug!("Lookup {:?}: {} matching entries", word, ordinals.len());
        ordinals
            .into_iter()
            .map(|i| self.read_definition(i))
            .collect()
    }

    /// Iterates every headword's definitions in index order.
    pub fn iter_definitions(&self) -> DefinitionIterator<'_> {
        DefinitionIterator::new(self)
    }
}

fn read_index(path: &std::path::Path, metadata: &DictionaryMetadata) -> Result<Vec<IndexRecord>> {
    let data = fs::read(path)?;
    if data.len() as u64 != metadata.index_file_size {
        return Err(StardictError::SizeMismatch {
            context: "index file",
            expected: metadata.index_file_size,
            found: data.len() as u64,
        });
    }
    let records = index::parse(&data, metadata.offset_width)?;
    if records.len() as u64 != metadata.word_count {
        return Err(StardictError::CountMismatch {
            item_type: "index records",
            expected: metadata.word_count,
            found: records.len() as u64,
        });
    }
    debug!(
        "Read {} index records ({}-bit offsets)",
        records.len(),
        metadata.offset_width.bits()
    );
    Ok(records)
}

fn read_synonyms(path: &std::path::Path, metadata: &DictionaryMetadata) -> Result<Vec<SynonymRecord>> {
    let records = synonym::read(&mut BufReader::new(File::open(path)?))?;
    if records.len() as u64 != metadata.synonym_count {
        return Err(StardictError::CountMismatch {
            item_type: "synonyms",
            expected: metadata.synonym_count,
            found: records.len() as u64,
        });
    }
    if let Some(bad) = records
        .iter()
        .find(|r| r.target_index as u64 >= metadata.word_count)
    {
        return Err(StardictError::InvalidFormat(format!(
            "Synonym {:?} targets entry {} but the index has {}",
            bad.alt_word, bad.target_index, metadata.word_count
        )));
    }
    Ok(records)
}

fn open_definitions(paths: &DictionaryPaths) -> Result<(Box<dyn DefinitionSource>, u64)> {
    let dict_path = paths.dict();
    if dict_path.exists() {
        let file = File::open(&dict_path).map_err(StardictError::from).in_file(&dict_path)?;
        let len = file.metadata().map_err(StardictError::from).in_file(&dict_path)?.len();
        debug!("Reading definitions from {}", dict_path.display());
        return Ok((Box::new(file), len));
    }

    let dz_path = paths.dict_dz();
    if dz_path.exists() {
        let inflate = || -> Result<Vec<u8>> {
            let mut data = Vec::new();
            GzDecoder::new(BufReader::new(File::open(&dz_path)?)).read_to_end(&mut data)?;
            Ok(data)
        };
        let data = inflate().in_file(&dz_path)?;
        debug!("Inflated {} to {} bytes", dz_path.display(), data.len());
        let len = data.len() as u64;
        return Ok((Box::new(Cursor::new(data)), len));
    }

    Err(StardictError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "neither .dict nor .dict.dz exists",
    ))
    .in_file(&dict_path))
}

fn check_blocks(index: &[IndexRecord], definitions_len: u64) -> Result<()> {
    for record in index {
        let end = record.offset.checked_add(record.size as u64);
        if end.map_or(true, |end| end > definitions_len) {
            return Err(StardictError::InvalidFormat(format!(
                "Block of {:?} at {}+{} exceeds the {} byte definitions file",
                record.word, record.offset, record.size, definitions_len
            )));
        }
    }
    Ok(())
}
