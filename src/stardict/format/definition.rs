//! # Definition File (`.dict`) Codec
//!
//! The `.dict` file is a flat concatenation of per-word blocks in write
//! order. Nothing inside the file marks where a block starts or ends; the
//! `.idx` record for the word supplies the offset and size.
//!
//! ## Self-describing blocks
//!
//! Used when the `.ifo` declares no `sametypesequence`. Each entry is
//! prefixed with its type marker:
//!
//! ```text
//! [1 byte ] type marker
//! lowercase marker: [N bytes] text, [1 byte] 0x00
//! uppercase marker: [4 bytes] payload length (big-endian), [N bytes] payload
//! ```
//!
//! ## Uniform blocks
//!
//! Used when the `.ifo` declares `sametypesequence`. Markers are omitted and
//! every block holds exactly one entry per declared type, in order. The last
//! entry has neither terminator nor length prefix; it runs to the end of the
//! block.
//!
//! A block's recorded size is always its exact encoded length, including any
//! trailing terminator.

use std::io::{Read, Seek, SeekFrom, Write};

use log::trace;

use crate::stardict::types::content_type::{ContentType, TypeSequence};
use crate::stardict::types::error::{Result, StardictError};
use crate::stardict::types::models::{DefinitionEntry, DefinitionMode, IndexRecord};
use crate::stardict::utils::{self, ByteReader};

/// Streams definition blocks to a `.dict` sink and tracks the write cursor.
#[derive(Debug)]
pub struct DefinitionWriter<W: Write> {
    writer: W,
    cursor: u64,
    mode: DefinitionMode,
}

impl<W: Write> DefinitionWriter<W> {
    pub fn new(writer: W, mode: DefinitionMode) -> Self {
        Self {
            writer,
            cursor: 0,
            mode,
        }
    }

    /// Number of bytes written so far; also the offset of the next block.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn mode(&self) -> &DefinitionMode {
        &self.mode
    }

    /// Appends one word's block and returns its index record.
    ///
    /// The block is fully encoded before anything is written, so a rejected
    /// block leaves the sink untouched.
    pub fn write_block(&mut self, word: &str, definitions: &[DefinitionEntry]) -> Result<IndexRecord> {
        let block = encode_block(definitions, &self.mode)
            .map_err(|e| match e {
                StardictError::SchemaMismatch(msg) => {
                    StardictError::SchemaMismatch(format!("{:?}: {}", word, msg))
                }
                other => other,
            })?;
        let size = u32::try_from(block.len()).map_err(|_| {
            StardictError::SchemaMismatch(format!(
                "{:?}: block of {} bytes exceeds the 32-bit size field",
                word,
                block.len()
            ))
        })?;

        self.writer.write_all(&block)?;
        let record = IndexRecord {
            word: word.to_string(),
            offset: self.cursor,
            size,
        };
        self.cursor += block.len() as u64;
        trace!("dict block: {}", record);
        Ok(record)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Encodes one word's definitions as a block.
pub fn encode_block(definitions: &[DefinitionEntry], mode: &DefinitionMode) -> Result<Vec<u8>> {
    let mut block = Vec::with_capacity(
        definitions.iter().map(|d| d.payload.len() + 5).sum(),
    );
    match mode {
        DefinitionMode::SelfDescribing => {
            for entry in definitions {
                block.push(entry.content_type.marker());
                encode_framed(&mut block, entry)?;
            }
        }
        DefinitionMode::Uniform(sequence) => {
            check_sequence(definitions, sequence)?;
            let last = definitions.len() - 1;
            for (i, entry) in definitions.iter().enumerate() {
                if i == last {
                    check_text(entry)?;
                    block.extend_from_slice(&entry.payload);
                } else {
                    encode_framed(&mut block, entry)?;
                }
            }
        }
    }
    Ok(block)
}

/// Terminated text or length-prefixed binary, depending on the entry's type.
fn encode_framed(block: &mut Vec<u8>, entry: &DefinitionEntry) -> Result<()> {
    if entry.content_type.is_string_like() {
        check_text(entry)?;
        block.extend_from_slice(&entry.payload);
        block.push(0);
    } else {
        let len = u32::try_from(entry.payload.len()).map_err(|_| {
            StardictError::SchemaMismatch(format!(
                "'{}' payload of {} bytes exceeds the 32-bit length field",
                entry.content_type,
                entry.payload.len()
            ))
        })?;
        utils::write_number(block, len as u64, 4)?;
        block.extend_from_slice(&entry.payload);
    }
    Ok(())
}

fn check_text(entry: &DefinitionEntry) -> Result<()> {
    if entry.content_type.is_string_like() && entry.payload.contains(&0) {
        return Err(StardictError::SchemaMismatch(format!(
            "'{}' text payload contains a NUL byte",
            entry.content_type
        )));
    }
    Ok(())
}

fn check_sequence(definitions: &[DefinitionEntry], sequence: &TypeSequence) -> Result<()> {
    if definitions.len() != sequence.len() {
        return Err(StardictError::SchemaMismatch(format!(
            "expected {} entries for sametypesequence '{}', got {}",
            sequence.len(),
            sequence,
            definitions.len()
        )));
    }
    for (i, (entry, expected)) in definitions.iter().zip(sequence.types()).enumerate() {
        if entry.content_type != *expected {
            return Err(StardictError::SchemaMismatch(format!(
                "entry {} has type '{}' but sametypesequence '{}' declares '{}'",
                i, entry.content_type, sequence, expected
            )));
        }
    }
    Ok(())
}

/// Decodes a block held in memory.
pub fn decode_block(data: &[u8], mode: &DefinitionMode) -> Result<Vec<DefinitionEntry>> {
    decode_block_at(data, 0, mode)
}

/// Decodes a block that started at `offset` in its file; errors report
/// absolute offsets.
pub fn decode_block_at(
    data: &[u8],
    offset: u64,
    mode: &DefinitionMode,
) -> Result<Vec<DefinitionEntry>> {
    let mut reader = ByteReader::with_base(data, offset);
    let mut entries = Vec::new();

    match mode {
        DefinitionMode::SelfDescribing => {
            while !reader.is_empty() {
                let marker_offset = reader.offset();
                let marker = reader.read_u8("definition type marker")?;
                let content_type = ContentType::from_marker(marker).map_err(|_| {
                    StardictError::InvalidFormat(format!(
                        "Unknown content type marker {:#04x} at byte offset {}",
                        marker, marker_offset
                    ))
                })?;
                entries.push(decode_framed(&mut reader, content_type)?);
            }
        }
        DefinitionMode::Uniform(sequence) => {
            let last = sequence.len() - 1;
            for (i, content_type) in sequence.types().iter().enumerate() {
                if i == last {
                    entries.push(DefinitionEntry::new(*content_type, reader.read_rest()));
                } else {
                    entries.push(decode_framed(&mut reader, *content_type)?);
                }
            }
        }
    }

    Ok(entries)
}

fn decode_framed(reader: &mut ByteReader<'_>, content_type: ContentType) -> Result<DefinitionEntry> {
    let payload = if content_type.is_string_like() {
        reader.read_cstring_bytes("definition text")?
    } else {
        let len = reader.read_number(4, "definition length")? as usize;
        reader.read_bytes(len, "definition payload")?
    };
    Ok(DefinitionEntry::new(content_type, payload))
}

/// Reads the block at `offset..offset + size` and decodes it.
pub fn read_block<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    size: u32,
    mode: &DefinitionMode,
) -> Result<Vec<DefinitionEntry>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut block = vec![0u8; size as usize];
    reader.read_exact(&mut block).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => StardictError::Truncated {
            context: "definition block",
            offset,
        },
        _ => StardictError::Io(e),
    })?;
    decode_block_at(&block, offset, mode)
}
