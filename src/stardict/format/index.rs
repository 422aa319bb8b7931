//! # Index File (`.idx`) Codec
//!
//! The index is a flat run of records, one per headword, sorted by the
//! headword's UTF-8 bytes so that readers can binary-search it:
//!
//! ```text
//! [N bytes] headword (UTF-8)
//! [1 byte ] 0x00
//! [4|8    ] offset of the block in .dict (big-endian, width from idxoffsetbits)
//! [4 bytes] size of the block (big-endian)
//! ```
//!
//! Sorting is the writer's responsibility; the reader trusts the order.

use std::io::{Read, Write};

use log::{debug, trace};

use crate::stardict::types::error::{Result, StardictError};
use crate::stardict::types::models::{IndexRecord, OffsetWidth};
use crate::stardict::utils::{self, ByteReader};

/// Encoded byte length of one record at the given offset width.
pub fn encoded_len(record: &IndexRecord, width: OffsetWidth) -> u64 {
    record.word.len() as u64 + 1 + width.number_width() as u64 + 4
}

/// Total encoded byte length of `records` (the `.ifo` `idxfilesize`).
pub fn total_len(records: &[IndexRecord], width: OffsetWidth) -> u64 {
    records.iter().map(|r| encoded_len(r, width)).sum()
}

/// Writes one record.
pub fn write_record(
    writer: &mut impl Write,
    record: &IndexRecord,
    width: OffsetWidth,
) -> Result<u64> {
    if record.offset > width.max_offset() {
        return Err(StardictError::InvalidFormat(format!(
            "Offset {} of {:?} does not fit in {} bits; use 64-bit offsets",
            record.offset,
            record.word,
            width.bits()
        )));
    }
    utils::write_cstring(writer, &record.word)?;
    utils::write_number(writer, record.offset, width.number_width())?;
    utils::write_number(writer, record.size as u64, 4)?;
    trace!("idx record: {}", record);
    Ok(encoded_len(record, width))
}

/// Writes all records in the order given and returns the bytes written.
pub fn write(writer: &mut impl Write, records: &[IndexRecord], width: OffsetWidth) -> Result<u64> {
    let mut written = 0u64;
    for record in records {
        written += write_record(writer, record, width)?;
    }
    debug!("Wrote {} index records ({} bytes)", records.len(), written);
    Ok(written)
}

/// Parses a complete in-memory index.
pub fn parse(data: &[u8], width: OffsetWidth) -> Result<Vec<IndexRecord>> {
    let mut reader = ByteReader::new(data);
    let mut records = Vec::new();

    while !reader.is_empty() {
        let word = reader.read_cstring("index headword")?;
        let offset = reader.read_number(width.number_width(), "index offset")?;
        let size = reader.read_number(4, "index size")? as u32;
        records.push(IndexRecord { word, offset, size });
    }

    Ok(records)
}

/// Reads an index stream to its end.
pub fn read(reader: &mut impl Read, width: OffsetWidth) -> Result<Vec<IndexRecord>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let records = parse(&data, width)?;
    debug!("Read {} index records ({} bytes)", records.len(), data.len());
    Ok(records)
}
