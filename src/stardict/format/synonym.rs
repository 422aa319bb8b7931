//! # Synonym File (`.syn`) Codec
//!
//! Same shape as the index, minus the block location:
//!
//! ```text
//! [N bytes] alternate headword (UTF-8)
//! [1 byte ] 0x00
//! [4 bytes] ordinal of the target word in the sorted .idx (big-endian)
//! ```

use std::io::{Read, Write};

use log::{debug, trace};

use crate::stardict::types::error::Result;
use crate::stardict::types::models::SynonymRecord;
use crate::stardict::utils::{self, ByteReader};

/// Encoded byte length of one record.
pub fn encoded_len(record: &SynonymRecord) -> u64 {
    record.alt_word.len() as u64 + 1 + 4
}

/// Writes all records in the order given and returns the bytes written.
pub fn write(writer: &mut impl Write, records: &[SynonymRecord]) -> Result<u64> {
    let mut written = 0u64;
    for record in records {
        utils::write_cstring(writer, &record.alt_word)?;
        utils::write_number(writer, record.target_index as u64, 4)?;
        trace!("syn record: {}", record);
        written += encoded_len(record);
    }
    debug!("Wrote {} synonym records ({} bytes)", records.len(), written);
    Ok(written)
}

/// Parses a complete in-memory synonym file.
pub fn parse(data: &[u8]) -> Result<Vec<SynonymRecord>> {
    let mut reader = ByteReader::new(data);
    let mut records = Vec::new();

    while !reader.is_empty() {
        let alt_word = reader.read_cstring("synonym headword")?;
        let target_index = reader.read_number(4, "synonym target index")? as u32;
        records.push(SynonymRecord {
            alt_word,
            target_index,
        });
    }

    Ok(records)
}

/// Reads a synonym stream to its end.
pub fn read(reader: &mut impl Read) -> Result<Vec<SynonymRecord>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let records = parse(&data)?;
    debug!("Read {} synonym records ({} bytes)", records.len(), data.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stardict::types::error::StardictError;

    #[test]
    fn record_layout_matches_format() {
        let records = vec![
            SynonymRecord {
                alt_word: "citrus".to_string(),
                target_index: 2,
            },
            SynonymRecord {
                alt_word: "malus".to_string(),
                target_index: 0,
            },
        ];
        let mut out = Vec::new();
        let written = write(&mut out, &records).unwrap();
        assert_eq!(&out[..11], b"citrus\0\x00\x00\x00\x02");
        assert_eq!(written, out.len() as u64);
        assert_eq!(read(&mut &out[..]).unwrap(), records);
    }

    #[test]
    fn missing_terminator_is_truncation() {
        assert!(matches!(
            parse(b"fruit"),
            Err(StardictError::Truncated { offset: 0, .. })
        ));
    }
}
