//! # Info File (`.ifo`) Codec
//!
//! The `.ifo` file is UTF-8 text. The first line is a fixed signature, every
//! following line is a `key=value` pair:
//!
//! ```text
//! StarDict's dict ifo file
//! version=2.4.2
//! bookname=...
//! wordcount=...
//! synwordcount=...        (only when non-zero)
//! idxfilesize=...
//! idxoffsetbits=64        (only for 64-bit offsets)
//! description=... author=... email=... website=... date=...
//! sametypesequence=...    (only for uniform blocks)
//! dicttype=...
//! ```
//!
//! Values are single-line; embedded line breaks are replaced on write.

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use log::{debug, trace, warn};

use crate::stardict::types::content_type::TypeSequence;
use crate::stardict::types::error::{Result, StardictError};
use crate::stardict::types::models::{DictType, DictionaryMetadata, OffsetWidth};

/// First line of every `.ifo` file.
pub const SIGNATURE: &str = "StarDict's dict ifo file";

/// Date format written to `date=`.
const DATE_FORMAT: &str = "%Y.%m.%d";

/// Date formats accepted on read, in order of preference.
const DATE_FORMATS: [&str; 2] = ["%Y%m%d", "%Y.%m.%d"];

/// Writes `metadata` as a complete `.ifo` file.
pub fn write(writer: &mut impl Write, metadata: &DictionaryMetadata) -> Result<()> {
    writeln!(writer, "{}", SIGNATURE)?;
    writeln!(writer, "version={}", sanitize(metadata.version_or_default()))?;
    writeln!(writer, "bookname={}", sanitize(&metadata.title))?;
    writeln!(writer, "wordcount={}", metadata.word_count)?;
    if metadata.synonym_count > 0 {
        writeln!(writer, "synwordcount={}", metadata.synonym_count)?;
    }
    writeln!(writer, "idxfilesize={}", metadata.index_file_size)?;
    if metadata.offset_width == OffsetWidth::Bits64 {
        writeln!(writer, "idxoffsetbits=64")?;
    }

    write_optional(writer, "description", metadata.description.as_deref())?;
    write_optional(writer, "author", metadata.author.as_deref())?;
    write_optional(writer, "email", metadata.email.as_deref())?;
    write_optional(writer, "website", metadata.website.as_deref())?;
    if let Some(date) = metadata.date {
        writeln!(writer, "date={}", date.format(DATE_FORMAT))?;
    }
    if let Some(sequence) = &metadata.same_type_sequence {
        writeln!(writer, "sametypesequence={}", sequence)?;
    }
    if let Some(dict_type) = &metadata.dict_type {
        write_optional(writer, "dicttype", Some(dict_type.as_str()))?;
    }

    debug!(
        "Wrote .ifo: bookname='{}', wordcount={}, synwordcount={}, idxfilesize={}",
        metadata.title, metadata.word_count, metadata.synonym_count, metadata.index_file_size
    );
    Ok(())
}

fn write_optional(writer: &mut impl Write, key: &str, value: Option<&str>) -> Result<()> {
    if let Some(value) = value.map(sanitize).filter(|v| !v.is_empty()) {
        writeln!(writer, "{}={}", key, value)?;
    }
    Ok(())
}

/// Collapses line breaks so a value stays on its own line.
pub fn sanitize(value: &str) -> String {
    value.replace(['\n', '\r'], " ").trim().to_string()
}

/// Reads a complete `.ifo` file.
pub fn read(reader: &mut impl BufRead) -> Result<DictionaryMetadata> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            StardictError::InvalidFormat("The .ifo file is not valid UTF-8".to_string())
        }
        _ => StardictError::Io(e),
    })?;
    parse(&text)
}

/// Parses `.ifo` text.
pub fn parse(text: &str) -> Result<DictionaryMetadata> {
    let mut lines = text.lines();
    let signature = lines
        .next()
        .map(|line| line.trim_start_matches('\u{feff}').trim_end())
        .unwrap_or_default();
    if signature != SIGNATURE {
        return Err(StardictError::InvalidFormat(format!(
            "Missing .ifo signature, first line is {:?}",
            signature
        )));
    }

    let mut metadata = DictionaryMetadata::default();
    for line in lines {
        let line = line.trim_end_matches('\r');
        let Some((key, value)) = line.split_once('=') else {
            if !line.trim().is_empty() {
                trace!("Ignoring .ifo line without '=': {:?}", line);
            }
            continue;
        };
        match key {
            "version" => metadata.version = Some(value.to_string()),
            "bookname" => metadata.title = value.to_string(),
            "wordcount" => metadata.word_count = parse_number(key, value)?,
            "synwordcount" => metadata.synonym_count = parse_number(key, value)?,
            "idxfilesize" => metadata.index_file_size = parse_number(key, value)?,
            "idxoffsetbits" => {
                let bits = u32::try_from(parse_number(key, value)?).map_err(|_| {
                    StardictError::InvalidFormat(format!("Invalid {} value {:?}", key, value))
                })?;
                metadata.offset_width = OffsetWidth::try_from(bits)?
            }
            "author" => metadata.author = Some(value.to_string()),
            "email" => metadata.email = Some(value.to_string()),
            "website" => metadata.website = Some(value.to_string()),
            "description" => metadata.description = Some(value.to_string()),
            "date" => metadata.date = parse_date(value),
            "sametypesequence" => metadata.same_type_sequence = Some(value.parse::<TypeSequence>()?),
            "dicttype" => metadata.dict_type = Some(DictType::parse(value)),
            _ => trace!("Ignoring unknown .ifo key {:?}", key),
        }
    }

    debug!(
        "Parsed .ifo: bookname='{}', wordcount={}, synwordcount={}, idxfilesize={}, idxoffsetbits={}",
        metadata.title,
        metadata.word_count,
        metadata.synonym_count,
        metadata.index_file_size,
        metadata.offset_width.bits()
    );
    Ok(metadata)
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| {
        StardictError::InvalidFormat(format!("Invalid {} value {:?}: {}", key, value, e))
    })
}

/// Tries each accepted date format; an unparsable date is treated as absent.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok());
    if date.is_none() {
        warn!("Ignoring unparsable .ifo date {:?}", value);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stardict::types::content_type::ContentType;

    #[test]
    fn minimal_file_layout() {
        let metadata = DictionaryMetadata {
            title: "Test\ndict ".to_string(),
            word_count: 2,
            index_file_size: 26,
            ..Default::default()
        };
        let mut out = Vec::new();
        write(&mut out, &metadata).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "StarDict's dict ifo file\nversion=2.4.2\nbookname=Test dict\nwordcount=2\nidxfilesize=26\n"
        );
    }

    #[test]
    fn optional_keys_are_emitted_in_order() {
        let metadata = DictionaryMetadata {
            version: Some("3.0.0".to_string()),
            title: "cs-en".to_string(),
            word_count: 10,
            synonym_count: 3,
            index_file_size: 200,
            offset_width: OffsetWidth::Bits64,
            author: Some("Someone".to_string()),
            email: Some("".to_string()),
            website: Some("https://kaikki.org".to_string()),
            description: Some("Generated from\r\nWiktionary".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            same_type_sequence: Some(
                TypeSequence::new(vec![ContentType::Meaning, ContentType::Html]).unwrap(),
            ),
            dict_type: Some(DictType::WordNet),
        };
        let mut out = Vec::new();
        write(&mut out, &metadata).unwrap();
        let text = String::from_utf8(out).unwrap();
        let keys: Vec<&str> = text
            .lines()
            .skip(1)
            .filter_map(|l| l.split_once('=').map(|(k, _)| k))
            .collect();
        assert_eq!(
            keys,
            vec![
                "version",
                "bookname",
                "wordcount",
                "synwordcount",
                "idxfilesize",
                "idxoffsetbits",
                "description",
                "author",
                "website",
                "date",
                "sametypesequence",
                "dicttype"
            ]
        );
        assert!(text.contains("description=Generated from  Wiktionary\n"));
        assert!(text.contains("date=2024.03.05\n"));
        assert!(text.contains("sametypesequence=mh\n"));

        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.offset_width, OffsetWidth::Bits64);
        assert_eq!(parsed.synonym_count, 3);
        assert_eq!(parsed.email, None);
        assert_eq!(parsed.date, metadata.date);
        assert_eq!(parsed.same_type_sequence, metadata.same_type_sequence);
        assert_eq!(parsed.dict_type, Some(DictType::WordNet));
    }

    #[test]
    fn reader_defaults_and_tolerances() {
        let text = "StarDict's dict ifo file\r\nbookname=x\r\nfoo=bar\r\n\r\ndate=not a date\r\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.title, "x");
        assert_eq!(parsed.word_count, 0);
        assert_eq!(parsed.index_file_size, 0);
        assert_eq!(parsed.offset_width, OffsetWidth::Bits32);
        assert_eq!(parsed.date, None);
        assert_eq!(parsed.version, None);
    }

    #[test]
    fn both_date_formats_are_accepted() {
        assert_eq!(parse_date("20240305"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_date("2024.3.5"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_date("5/3/2024"), None);
    }

    #[test]
    fn bad_input_is_a_format_error() {
        assert!(parse("bookname=x\nwordcount=1\n").unwrap_err().is_format_error());
        assert!(parse("").unwrap_err().is_format_error());
        let bad_count = format!("{}\nwordcount=many\n", SIGNATURE);
        assert!(parse(&bad_count).unwrap_err().is_format_error());
        let bad_bits = format!("{}\nidxoffsetbits=48\n", SIGNATURE);
        assert!(parse(&bad_bits).unwrap_err().is_format_error());
        // 2^32 + 32 must not wrap around to 32.
        let wrapped_bits = format!("{}\nidxoffsetbits=4294967328\n", SIGNATURE);
        let err = parse(&wrapped_bits).unwrap_err();
        assert!(matches!(err, StardictError::InvalidFormat(_)));
        let bad_sequence = format!("{}\nsametypesequence=mQ\n", SIGNATURE);
        assert!(parse(&bad_sequence).unwrap_err().is_format_error());
    }
}
