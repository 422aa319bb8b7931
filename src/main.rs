use stardict_codec::stardict::format::{index, info, synonym};
use stardict_codec::{DictionaryPaths, DictionaryReader, OffsetWidth, Result, WordDefinition};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file.ifo|.idx|.syn|.dict|.dict.dz> [word]", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let result = match args.get(2) {
        Some(word) => lookup(path, word),
        None => dump(path),
    };

    if let Err(e) = result {
        eprintln!("ERROR: Failed to read {}", path.display());
        eprintln!("  {}", e);
        std::process::exit(1);
    }
}

fn dump(path: &Path) -> Result<()> {
    let name = path.to_string_lossy();
    if name.ends_with(".ifo") {
        let metadata = info::read(&mut BufReader::new(File::open(path)?))?;
        println!("Title: {}", metadata.title);
        println!("Version: {}", metadata.version_or_default());
        println!("Words: {}", metadata.word_count);
        println!("Synonyms: {}", metadata.synonym_count);
        println!("Index size: {} bytes", metadata.index_file_size);
        println!("Offset bits: {}", metadata.offset_width.bits());
        if let Some(sequence) = &metadata.same_type_sequence {
            println!("Type sequence: {}", sequence);
        }
        for (label, value) in [
            ("Author", &metadata.author),
            ("Email", &metadata.email),
            ("Website", &metadata.website),
            ("Description", &metadata.description),
        ] {
            if let Some(value) = value {
                println!("{}: {}", label, value);
            }
        }
        if let Some(date) = metadata.date {
            println!("Date: {}", date);
        }
    } else if name.ends_with(".idx") {
        let width = sibling_offset_width(path);
        for record in index::read(&mut BufReader::new(File::open(path)?), width)? {
            println!("{}", record);
        }
    } else if name.ends_with(".syn") {
        for record in synonym::read(&mut BufReader::new(File::open(path)?))? {
            println!("{}", record);
        }
    } else {
        let reader = DictionaryReader::open(DictionaryPaths::from_member(path))?;
        for word in reader.iter_definitions() {
            print_word(&word?);
        }
    }
    Ok(())
}

fn lookup(path: &Path, word: &str) -> Result<()> {
    let reader = DictionaryReader::open(DictionaryPaths::from_member(path))?;
    let found = reader.lookup(word)?;
    if found.is_empty() {
        println!("{}: not found", word);
    }
    for definition in &found {
        print_word(definition);
    }
    Ok(())
}

fn print_word(word: &WordDefinition) {
    println!("{}", word.word);
    for entry in &word.definitions {
        println!("  {}", entry);
    }
}

/// Offset width declared by the `.ifo` next to `idx_path`; 32 bits if absent.
fn sibling_offset_width(idx_path: &Path) -> OffsetWidth {
    let ifo_path = DictionaryPaths::from_member(idx_path).ifo();
    File::open(ifo_path)
        .ok()
        .and_then(|file| info::read(&mut BufReader::new(file)).ok())
        .map(|metadata| metadata.offset_width)
        .unwrap_or_default()
}
