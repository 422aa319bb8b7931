//! Property tests: build-then-read round trips and parser robustness on arbitrary bytes.

use proptest::prelude::*;
use stardict_codec::stardict::format::{definition, index, info, synonym};
use stardict_codec::{
    BuildOptions, ContentType, DefinitionEntry, DefinitionMode, DictionaryBuilder,
    DictionaryPaths, DictionaryReader, OffsetWidth, TypeSequence, WordDefinition,
};

fn content_type() -> impl Strategy<Value = ContentType> {
    prop::sample::select(ContentType::all().collect::<Vec<_>>())
}

fn payload(content_type: ContentType) -> BoxedStrategy<Vec<u8>> {
    if content_type.is_string_like() {
        "[^\\x00]{0,24}".prop_map(String::into_bytes).boxed()
    } else {
        prop::collection::vec(any::<u8>(), 0..32).boxed()
    }
}

fn entry() -> impl Strategy<Value = DefinitionEntry> {
    content_type().prop_flat_map(|ct| payload(ct).prop_map(move |p| DefinitionEntry::new(ct, p)))
}

fn headword() -> impl Strategy<Value = String> {
    "[a-zA-Z\u{e9}\u{4e2d} '-]{1,12}"
}

fn width() -> impl Strategy<Value = OffsetWidth> {
    prop_oneof![Just(OffsetWidth::Bits32), Just(OffsetWidth::Bits64)]
}

fn build_and_read(
    options: BuildOptions,
    words: Vec<WordDefinition>,
) -> (Vec<WordDefinition>, DictionaryReader, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let paths = DictionaryPaths::new(tmp.path().join("prop"));
    DictionaryBuilder::new(paths.clone(), options)
        .build(words)
        .unwrap();
    let reader = DictionaryReader::open(paths).unwrap();
    let read = reader.iter_definitions().map(|r| r.unwrap()).collect();
    (read, reader, tmp)
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        cases: 48,
        .. ProptestConfig::default()
    })]

    #[test]
    fn self_describing_round_trip(
        words in prop::collection::btree_map(headword(), prop::collection::vec(entry(), 0..5), 0..16),
        width in width(),
    ) {
        // Reversed so the builder has to sort.
        let input: Vec<WordDefinition> = words
            .iter()
            .rev()
            .map(|(w, defs)| WordDefinition::new(w.clone(), defs.clone()))
            .collect();
        let (read, reader, _tmp) = build_and_read(BuildOptions::new("prop").offset_width(width), input);

        let expected: Vec<WordDefinition> = words
            .into_iter()
            .map(|(w, defs)| {
                let mut word = WordDefinition::new(w, defs);
                word.dedup_definitions();
                word
            })
            .collect();
        prop_assert_eq!(read, expected);

        let index = reader.index();
        prop_assert!(index.windows(2).all(|p| p[0].word.as_bytes() < p[1].word.as_bytes()));
        let total: u64 = index.iter().map(|r| r.size as u64).sum();
        prop_assert_eq!(total, reader.definitions_len());
    }

    #[test]
    fn uniform_round_trip(
        (types, words) in prop::collection::vec(content_type(), 1..4).prop_flat_map(|types| {
            let entries: Vec<BoxedStrategy<DefinitionEntry>> = types
                .iter()
                .map(|&ct| payload(ct).prop_map(move |p| DefinitionEntry::new(ct, p)).boxed())
                .collect();
            (Just(types), prop::collection::btree_map(headword(), entries, 0..12))
        }),
    ) {
        let sequence = TypeSequence::new(types).unwrap();
        let input: Vec<WordDefinition> = words
            .into_iter()
            .map(|(w, defs)| WordDefinition::new(w, defs))
            .collect();
        let (read, reader, _tmp) = build_and_read(
            BuildOptions::new("prop").same_type_sequence(sequence.clone()),
            input.clone(),
        );
        prop_assert_eq!(reader.metadata().same_type_sequence.as_ref(), Some(&sequence));
        prop_assert_eq!(read, input);
    }

    #[test]
    fn synonyms_resolve_to_their_targets(
        words in prop::collection::btree_set(headword(), 1..12),
        picks in prop::collection::btree_map(headword(), any::<prop::sample::Index>(), 0..12),
    ) {
        let words: Vec<String> = words.into_iter().collect();
        let tmp = tempfile::tempdir().unwrap();
        let paths = DictionaryPaths::new(tmp.path().join("syn"));
        let mut builder = DictionaryBuilder::new(paths.clone(), BuildOptions::new("syn"));
        builder.begin().unwrap();
        for w in words.iter().rev() {
            builder
                .add_word(WordDefinition::new(w.clone(), vec![DefinitionEntry::new(ContentType::Meaning, w.as_str())]))
                .unwrap();
        }
        for (alt, target) in &picks {
            builder.add_synonym(alt.clone(), target.get(&words).clone()).unwrap();
            // Repeating an identical pair is harmless.
            builder.add_synonym(alt.clone(), target.get(&words).clone()).unwrap();
        }
        builder.sort().unwrap();
        builder.finalize().unwrap();

        let reader = DictionaryReader::open(paths).unwrap();
        let synonyms = reader.synonyms();
        prop_assert_eq!(synonyms.len(), picks.len());
        prop_assert!(synonyms.windows(2).all(|p| p[0].alt_word < p[1].alt_word));
        for (alt, target) in &picks {
            let ordinals = reader.find_synonym_targets(alt);
            let hit = ordinals.iter().any(|&i| reader.index()[i].word == *target.get(&words));
            prop_assert!(hit, "{:?} should reach {:?}", alt, target.get(&words));
        }
    }

    #[test]
    fn parsers_never_panic_on_arbitrary_bytes(
        data in prop::collection::vec(any::<u8>(), 0..256),
        width in width(),
        types in prop::collection::vec(content_type(), 1..4),
    ) {
        let _ = index::parse(&data, width);
        let _ = synonym::parse(&data);
        let _ = definition::decode_block(&data, &DefinitionMode::SelfDescribing);
        let uniform = DefinitionMode::Uniform(TypeSequence::new(types).unwrap());
        let _ = definition::decode_block(&data, &uniform);
        let _ = info::parse(&String::from_utf8_lossy(&data));
    }

    #[test]
    fn truncated_index_is_a_format_error(
        words in prop::collection::btree_set(headword(), 1..8),
        width in width(),
        cut in any::<prop::sample::Index>(),
    ) {
        let records: Vec<_> = words
            .into_iter()
            .enumerate()
            .map(|(i, word)| stardict_codec::IndexRecord { word, offset: i as u64 * 7, size: 7 })
            .collect();
        let mut data = Vec::new();
        index::write(&mut data, &records, width).unwrap();
        let len = cut.index(data.len());
        let parsed = index::parse(&data[..len], width);
        if is_record_boundary(&records, width, len) {
            prop_assert!(parsed.is_ok());
        } else {
            prop_assert!(parsed.unwrap_err().is_format_error());
        }
    }
}

fn is_record_boundary(records: &[stardict_codec::IndexRecord], width: OffsetWidth, at: usize) -> bool {
    let mut pos = 0usize;
    for record in records {
        if pos == at {
            return true;
        }
        pos += index::encoded_len(record, width) as usize;
    }
    pos == at
}
