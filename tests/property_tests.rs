//! Property-based tests for the record decoder.
//!
//! These tests use proptest to generate arbitrary well-formed record streams
//! and verify the decoder consumes exactly what each record declares.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use aa01::aa01::{DataRecord, RecordDecoder};
use aa01::test_utils::RecordBuilder;
use aa01::{Aa01Error, BoundedView, MemoryReader, Result};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct FileCase {
    path: String,
    flags: u64,
    extra: Option<String>,
    payload: Vec<u8>,
}

fn file_case_strategy() -> impl Strategy<Value = FileCase> {
    (
        "[a-z]{1,8}(/[a-z0-9_.]{1,8}){0,3}",
        any::<u64>(),
        proptest::option::of("[ -~]{0,16}"),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(path, flags, extra, payload)| FileCase {
            path,
            flags,
            extra,
            payload,
        })
}

fn encode(case: &FileCase) -> Vec<u8> {
    let mut builder = RecordBuilder::new().char_field("TYP", 'F').text("PAT", &case.path);
    if let Some(extra) = &case.extra {
        builder = builder.text("XTR", extra);
    }
    builder
        .uint("FLG", case.flags)
        .size("DAT", case.payload.len() as u32)
        .payload(&case.payload)
        .build()
}

fn decoder(bytes: Vec<u8>) -> RecordDecoder<DataRecord> {
    RecordDecoder::new(BoundedView::whole(Arc::new(MemoryReader::new(bytes))))
}

proptest! {
    /// Each record consumes its declared length plus its payload, leaving the
    /// cursor at the next record's magic.
    #[test]
    fn prop_cursor_lands_on_next_record(cases in prop::collection::vec(file_case_strategy(), 0..8)) {
        let encoded: Vec<Vec<u8>> = cases.iter().map(encode).collect();
        let mut records = decoder(encoded.concat());

        let mut expected_offset = 0u64;
        for (case, bytes) in cases.iter().zip(&encoded) {
            let record = records.next().unwrap().unwrap();
            expected_offset += bytes.len() as u64;

            prop_assert_eq!(records.view().position(), expected_offset);
            prop_assert_eq!(record.path.as_deref(), Some(case.path.as_str()));
            prop_assert_eq!(record.flags, Some(case.flags));
            prop_assert_eq!(record.dat, Some(case.payload.len() as u64));
            prop_assert_eq!(record.payload.is_some(), !case.payload.is_empty());
        }
        prop_assert!(records.next().is_none());
    }

    /// Decoding the same bytes twice gives identical records.
    #[test]
    fn prop_decoding_is_deterministic(cases in prop::collection::vec(file_case_strategy(), 1..6)) {
        let bytes: Vec<u8> = cases.iter().flat_map(encode).collect();
        let source = Arc::new(MemoryReader::new(bytes));

        let first: Vec<DataRecord> =
            RecordDecoder::new(BoundedView::whole(source.clone())).collect::<Result<_>>().unwrap();
        let second: Vec<DataRecord> =
            RecordDecoder::new(BoundedView::whole(source)).collect::<Result<_>>().unwrap();
        prop_assert_eq!(first, second);
    }

    /// Type codes outside the table are always fatal.
    #[test]
    fn prop_unknown_type_codes_are_fatal(code in any::<u8>().prop_filter(
        "known code",
        |c| !b"1248ABPTS".contains(c),
    )) {
        let bytes = RecordBuilder::new()
            .raw_tag("FLG", char::from(code), &[0; 8])
            .build();

        match decoder(bytes).next() {
            Some(Err(Aa01Error::UnknownFieldType { offset, .. })) => prop_assert_eq!(offset, 6),
            other => prop_assert!(false, "expected UnknownFieldType, got {:?}", other),
        }
    }

    /// Arbitrary bytes never panic the decoder.
    #[test]
    fn prop_arbitrary_input_does_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut with_magic = b"AA01".to_vec();
        with_magic.extend_from_slice(&bytes);

        for result in decoder(with_magic) {
            let _ = result;
        }
    }
}
