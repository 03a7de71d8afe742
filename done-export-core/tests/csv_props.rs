//! Property tests for CSV encoding and timestamp normalisation.

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use done_export_core::csv_encode::encode;
use done_export_core::fetch::normalize_value;
use done_export_core::record::RecordRow;
use done_export_core::timestamp::to_iso_string;

fn field_name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,10}"
}

/// Values biased towards the characters that force quoting.
fn field_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,12}",
        "[a-z]{0,4}[,\"\r\n;][a-z]{0,4}",
        "[a-z ,\"\r\n]{0,16}",
        "\\PC{0,12}",
        Just(String::new()),
    ]
}

fn table_strategy() -> impl Strategy<Value = (Vec<String>, Vec<Vec<String>>)> {
    (1usize..6).prop_flat_map(|columns| {
        (
            prop::collection::btree_set(field_name_strategy(), columns)
                .prop_map(|names| names.into_iter().collect::<Vec<_>>()),
            prop::collection::vec(prop::collection::vec(field_value_strategy(), columns), 1..8),
        )
    })
}

fn rows_from(header: &[String], values: &[Vec<String>]) -> Vec<RecordRow> {
    values
        .iter()
        .map(|row| header.iter().cloned().zip(row.iter().cloned()).collect())
        .collect()
}

proptest! {
    #[test]
    fn encoded_documents_decode_to_the_same_table((header, values) in table_strategy()) {
        let rows = rows_from(&header, &values);
        let encoded = encode(&rows, ',').unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(encoded.as_bytes());
        let decoded_header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_owned)
            .collect();
        prop_assert_eq!(&decoded_header, &header);

        let decoded: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.unwrap().iter().map(str::to_owned).collect())
            .collect();
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn header_line_is_first_row_keys((header, values) in table_strategy()) {
        let rows = rows_from(&header, &values);
        let encoded = encode(&rows, ',').unwrap();
        let first_line = encoded.split('\n').next().unwrap();
        prop_assert_eq!(first_line, header.join(","));
    }

    #[test]
    fn timestamp_normalisation_is_idempotent(
        secs in 0i64..4_102_444_800,
        nanos in 0u32..1_000_000_000,
        format in prop::sample::select(vec![
            "%Y-%m-%dT%H:%M:%SZ",
            "%Y-%m-%dT%H:%M:%S%.3fZ",
            "%Y-%m-%dT%H:%M:%S%.6fZ",
            "%Y-%m-%dT%H:%MZ",
        ]),
    ) {
        let instant: DateTime<Utc> = DateTime::from_timestamp(secs, nanos).unwrap();
        let raw = serde_json::Value::String(instant.format(format).to_string());

        let once = normalize_value(&raw);
        let twice = normalize_value(&serde_json::Value::String(once.clone()));
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.ends_with('Z'));
        prop_assert_eq!(once.len(), to_iso_string(instant).len());
    }
}
