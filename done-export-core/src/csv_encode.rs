//! Encodes record rows as delimited text.
//!
//! The header is taken from the first row. All rows must carry the same field
//! sequence; a row that does not is rejected rather than reconciled. Fields are
//! quoted (with internal quotes doubled) only when they contain the delimiter,
//! a double quote or a line break. Lines are joined with `\n` and the document
//! has no trailing line break.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::record::RecordRow;

pub const DEFAULT_DELIMITER: char = ',';

#[derive(Debug, Error)]
pub enum CsvEncodeError {
    #[error("invalid delimiter {0:?}: expected a single ASCII character other than a quote or line break")]
    InvalidDelimiter(char),

    #[error("row {row} has fields {found:?} but the header is {expected:?}")]
    SchemaMismatch {
        row: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("encoded CSV is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn delimiter_byte(delimiter: char) -> Result<u8, CsvEncodeError> {
    match u8::try_from(delimiter) {
        Ok(byte) if byte.is_ascii() && !matches!(byte, b'"' | b'\r' | b'\n') => Ok(byte),
        _ => Err(CsvEncodeError::InvalidDelimiter(delimiter)),
    }
}

/// Encodes `rows` using `delimiter`. An empty slice encodes to an empty string.
pub fn encode(rows: &[RecordRow], delimiter: char) -> Result<String, CsvEncodeError> {
    let delimiter = delimiter_byte(delimiter)?;
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let header: Vec<&str> = first.keys().collect();

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&header)?;
    for (index, row) in rows.iter().enumerate() {
        if !row.keys().eq(header.iter().copied()) {
            return Err(CsvEncodeError::SchemaMismatch {
                row: index,
                expected: header.iter().map(|name| name.to_string()).collect(),
                found: row.keys().map(str::to_owned).collect(),
            });
        }
        writer.write_record(row.values())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    tracing::debug!(rows = rows.len(), bytes = text.len(), "Encoded CSV document");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RecordRow {
        pairs.iter().copied().collect()
    }

    #[test]
    fn empty_input_is_empty_document() {
        assert_eq!(encode(&[], ',').unwrap(), "");
    }

    #[test]
    fn header_then_rows_without_trailing_newline() {
        let rows = vec![
            row(&[("ID", "1"), ("Title", "First")]),
            row(&[("ID", "2"), ("Title", "Second")]),
        ];
        assert_eq!(encode(&rows, ',').unwrap(), "ID,Title\n1,First\n2,Second");
    }

    #[test]
    fn quotes_only_when_needed() {
        let rows = vec![row(&[
            ("plain", "abc"),
            ("comma", "a,b"),
            ("quote", "say \"hi\""),
            ("newline", "line1\nline2"),
            ("cr", "x\ry"),
            ("empty", ""),
        ])];
        let encoded = encode(&rows, ',').unwrap();
        let body = encoded.split_once('\n').map(|(_, body)| body).unwrap();
        assert_eq!(body, "abc,\"a,b\",\"say \"\"hi\"\"\",\"line1\nline2\",\"x\ry\",");
    }

    #[test]
    fn other_delimiters_change_what_needs_quoting() {
        let rows = vec![row(&[("a", "x,y"), ("b", "p;q")])];
        assert_eq!(encode(&rows, ';').unwrap(), "a;b\nx,y;\"p;q\"");
    }

    #[test]
    fn rejects_unusable_delimiters() {
        let rows = vec![row(&[("a", "1")])];
        for bad in ['"', '\n', '\r', 'é'] {
            assert!(matches!(
                encode(&rows, bad),
                Err(CsvEncodeError::InvalidDelimiter(c)) if c == bad
            ));
        }
    }

    #[test]
    fn rejects_heterogeneous_rows() {
        let rows = vec![
            row(&[("ID", "1"), ("Title", "a")]),
            row(&[("ID", "2"), ("Owner", "b")]),
        ];
        match encode(&rows, ',') {
            Err(CsvEncodeError::SchemaMismatch { row, found, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(found, vec!["ID", "Owner"]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }
}
