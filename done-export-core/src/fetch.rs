//! Executes a [`ListQuery`] through a [`ListReader`] and normalises the result.
//!
//! Pages are pulled lazily via [`page_stream`] until the reader stops returning
//! a continuation token. Each raw item is projected onto the query's fields in
//! order; absent or null values become empty strings, UTC timestamps are
//! rewritten in canonical ISO-8601 form and every row is stamped with
//! [`EXPORTED_ON_FIELD`].

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, TryStreamExt};
use serde_json::Value;
use tracing::{debug, info};

use crate::contract::{ListPage, ListReader, RawItem, RemoteError};
use crate::query::ListQuery;
use crate::record::{RecordRow, EXPORTED_ON_FIELD};
use crate::timestamp::{canonicalize_utc_timestamp, to_iso_string};

/// Streams every page of `query`, following continuation tokens.
pub fn page_stream<'a, R>(
    reader: &'a R,
    query: &'a ListQuery,
) -> impl Stream<Item = Result<ListPage, RemoteError>> + 'a
where
    R: ListReader + ?Sized,
{
    // None: exhausted. Some(token): fetch the page for token.
    stream::try_unfold(Some(None), move |cursor: Option<Option<String>>| async move {
        let token = match cursor {
            Some(token) => token,
            None => return Ok::<_, RemoteError>(None),
        };
        let page = reader.read_page(query, token).await?;
        let next = page.next_page.clone().map(Some);
        Ok(Some((page, next)))
    })
}

/// Runs `query` to completion and returns one normalised row per item.
///
/// An empty result is a valid outcome and yields an empty vector.
pub async fn fetch_rows<R>(
    reader: &R,
    query: &ListQuery,
    exported_on: DateTime<Utc>,
) -> Result<Vec<RecordRow>, RemoteError>
where
    R: ListReader + ?Sized,
{
    let exported_on = to_iso_string(exported_on);
    let pages = page_stream(reader, query);
    futures::pin_mut!(pages);

    let mut rows = Vec::new();
    let mut page_count = 0usize;
    while let Some(page) = pages.try_next().await? {
        page_count += 1;
        debug!(page = page_count, items = page.rows.len(), "Fetched result page");
        rows.extend(
            page.rows
                .iter()
                .map(|item| project_row(item, &query.view_fields, &exported_on)),
        );
    }
    info!(list = %query.list_title, rows = rows.len(), pages = page_count, "Fetched matching items");
    Ok(rows)
}

/// Builds a row from `item` holding exactly `fields` plus the export stamp.
pub fn project_row(item: &RawItem, fields: &[String], exported_on: &str) -> RecordRow {
    let mut row = RecordRow::new();
    for field in fields {
        let value = item.get(field).map(normalize_value).unwrap_or_default();
        row.insert(field.as_str(), value);
    }
    row.insert(EXPORTED_ON_FIELD, exported_on);
    row
}

/// Renders one raw field value as export text.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => canonicalize_utc_timestamp(text).unwrap_or_else(|| text.clone()),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        // Multi-value lookups arrive as arrays; join them like a list column.
        Value::Array(items) => items.iter().map(normalize_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
