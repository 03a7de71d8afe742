//! Translates an [`ExportConfig`] into a list query.
//!
//! The query selects items whose status equals the done value and whose
//! completion date lies at or before `now - older_than_days`, sorted by that
//! date ascending and projected onto the configured fields. Field names are
//! not checked here; the remote list rejects unknown fields when the query runs.

use chrono::{DateTime, TimeDelta, Utc};
use quick_xml::escape::escape;

use crate::config::ExportConfig;
use crate::timestamp::to_iso_string;

/// Page size requested from the remote list.
pub const DEFAULT_ROW_LIMIT: u32 = 1000;

/// Status equality combined with an upper bound on the completion date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneFilter {
    pub status_field: String,
    pub done_value: String,
    pub date_field: String,
    /// Inclusive upper bound for the date field.
    pub threshold: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

/// A filtered, sorted and projected query against one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub list_title: String,
    pub view_fields: Vec<String>,
    pub filter: DoneFilter,
    pub order_by: OrderBy,
    pub row_limit: u32,
}

/// Returns `now` minus `days` whole days, clamped to the earliest representable instant.
pub fn threshold_date(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Builds the export query for `config` as of `now`.
pub fn build_query(config: &ExportConfig, now: DateTime<Utc>) -> ListQuery {
    let threshold = threshold_date(now, config.older_than_days);
    tracing::debug!(
        list = %config.list_title,
        threshold = %to_iso_string(threshold),
        "Built export query"
    );
    ListQuery {
        list_title: config.list_title.clone(),
        view_fields: config.select_fields.clone(),
        filter: DoneFilter {
            status_field: config.status_field.clone(),
            done_value: config.done_value.clone(),
            date_field: config.done_date_field.clone(),
            threshold,
        },
        order_by: OrderBy {
            field: config.done_date_field.clone(),
            ascending: true,
        },
        row_limit: DEFAULT_ROW_LIMIT,
    }
}

impl ListQuery {
    /// Renders the query as a CAML `<View>` document.
    pub fn to_view_xml(&self) -> String {
        let view_fields: String = self
            .view_fields
            .iter()
            .map(|field| format!("<FieldRef Name='{}' />", escape(field.as_str())))
            .collect();
        let filter = &self.filter;
        format!(
            "<View>\
               <ViewFields>{view_fields}</ViewFields>\
               <Query>\
                 <Where><And>\
                   <Eq><FieldRef Name='{status}' /><Value Type='Text'>{done}</Value></Eq>\
                   <Leq><FieldRef Name='{date}' /><Value IncludeTimeValue='TRUE' Type='DateTime'>{threshold}</Value></Leq>\
                 </And></Where>\
                 <OrderBy><FieldRef Name='{order}' Ascending='{ascending}' /></OrderBy>\
               </Query>\
               <RowLimit Paged='TRUE'>{limit}</RowLimit>\
             </View>",
            status = escape(filter.status_field.as_str()),
            done = escape(filter.done_value.as_str()),
            date = escape(filter.date_field.as_str()),
            threshold = to_iso_string(filter.threshold),
            order = escape(self.order_by.field.as_str()),
            ascending = if self.order_by.ascending { "TRUE" } else { "FALSE" },
            limit = self.row_limit,
        )
    }
}
