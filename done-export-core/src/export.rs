//! High-level pipeline: orchestrates query → fetch → encode → publish for one export run.
//!
//! [`Exporter`] is the trigger behind the "export now" action. It owns the
//! configuration, the injected capabilities, the busy flag and the run log.
//!
//! # Responsibilities
//! - Runs each stage exactly once per trigger, in order, fail-fast
//! - Allows at most one run in flight; a trigger while busy is ignored
//! - Clears the run log at the start of a run and appends progress lines
//! - Converts any fault into a single `Error: …` log line and a
//!   [`ExportOutcome::Failed`] outcome; nothing is retried
//!
//! # Terminal states
//! - [`ExportOutcome::Completed`]: the file was written
//! - [`ExportOutcome::NoRows`]: nothing matched, no upload was attempted
//! - [`ExportOutcome::Failed`]: a stage failed, the message is in the log
//!
//! [`prepare`] exposes the fetch and encode stages without uploading, for dry runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::ExportConfig;
use crate::contract::{Clock, DocumentStore, ListReader, PublishedFile, SystemClock};
use crate::csv_encode::{encode, DEFAULT_DELIMITER};
use crate::error::ExportError;
use crate::fetch::fetch_rows;
use crate::publish::{export_file_name, publish};
use crate::query::build_query;
use crate::record::RecordRow;

/// How a trigger ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed { rows: usize, file: PublishedFile },
    NoRows,
    Failed { message: String },
    /// Another run was in flight; this trigger did nothing.
    AlreadyRunning,
}

/// Rows and encoded document of a run that has not been uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExport {
    pub rows: Vec<RecordRow>,
    pub csv: String,
    pub file_name: String,
}

/// Append-only list of user-facing status lines for the current run.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Mutex<Vec<String>>,
}

impl RunLog {
    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, line: impl Into<String>) {
        let line = line.into();
        info!(line = %line, "Run log");
        self.guard().push(line);
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    /// Snapshot of the lines so far.
    pub fn lines(&self) -> Vec<String> {
        self.guard().clone()
    }
}

/// Releases the busy flag when the run ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fetches and encodes without uploading.
pub async fn prepare<R>(
    config: &ExportConfig,
    reader: &R,
    now: DateTime<Utc>,
) -> Result<PreparedExport, ExportError>
where
    R: ListReader + ?Sized,
{
    let rows = fetch_stage(config, reader, now).await?;
    let csv = encode(&rows, DEFAULT_DELIMITER)?;
    Ok(PreparedExport {
        rows,
        csv,
        file_name: export_file_name(config.file_prefix.as_deref(), now.date_naive()),
    })
}

async fn fetch_stage<R>(
    config: &ExportConfig,
    reader: &R,
    now: DateTime<Utc>,
) -> Result<Vec<RecordRow>, ExportError>
where
    R: ListReader + ?Sized,
{
    let query = build_query(config, now);
    fetch_rows(reader, &query, now)
        .await
        .map_err(|source| ExportError::Fetch {
            list: config.list_title.clone(),
            source,
        })
}

pub struct Exporter<R, S, C = SystemClock> {
    config: ExportConfig,
    reader: R,
    store: S,
    clock: C,
    busy: AtomicBool,
    log: RunLog,
}

impl<R, S> Exporter<R, S, SystemClock>
where
    R: ListReader,
    S: DocumentStore,
{
    pub fn new(config: ExportConfig, reader: R, store: S) -> Self {
        Self::with_clock(config, reader, store, SystemClock)
    }
}

impl<R, S, C> Exporter<R, S, C>
where
    R: ListReader,
    S: DocumentStore,
    C: Clock,
{
    pub fn with_clock(config: ExportConfig, reader: R, store: S, clock: C) -> Self {
        config.trace_loaded();
        Self {
            config,
            reader,
            store,
            clock,
            busy: AtomicBool::new(false),
            log: RunLog::default(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// True while a run is in flight; the trigger is disabled meanwhile.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Lines logged by the most recent run.
    pub fn log(&self) -> Vec<String> {
        self.log.lines()
    }

    /// Runs the export once. Faults never escape; they end the run as [`ExportOutcome::Failed`].
    pub async fn run(&self) -> ExportOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(list = %self.config.list_title, "Export already running, trigger ignored");
            return ExportOutcome::AlreadyRunning;
        }
        let _busy = BusyGuard(&self.busy);
        self.log.clear();

        let now = self.clock.now();
        info!(list = %self.config.list_title, %now, "[EXPORT] Starting export run");
        match self.execute(now).await {
            Ok(outcome) => {
                info!(?outcome, "[EXPORT] Run finished");
                outcome
            }
            Err(e) => {
                error!(error = ?e, "[EXPORT][ERROR] Run failed");
                let message = e.to_string();
                self.log.append(format!("Error: {message}"));
                ExportOutcome::Failed { message }
            }
        }
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<ExportOutcome, ExportError> {
        let config = &self.config;

        self.log.append(format!("Reading from list: {} …", config.list_title));
        let rows = fetch_stage(config, &self.reader, now).await?;
        self.log.append(format!("Items found: {}", rows.len()));
        if rows.is_empty() {
            self.log.append("Nothing to export.");
            return Ok(ExportOutcome::NoRows);
        }

        let csv = encode(&rows, DEFAULT_DELIMITER)?;
        let file_name = export_file_name(config.file_prefix.as_deref(), now.date_naive());

        self.log.append(format!(
            "Writing file to: {}/{}",
            config.target_folder.trim_end_matches('/'),
            file_name
        ));
        let file = publish(&self.store, &config.target_folder, &file_name, &csv)
            .await
            .map_err(|source| ExportError::Publish {
                file: file_name.clone(),
                source,
            })?;

        self.log.append("Export completed");
        Ok(ExportOutcome::Completed {
            rows: rows.len(),
            file,
        })
    }
}
