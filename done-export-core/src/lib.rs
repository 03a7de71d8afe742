#![doc = "done-export-core: core pipeline for exporting completed list items to CSV."]

//! This crate contains the export pipeline and the capability contract it runs against.
//! Transport-specific clients (REST, local disk) live in the CLI crate.
//!
//! # Usage
//! Build an [`export::Exporter`] from an [`config::ExportConfig`], a
//! [`contract::ListReader`] and a [`contract::DocumentStore`], then call `run`.

pub mod config;
pub mod contract;
pub mod csv_encode;
pub mod error;
pub mod export;
pub mod fetch;
pub mod publish;
pub mod query;
pub mod record;
pub mod timestamp;
