//! done-export: command-line front end for the done-item CSV export.
//!
//! Binds [`done_export_core`] to SharePoint over REST ([`sharepoint`]) or to a
//! local directory ([`local_store`]), and reads the static YAML configuration
//! ([`load_config`]).

pub mod cli;
pub mod load_config;
pub mod local_store;
pub mod sharepoint;

pub use cli::{run, Cli, Commands};
