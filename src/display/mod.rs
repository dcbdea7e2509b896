//! Terminal display utilities for CLI output.
//!
//! Provides styled tables for retrieval results and cluster reports, and the
//! theme used for every status line.

pub mod tables;
pub mod theme;

pub use tables::{TableBuilder, create_cluster_table, create_results_table};
pub use theme::{Status, THEME, Theme};
