//! Input/Output handling for the CLI.
//!
//! This module provides:
//! - Corpus loading from text files
//! - Consistent exit codes

pub mod corpus;
pub mod exit_code;

pub use corpus::read_corpus;
pub use exit_code::ExitCode;
