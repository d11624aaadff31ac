//! Storage infrastructure: configuration and log files.
//!
//! The `config` sub-module reads the TOML file that sits next to the
//! executable, fills in defaults for anything missing, and writes a starter
//! file on first run.  `log_file` opens the append-only log beside it.

pub mod config;
pub mod log_file;
