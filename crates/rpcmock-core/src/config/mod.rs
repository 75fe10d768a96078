//! Configuration: router options and descriptor files (YAML/JSON/JSONC).

pub mod error;
pub mod options;
pub mod parser;
