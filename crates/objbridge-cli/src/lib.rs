//! metadump: inspection commands over an objbridge metadata blob
//!
//! Each command takes an opened [`objbridge_meta::MetaFile`] and writes a
//! report through [`output::StyledOutput`]; `main.rs` only parses arguments
//! and loads the file.

pub mod commands;
pub mod output;
