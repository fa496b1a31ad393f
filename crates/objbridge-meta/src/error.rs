//! Errors raised while opening a metadata blob
//!
//! Lookups themselves never fail: absence is reported as `None` or an empty
//! collection. Only the loader boundary can reject a blob.

use thiserror::Error;

/// Metadata loading errors
#[derive(Debug, Error)]
pub enum MetaError {
    /// The blob ends before a table header or table body
    #[error("Metadata blob truncated in {section}: need {needed} bytes, have {len}")]
    Truncated {
        /// Section being read
        section: &'static str,
        /// Bytes required to hold the section
        needed: usize,
        /// Actual blob length
        len: usize,
    },

    /// A table count is negative
    #[error("Negative entry count {count} in {section}")]
    NegativeCount {
        /// Section being read
        section: &'static str,
        /// The stored count
        count: i32,
    },

    /// A system version string could not be parsed
    #[error("Invalid system version '{0}'")]
    InvalidVersion(String),

    /// The process-wide metadata file has already been installed
    #[error("A metadata file is already installed for this process")]
    AlreadyInstalled,
}
