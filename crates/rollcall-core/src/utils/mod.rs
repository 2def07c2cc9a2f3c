//! Utility functions for formatting query results and session details.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{cell_text, format_remaining, format_timestamp, pad, truncate_string, Table};
