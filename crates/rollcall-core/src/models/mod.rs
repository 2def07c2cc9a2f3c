//! Data models for query results.
//!
//! - `Page`: Paginated result envelope shared by every query endpoint
//! - `Record`: Untyped flat row, rendered as-is into a grid
//! - `RecordKind`: Which collection a query targets
//! - `Student`: Typed student row

pub mod page;
pub mod student;

pub use page::{Page, Record, RecordKind};
pub use student::Student;
