use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a query result, keys in server order.
pub type Record = Map<String, Value>;

/// Paginated query result. Only `items` is required; the paging fields are
/// echoed back by the server when it has them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Number of pages implied by `total` and `size`, if both are known
    pub fn page_count(&self) -> Option<u64> {
        match (self.total, self.size) {
            (Some(total), Some(size)) if size > 0 => Some(total.div_ceil(size)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Record collections exposed through `/api/<kind>/query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Student,
    Score,
    Course,
    Department,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Student,
        RecordKind::Score,
        RecordKind::Course,
        RecordKind::Department,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Student => "student",
            RecordKind::Score => "score",
            RecordKind::Course => "course",
            RecordKind::Department => "department",
        }
    }

    /// Query endpoint under the given API prefix, e.g. `/api/student/query`
    pub fn query_path(&self, prefix: &str) -> String {
        format!("{}/{}/query", prefix.trim_end_matches('/'), self.as_str())
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown record kind '{}' (expected one of: student, score, course, department)",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_with_only_items() {
        let page: Page<Record> = serde_json::from_str(r#"{"items": [{"id": "1"}]}"#).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.index, None);
        assert_eq!(page.page_count(), None);
    }

    #[test]
    fn test_page_with_paging_fields() {
        let page: Page<Record> = serde_json::from_str(
            r#"{"index": 2, "size": 50, "total": 101, "items": []}"#,
        )
        .unwrap();
        assert_eq!(page.index, Some(2));
        assert_eq!(page.page_count(), Some(3));
        assert!(page.is_empty());
    }

    #[test]
    fn test_record_keeps_server_key_order() {
        let page: Page<Record> =
            serde_json::from_str(r#"{"items": [{"name": "a", "id": "1", "age": 20}]}"#).unwrap();
        let keys: Vec<&str> = page.items[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "id", "age"]);
    }

    #[test]
    fn test_record_kind() {
        assert_eq!(RecordKind::Score.query_path("/api"), "/api/score/query");
        assert_eq!(RecordKind::Course.query_path("/api/"), "/api/course/query");
        assert_eq!("Department".parse::<RecordKind>(), Ok(RecordKind::Department));
        assert!("professor".parse::<RecordKind>().is_err());
    }
}
