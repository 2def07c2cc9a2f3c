//! Query-string construction for the record search pages.

use url::form_urlencoded::byte_serialize;

/// Ordered field name -> value pairs. Insertion order is kept and
/// empty values are dropped when serializing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pairs that survive serialization
    pub fn non_empty(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(_, v)| !v.is_empty())
    }

    /// `?k1=v1&k2=v2` over the non-empty pairs, or `""` if none remain.
    pub fn to_query_string(&self) -> String {
        let joined = self
            .non_empty()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        if joined.is_empty() {
            joined
        } else {
            format!("?{}", joined)
        }
    }

    /// Append the query string to a base path
    pub fn apply_to(&self, path: &str) -> String {
        format!("{}{}", path, self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn encode(raw: &str) -> String {
    byte_serialize(raw.as_bytes()).collect()
}

/// Inputs of the student search page, all as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentQuery {
    pub keyword: String,
    pub department: String,
    pub email: String,
    pub age: String,
    /// Page size
    pub size: String,
    /// 1-based page index
    pub index: String,
}

impl StudentQuery {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .with("keyword", self.keyword.as_str())
            .with("department", self.department.as_str())
            .with("email", self.email.as_str())
            .with("age", self.age.as_str())
            .with("size", self.size.as_str())
            .with("index", self.index.as_str())
    }
}
