//! Request records handed in by the host and the descriptor scripts see.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sandbox::template::apply_variables;

/// One header row of a request record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRecord {
    pub key: String,
    pub value: String,
    /// Inactive rows are kept in the record but never sent.
    #[serde(default)]
    pub is_active: bool,
}

impl HeaderRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>, is_active: bool) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            is_active,
        }
    }
}

/// The request as stored by the host, before flattening.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderRecord>,
}

impl RequestRecord {
    /// Parse a record from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The request a script run represents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: String,
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
}

impl RequestDescriptor {
    /// Flatten a record.
    ///
    /// The method falls back to `default_method` when missing or empty. Only
    /// active headers are kept; a later active header replaces an earlier one
    /// with the same key.
    pub fn from_record(record: &RequestRecord, default_method: &str) -> Self {
        let method = record
            .method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(default_method)
            .to_string();

        let headers = record
            .headers
            .iter()
            .filter(|h| h.is_active)
            .map(|h| (h.key.clone(), h.value.clone()))
            .collect();

        Self {
            url: record.url.clone(),
            method,
            body: record.body.clone(),
            headers,
        }
    }

    /// Substitute `{{name}}` placeholders in url, body and headers.
    pub fn with_variables(&self, variables: &HashMap<String, String>) -> Self {
        Self {
            url: apply_variables(&self.url, variables),
            method: self.method.clone(),
            body: self.body.as_deref().map(|b| apply_variables(b, variables)),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (apply_variables(k, variables), apply_variables(v, variables)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_headers_dropped_and_method_defaults() {
        let record = RequestRecord {
            url: "http://localhost/api".to_string(),
            method: None,
            body: None,
            headers: vec![
                HeaderRecord::new("A", "1", true),
                HeaderRecord::new("B", "2", false),
            ],
        };

        let desc = RequestDescriptor::from_record(&record, "GET");
        assert_eq!(desc.method, "GET");
        assert_eq!(desc.headers.len(), 1);
        assert_eq!(desc.headers.get("A").map(String::as_str), Some("1"));
        assert!(!desc.headers.contains_key("B"));
    }

    #[test]
    fn test_duplicate_active_header_last_wins() {
        let record = RequestRecord {
            url: "u".to_string(),
            method: Some("POST".to_string()),
            body: Some("{}".to_string()),
            headers: vec![
                HeaderRecord::new("X", "first", true),
                HeaderRecord::new("X", "ignored", false),
                HeaderRecord::new("X", "second", true),
            ],
        };

        let desc = RequestDescriptor::from_record(&record, "GET");
        assert_eq!(desc.method, "POST");
        assert_eq!(desc.body.as_deref(), Some("{}"));
        assert_eq!(desc.headers["X"], "second");
    }

    #[test]
    fn test_empty_method_defaults() {
        let record = RequestRecord {
            url: "u".to_string(),
            method: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(RequestDescriptor::from_record(&record, "GET").method, "GET");
    }

    #[test]
    fn test_record_from_json() {
        let record = RequestRecord::from_json_str(
            r#"{"url":"http://h/x","headers":[{"key":"A","value":"1","isActive":true},{"key":"B","value":"2","isActive":false}]}"#,
        )
        .unwrap();
        assert_eq!(record.method, None);
        assert_eq!(record.headers.len(), 2);
        assert!(record.headers[0].is_active);
        assert!(!record.headers[1].is_active);
    }

    #[test]
    fn test_with_variables() {
        let mut desc = RequestDescriptor {
            url: "https://{{host}}/users".to_string(),
            method: "POST".to_string(),
            body: Some(r#"{"token":"{{token}}"}"#.to_string()),
            headers: HashMap::new(),
        };
        desc.headers
            .insert("Authorization".to_string(), "Bearer {{token}}".to_string());

        let vars: HashMap<String, String> = [("host", "example.com"), ("token", "t0k")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let rendered = desc.with_variables(&vars);
        assert_eq!(rendered.url, "https://example.com/users");
        assert_eq!(rendered.body.as_deref(), Some(r#"{"token":"t0k"}"#));
        assert_eq!(rendered.headers["Authorization"], "Bearer t0k");
    }
}
