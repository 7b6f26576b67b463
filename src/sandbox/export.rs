//! The slot a script writes its result into.

use serde::Serialize;
use serde_json::Value;

/// Marker held by an export slot nobody has written to.
pub const DEFAULT_EXPORT: &str = "export:impossiblethis:tropxe";

/// Holds whatever a script exported.
///
/// Starts at [`DEFAULT_EXPORT`] so hosts can tell "never exported" apart
/// from an exported `null`, `false` or `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSlot {
    pub content: Value,
}

impl Default for ExportSlot {
    fn default() -> Self {
        Self {
            content: Value::String(DEFAULT_EXPORT.to_string()),
        }
    }
}

impl ExportSlot {
    /// Replace the content. Last write wins.
    pub fn set(&mut self, value: impl Into<Value>) {
        self.content = value.into();
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn is_exported(&self) -> bool {
        self.content.as_str() != Some(DEFAULT_EXPORT)
    }

    /// The exported value, or `None` while the slot still holds the marker.
    pub fn exported(&self) -> Option<&Value> {
        self.is_exported().then_some(&self.content)
    }

    pub fn into_exported(self) -> Option<Value> {
        if self.is_exported() {
            Some(self.content)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_starts_at_marker() {
        let slot = ExportSlot::default();
        assert_eq!(slot.content(), &json!("export:impossiblethis:tropxe"));
        assert!(!slot.is_exported());
        assert!(slot.exported().is_none());
    }

    #[test]
    fn test_falsy_values_count_as_exported() {
        for value in [json!(null), json!(false), json!(0), json!("")] {
            let mut slot = ExportSlot::default();
            slot.set(value.clone());
            assert_eq!(slot.exported(), Some(&value));
        }
    }

    #[test]
    fn test_last_write_wins() {
        let mut slot = ExportSlot::default();
        slot.set(1);
        slot.set(json!({"id": "001"}));
        assert_eq!(slot.into_exported(), Some(json!({"id": "001"})));
    }
}
