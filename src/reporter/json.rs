use crate::reporter::Reporter;
use crate::types::RunSummary;

/// Machine-readable mode: emits the same document as `summary.json`.
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn report(&self, summary: &RunSummary) -> String {
        serde_json::to_string_pretty(summary)
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize summary: {}"}}"#, e))
    }
}
