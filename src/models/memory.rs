use serde::{Deserialize, Serialize};

/// Pre-formatted memory block returned by the collector, printed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryContext(pub String);

impl MemoryContext {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Body of `POST /api/memory/extract`. Exactly one transcript field is set.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

/// `{ "data": ... }` envelope used by every collector response
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

/// Only `formatted` is read; sibling fields such as `memories` are ignored
/// whatever their shape.
#[derive(Deserialize, Debug, Default)]
pub struct FormattedData {
    #[serde(default)]
    pub formatted: Option<String>,
}

impl Envelope<FormattedData> {
    /// `data.formatted`, with an empty string treated as absent
    pub fn formatted(self) -> Option<String> {
        self.data
            .and_then(|d| d.formatted)
            .filter(|s| !s.trim().is_empty())
    }
}
