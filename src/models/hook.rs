use serde_json::Value;
use std::path::PathBuf;

/// What caused a context compaction, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompactTrigger {
    Manual,
    Auto,
    #[default]
    Unknown,
}

impl CompactTrigger {
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("manual") => CompactTrigger::Manual,
            Some("auto") => CompactTrigger::Auto,
            _ => CompactTrigger::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompactTrigger::Manual => "manual",
            CompactTrigger::Auto => "auto",
            CompactTrigger::Unknown => "unknown",
        }
    }
}

/// Host-supplied pointer to the session transcript. Never parsed locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptReference {
    pub path: PathBuf,
    pub trigger: CompactTrigger,
}

impl TranscriptReference {
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// JSON payload the host writes to a hook's stdin.
///
/// Fields are read one by one from the raw value so that a field of an
/// unexpected type only loses that field. `raw` is passed through untouched
/// as event data.
#[derive(Debug, Clone, Default)]
pub struct HookInput {
    pub raw: Option<Value>,
    pub session_id: Option<String>,
    pub transcript_path: Option<String>,
    pub trigger: Option<String>,
    pub stop_hook_active: bool,
    pub tool_name: Option<String>,
    pub tool_input: Option<Value>,
}

impl HookInput {
    /// Parse stdin bytes. Empty or invalid JSON yields an empty input.
    pub fn from_slice(bytes: &[u8]) -> Self {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Self::default();
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let get_str = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let stop_hook_active = match value.get("stop_hook_active") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1")
            }
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        };
        let tool_input = value
            .get("tool_input")
            .filter(|v| !v.is_null())
            .cloned();

        HookInput {
            session_id: get_str("session_id"),
            transcript_path: get_str("transcript_path"),
            trigger: get_str("trigger"),
            stop_hook_active,
            tool_name: get_str("tool_name"),
            tool_input,
            raw: Some(value),
        }
    }

    pub fn compact_trigger(&self) -> CompactTrigger {
        CompactTrigger::parse(self.trigger.as_deref())
    }

    pub fn transcript(&self) -> Option<TranscriptReference> {
        self.transcript_path.as_ref().map(|p| TranscriptReference {
            path: PathBuf::from(p),
            trigger: self.compact_trigger(),
        })
    }
}
