use serde::Serialize;
use serde_json::Value;

/// Lifecycle event names understood by the collector.
///
/// Handlers for generic wrapping pass whatever event name the host
/// configured (e.g. `PreToolUse`), so `eventType` is a plain string on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    SessionStart,
    SessionEnd,
    PreCompact,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::SessionStart => "SessionStart",
            LifecycleEvent::SessionEnd => "SessionEnd",
            LifecycleEvent::PreCompact => "PreCompact",
        }
    }

    pub fn hook_script(&self) -> &'static str {
        match self {
            LifecycleEvent::SessionStart => "session-start",
            LifecycleEvent::SessionEnd => "session-end",
            LifecycleEvent::PreCompact => "pre-compact",
        }
    }
}

/// One record per lifecycle occurrence, POSTed once and dropped.
///
/// Absent fields are omitted from the JSON body; the collector relies on
/// that.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookEvent {
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_matcher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_script: Option<String>,
}

impl HookEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        HookEvent {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    pub fn lifecycle(event: LifecycleEvent) -> Self {
        HookEvent {
            hook_script: Some(event.hook_script().to_string()),
            ..HookEvent::new(event.as_str())
        }
    }

    /// Event data from the raw hook input. JSON `null` counts as absent.
    pub fn with_event_data(mut self, data: Option<Value>) -> Self {
        self.event_data = data.filter(|v| !v.is_null());
        self
    }
}
