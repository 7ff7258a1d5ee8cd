//! # Lifecycle Dispatcher
//!
//! One handler per hook. Handlers never return errors: every failure is
//! logged to stderr and the handler still yields its exit code, which is 0
//! for all lifecycle hooks and the wrapped command's code for `log-event`.

use serde_json::{Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::Config;
use crate::context;
use crate::models::{HookEvent, HookInput, LifecycleEvent};
use crate::reporter::{ExtractSource, RemoteReporter, Transport, UreqTransport};
use crate::wrapper;

pub const LOG_EVENT_SCRIPT: &str = "log-event";

/// How the Stop hook hands off memory extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// Re-run this executable as `extract` in its own process group and
    /// don't wait for it
    Detached(PathBuf),
    /// Run the extraction in this process
    Inline,
}

/// What the Stop hook decided to do with its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopDecision {
    /// `stop_hook_active` was set: this stop is itself a hook continuation
    LoopGuard,
    NoTranscript,
    Extract(PathBuf),
}

pub fn decide_stop(input: &HookInput) -> StopDecision {
    if input.stop_hook_active {
        return StopDecision::LoopGuard;
    }
    match input.transcript() {
        Some(t) if t.exists() => StopDecision::Extract(t.path),
        _ => StopDecision::NoTranscript,
    }
}

/// `cognova-hook extract ...` invocation used for detached extraction.
///
/// The token travels through the environment rather than argv.
pub fn detached_extract_command(
    exe: &Path,
    config: &Config,
    transcript: &Path,
    session_id: Option<&str>,
) -> Command {
    let mut cmd = Command::new(exe);
    cmd.arg("extract")
        .arg("--transcript-path")
        .arg(transcript)
        .arg("--api-url")
        .arg(&config.credentials.api_base);
    if let Some(session) = session_id {
        cmd.arg("--session-id").arg(session);
    }
    if let Some(project) = &config.project_dir {
        cmd.arg("--project-dir").arg(project);
    }
    if config.credentials.has_token() {
        cmd.env("COGNOVA_API_TOKEN", &config.credentials.api_token);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    cmd
}

pub struct Dispatcher<'a, T = UreqTransport> {
    reporter: RemoteReporter<'a, T>,
    launch: Launch,
}

impl<'a> Dispatcher<'a, UreqTransport> {
    pub fn new(config: &'a Config) -> Self {
        let launch = config
            .current_exe
            .clone()
            .map(Launch::Detached)
            .unwrap_or(Launch::Inline);
        Dispatcher {
            reporter: RemoteReporter::new(config),
            launch,
        }
    }
}

impl<'a, T: Transport> Dispatcher<'a, T> {
    pub fn with_reporter(reporter: RemoteReporter<'a, T>, launch: Launch) -> Self {
        Dispatcher { reporter, launch }
    }

    fn config(&self) -> &'a Config {
        self.reporter.config()
    }

    fn session_id(&self, input: &HookInput) -> Option<String> {
        input
            .session_id
            .clone()
            .or_else(|| self.config().session_id.clone())
    }

    fn event(&self, event: HookEvent, input: &HookInput) -> HookEvent {
        HookEvent {
            project_dir: self.config().project_dir.clone(),
            session_id: self.session_id(input),
            ..event
        }
    }

    fn report(&self, event: &HookEvent) -> bool {
        match self.reporter.report_event(event) {
            Ok(()) => {
                tracing::debug!(event_type = %event.event_type, "event logged");
                true
            }
            Err(e) => {
                tracing::debug!(event_type = %event.event_type, error = %e, "event not logged");
                false
            }
        }
    }

    pub fn session_start(&self, input: &HookInput, out: &mut dyn Write) -> i32 {
        let event = HookEvent::lifecycle(LifecycleEvent::SessionStart)
            .with_event_data(input.raw.clone());
        self.report(&self.event(event, input));

        let bridge = self.reporter.get_bridge_context().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "bridge context unavailable");
            None
        });
        let memory = self
            .reporter
            .get_memory_context(None, self.config().memory_limit)
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "memory context unavailable");
                None
            });

        // The profile file is only consulted when no memories came back
        let onboarded =
            memory.is_none() && context::is_onboarded(&self.config().profile_candidates());
        let notice = context::select_notice(memory.is_some(), onboarded);
        tracing::debug!(?notice, "session start notice");

        let written = context::write_bridge_context(out, bridge.as_deref())
            .and_then(|_| context::write_notice(out, notice, memory.as_ref()))
            .and_then(|_| out.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "could not write session context");
        }
        0
    }

    pub fn session_end(&self, input: &HookInput) -> i32 {
        let event =
            HookEvent::lifecycle(LifecycleEvent::SessionEnd).with_event_data(input.raw.clone());
        self.report(&self.event(event, input));
        0
    }

    /// Compaction must never be held up, so this always returns 0
    pub fn pre_compact(&self, input: &HookInput) -> i32 {
        let trigger = input.compact_trigger();
        let event = HookEvent::lifecycle(LifecycleEvent::PreCompact)
            .with_event_data(Some(json!({ "trigger": trigger.as_str() })));
        self.report(&self.event(event, input));

        match input.transcript() {
            Some(t) if t.exists() => {
                let path = t.path.to_string_lossy();
                let session = self.session_id(input);
                match self.reporter.extract_memories(
                    Some(ExtractSource::Path(&path)),
                    session.as_deref(),
                    None,
                ) {
                    Ok(()) => tracing::info!(
                        "[pre-compact] Extracted memories before {} compaction",
                        t.trigger.as_str()
                    ),
                    Err(e) => {
                        tracing::info!(error = %e, "[pre-compact] memory extraction did not run")
                    }
                }
            }
            _ => tracing::info!(
                "[pre-compact] No transcript path available: {:?}",
                input.transcript_path
            ),
        }
        0
    }

    pub fn stop(&self, input: &HookInput) -> i32 {
        let path = match decide_stop(input) {
            StopDecision::LoopGuard => {
                tracing::debug!("[stop] stop_hook_active set; skipping");
                return 0;
            }
            StopDecision::NoTranscript => {
                tracing::debug!("[stop] no transcript to extract from");
                return 0;
            }
            StopDecision::Extract(path) => path,
        };
        let session = self.session_id(input);

        match &self.launch {
            Launch::Detached(exe) => {
                match detached_extract_command(exe, self.config(), &path, session.as_deref())
                    .spawn()
                {
                    Ok(child) => {
                        tracing::debug!(pid = child.id(), "[stop] memory extraction launched")
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "[stop] could not launch memory extraction")
                    }
                }
            }
            Launch::Inline => {
                let path = path.to_string_lossy();
                match self.reporter.extract_memories(
                    Some(ExtractSource::Path(&path)),
                    session.as_deref(),
                    None,
                ) {
                    Ok(()) => tracing::debug!("[stop] memory extraction completed"),
                    Err(e) => tracing::debug!(error = %e, "[stop] memory extraction failed"),
                }
            }
        }
        0
    }

    /// Generic wrapper: run `command` with the raw hook input, report the
    /// outcome, relay the command's output and return its exit code.
    pub fn log_event(
        &self,
        event_type: &str,
        matcher: Option<&str>,
        command: &[String],
        raw_input: &[u8],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> i32 {
        let input = HookInput::from_slice(raw_input);
        let outcome = wrapper::run(command, raw_input);

        let has_tool_input = input.tool_input.as_ref().is_some_and(non_empty_value);
        let event_data = if has_tool_input || !command.is_empty() {
            Some(json!({
                "tool_input": input.tool_input.clone().unwrap_or_else(|| json!({})),
                "wrapped_command": if command.is_empty() { Value::Null } else { json!(command) },
            }))
        } else {
            None
        };

        let event = HookEvent {
            tool_name: input.tool_name.clone(),
            tool_matcher: matcher.map(str::to_string),
            event_data,
            exit_code: Some(outcome.exit_code),
            blocked: outcome.blocked,
            block_reason: outcome.block_reason.clone(),
            duration_ms: Some(outcome.duration_ms),
            hook_script: Some(LOG_EVENT_SCRIPT.to_string()),
            ..HookEvent::new(event_type)
        };
        self.report(&self.event(event, &input));

        let relayed = out
            .write_all(&outcome.stdout)
            .and_then(|_| out.flush())
            .and_then(|_| err.write_all(&outcome.stderr))
            .and_then(|_| err.flush());
        if let Err(e) = relayed {
            tracing::warn!(error = %e, "could not relay wrapped hook output");
        }

        if outcome.blocked {
            tracing::debug!(reason = ?outcome.block_reason, "wrapped hook blocked the action");
        }
        outcome.exit_code
    }

    /// Manual / detached extraction. Without a path, `stdin_text` is the transcript.
    pub fn extract(&self, transcript_path: Option<&str>, stdin_text: &[u8]) -> i32 {
        let text;
        let source = match transcript_path {
            Some(p) => Some(ExtractSource::Path(p)),
            None => {
                text = String::from_utf8_lossy(stdin_text).into_owned();
                Some(ExtractSource::Text(&text))
            }
        };
        let session = self.config().session_id.clone();
        match self
            .reporter
            .extract_memories(source, session.as_deref(), None)
        {
            Ok(()) => tracing::info!("memory extraction completed"),
            Err(e) => tracing::warn!(error = %e, "memory extraction failed"),
        }
        0
    }
}

/// Null and empty containers or strings count as no tool input
fn non_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
