//! # Command Wrapper
//!
//! Runs a wrapped hook command with the hook input on its stdin and
//! classifies how it ended.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;

/// Exit code with which a hook tells the host to block the requested action.
/// Fixed by the host's hook protocol.
pub const BLOCK_EXIT_CODE: i32 = 2;

/// Exit code reported when the wrapped command could not be run at all
pub const LOCAL_FAILURE_EXIT_CODE: i32 = 1;

const FALLBACK_BLOCK_REASON: &str = "blocked by wrapped hook (exit code 2)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapOutcome {
    pub exit_code: i32,
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub duration_ms: u64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// The command never ran to completion because of a fault on our side
    /// (spawn or wait failed). `exit_code` is synthesized.
    pub local_failure: bool,
}

impl WrapOutcome {
    fn local_failure(reason: String, duration_ms: u64) -> Self {
        WrapOutcome {
            exit_code: LOCAL_FAILURE_EXIT_CODE,
            blocked: false,
            block_reason: Some(reason),
            duration_ms,
            local_failure: true,
            ..Default::default()
        }
    }
}

/// Run `command` with `stdin_payload` on its stdin. An empty command is a no-op.
pub fn run(command: &[String], stdin_payload: &[u8]) -> WrapOutcome {
    let Some((program, args)) = command.split_first() else {
        return WrapOutcome::default();
    };

    let start = Instant::now();
    let elapsed_ms = |start: Instant| start.elapsed().as_millis() as u64;

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::error!(
                command = ?command,
                error = %e,
                "local failure: could not start wrapped hook"
            );
            return WrapOutcome::local_failure(
                format!("failed to start {}: {}", program, e),
                elapsed_ms(start),
            );
        }
    };

    // Feed stdin from a separate thread so a child that writes a lot before
    // reading its input cannot deadlock against us.
    let writer = child.stdin.take().map(|mut stdin| {
        let payload = stdin_payload.to_vec();
        thread::spawn(move || {
            // A child that exits without reading its input closes the pipe
            let _ = stdin.write_all(&payload);
        })
    });

    let output = child.wait_with_output();
    let duration_ms = elapsed_ms(start);
    if let Some(handle) = writer {
        let _ = handle.join();
    }

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(
                command = ?command,
                error = %e,
                "local failure: lost track of wrapped hook"
            );
            return WrapOutcome::local_failure(
                format!("failed to wait for {}: {}", program, e),
                duration_ms,
            );
        }
    };

    let (exit_code, blocked, block_reason) = match output.status.code() {
        Some(BLOCK_EXIT_CODE) => (
            BLOCK_EXIT_CODE,
            true,
            Some(block_reason(&output.stdout, &output.stderr)),
        ),
        Some(code) => (code, false, None),
        None => (
            LOCAL_FAILURE_EXIT_CODE,
            false,
            Some("terminated by signal".to_string()),
        ),
    };

    WrapOutcome {
        exit_code,
        blocked,
        block_reason,
        duration_ms,
        stdout: output.stdout,
        stderr: output.stderr,
        local_failure: false,
    }
}

/// Reason for a block: JSON `reason` on stdout, else stdout text, else stderr text
pub fn block_reason(stdout: &[u8], stderr: &[u8]) -> String {
    let out = String::from_utf8_lossy(stdout);
    let out = out.trim();

    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(out) {
        match obj.get("reason") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }
    if !out.is_empty() {
        return out.to_string();
    }

    let err = String::from_utf8_lossy(stderr);
    let err = err.trim();
    if !err.is_empty() {
        return err.to_string();
    }
    FALLBACK_BLOCK_REASON.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[test]
    fn empty_command_is_a_noop() {
        let outcome = run(&[], b"{}");
        assert_eq!(outcome.exit_code, 0);
        assert!(!outcome.blocked);
        assert!(outcome.block_reason.is_none());
        assert_eq!(outcome.duration_ms, 0);
    }

    #[test]
    fn block_reason_priority() {
        assert_eq!(block_reason(br#"{"reason":"policy violation"}"#, b""), "policy violation");
        assert_eq!(block_reason(br#"{"reason":{"code":7}}"#, b""), r#"{"code":7}"#);
        assert_eq!(block_reason(br#"{"decision":"block"}"#, b"err"), r#"{"decision":"block"}"#);
        assert_eq!(block_reason(b"nope\n", b""), "nope");
        assert_eq!(block_reason(b"\"quoted\"", b""), "\"quoted\"");
        assert_eq!(block_reason(b"", b" denied by policy \n"), "denied by policy");
        assert_eq!(block_reason(b"", b""), FALLBACK_BLOCK_REASON);
    }

    #[cfg(unix)]
    #[test]
    fn exit_two_with_json_reason_is_blocked() {
        let outcome = run(&sh(r#"echo '{"reason":"policy violation"}'; exit 2"#), b"");
        assert_eq!(outcome.exit_code, 2);
        assert!(outcome.blocked);
        assert_eq!(outcome.block_reason.as_deref(), Some("policy violation"));
        assert!(!outcome.local_failure);
    }

    #[cfg(unix)]
    #[test]
    fn exit_two_with_plain_stdout_uses_text() {
        let outcome = run(&sh("printf nope; exit 2"), b"");
        assert!(outcome.blocked);
        assert_eq!(outcome.block_reason.as_deref(), Some("nope"));
    }

    #[cfg(unix)]
    #[test]
    fn other_exit_codes_pass_through() {
        let outcome = run(&sh("echo fine; echo warn >&2; exit 3"), b"");
        assert_eq!(outcome.exit_code, 3);
        assert!(!outcome.blocked);
        assert!(outcome.block_reason.is_none());
        assert_eq!(outcome.stdout, b"fine\n");
        assert_eq!(outcome.stderr, b"warn\n");
    }

    #[cfg(unix)]
    #[test]
    fn stdin_payload_reaches_the_command() {
        let outcome = run(&sh("cat"), br#"{"tool_name":"Bash"}"#);
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, br#"{"tool_name":"Bash"}"#);
    }

    #[cfg(unix)]
    #[test]
    fn large_payload_does_not_deadlock() {
        let payload = vec![b'x'; 1 << 20];
        let outcome = run(&sh("cat"), &payload);
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout.len(), payload.len());
    }

    #[cfg(unix)]
    #[test]
    fn duration_covers_the_command() {
        let outcome = run(&sh("sleep 0.2"), b"");
        assert!(outcome.duration_ms >= 150, "duration {}", outcome.duration_ms);
    }

    #[test]
    fn missing_binary_is_a_local_failure() {
        let outcome = run(&["definitely-not-a-real-hook-binary-9f2c".to_string()], b"{}");
        assert_eq!(outcome.exit_code, 1);
        assert!(!outcome.blocked);
        assert!(outcome.local_failure);
        assert!(!outcome.block_reason.unwrap_or_default().is_empty());
    }
}
