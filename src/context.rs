//! # Session Context
//!
//! Text injected into a new session by the SessionStart hook. The host feeds
//! stdout straight into the conversation, so the wording here steers what
//! the assistant does first.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::models::MemoryContext;

/// Heading that a completed onboarding appends to CLAUDE.md
pub const PROFILE_HEADING: &str = "## User Profile";

/// Which memory notice a new session receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    /// Memories were loaded; show them
    Memories,
    /// Nothing loaded but the profile already exists
    ProfileOnly,
    /// Nothing loaded and no profile: run the first-session interview
    Onboarding,
}

/// Loaded memories always win; otherwise the onboarding state decides
pub fn select_notice(context_available: bool, onboarded: bool) -> SessionNotice {
    match (context_available, onboarded) {
        (true, _) => SessionNotice::Memories,
        (false, true) => SessionNotice::ProfileOnly,
        (false, false) => SessionNotice::Onboarding,
    }
}

/// True if any candidate file has a `## User Profile` heading line
pub fn is_onboarded<P: AsRef<Path>>(candidates: &[P]) -> bool {
    candidates.iter().any(|p| match fs::read_to_string(p.as_ref()) {
        Ok(text) => has_profile_heading(&text),
        Err(_) => false,
    })
}

fn has_profile_heading(text: &str) -> bool {
    text.lines().any(|line| line.trim_start().starts_with(PROFILE_HEADING))
}

/// Bridge summary padded with blank lines. Nothing is written when absent.
pub fn write_bridge_context(out: &mut dyn Write, bridge: Option<&str>) -> io::Result<()> {
    if let Some(text) = bridge {
        writeln!(out)?;
        writeln!(out, "{}", text)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_notice(
    out: &mut dyn Write,
    notice: SessionNotice,
    context: Option<&MemoryContext>,
) -> io::Result<()> {
    match notice {
        SessionNotice::Memories => {
            writeln!(out, "## Session Memory")?;
            writeln!(out)?;
            writeln!(out, "The following memories were loaded from previous sessions.")?;
            writeln!(out, "Review them before starting work.")?;
            writeln!(out, "As you work, store new insights with `/memory store`.")?;
            writeln!(
                out,
                "If the user tells you something about themselves, store it IMMEDIATELY."
            )?;
            writeln!(out)?;
            if let Some(ctx) = context {
                writeln!(out, "{}", ctx.as_str())?;
            }
        }
        SessionNotice::ProfileOnly => {
            writeln!(out, "## Session Memory")?;
            writeln!(out)?;
            writeln!(
                out,
                "No memories were loaded this session (API may be unreachable)."
            )?;
            writeln!(out, "User profile is available in CLAUDE.md. Proceed normally.")?;
            writeln!(
                out,
                "As you work, store new insights with `/memory store` when the API is available."
            )?;
        }
        SessionNotice::Onboarding => out.write_all(ONBOARDING_SCRIPT.as_bytes())?,
    }
    Ok(())
}

const ONBOARDING_SCRIPT: &str = "\
## Session Memory — ONBOARDING REQUIRED

No memories loaded. This is likely a first session.

IMPORTANT: Before doing anything else, introduce yourself briefly and then
ask the user the following questions in a single message:

1. What do you do? (role, profession, background)
2. What kind of projects do you work on? (tech stack, domains, languages)
3. What are you hoping to use Cognova for? (goals, workflows)
4. Any tools, conventions, or preferences you're particular about?

After they respond, store EACH distinct fact as a separate memory using
`/memory store --type preference \"...\"`.

Then append a `## User Profile` section to your CLAUDE.md with a brief
summary (3-5 bullet points) so this context is always available.

Only after onboarding is complete should you proceed with whatever the user needs.
";
