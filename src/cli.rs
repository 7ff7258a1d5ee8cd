use clap::error::ErrorKind;

use crate::utils::truthy;

pub const DEFAULT_API_BASE: &str = "http://localhost:3000";
pub const DEFAULT_MEMORY_LIMIT: usize = 5;

#[derive(clap::Subcommand, Debug, Clone)]
pub enum HookCommand {
    /// SessionStart: log the event and print bridge + memory context
    SessionStart,
    /// SessionEnd: log the event
    SessionEnd,
    /// PreCompact: log the event and extract memories before compaction
    PreCompact,
    /// Stop: launch memory extraction in the background
    Stop,
    /// Log an arbitrary hook event, optionally wrapping another hook command
    LogEvent {
        /// Event name reported to the collector (e.g. PreToolUse)
        event_type: String,

        /// Tool matcher the wrapped hook was registered with
        #[arg(long)]
        matcher: Option<String>,

        /// Command to run with the hook input on stdin; its exit code is returned
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Ask the collector to extract memories from a transcript.
    /// Reads the transcript text from stdin when no path is given.
    Extract {
        #[arg(long)]
        transcript_path: Option<String>,
    },
}

#[derive(clap::Parser, Debug)]
#[command(name = "cognova-hook", version, about = "Cognova lifecycle hooks")]
pub struct Args {
    #[command(subcommand)]
    pub command: HookCommand,

    /// Collector base URL
    #[arg(long, global = true, env = "COGNOVA_API_URL", default_value = DEFAULT_API_BASE)]
    pub api_url: String,

    /// API token; when unset the .api-token search path is used
    #[arg(long, global = true, env = "COGNOVA_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Cognova install directory (holds .api-token and CLAUDE.md)
    #[arg(long, global = true, env = "COGNOVA_PROJECT_DIR")]
    pub install_dir: Option<String>,

    /// Host project directory, reported as projectDir
    #[arg(long, global = true, env = "CLAUDE_PROJECT_DIR")]
    pub project_dir: Option<String>,

    /// Host session id, used when the hook input carries none
    #[arg(long, global = true, env = "CLAUDE_SESSION_ID")]
    pub session_id: Option<String>,

    /// Number of memories requested at session start (default 5).
    /// Unparseable values fall back to the default instead of failing the hook.
    #[arg(long, global = true, env = "COGNOVA_MEMORY_LIMIT")]
    pub memory_limit: Option<String>,

    /// Verbose diagnostics on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Raw DEBUG value; any value except 0/false/no/off enables diagnostics
    #[arg(long = "debug-env", global = true, env = "DEBUG", hide = true)]
    pub debug_env: Option<String>,
}

/// What `main` should do when argument parsing does not produce `Args`
#[derive(Debug)]
pub enum ParseFailure {
    /// `--help` / `--version`: print and exit 0
    Display(String),
    /// Usage error: print and exit 1. Never 2, which the host reads as a block.
    Usage(String),
}

impl Args {
    pub fn try_parse_from_env() -> Result<Self, ParseFailure> {
        Self::try_parse_from_iter(std::env::args_os())
    }

    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, ParseFailure>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Args as clap::Parser>::try_parse_from(iter).map_err(|e| match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                ParseFailure::Display(e.to_string())
            }
            _ => ParseFailure::Usage(e.to_string()),
        })
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug || self.debug_env.as_deref().is_some_and(truthy)
    }
}
