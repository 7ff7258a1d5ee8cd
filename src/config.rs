//! # Configuration
//!
//! Everything a hook needs from its surroundings is captured once, in
//! [`Config::from_args`], and passed by reference from there on. Components
//! never read environment variables or the working directory themselves.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{Args, DEFAULT_API_BASE, DEFAULT_MEMORY_LIMIT};

/// Plain-text token file, looked up along [`CredentialResolver::search_path`]
pub const TOKEN_FILE: &str = ".api-token";

/// Install location inside the published container image
pub const CONTAINER_INSTALL_DIR: &str = "/home/node/app";

/// Project documentation file that receives the onboarding profile
pub const PROFILE_FILE: &str = "CLAUDE.md";

/// Connect and total deadlines for a single collector request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub total: Duration,
}

impl Timeouts {
    /// Event logging and context lookups
    pub const LIGHT: Timeouts = Timeouts {
        connect: Duration::from_secs(2),
        total: Duration::from_secs(5),
    };

    /// Memory extraction runs remote processing and gets more time
    pub const EXTRACT: Timeouts = Timeouts {
        connect: Duration::from_secs(5),
        total: Duration::from_secs(30),
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_base: String,
    /// Empty means remote calls are disabled for this invocation
    pub api_token: String,
}

impl Credentials {
    pub fn new(api_base: &str, api_token: &str) -> Self {
        Credentials {
            api_base: normalize_base(api_base),
            api_token: api_token.trim().to_string(),
        }
    }

    pub fn has_token(&self) -> bool {
        !self.api_token.is_empty()
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Token lookup: explicit token first, then the first readable, non-empty
/// `.api-token` along the candidate list.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    env_token: Option<String>,
    candidates: Vec<PathBuf>,
}

impl CredentialResolver {
    pub fn new(env_token: Option<String>, candidates: Vec<PathBuf>) -> Self {
        CredentialResolver {
            env_token,
            candidates,
        }
    }

    /// Candidate token files in priority order:
    /// 1. install dir (`COGNOVA_PROJECT_DIR`)
    /// 2. container install dir
    /// 3. four levels above the running executable
    /// 4. current working directory
    pub fn search_path(install_dir: Option<&Path>, exe: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(4);
        if let Some(dir) = install_dir {
            paths.push(dir.join(TOKEN_FILE));
        }
        paths.push(Path::new(CONTAINER_INSTALL_DIR).join(TOKEN_FILE));
        if let Some(root) = exe.and_then(|e| e.ancestors().nth(4)) {
            paths.push(root.join(TOKEN_FILE));
        }
        paths.push(cwd.join(TOKEN_FILE));
        paths
    }

    pub fn resolve_token(&self) -> String {
        self.resolve_token_with(|p| fs::read_to_string(p))
    }

    /// Same as [`resolve_token`](Self::resolve_token) with an injected file reader
    pub fn resolve_token_with<F>(&self, mut read: F) -> String
    where
        F: FnMut(&Path) -> io::Result<String>,
    {
        if let Some(token) = self
            .env_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            return token.to_string();
        }

        for candidate in &self.candidates {
            match read(candidate) {
                Ok(raw) => {
                    let token = raw.trim();
                    if !token.is_empty() {
                        tracing::debug!(path = %candidate.display(), "api token loaded from file");
                        return token.to_string();
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::debug!(
                        path = %candidate.display(),
                        error = %e,
                        "skipping unreadable token file"
                    );
                }
            }
        }

        tracing::debug!(
            checked = ?self.candidates,
            "no api token found; remote calls disabled"
        );
        String::new()
    }

    pub fn resolve(&self, api_base: &str) -> Credentials {
        Credentials::new(api_base, &self.resolve_token())
    }
}

/// Resolved per-process settings shared by every component
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Cognova install directory (`COGNOVA_PROJECT_DIR`)
    pub install_dir: Option<PathBuf>,
    /// Host project directory (`CLAUDE_PROJECT_DIR`), reported as `projectDir`
    pub project_dir: Option<String>,
    /// Fallback session id (`CLAUDE_SESSION_ID`)
    pub session_id: Option<String>,
    pub cwd: PathBuf,
    pub current_exe: Option<PathBuf>,
    pub memory_limit: usize,
    pub event_timeouts: Timeouts,
    pub extract_timeouts: Timeouts,
}

impl Config {
    /// Configuration with the given credentials and no environment input
    pub fn new(credentials: Credentials) -> Self {
        Config {
            credentials,
            install_dir: None,
            project_dir: None,
            session_id: None,
            cwd: PathBuf::from("."),
            current_exe: None,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            event_timeouts: Timeouts::LIGHT,
            extract_timeouts: Timeouts::EXTRACT,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let current_exe = std::env::current_exe().ok();
        let install_dir = non_empty(args.install_dir.as_deref()).map(PathBuf::from);

        let resolver = CredentialResolver::new(
            args.api_token.clone(),
            CredentialResolver::search_path(
                install_dir.as_deref(),
                current_exe.as_deref(),
                &cwd,
            ),
        );

        Config {
            credentials: resolver.resolve(&args.api_url),
            install_dir,
            project_dir: non_empty(args.project_dir.as_deref()).map(str::to_string),
            session_id: non_empty(args.session_id.as_deref()).map(str::to_string),
            cwd,
            current_exe,
            memory_limit: parse_memory_limit(args.memory_limit.as_deref()),
            event_timeouts: Timeouts::LIGHT,
            extract_timeouts: Timeouts::EXTRACT,
        }
    }

    /// Where a completed onboarding leaves its `## User Profile` section
    pub fn profile_candidates(&self) -> Vec<PathBuf> {
        let mut paths = Vec::with_capacity(2);
        if let Some(dir) = &self.install_dir {
            paths.push(dir.join(PROFILE_FILE));
        }
        paths.push(self.cwd.join(PROFILE_FILE));
        paths
    }
}

fn parse_memory_limit(raw: Option<&str>) -> usize {
    let Some(raw) = non_empty(raw) else {
        return DEFAULT_MEMORY_LIMIT;
    };
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::debug!(value = raw, "ignoring invalid COGNOVA_MEMORY_LIMIT");
            DEFAULT_MEMORY_LIMIT
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
