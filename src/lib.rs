//! # Cognova Hooks
//!
//! Lifecycle hooks that connect a Claude Code session to the Cognova
//! collector.
//!
//! ## Overview
//!
//! Each hook is a short-lived process that reads the host's JSON payload on
//! stdin and:
//! - reports a structured event to the collector (`/api/hooks/events`)
//! - extracts memories from the session transcript before compaction and
//!   after each turn
//! - injects bridge and memory context into a new session, or an onboarding
//!   script on the first run
//! - optionally wraps another hook command and passes its exit code through
//!
//! Remote calls are bounded by short timeouts and fail silently: telemetry
//! and memory must never disrupt the host session.

/// Session-start text: memory notice, onboarding script, bridge context
pub mod context;

/// Command-line arguments and environment bindings
pub mod cli;

/// Per-process configuration and credential resolution
pub mod config;

/// One handler per lifecycle hook
pub mod dispatch;

/// stderr diagnostics
pub mod logging;

/// Data models for hook input, events and memory payloads
pub mod models;

/// Collector client
pub mod reporter;

/// Stdin and flag helpers
pub mod utils;

/// Wrapped hook execution and block classification
pub mod wrapper;
