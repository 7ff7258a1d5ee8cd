//! # Remote Reporter
//!
//! Best-effort calls to the Cognova collector. Every operation returns a
//! `Result<_, ReportError>` and never panics; callers log the error and move
//! on, so a dead or slow collector can never disrupt the host session.

use serde_json::Value;

use crate::config::{Config, Timeouts};
use crate::models::{Envelope, ExtractRequest, FormattedData, HookEvent, MemoryContext};

pub const EVENTS_PATH: &str = "/api/hooks/events";
pub const EXTRACT_PATH: &str = "/api/memory/extract";
pub const MEMORY_CONTEXT_PATH: &str = "/api/memory/context";
pub const BRIDGE_CONTEXT_PATH: &str = "/api/bridges/context";

/// Header carrying the resolved API token
pub const TOKEN_HEADER: &str = "X-API-Token";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("no api token configured")]
    MissingToken,
    #[error("no transcript provided for memory extraction")]
    MissingTranscript,
    #[error("request timed out")]
    Timeout,
    #[error("collector answered with status {0}")]
    Status(u16),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// One outgoing collector request, independent of the HTTP client
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub url: String,
    pub token: String,
    pub query: Vec<(&'static str, String)>,
    pub timeouts: Timeouts,
}

/// HTTP seam between the reporter and the network
pub trait Transport {
    fn post_json(&self, call: &Call, body: &Value) -> Result<(), ReportError>;
    fn get_json(&self, call: &Call) -> Result<Value, ReportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_json(&self, call: &Call, body: &Value) -> Result<(), ReportError> {
        (**self).post_json(call, body)
    }

    fn get_json(&self, call: &Call) -> Result<Value, ReportError> {
        (**self).get_json(call)
    }
}

/// Blocking `ureq` transport; one agent per call so each gets its own deadlines
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    fn agent(timeouts: Timeouts) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_connect(Some(timeouts.connect))
            .timeout_global(Some(timeouts.total))
            .build()
            .into()
    }
}

impl Transport for UreqTransport {
    fn post_json(&self, call: &Call, body: &Value) -> Result<(), ReportError> {
        let agent = Self::agent(call.timeouts);
        let mut request = agent.post(&call.url).header(TOKEN_HEADER, call.token.as_str());
        for (key, value) in &call.query {
            request = request.query(*key, value);
        }
        request.send_json(body).map_err(map_ureq_error)?;
        Ok(())
    }

    fn get_json(&self, call: &Call) -> Result<Value, ReportError> {
        let agent = Self::agent(call.timeouts);
        let mut request = agent
            .get(&call.url)
            .header(TOKEN_HEADER, call.token.as_str())
            .header("Accept", "application/json");
        for (key, value) in &call.query {
            request = request.query(*key, value);
        }
        let mut response = request.call().map_err(map_ureq_error)?;
        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|e| match map_ureq_error(e) {
                ReportError::Transport(msg) => ReportError::Decode(msg),
                other => other,
            })
    }
}

fn map_ureq_error(err: ureq::Error) -> ReportError {
    match err {
        ureq::Error::StatusCode(code) => ReportError::Status(code),
        ureq::Error::Timeout(_) => ReportError::Timeout,
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => ReportError::Timeout,
        other => ReportError::Transport(other.to_string()),
    }
}

/// Transcript handed to the extraction endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractSource<'a> {
    Path(&'a str),
    Text(&'a str),
}

pub struct RemoteReporter<'a, T = UreqTransport> {
    config: &'a Config,
    transport: T,
}

impl<'a> RemoteReporter<'a, UreqTransport> {
    pub fn new(config: &'a Config) -> Self {
        RemoteReporter {
            config,
            transport: UreqTransport,
        }
    }
}

impl<'a, T: Transport> RemoteReporter<'a, T> {
    pub fn with_transport(config: &'a Config, transport: T) -> Self {
        RemoteReporter { config, transport }
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    fn call(&self, path: &str, timeouts: Timeouts) -> Result<Call, ReportError> {
        let creds = &self.config.credentials;
        if !creds.has_token() {
            return Err(ReportError::MissingToken);
        }
        Ok(Call {
            url: format!("{}{}", creds.api_base, path),
            token: creds.api_token.clone(),
            query: Vec::new(),
            timeouts,
        })
    }

    /// `POST /api/hooks/events` with the sparse event body
    pub fn report_event(&self, event: &HookEvent) -> Result<(), ReportError> {
        let call = self.call(EVENTS_PATH, self.config.event_timeouts)?;
        let body = serde_json::to_value(event).map_err(|e| ReportError::Decode(e.to_string()))?;
        self.transport.post_json(&call, &body)
    }

    /// `POST /api/memory/extract`.
    ///
    /// An empty path or text counts as no transcript and fails before any
    /// request is made. Session and project default to the configured ones.
    pub fn extract_memories(
        &self,
        source: Option<ExtractSource<'_>>,
        session_id: Option<&str>,
        project_path: Option<&str>,
    ) -> Result<(), ReportError> {
        let call = self.call(EXTRACT_PATH, self.config.extract_timeouts)?;

        let mut request = ExtractRequest {
            session_id: session_id
                .map(str::to_string)
                .or_else(|| self.config.session_id.clone()),
            project_path: project_path
                .map(str::to_string)
                .or_else(|| self.config.project_dir.clone()),
            ..Default::default()
        };
        match source {
            Some(ExtractSource::Path(p)) if !p.trim().is_empty() => {
                request.transcript_path = Some(p.to_string());
            }
            Some(ExtractSource::Text(t)) if !t.trim().is_empty() => {
                request.transcript = Some(t.to_string());
            }
            _ => return Err(ReportError::MissingTranscript),
        }

        let body =
            serde_json::to_value(&request).map_err(|e| ReportError::Decode(e.to_string()))?;
        self.transport.post_json(&call, &body)
    }

    /// `GET /api/memory/context?project=<p>&limit=<n>`
    pub fn get_memory_context(
        &self,
        project: Option<&str>,
        limit: usize,
    ) -> Result<Option<MemoryContext>, ReportError> {
        let mut call = self.call(MEMORY_CONTEXT_PATH, self.config.event_timeouts)?;
        let project = project
            .map(str::to_string)
            .or_else(|| self.config.project_dir.clone())
            .unwrap_or_default();
        call.query.push(("project", project));
        call.query.push(("limit", limit.to_string()));

        let value = self.transport.get_json(&call)?;
        Ok(decode_formatted(value)?.map(MemoryContext))
    }

    /// `GET /api/bridges/context`: integration summary injected at session start
    pub fn get_bridge_context(&self) -> Result<Option<String>, ReportError> {
        let call = self.call(BRIDGE_CONTEXT_PATH, self.config.event_timeouts)?;
        let value = self.transport.get_json(&call)?;
        decode_formatted(value)
    }
}

fn decode_formatted(value: Value) -> Result<Option<String>, ReportError> {
    serde_json::from_value::<Envelope<FormattedData>>(value)
        .map(Envelope::formatted)
        .map_err(|e| ReportError::Decode(e.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Records every call and answers GETs with a canned body
    #[derive(Default)]
    pub struct RecordingTransport {
        pub posts: RefCell<Vec<(Call, Value)>>,
        pub gets: RefCell<Vec<Call>>,
        pub responses: RefCell<Vec<(String, Result<Value, ReportError>)>>,
        pub post_result: RefCell<Option<ReportError>>,
    }

    impl RecordingTransport {
        pub fn respond(&self, path: &str, result: Result<Value, ReportError>) {
            self.responses.borrow_mut().push((path.to_string(), result));
        }

        pub fn fail_posts(&self, err: ReportError) {
            *self.post_result.borrow_mut() = Some(err);
        }

        pub fn call_count(&self) -> usize {
            self.posts.borrow().len() + self.gets.borrow().len()
        }

        pub fn posts_to(&self, path: &str) -> Vec<Value> {
            self.posts
                .borrow()
                .iter()
                .filter(|(c, _)| c.url.ends_with(path))
                .map(|(_, b)| b.clone())
                .collect()
        }
    }

    impl Transport for RecordingTransport {
        fn post_json(&self, call: &Call, body: &Value) -> Result<(), ReportError> {
            self.posts.borrow_mut().push((call.clone(), body.clone()));
            match self.post_result.borrow().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn get_json(&self, call: &Call) -> Result<Value, ReportError> {
            self.gets.borrow_mut().push(call.clone());
            self.responses
                .borrow()
                .iter()
                .find(|(path, _)| call.url.ends_with(path.as_str()))
                .map(|(_, r)| r.clone())
                .unwrap_or(Err(ReportError::Status(404)))
        }
    }
}
