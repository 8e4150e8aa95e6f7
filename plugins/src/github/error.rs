use std::{error::Error as StdError, fmt};

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GithubHttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl GithubHttpErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GithubHttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call against the source-control host, carrying enough context
/// (method, path, status, body preview) to diagnose it from a log line.
#[derive(Debug)]
pub struct GithubHttpError {
    kind: GithubHttpErrorKind,
    status: Option<u16>,
    method: String,
    path: String,
    message: String,
    source: Option<anyhow::Error>,
}

impl GithubHttpError {
    pub fn kind(&self) -> GithubHttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, method: &str, path: &str) -> Self {
        let kind = if err.is_timeout() {
            GithubHttpErrorKind::Timeout
        } else if err.is_connect() {
            GithubHttpErrorKind::Connect
        } else if err.is_request() {
            GithubHttpErrorKind::Request
        } else if err.is_body() {
            GithubHttpErrorKind::Body
        } else if err.is_decode() {
            GithubHttpErrorKind::Decode
        } else {
            GithubHttpErrorKind::Unknown
        };
        let status = err.status().map(|s| s.as_u16());
        let message = err.to_string();
        GithubHttpError {
            kind,
            status,
            method: method.to_string(),
            path: path.to_string(),
            message,
            source: Some(anyhow::Error::new(err)),
        }
    }

    pub(crate) fn status_error(status: u16, method: &str, path: &str, body: &str) -> Self {
        GithubHttpError {
            kind: GithubHttpErrorKind::Status,
            status: Some(status),
            method: method.to_string(),
            path: path.to_string(),
            message: preview_body(body),
            source: None,
        }
    }

    pub(crate) fn decode_error(
        status: u16,
        method: &str,
        path: &str,
        err: serde_json::Error,
        body: &str,
    ) -> Self {
        let message = format!(
            "failed to decode response body: {} | body={}",
            err,
            preview_body(body)
        );
        GithubHttpError {
            kind: GithubHttpErrorKind::Decode,
            status: Some(status),
            method: method.to_string(),
            path: path.to_string(),
            message,
            source: Some(anyhow::Error::new(err)),
        }
    }
}

impl fmt::Display for GithubHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "github http error kind={} {} {}",
            self.kind, self.method, self.path
        )?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for GithubHttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}
