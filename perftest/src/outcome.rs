//! Request outcome classification

use serde::Serialize;

/// Classification of one input item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// 2xx response with a JSON body
    Success,
    /// Input line was not a JSON object; no request issued
    MalformedInput,
    /// Non-2xx response
    HttpError,
    /// Request exceeded the per-request timeout
    Timeout,
    /// Connection or other transport failure
    Transport,
    /// 2xx response whose body is not JSON
    MalformedResponse,
}

impl OutcomeKind {
    /// Every kind, in report order
    pub const ALL: [OutcomeKind; 6] = [
        OutcomeKind::Success,
        OutcomeKind::MalformedInput,
        OutcomeKind::HttpError,
        OutcomeKind::Timeout,
        OutcomeKind::Transport,
        OutcomeKind::MalformedResponse,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::MalformedInput => "malformed_input",
            OutcomeKind::HttpError => "http_error",
            OutcomeKind::Timeout => "timeout",
            OutcomeKind::Transport => "transport",
            OutcomeKind::MalformedResponse => "malformed_response",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one input item, with the HTTP status where there is one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx response with a JSON body
    Success,
    /// Input line rejected before any request
    MalformedInput,
    /// Non-2xx response
    HttpError {
        /// Response status code
        status: u16,
    },
    /// Per-request timeout elapsed
    Timeout,
    /// Connection or other transport failure
    Transport,
    /// 2xx response whose body is not JSON
    MalformedResponse,
}

impl Outcome {
    /// Classification without details
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success => OutcomeKind::Success,
            Outcome::MalformedInput => OutcomeKind::MalformedInput,
            Outcome::HttpError { .. } => OutcomeKind::HttpError,
            Outcome::Timeout => OutcomeKind::Timeout,
            Outcome::Transport => OutcomeKind::Transport,
            Outcome::MalformedResponse => OutcomeKind::MalformedResponse,
        }
    }

    /// Whether this counts as a success
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// HTTP status for `HttpError`
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Outcome::HttpError { status } => Some(*status),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::HttpError { status } => write!(f, "http_error ({status})"),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status() {
        let outcome = Outcome::HttpError { status: 503 };
        assert_eq!(outcome.kind(), OutcomeKind::HttpError);
        assert_eq!(outcome.http_status(), Some(503));
        assert!(!outcome.is_success());
        assert_eq!(outcome.to_string(), "http_error (503)");

        assert!(Outcome::Success.is_success());
        assert_eq!(Outcome::Timeout.http_status(), None);
    }

    #[test]
    fn test_kind_snake_case_serialization() {
        assert_eq!(
            serde_json::to_string(&OutcomeKind::MalformedResponse).unwrap(),
            "\"malformed_response\""
        );
        for kind in OutcomeKind::ALL {
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.as_str())
            );
        }
    }
}
