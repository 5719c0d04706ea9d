//! Per-query results, batch aggregation and response shaping

use crate::error::{EngineError, EngineErrorKind};
use crate::query::{RequestError, RequestShape};
use serde::Serialize;
use serde_json::value::RawValue;

/// Why a single query failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "category", content = "kind")]
pub enum FailureKind {
    /// The engine rejected or failed the call
    Engine(EngineErrorKind),
    /// Failure outside the engine (panic, malformed engine output)
    Unexpected,
}

impl FailureKind {
    /// HTTP status for this failure
    pub fn http_status(&self) -> u16 {
        match self {
            FailureKind::Engine(kind) => kind.http_status(),
            FailureKind::Unexpected => 500,
        }
    }
}

/// Failure descriptor for one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    /// Classification
    pub kind: FailureKind,
    /// Message surfaced to the caller
    pub message: String,
}

/// Outcome of one query: the engine's verbatim answer or a failure
#[derive(Debug, Clone)]
pub enum QueryResult {
    /// Raw engine answer
    Success(Box<RawValue>),
    /// Classified failure
    Failure(QueryFailure),
}

impl QueryResult {
    /// Wrap an engine answer, rejecting text that is not JSON
    pub fn from_engine_output(output: String) -> Self {
        match RawValue::from_string(output) {
            Ok(raw) => QueryResult::Success(raw),
            Err(e) => {
                Self::unexpected(format!("search engine returned malformed JSON: {e}"))
            }
        }
    }

    /// Failure carrying an engine error
    pub fn engine_failure(err: EngineError) -> Self {
        QueryResult::Failure(QueryFailure {
            kind: FailureKind::Engine(err.kind),
            message: err.message,
        })
    }

    /// Failure that did not originate in the engine
    pub fn unexpected(message: impl Into<String>) -> Self {
        QueryResult::Failure(QueryFailure {
            kind: FailureKind::Unexpected,
            message: message.into(),
        })
    }

    /// Whether the query succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    /// Failure descriptor, if any
    pub fn failure(&self) -> Option<&QueryFailure> {
        match self {
            QueryResult::Success(_) => None,
            QueryResult::Failure(failure) => Some(failure),
        }
    }

    /// HTTP status this result would carry on its own
    pub fn http_status(&self) -> u16 {
        match self {
            QueryResult::Success(_) => 200,
            QueryResult::Failure(failure) => failure.kind.http_status(),
        }
    }
}

/// Wire element of a response: raw answer or `{"error": message}`
#[derive(Serialize)]
#[serde(untagged)]
enum ResponseItem<'a> {
    Answer(&'a RawValue),
    Error { error: &'a str },
}

impl<'a> From<&'a QueryResult> for ResponseItem<'a> {
    fn from(result: &'a QueryResult) -> Self {
        match result {
            QueryResult::Success(raw) => ResponseItem::Answer(raw),
            QueryResult::Failure(failure) => ResponseItem::Error {
                error: &failure.message,
            },
        }
    }
}

/// Results aligned index-for-index with the submitted batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    results: Vec<QueryResult>,
    shape: RequestShape,
}

impl BatchResult {
    /// Assemble from ordered results
    pub fn new(results: Vec<QueryResult>, shape: RequestShape) -> Self {
        Self { results, shape }
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether there are no results
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in input order
    pub fn results(&self) -> &[QueryResult] {
        &self.results
    }

    /// Number of failed queries
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// Shape the HTTP response for this batch
    ///
    /// A single request answers with its own result and status; a wrapped
    /// batch always answers 200 with an array.
    pub fn into_response(self) -> DispatchResponse {
        match (self.shape, self.results.as_slice()) {
            (RequestShape::Single, [result]) => {
                let status = result.http_status();
                match result {
                    QueryResult::Success(raw) => DispatchResponse::new(status, raw.get()),
                    QueryResult::Failure(failure) => {
                        DispatchResponse::error(status, &failure.message)
                    }
                }
            }
            _ => {
                let items: Vec<ResponseItem<'_>> =
                    self.results.iter().map(ResponseItem::from).collect();
                match serde_json::to_string(&items) {
                    Ok(body) => DispatchResponse::new(200, body),
                    Err(e) => DispatchResponse::error(500, &e.to_string()),
                }
            }
        }
    }
}

/// Status code and JSON body produced by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    /// HTTP status
    pub status: u16,
    /// JSON body
    pub body: String,
}

impl DispatchResponse {
    /// Response with a ready JSON body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `{"error": message}` response
    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self { status, body }
    }

    /// 400 response for a rejected request body
    pub fn bad_request(err: &RequestError) -> Self {
        Self::error(400, &err.to_string())
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
