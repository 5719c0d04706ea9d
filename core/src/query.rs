//! Query model and request-body parsing
//!
//! A request body is either a single attributes object or a wrapper
//! `{"searches": [attributes, ...]}`. Both shapes are resolved here, once,
//! into a [`QueryBatch`]; everything downstream works on the batch and only
//! consults [`RequestShape`] again when the response is serialized.

use crate::flags::SearchFlags;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Name of the wrapper field carrying a batch of searches
pub const SEARCHES_FIELD: &str = "searches";

/// Reasons a request body is rejected before dispatch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Body is empty
    #[error("request body is empty")]
    EmptyBody,

    /// Body is not valid JSON
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    /// Body is valid JSON but not an object
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// `searches` is present but not an array
    #[error("'searches' must be an array of attribute objects")]
    InvalidSearches,

    /// `searches` is an empty array
    #[error("'searches' must contain at least one search")]
    EmptyBatch,

    /// A query lacks a non-empty attributes object
    #[error("search {index} must be a non-empty JSON object of attributes")]
    MissingAttributes {
        /// Position of the offending query in the request
        index: usize,
    },
}

/// Shape of the original request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// A bare attributes object
    Single,
    /// A `searches` wrapper
    Batch,
}

/// One search: verbatim attributes plus behavior options
#[derive(Debug, Clone)]
pub struct Query {
    attributes: Box<RawValue>,
    flags: SearchFlags,
    profile: Option<Arc<str>>,
}

impl Query {
    /// Build a query from raw attributes JSON
    ///
    /// The attributes must be a non-empty JSON object.
    pub fn new(
        attributes: &str,
        flags: SearchFlags,
        profile: Option<&str>,
    ) -> Result<Self, RequestError> {
        let raw = RawValue::from_string(attributes.trim().to_string())
            .map_err(|e| RequestError::InvalidJson(e.to_string()))?;
        if !is_attributes_object(&raw) {
            return Err(RequestError::MissingAttributes { index: 0 });
        }
        Ok(Self::from_raw(raw, flags, profile.map(Arc::from)))
    }

    fn from_raw(attributes: Box<RawValue>, flags: SearchFlags, profile: Option<Arc<str>>) -> Self {
        Self {
            attributes,
            flags,
            profile,
        }
    }

    /// Attributes JSON exactly as received
    pub fn attributes(&self) -> &str {
        self.attributes.get()
    }

    /// Search flags
    pub fn flags(&self) -> SearchFlags {
        self.flags
    }

    /// Search profile name, if any
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}

/// Ordered, non-empty set of queries submitted together
#[derive(Debug, Clone)]
pub struct QueryBatch {
    queries: Vec<Query>,
    shape: RequestShape,
}

#[derive(Deserialize)]
struct SearchesEnvelope {
    searches: Vec<Box<RawValue>>,
}

impl QueryBatch {
    /// Wrap a single query
    pub fn single(query: Query) -> Self {
        Self {
            queries: vec![query],
            shape: RequestShape::Single,
        }
    }

    /// Build a wrapped batch; fails on an empty list
    pub fn batch(queries: Vec<Query>) -> Result<Self, RequestError> {
        if queries.is_empty() {
            return Err(RequestError::EmptyBatch);
        }
        Ok(Self {
            queries,
            shape: RequestShape::Batch,
        })
    }

    /// Parse a raw request body, applying `flags` and `profile` to every query
    pub fn parse(
        body: &[u8],
        flags: SearchFlags,
        profile: Option<&str>,
    ) -> Result<Self, RequestError> {
        let text = std::str::from_utf8(body)
            .map_err(|e| RequestError::InvalidJson(e.to_string()))?
            .trim();
        if text.is_empty() {
            return Err(RequestError::EmptyBody);
        }

        let value: Value =
            serde_json::from_str(text).map_err(|e| RequestError::InvalidJson(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(RequestError::NotAnObject);
        };

        let profile: Option<Arc<str>> = profile.map(Arc::from);

        if !map.contains_key(SEARCHES_FIELD) {
            if map.is_empty() {
                return Err(RequestError::MissingAttributes { index: 0 });
            }
            let raw = RawValue::from_string(text.to_string())
                .map_err(|e| RequestError::InvalidJson(e.to_string()))?;
            return Ok(Self::single(Query::from_raw(raw, flags, profile)));
        }

        let envelope: SearchesEnvelope =
            serde_json::from_str(text).map_err(|_| RequestError::InvalidSearches)?;

        let queries = envelope
            .searches
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                if is_attributes_object(&raw) {
                    Ok(Query::from_raw(raw, flags, profile.clone()))
                } else {
                    Err(RequestError::MissingAttributes { index })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::batch(queries)
    }

    /// Number of queries
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the batch holds no queries; never true once constructed
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Original request shape
    pub fn shape(&self) -> RequestShape {
        self.shape
    }

    /// Queries in submission order
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Consume into the ordered queries
    pub fn into_queries(self) -> Vec<Query> {
        self.queries
    }
}

fn is_attributes_object(raw: &RawValue) -> bool {
    matches!(
        serde_json::from_str::<Value>(raw.get()),
        Ok(Value::Object(map)) if !map.is_empty()
    )
}
