//! Lazy line-delimited JSON input

use std::path::Path;

use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};

use crate::error::{HarnessError, HarnessResult};

/// What a non-blank input line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A JSON object, kept verbatim for posting
    Query(String),
    /// Anything else, with the reason it was rejected
    Malformed(String),
}

/// One non-blank input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    /// 1-based line number in the source
    pub line: u64,
    /// Classified content
    pub payload: Payload,
}

/// Reads input one line at a time, skipping blank lines
pub struct InputReader<R> {
    segments: Split<BufReader<R>>,
    line: u64,
}

impl InputReader<File> {
    /// Open `path` for reading
    ///
    /// Fails with [`HarnessError::InputUnavailable`] when the path is
    /// missing, unreadable or not a regular file.
    pub async fn open(path: &Path) -> HarnessResult<Self> {
        let unavailable = |source| HarnessError::InputUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(unavailable)?;
        if !metadata.is_file() {
            return Err(unavailable(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }

        let file = File::open(path).await.map_err(unavailable)?;
        Ok(Self::new(file))
    }
}

impl<R: AsyncRead + Unpin> InputReader<R> {
    /// Wrap any async reader
    pub fn new(reader: R) -> Self {
        Self {
            segments: BufReader::new(reader).split(b'\n'),
            line: 0,
        }
    }

    /// Number of lines consumed so far, blank ones included
    pub fn lines_read(&self) -> u64 {
        self.line
    }

    /// Next non-blank line, or `None` at end of input
    pub async fn next_item(&mut self) -> std::io::Result<Option<InputItem>> {
        while let Some(segment) = self.segments.next_segment().await? {
            self.line += 1;
            if let Some(payload) = classify(segment) {
                return Ok(Some(InputItem {
                    line: self.line,
                    payload,
                }));
            }
        }
        Ok(None)
    }
}

fn classify(segment: Vec<u8>) -> Option<Payload> {
    let text = match String::from_utf8(segment) {
        Ok(text) => text,
        Err(_) => return Some(Payload::Malformed("line is not valid UTF-8".into())),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let payload = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(_)) => Payload::Query(trimmed.to_string()),
        Ok(_) => Payload::Malformed("line is not a JSON object".into()),
        Err(e) => Payload::Malformed(format!("invalid JSON: {e}")),
    };
    Some(payload)
}
