//! Sizing of the record channel between request tasks and the aggregator

use std::num::NonZeroUsize;

/// Records buffered before request tasks wait on the aggregator
const DEFAULT_RECORDS_BUFFER: usize = 10_000;

/// Record channel sizing
///
/// The capacity is never zero, which `tokio::sync::mpsc::channel` would
/// reject with a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    records_buffer: NonZeroUsize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RECORDS_BUFFER)
    }
}

impl ChannelConfig {
    /// Config buffering `records` records; zero is raised to one
    pub fn new(records: usize) -> Self {
        Self {
            records_buffer: NonZeroUsize::new(records).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Replace the record buffer size; zero is raised to one
    pub fn with_records_buffer(self, records: usize) -> Self {
        Self::new(records)
    }

    /// Record channel capacity
    pub fn records_buffer(&self) -> usize {
        self.records_buffer.get()
    }
}
