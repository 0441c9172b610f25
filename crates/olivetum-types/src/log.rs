//! Event log entries.

use primitive_types::{H160, H256};

/// A log record emitted during state transition (e.g. dividend claims).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Emitting contract address.
    pub address: H160,
    /// Indexed topics; topic 0 is the event signature hash.
    pub topics: Vec<H256>,
    /// ABI-encoded payload.
    pub data: Vec<u8>,
}
