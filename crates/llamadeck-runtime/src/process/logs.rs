//! Captured llama-server output.
//!
//! Lines read from the child's stdout/stderr land in a bounded ring buffer
//! and are broadcast to live subscribers.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Maximum number of log lines kept in the ring buffer
pub const MAX_LOG_LINES: usize = 5000;

const BROADCAST_CAPACITY: usize = 1000;

/// A single captured output line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLogEntry {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// `stdout` or `stderr`
    pub stream: String,
    /// The line content, without its trailing newline
    pub line: String,
}

impl ServerLogEntry {
    /// Create a new log entry with current timestamp
    pub fn new(stream: &str, line: String) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            stream: stream.to_string(),
            line,
        }
    }
}

/// Ring buffer of recent output plus a broadcast channel for new lines.
#[derive(Debug)]
pub struct ServerLogBuffer {
    lines: RwLock<VecDeque<ServerLogEntry>>,
    capacity: usize,
    broadcast_tx: broadcast::Sender<ServerLogEntry>,
}

impl ServerLogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_LINES)
    }

    /// Buffer that keeps at most `capacity` lines (minimum one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            lines: RwLock::new(VecDeque::with_capacity(capacity.min(MAX_LOG_LINES))),
            capacity,
            broadcast_tx,
        }
    }

    /// Append a line, dropping the oldest one when full.
    pub fn push(&self, stream: &str, line: String) {
        let entry = ServerLogEntry::new(stream, line);

        {
            let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(entry.clone());
        }

        // No receivers is fine
        let _ = self.broadcast_tx.send(entry);
    }

    /// All buffered lines, oldest first.
    pub fn snapshot(&self) -> Vec<ServerLogEntry> {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// The most recent `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<ServerLogEntry> {
        let lines = self.lines.read().unwrap_or_else(PoisonError::into_inner);
        let skip = lines.len().saturating_sub(count);
        lines.iter().skip(skip).cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerLogEntry> {
        self.broadcast_tx.subscribe()
    }

    pub fn clear(&self) {
        self.lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for ServerLogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let buffer = ServerLogBuffer::with_capacity(3);
        for i in 0..5 {
            buffer.push("stdout", format!("line {i}"));
        }
        let lines: Vec<String> = buffer.snapshot().into_iter().map(|e| e.line).collect();
        assert_eq!(lines, vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_tail() {
        let buffer = ServerLogBuffer::new();
        buffer.push("stdout", "a".to_string());
        buffer.push("stderr", "b".to_string());
        buffer.push("stdout", "c".to_string());

        let tail = buffer.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].line, "b");
        assert_eq!(tail[0].stream, "stderr");
        assert_eq!(buffer.tail(10).len(), 3);

        buffer.clear();
        assert!(buffer.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_to_subscribers() {
        let buffer = ServerLogBuffer::new();
        let mut rx = buffer.subscribe();
        buffer.push("stderr", "model loaded".to_string());

        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.line, "model loaded");
        assert_eq!(entry.stream, "stderr");
    }
}
