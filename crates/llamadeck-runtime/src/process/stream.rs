//! Async stream log readers (non-UTF8-safe).
//!
//! llama-server can emit non-UTF8 bytes on stdout/stderr, which would end a
//! `BufReader::lines()` loop early. Lines are read as bytes and decoded
//! lossily instead.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use super::logs::ServerLogBuffer;

pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    pid: u32,
    stream_type: &'static str,
    sink: Arc<ServerLogBuffer>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    let line = decode_line(&buf);
                    debug!(target: "llama_server", pid, stream = stream_type, "{line}");
                    sink.push(stream_type, line);
                }
                Err(e) => {
                    debug!(pid, stream = stream_type, error = %e, "log stream reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(pid, stream = stream_type, "log stream reader task exiting");
    });
}

/// Strip the line terminator and decode lossily.
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && buf[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
