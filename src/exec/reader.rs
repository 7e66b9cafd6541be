// src/exec/reader.rs

//! Output stream readers.
//!
//! Both readers consume a child pipe until end-of-stream and return the
//! accumulated text. They never fail: read errors end the stream with a
//! warning and invalid UTF-8 is decoded lossily.
//!
//! Lines are split on `\n`, `\r\n` and bare `\r`, and each line is handed
//! on as soon as its terminator arrives, so carriage-return redraws of a
//! progress bar are reported while the download is still running.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, trace, warn};

use super::progress::{parse_progress_line, ProgressCallback};

/// Accumulate `stream` without any parsing (used for stderr).
pub async fn read_plain<R>(stream: R) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buffer = String::new();
    for_each_line(stream, "stderr", |line| {
        trace!("stderr: {}", line);
        push_line(&mut buffer, line);
    })
    .await;
    buffer
}

/// Accumulate `stream`, reporting every recognized progress line to
/// `on_progress` before the line is appended to the buffer.
pub async fn read_with_progress<R>(stream: R, on_progress: Option<ProgressCallback>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buffer = String::new();
    for_each_line(stream, "stdout", |line| {
        trace!("stdout: {}", line);
        if let Some(callback) = &on_progress {
            if let Some(event) = parse_progress_line(line) {
                callback(&event);
            }
        }
        push_line(&mut buffer, line);
    })
    .await;
    buffer
}

fn push_line(buffer: &mut String, line: &str) {
    buffer.push_str(line);
    buffer.push('\n');
}

async fn for_each_line<R, F>(stream: R, label: &'static str, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(stream);
    let mut pending: Vec<u8> = Vec::new();
    // Last byte seen was `\r`, so a directly following `\n` ends nothing.
    let mut after_cr = false;
    let mut lines = 0usize;

    loop {
        let chunk = match reader.fill_buf().await {
            Ok([]) => break,
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(stream = label, error = %e, "error reading child output; treating as end of stream");
                break;
            }
        };
        let consumed = chunk.len();

        for &byte in chunk {
            match byte {
                b'\n' if after_cr => after_cr = false,
                b'\n' | b'\r' => {
                    emit_line(&mut pending, &mut on_line);
                    lines += 1;
                    after_cr = byte == b'\r';
                }
                _ => {
                    after_cr = false;
                    pending.push(byte);
                }
            }
        }
        reader.consume(consumed);
    }

    if !pending.is_empty() {
        emit_line(&mut pending, &mut on_line);
        lines += 1;
    }

    debug!(stream = label, lines, "output stream drained");
}

fn emit_line<F>(pending: &mut Vec<u8>, on_line: &mut F)
where
    F: FnMut(&str),
{
    on_line(&String::from_utf8_lossy(pending));
    pending.clear();
}
