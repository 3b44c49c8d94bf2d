use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use futures::StreamExt;
use galay_domain::{FrameEvent, StreamFrame};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::cli::ProbeArgs;

/// POSTs the body and prints `status=… content_type=…`, then every received
/// line prefixed with the elapsed seconds, until a `done` or `error` frame.
pub async fn probe<W: Write>(args: &ProbeArgs, out: &mut W) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs_f64(args.timeout.max(0.0)))
        .build()
        .context("Failed to build HTTP client")?;

    let start = Instant::now();
    let response = client
        .post(args.url.clone())
        .header(CONTENT_TYPE, "application/json")
        .body(args.body.clone())
        .send()
        .await
        .with_context(|| format!("request_failed POST {}", args.url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if !body.is_empty() {
            writeln!(out, "{body}")?;
        }
        bail!(
            "http_error={} reason={}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    writeln!(out, "status={} content_type={content_type}", status.as_u16())?;

    let mut body = response.bytes_stream();
    let mut pending: Vec<u8> = Vec::new();
    while let Some(chunk) = body.next().await {
        pending.extend_from_slice(&chunk.context("Failed to read stream")?);
        while let Some(end) = pending.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\r', '\n']);
            writeln!(out, "{:7.3}s {line}", start.elapsed().as_secs_f64())?;
            if is_terminal_line(line) {
                debug!("Terminal frame seen, stopping probe");
                return Ok(());
            }
        }
    }

    if !pending.is_empty() {
        let line = String::from_utf8_lossy(&pending);
        writeln!(out, "{:7.3}s {}", start.elapsed().as_secs_f64(), line.trim_end_matches('\r'))?;
    }
    Ok(())
}

/// A `data:` line carrying a `done` or `error` frame.
fn is_terminal_line(line: &str) -> bool {
    let Some(payload) = line.strip_prefix("data:").map(str::trim) else {
        return false;
    };
    StreamFrame::parse(payload)
        .is_some_and(|frame| frame.events().iter().any(FrameEvent::is_terminal))
}
