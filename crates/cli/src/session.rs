//! JSON-lines session: one request per input line, one response per output line.

use crate::tools::{ToolRequest, Workspace};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::{BufRead, Write};

/// Serve requests until the input ends. Returns the number of requests handled.
pub fn run<R: BufRead, W: Write>(workspace: &Workspace, input: R, mut output: W) -> Result<usize> {
    let mut handled = 0;
    for line in input.lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = respond_line(workspace, &line);
        serde_json::to_writer(&mut output, &response).context("Failed to write response")?;
        writeln!(output)?;
        output.flush()?;
        handled += 1;
    }
    log::info!("Session ended after {} requests", handled);
    Ok(handled)
}

fn respond_line(workspace: &Workspace, line: &str) -> Value {
    match serde_json::from_str::<ToolRequest>(line) {
        Ok(request) => {
            log::debug!("Session request: {:?}", request);
            workspace.respond(request)
        }
        Err(err) => {
            log::warn!("Unreadable request: {}", err);
            json!({
                "error": {
                    "type": "invalid_request",
                    "message": err.to_string(),
                },
            })
        }
    }
}
