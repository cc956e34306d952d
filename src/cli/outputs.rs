//! Invocation outputs
//!
//! Emits the structured result either as `name=value` lines (appended to
//! the file named by `$GITHUB_OUTPUT` when running under a CI job, else
//! stdout) or as one JSON document.

use crate::cli::args::OutputFormat;
use crate::dispatcher::{OperationResult, OperationStatus};
use crate::error::{Error, Result};
use std::io::Write;

pub fn emit(result: &OperationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(result)
                .map_err(|e| Error::Config(format!("failed to encode result: {}", e)))?;
            println!("{}", rendered);
            Ok(())
        }
        OutputFormat::Text => emit_lines(result),
    }
}

fn emit_lines(result: &OperationResult) -> Result<()> {
    let mut lines = Vec::new();
    let status = match result.status {
        OperationStatus::Success => "success",
        OperationStatus::Failure => "failure",
    };
    lines.push(format!("operation-status={}", status));

    if let Some(digest) = &result.image_digest {
        lines.push(format!("image-digest={}", digest));
    }
    if let Some(namespaces) = &result.namespaces {
        let encoded = serde_json::to_string(namespaces)
            .map_err(|e| Error::Config(format!("failed to encode namespaces: {}", e)))?;
        lines.push(format!("namespaces={}", encoded));
    }
    if let Some(scan) = &result.scan {
        lines.push(format!("scan-result={}", scan.detail));
    }

    match std::env::var("GITHUB_OUTPUT") {
        Ok(path) if !path.is_empty() => {
            let mut file = std::fs::OpenOptions::new().append(true).create(true).open(path)?;
            for line in &lines {
                writeln!(file, "{}", line)?;
            }
        }
        _ => {
            for line in &lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
