//! JSON summary output
//!
//! Writes the configuration and every completed phase of a run to a single
//! JSON document for programmatic consumption.

use crate::config::Config;
use crate::coordinator::RunSummary;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level JSON document
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub tool: &'static str,
    pub version: &'static str,
    pub timestamp_unix: u64,
    pub config: &'a Config,
    pub result: &'a RunSummary,
}

impl<'a> JsonReport<'a> {
    pub fn new(config: &'a Config, result: &'a RunSummary) -> Self {
        let timestamp_unix = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            timestamp_unix,
            config,
            result,
        }
    }
}

/// Write the report to `path`, pretty-printed
pub fn write_json_output(path: &Path, report: &JsonReport<'_>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON output: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("Failed to write JSON output: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write JSON output: {}", path.display()))?;
    Ok(())
}
