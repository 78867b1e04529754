// src/recording/exporter.rs
//! Export recordings to JSON or replay scripts
//!
//! Supports:
//! - JSON (lossless, re-importable)
//! - Selenium (Python)
//! - Puppeteer (Node.js)
//! - Playwright (Node.js)
//!
//! Exports read a snapshot and never mutate the recording.

use crate::compiler::{self, PlaywrightBackend, PuppeteerBackend, ScriptOptions, SeleniumBackend};
use crate::observability::names;
use crate::recording::timeline::InteractionRecording;
use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Serialized recording
    Json,

    /// Python script for Selenium WebDriver
    Selenium,

    /// Node.js script for Puppeteer
    Puppeteer,

    /// Node.js script for Playwright
    Playwright,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Selenium => "selenium",
            ExportFormat::Puppeteer => "puppeteer",
            ExportFormat::Playwright => "playwright",
        }
    }

    /// File extension of the produced artifact
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Selenium => "py",
            ExportFormat::Puppeteer | ExportFormat::Playwright => "js",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "selenium" | "python" => Ok(ExportFormat::Selenium),
            "puppeteer" => Ok(ExportFormat::Puppeteer),
            "playwright" => Ok(ExportFormat::Playwright),
            other => Err(EngineError::ExportFailed(format!("Unknown export format: {}", other))),
        }
    }
}

/// Options for `Recorder::export_as_json`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonExportOptions {
    pub pretty: bool,
}

/// Produced artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    pub format: ExportFormat,
    pub data: String,

    /// Size of `data` in bytes
    pub size: usize,

    /// Suggested file name
    pub filename: String,
}

/// Exporter for recordings
#[derive(Debug, Clone)]
pub struct Exporter {
    format: ExportFormat,
    script_options: ScriptOptions,
    pretty: bool,
}

impl Exporter {
    /// Create a new exporter
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            script_options: ScriptOptions::default(),
            pretty: false,
        }
    }

    pub fn with_script_options(mut self, options: ScriptOptions) -> Self {
        self.script_options = options;
        self
    }

    /// Pretty-print JSON output
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Export a recording
    pub fn export(&self, recording: &InteractionRecording) -> Result<ExportResult> {
        debug!(
            "Exporting recording {} ({} events) as {}",
            recording.id,
            recording.events.len(),
            self.format
        );

        let data = match self.format {
            ExportFormat::Json => recording
                .to_json(self.pretty)
                .map_err(|e| EngineError::ExportFailed(format!("JSON serialization error: {}", e)))?,
            ExportFormat::Selenium => {
                compiler::compile(&SeleniumBackend, recording, &self.script_options)
            }
            ExportFormat::Puppeteer => {
                compiler::compile(&PuppeteerBackend, recording, &self.script_options)
            }
            ExportFormat::Playwright => {
                compiler::compile(&PlaywrightBackend, recording, &self.script_options)
            }
        };

        metrics::histogram!(names::EXPORT_BYTES, "format" => self.format.as_str())
            .record(data.len() as f64);

        Ok(ExportResult {
            format: self.format,
            size: data.len(),
            filename: self.filename(recording),
            data,
        })
    }

    /// Export a serialized recording, validating its structure first
    pub fn export_serialized(&self, json: &str) -> Result<ExportResult> {
        let recording = InteractionRecording::from_json(json)?;
        self.export(&recording)
    }

    /// `{slug}-{id suffix}.{ext}`
    fn filename(&self, recording: &InteractionRecording) -> String {
        let slug = slugify(&recording.name);
        let id: Vec<char> = recording.id.chars().collect();
        let suffix = id[id.len().saturating_sub(8)..]
            .iter()
            .collect::<String>()
            .to_ascii_lowercase();
        let slug = if slug.is_empty() {
            "recording".to_string()
        } else {
            slug
        };
        format!("{}-{}.{}", slug, suffix, self.format.extension())
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= 48 {
            break;
        }
    }
    slug
}
