// src/compiler/mod.rs
//! Replay-script compilation
//!
//! Three backends turn a recording into an automation script:
//!
//! - **Selenium**: Python, `selenium.webdriver`
//! - **Puppeteer**: Node.js, `puppeteer`
//! - **Playwright**: Node.js, `playwright` (chromium)
//!
//! All backends share one driver loop ([`compile`]): one statement block per
//! event in recording order, optional waits after configured event types,
//! and header/setup/teardown boilerplate that never alters the per-event
//! statements. Compilation is pure and never fails.

pub mod escape;
pub mod playwright;
pub mod puppeteer;
pub mod selenium;

use crate::recording::event::{EventData, EventType, InteractionEvent};
use crate::recording::timeline::InteractionRecording;
use serde::{Deserialize, Serialize};

pub use playwright::PlaywrightBackend;
pub use puppeteer::PuppeteerBackend;
pub use selenium::SeleniumBackend;

/// Script generation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptOptions {
    /// Leading comment block describing the recording
    pub include_header: bool,

    /// Imports, browser launch and teardown around the statements
    pub include_setup: bool,

    /// Insert a fixed wait after `wait_after` event types
    pub include_waits: bool,

    pub wait_ms: u64,
    pub wait_after: Vec<EventType>,

    /// Environment variable read in place of masked values
    pub masked_value_env: String,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            include_setup: true,
            include_waits: true,
            wait_ms: 500,
            wait_after: vec![EventType::Navigation, EventType::Click],
            masked_value_env: "RECORDER_MASKED_VALUE".to_string(),
        }
    }
}

impl ScriptOptions {
    /// Statements only: no header, setup or waits
    pub fn bare() -> Self {
        Self {
            include_header: false,
            include_setup: false,
            include_waits: false,
            ..Default::default()
        }
    }
}

/// Where an action is aimed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target<'a> {
    Css(&'a str),
    XPath(&'a str),
    Point(f64, f64),
}

/// Best available address for an event: CSS selector, then XPath, then
/// pointer coordinates
pub fn resolve_target(event: &InteractionEvent) -> Option<Target<'_>> {
    if let Some(element) = event.element.as_ref() {
        if let Some(css) = element.css_selector() {
            return Some(Target::Css(css));
        }
        if let Some(xpath) = element.xpath_expr() {
            return Some(Target::XPath(xpath));
        }
    }
    event.data.point().map(|(x, y)| Target::Point(x, y))
}

/// Element address only; coordinates are not enough for form controls
pub fn resolve_element(event: &InteractionEvent) -> Option<Target<'_>> {
    match resolve_target(event)? {
        Target::Point(..) => None,
        target => Some(target),
    }
}

/// Target-framework syntax
pub trait ScriptBackend {
    /// Human-readable target name used in the header
    fn name(&self) -> &'static str;

    /// Indentation for statements inside the setup scaffold
    fn indent(&self) -> &'static str;

    fn comment(&self, text: &str) -> String;

    /// Lines before the first statement
    fn setup(&self, recording: &InteractionRecording) -> Vec<String>;

    /// Lines after the last statement
    fn teardown(&self) -> Vec<String>;

    fn wait(&self, ms: u64) -> String;

    /// Statement block for one event, or None if the event has no replayable
    /// action (including address-requiring events with no address)
    fn statement(&self, event: &InteractionEvent, options: &ScriptOptions) -> Option<Vec<String>>;

    /// Placeholder for a scaffold with no statements
    fn empty_body(&self) -> Option<String> {
        None
    }
}

/// Compile a recording with the given backend
pub fn compile<B: ScriptBackend + ?Sized>(
    backend: &B,
    recording: &InteractionRecording,
    options: &ScriptOptions,
) -> String {
    let mut lines = Vec::new();

    if options.include_header {
        lines.extend(header_lines(backend, recording));
        lines.push(String::new());
    }
    if options.include_setup {
        lines.extend(backend.setup(recording));
    }

    let indent = if options.include_setup {
        backend.indent()
    } else {
        ""
    };

    let mut blocks = 0;
    for event in &recording.events {
        let Some(block) = backend.statement(event, options) else {
            continue;
        };
        blocks += 1;
        lines.extend(block.into_iter().map(|line| format!("{}{}", indent, line)));

        if options.include_waits && options.wait_after.contains(&event.event_type) {
            lines.push(format!("{}{}", indent, backend.wait(options.wait_ms)));
        }
    }

    if options.include_setup {
        if blocks == 0 {
            if let Some(placeholder) = backend.empty_body() {
                lines.push(format!("{}{}", indent, placeholder));
            }
        }
        lines.extend(backend.teardown());
    }

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

/// Comment block identifying the recording
fn header_lines<B: ScriptBackend + ?Sized>(backend: &B, recording: &InteractionRecording) -> Vec<String> {
    let recorded_at = chrono::DateTime::from_timestamp_millis(recording.start_time)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| recording.start_time.to_string());

    let mut header = vec![
        format!(
            "{} replay script generated by interaction-recorder {}",
            backend.name(),
            crate::VERSION
        ),
        format!(
            "Recording: {} ({})",
            escape::comment_text(&recording.name),
            recording.id
        ),
        format!("Recorded at: {}", recorded_at),
        format!("Events: {}", recording.events.len()),
    ];
    if let Some(duration) = recording.duration {
        header.push(format!("Duration: {} ms", duration));
    }
    if let Some(url) = recording.start_url.as_deref() {
        header.push(format!("Start URL: {}", escape::comment_text(url)));
    }

    header.iter().map(|line| backend.comment(line)).collect()
}

/// Start URL to open before replay, unless the first event already navigates
/// there
pub(crate) fn initial_url(recording: &InteractionRecording) -> Option<&str> {
    let start_url = recording.start_url.as_deref().filter(|u| !u.trim().is_empty())?;
    match recording.events.first().map(|event| &event.data) {
        Some(EventData::Navigation { url, .. }) if url == start_url => None,
        _ => Some(start_url),
    }
}

/// Checkpoint and annotation markers render as comments in every backend
pub(crate) fn marker_comment(event: &InteractionEvent) -> Option<String> {
    match &event.data {
        EventData::Checkpoint { name, .. } => {
            Some(format!("Checkpoint: {}", escape::comment_text(name)))
        }
        EventData::Annotation { text, .. } => Some(format!("Note: {}", escape::comment_text(text))),
        _ => None,
    }
}
