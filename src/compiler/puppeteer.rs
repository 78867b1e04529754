// src/compiler/puppeteer.rs
//! Puppeteer (Node.js) backend

use crate::compiler::escape::{js_string, number};
use crate::compiler::{
    initial_url, marker_comment, resolve_element, resolve_target, ScriptBackend, ScriptOptions,
    Target,
};
use crate::recording::event::{EventData, InteractionEvent, KeyModifiers, MouseButton};
use crate::recording::timeline::InteractionRecording;

#[derive(Debug, Clone, Copy, Default)]
pub struct PuppeteerBackend;

/// Selector string understood by `page.click`, `page.hover` and friends
fn selector(target: Target<'_>) -> Option<String> {
    match target {
        Target::Css(css) => Some(js_string(css)),
        Target::XPath(xpath) => Some(js_string(&format!("::-p-xpath({})", xpath))),
        Target::Point(..) => None,
    }
}

fn button_name(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "left",
        MouseButton::Middle => "middle",
        MouseButton::Right => "right",
        MouseButton::Back => "back",
        MouseButton::Forward => "forward",
    }
}

/// `{ button: 'right', clickCount: 2 }`, or nothing for a plain left click
fn click_options(button: MouseButton, click_count: u32) -> Option<String> {
    let mut parts = Vec::new();
    if button != MouseButton::Left {
        parts.push(format!("button: '{}'", button_name(button)));
    }
    if click_count > 1 {
        parts.push(format!("clickCount: {}", click_count));
    }
    (!parts.is_empty()).then(|| format!("{{ {} }}", parts.join(", ")))
}

fn modifier_keys(modifiers: &KeyModifiers) -> Vec<&'static str> {
    let mut held = Vec::new();
    if modifiers.ctrl {
        held.push("Control");
    }
    if modifiers.alt {
        held.push("Alt");
    }
    if modifiers.shift {
        held.push("Shift");
    }
    if modifiers.meta {
        held.push("Meta");
    }
    held
}

impl PuppeteerBackend {
    fn value_expr(event: &InteractionEvent, value: &str, options: &ScriptOptions) -> String {
        if event.masked {
            format!("process.env[{}] || ''", js_string(&options.masked_value_env))
        } else {
            js_string(value)
        }
    }

    fn click(target: Target<'_>, button: MouseButton, click_count: u32) -> Option<String> {
        let options = click_options(button, click_count)
            .map(|options| format!(", {}", options))
            .unwrap_or_default();
        if let Target::Point(x, y) = target {
            return Some(format!(
                "await page.mouse.click({}, {}{});",
                number(x),
                number(y),
                options
            ));
        }
        Some(format!("await page.click({}{});", selector(target)?, options))
    }

    fn key_press(event: &InteractionEvent, key: &str, modifiers: &KeyModifiers) -> Vec<String> {
        if event.masked {
            return vec!["// Masked key press omitted".to_string()];
        }
        let held = modifier_keys(modifiers);
        let mut lines: Vec<String> = held
            .iter()
            .map(|m| format!("await page.keyboard.down('{}');", m))
            .collect();
        lines.push(format!("await page.keyboard.press({});", js_string(key)));
        lines.extend(
            held.iter()
                .rev()
                .map(|m| format!("await page.keyboard.up('{}');", m)),
        );
        lines
    }
}

impl ScriptBackend for PuppeteerBackend {
    fn name(&self) -> &'static str {
        "Puppeteer"
    }

    fn indent(&self) -> &'static str {
        "  "
    }

    fn comment(&self, text: &str) -> String {
        format!("// {}", text)
    }

    fn setup(&self, recording: &InteractionRecording) -> Vec<String> {
        let mut lines = vec![
            "const puppeteer = require('puppeteer');".to_string(),
            String::new(),
            "(async () => {".to_string(),
            "  const browser = await puppeteer.launch({ headless: false });".to_string(),
            "  const page = await browser.newPage();".to_string(),
        ];
        if let Some(url) = initial_url(recording) {
            lines.push(format!("  await page.goto({});", js_string(url)));
        }
        lines
    }

    fn teardown(&self) -> Vec<String> {
        vec![
            String::new(),
            "  await browser.close();".to_string(),
            "})();".to_string(),
        ]
    }

    fn wait(&self, ms: u64) -> String {
        format!("await new Promise((resolve) => setTimeout(resolve, {}));", ms)
    }

    fn statement(&self, event: &InteractionEvent, options: &ScriptOptions) -> Option<Vec<String>> {
        if let Some(comment) = marker_comment(event) {
            return Some(vec![self.comment(&comment)]);
        }

        let line = match &event.data {
            EventData::Navigation { url, .. } => format!("await page.goto({});", js_string(url)),
            EventData::Click {
                button,
                click_count,
                ..
            } => Self::click(resolve_target(event)?, *button, *click_count)?,
            EventData::Input { value, .. } | EventData::Change { value } => {
                let selector = selector(resolve_element(event)?)?;
                format!(
                    "await page.locator({}).fill({});",
                    selector,
                    Self::value_expr(event, value, options)
                )
            }
            EventData::KeyPress { key, modifiers, .. } => {
                return Some(Self::key_press(event, key, modifiers));
            }
            EventData::Scroll { scroll_x, scroll_y } => format!(
                "await page.evaluate(() => window.scrollTo({}, {}));",
                number(*scroll_x),
                number(*scroll_y)
            ),
            EventData::Wheel {
                delta_x, delta_y, ..
            } => format!(
                "await page.mouse.wheel({{ deltaX: {}, deltaY: {} }});",
                number(*delta_x),
                number(*delta_y)
            ),
            EventData::Hover { .. } => match resolve_target(event)? {
                Target::Point(x, y) => {
                    format!("await page.mouse.move({}, {});", number(x), number(y))
                }
                target => format!("await page.hover({});", selector(target)?),
            },
            EventData::Select { value, .. } => format!(
                "await page.select({}, {});",
                selector(resolve_element(event)?)?,
                js_string(value)
            ),
            EventData::Resize { width, height } => format!(
                "await page.setViewport({{ width: {}, height: {} }});",
                width, height
            ),
            EventData::MouseMove { .. }
            | EventData::MouseDown { .. }
            | EventData::MouseUp { .. }
            | EventData::KeyDown { .. }
            | EventData::KeyUp { .. }
            | EventData::Focus
            | EventData::Blur
            | EventData::Load { .. }
            | EventData::VisibilityChange { .. }
            | EventData::Checkpoint { .. }
            | EventData::Annotation { .. } => return None,
        };

        Some(vec![line])
    }
}
