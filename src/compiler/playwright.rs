// src/compiler/playwright.rs
//! Playwright (Node.js, chromium) backend

use crate::compiler::escape::{js_string, number};
use crate::compiler::{
    initial_url, marker_comment, resolve_element, resolve_target, ScriptBackend, ScriptOptions,
    Target,
};
use crate::recording::event::{EventData, InteractionEvent, KeyModifiers, MouseButton};
use crate::recording::timeline::InteractionRecording;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaywrightBackend;

impl PlaywrightBackend {
    fn locator(target: Target<'_>) -> Option<String> {
        match target {
            Target::Css(css) => Some(format!("page.locator({})", js_string(css))),
            Target::XPath(xpath) => Some(format!(
                "page.locator({})",
                js_string(&format!("xpath={}", xpath))
            )),
            Target::Point(..) => None,
        }
    }

    fn click(target: Target<'_>, button: MouseButton, click_count: u32) -> Option<String> {
        let button = match button {
            MouseButton::Right => Some("right"),
            MouseButton::Middle => Some("middle"),
            _ => None,
        };

        if let Target::Point(x, y) = target {
            let mut options = Vec::new();
            if let Some(button) = button {
                options.push(format!("button: '{}'", button));
            }
            if click_count > 1 {
                options.push(format!("clickCount: {}", click_count));
            }
            let options = if options.is_empty() {
                String::new()
            } else {
                format!(", {{ {} }}", options.join(", "))
            };
            return Some(format!(
                "await page.mouse.click({}, {}{});",
                number(x),
                number(y),
                options
            ));
        }

        let locator = Self::locator(target)?;
        let line = match (button, click_count) {
            (Some(button), _) => format!("await {}.click({{ button: '{}' }});", locator, button),
            (None, n) if n >= 2 => format!("await {}.dblclick();", locator),
            (None, _) => format!("await {}.click();", locator),
        };
        Some(line)
    }

    fn value_expr(event: &InteractionEvent, value: &str, options: &ScriptOptions) -> String {
        if event.masked {
            format!("process.env[{}] || ''", js_string(&options.masked_value_env))
        } else {
            js_string(value)
        }
    }

    /// `Control+Shift+a` style chord
    fn chord(key: &str, modifiers: &KeyModifiers) -> String {
        let mut parts = Vec::new();
        if modifiers.ctrl {
            parts.push("Control");
        }
        if modifiers.alt {
            parts.push("Alt");
        }
        if modifiers.shift {
            parts.push("Shift");
        }
        if modifiers.meta {
            parts.push("Meta");
        }
        parts.push(key);
        parts.join("+")
    }
}

impl ScriptBackend for PlaywrightBackend {
    fn name(&self) -> &'static str {
        "Playwright"
    }

    fn indent(&self) -> &'static str {
        "  "
    }

    fn comment(&self, text: &str) -> String {
        format!("// {}", text)
    }

    fn setup(&self, recording: &InteractionRecording) -> Vec<String> {
        let mut lines = vec![
            "const { chromium } = require('playwright');".to_string(),
            String::new(),
            "(async () => {".to_string(),
            "  const browser = await chromium.launch({ headless: false });".to_string(),
            "  const context = await browser.newContext();".to_string(),
            "  const page = await context.newPage();".to_string(),
        ];
        if let Some(url) = initial_url(recording) {
            lines.push(format!("  await page.goto({});", js_string(url)));
        }
        lines
    }

    fn teardown(&self) -> Vec<String> {
        vec![
            String::new(),
            "  await context.close();".to_string(),
            "  await browser.close();".to_string(),
            "})();".to_string(),
        ]
    }

    fn wait(&self, ms: u64) -> String {
        format!("await page.waitForTimeout({});", ms)
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
            EventData::Input { value, .. } | EventData::Change { value } => format!(
                "await {}.fill({});",
                Self::locator(resolve_element(event)?)?,
                Self::value_expr(event, value, options)
            ),
            EventData::KeyPress { key, modifiers, .. } => {
                if event.masked {
                    "// Masked key press omitted".to_string()
                } else {
                    format!(
                        "await page.keyboard.press({});",
                        js_string(&Self::chord(key, modifiers))
                    )
                }
            }
            EventData::Scroll { scroll_x, scroll_y } => format!(
                "await page.evaluate(() => window.scrollTo({}, {}));",
                number(*scroll_x),
                number(*scroll_y)
            ),
            EventData::Wheel {
                delta_x, delta_y, ..
            } => format!(
                "await page.mouse.wheel({}, {});",
                number(*delta_x),
                number(*delta_y)
            ),
            EventData::Hover { .. } => match resolve_target(event)? {
                Target::Point(x, y) => {
                    format!("await page.mouse.move({}, {});", number(x), number(y))
                }
                target => format!("await {}.hover();", Self::locator(target)?),
            },
            EventData::Select { value, .. } => format!(
                "await {}.selectOption({});",
                Self::locator(resolve_element(event)?)?,
                js_string(value)
            ),
            EventData::Resize { width, height } => format!(
                "await page.setViewportSize({{ width: {}, height: {} }});",
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
