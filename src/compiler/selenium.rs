// src/compiler/selenium.rs
//! Selenium WebDriver (Python) backend

use crate::compiler::escape::{comment_text, number, py_string};
use crate::compiler::{
    initial_url, marker_comment, resolve_element, resolve_target, ScriptBackend, ScriptOptions,
    Target,
};
use crate::recording::event::{EventData, InteractionEvent, KeyModifiers, MouseButton};
use crate::recording::timeline::InteractionRecording;

/// Emits a `run(driver)` function using `selenium.webdriver`
#[derive(Debug, Clone, Copy, Default)]
pub struct SeleniumBackend;

impl SeleniumBackend {
    /// Python expression evaluating to the target WebElement
    fn element(target: Target<'_>) -> String {
        match target {
            Target::Css(css) => format!("driver.find_element(By.CSS_SELECTOR, {})", py_string(css)),
            Target::XPath(xpath) => format!("driver.find_element(By.XPATH, {})", py_string(xpath)),
            Target::Point(x, y) => format!(
                "driver.execute_script(\"return document.elementFromPoint(arguments[0], arguments[1])\", {}, {})",
                number(x),
                number(y)
            ),
        }
    }

    fn click(target: Target<'_>, button: MouseButton, click_count: u32) -> String {
        let element = Self::element(target);
        match (button, click_count) {
            (MouseButton::Right, _) => {
                format!("ActionChains(driver).context_click({}).perform()", element)
            }
            (_, n) if n >= 2 => format!("ActionChains(driver).double_click({}).perform()", element),
            _ => format!("{}.click()", element),
        }
    }

    fn value_expr(event: &InteractionEvent, value: &str, options: &ScriptOptions) -> String {
        if event.masked {
            format!("os.environ.get({}, \"\")", py_string(&options.masked_value_env))
        } else {
            py_string(value)
        }
    }

    fn fill(event: &InteractionEvent, value: &str, options: &ScriptOptions) -> Option<Vec<String>> {
        let element = Self::element(resolve_element(event)?);
        Some(vec![
            format!("element = {}", element),
            "element.clear()".to_string(),
            format!("element.send_keys({})", Self::value_expr(event, value, options)),
        ])
    }

    fn key_press(event: &InteractionEvent, key: &str, modifiers: &KeyModifiers) -> Vec<String> {
        if event.masked {
            return vec!["# Masked key press omitted".to_string()];
        }
        let Some(key) = key_literal(key) else {
            return vec![format!("# Unsupported key: {}", comment_text(key))];
        };

        let held = held_modifiers(modifiers);
        let mut chain = String::from("ActionChains(driver)");
        for modifier in &held {
            chain.push_str(&format!(".key_down({})", modifier));
        }
        chain.push_str(&format!(".send_keys({})", key));
        for modifier in held.iter().rev() {
            chain.push_str(&format!(".key_up({})", modifier));
        }
        chain.push_str(".perform()");
        vec![chain]
    }
}

/// Python expression for a DOM key value
fn key_literal(key: &str) -> Option<String> {
    let named = match key {
        "Enter" => "ENTER",
        "Tab" => "TAB",
        "Escape" | "Esc" => "ESCAPE",
        "Backspace" => "BACKSPACE",
        "Delete" => "DELETE",
        "ArrowUp" => "ARROW_UP",
        "ArrowDown" => "ARROW_DOWN",
        "ArrowLeft" => "ARROW_LEFT",
        "ArrowRight" => "ARROW_RIGHT",
        "Home" => "HOME",
        "End" => "END",
        "PageUp" => "PAGE_UP",
        "PageDown" => "PAGE_DOWN",
        "Insert" => "INSERT",
        " " | "Space" | "Spacebar" => "SPACE",
        "Shift" => "SHIFT",
        "Control" => "CONTROL",
        "Alt" => "ALT",
        "Meta" => "META",
        "F1" => "F1",
        "F2" => "F2",
        "F3" => "F3",
        "F4" => "F4",
        "F5" => "F5",
        "F6" => "F6",
        "F7" => "F7",
        "F8" => "F8",
        "F9" => "F9",
        "F10" => "F10",
        "F11" => "F11",
        "F12" => "F12",
        _ if key.chars().count() == 1 => return Some(py_string(key)),
        _ => return None,
    };
    Some(format!("Keys.{}", named))
}

fn held_modifiers(modifiers: &KeyModifiers) -> Vec<&'static str> {
    let mut held = Vec::new();
    if modifiers.ctrl {
        held.push("Keys.CONTROL");
    }
    if modifiers.alt {
        held.push("Keys.ALT");
    }
    if modifiers.shift {
        held.push("Keys.SHIFT");
    }
    if modifiers.meta {
        held.push("Keys.META");
    }
    held
}

impl ScriptBackend for SeleniumBackend {
    fn name(&self) -> &'static str {
        "Selenium (Python)"
    }

    fn indent(&self) -> &'static str {
        "    "
    }

    fn comment(&self, text: &str) -> String {
        format!("# {}", text)
    }

    fn setup(&self, recording: &InteractionRecording) -> Vec<String> {
        let mut lines = vec![
            "import os".to_string(),
            "import time".to_string(),
            String::new(),
            "from selenium import webdriver".to_string(),
            "from selenium.webdriver.common.action_chains import ActionChains".to_string(),
            "from selenium.webdriver.common.by import By".to_string(),
            "from selenium.webdriver.common.keys import Keys".to_string(),
            "from selenium.webdriver.support.ui import Select".to_string(),
            String::new(),
            String::new(),
            "def run(driver):".to_string(),
        ];
        if let Some(url) = initial_url(recording) {
            lines.push(format!("{}driver.get({})", self.indent(), py_string(url)));
        }
        lines
    }

    fn teardown(&self) -> Vec<String> {
        vec![
            String::new(),
            String::new(),
            "if __name__ == \"__main__\":".to_string(),
            "    driver = webdriver.Chrome()".to_string(),
            "    try:".to_string(),
            "        run(driver)".to_string(),
            "    finally:".to_string(),
            "        driver.quit()".to_string(),
        ]
    }

    fn wait(&self, ms: u64) -> String {
        format!("time.sleep({})", number(ms as f64 / 1000.0))
    }

    fn empty_body(&self) -> Option<String> {
        Some("pass".to_string())
    }

    fn statement(&self, event: &InteractionEvent, options: &ScriptOptions) -> Option<Vec<String>> {
        if let Some(comment) = marker_comment(event) {
            return Some(vec![self.comment(&comment)]);
        }

        match &event.data {
            EventData::Navigation { url, .. } => Some(vec![format!("driver.get({})", py_string(url))]),
            EventData::Click {
                button,
                click_count,
                ..
            } => {
                let target = resolve_target(event)?;
                Some(vec![Self::click(target, *button, *click_count)])
            }
            EventData::Input { value, .. } | EventData::Change { value } => {
                Self::fill(event, value, options)
            }
            EventData::KeyPress { key, modifiers, .. } => {
                Some(Self::key_press(event, key, modifiers))
            }
            EventData::Scroll { scroll_x, scroll_y } => Some(vec![format!(
                "driver.execute_script(\"window.scrollTo(arguments[0], arguments[1])\", {}, {})",
                number(*scroll_x),
                number(*scroll_y)
            )]),
            EventData::Wheel {
                delta_x, delta_y, ..
            } => Some(vec![format!(
                "driver.execute_script(\"window.scrollBy(arguments[0], arguments[1])\", {}, {})",
                number(*delta_x),
                number(*delta_y)
            )]),
            EventData::Hover { .. } => Some(vec![format!(
                "ActionChains(driver).move_to_element({}).perform()",
                Self::element(resolve_target(event)?)
            )]),
            EventData::Select { value, .. } => {
                let element = Self::element(resolve_element(event)?);
                Some(vec![format!(
                    "Select({}).select_by_value({})",
                    element,
                    py_string(value)
                )])
            }
            EventData::Resize { width, height } => {
                Some(vec![format!("driver.set_window_size({}, {})", width, height)])
            }
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
            | EventData::Annotation { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::recording::event::ElementDescriptor;
    use crate::recording::options::RecordingOptions;

    fn event(data: EventData, element: Option<ElementDescriptor>) -> InteractionEvent {
        InteractionEvent::new(data, 0, 0, 0).with_element(element)
    }

    fn statement(event: &InteractionEvent) -> Option<Vec<String>> {
        SeleniumBackend.statement(event, &ScriptOptions::default())
    }

    #[test]
    fn test_click_variants() {
        let submit = Some(ElementDescriptor::with_selector("#submit"));
        let single = event(
            EventData::Click {
                x: None,
                y: None,
                button: MouseButton::Left,
                click_count: 1,
            },
            submit.clone(),
        );
        assert_eq!(
            statement(&single).unwrap(),
            vec![r##"driver.find_element(By.CSS_SELECTOR, "#submit").click()"##]
        );

        let double = event(
            EventData::Click {
                x: None,
                y: None,
                button: MouseButton::Left,
                click_count: 2,
            },
            submit,
        );
        assert!(statement(&double).unwrap()[0].contains("double_click"));

        let point = event(
            EventData::Click {
                x: Some(10.0),
                y: Some(20.5),
                button: MouseButton::Left,
                click_count: 1,
            },
            None,
        );
        assert_eq!(
            statement(&point).unwrap(),
            vec![r#"driver.execute_script("return document.elementFromPoint(arguments[0], arguments[1])", 10, 20.5).click()"#]
        );
    }

    #[test]
    fn test_key_press_with_modifiers() {
        let press = event(
            EventData::KeyPress {
                key: "a".to_string(),
                code: "KeyA".to_string(),
                modifiers: KeyModifiers {
                    ctrl: true,
                    ..Default::default()
                },
            },
            None,
        );
        assert_eq!(
            statement(&press).unwrap(),
            vec![r#"ActionChains(driver).key_down(Keys.CONTROL).send_keys("a").key_up(Keys.CONTROL).perform()"#]
        );
    }

    #[test]
    fn test_select_needs_element_address() {
        let select = event(
            EventData::Select {
                value: "de".to_string(),
                selected_text: None,
                selected_index: None,
            },
            None,
        );
        assert!(statement(&select).is_none());
    }

    #[test]
    fn test_empty_scaffold_is_valid_python() {
        let recording = InteractionRecording::new("empty", 0, RecordingOptions::default());
        let script = compile(&SeleniumBackend, &recording, &ScriptOptions::default());
        assert!(script.contains("def run(driver):\n    pass\n"));
        assert!(script.contains("driver.quit()"));
    }
}
