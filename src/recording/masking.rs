// src/recording/masking.rs
//! Sensitive-field detection and redaction

use crate::recording::event::{ElementDescriptor, EventData};
use crate::recording::options::RecordingOptions;
use crate::utils::errors::{EngineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement for every redacted value
pub const REDACTION_TOKEN: &str = "[REDACTED]";

/// Field-name heuristics, matched case-insensitively against
/// name, id, type and class
static SENSITIVE_FIELD: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)password|passwd|passphrase|pwd|e-?mail|phone|mobile",
        r"|ssn|social[-_ ]?security",
        r"|credit[-_ ]?card|card[-_ ]?(number|num|no)|cc[-_ ]?(number|num)",
        r"|cvv|cvc|token|api[-_ ]?key|secret",
    ))
    .ok()
});

/// Short heuristics that only count as a whole word of the field name
/// (`userPin`, `pin-code`, `telNumber`) and never inside one (`spinner`)
const SENSITIVE_WORDS: [&str; 4] = ["pin", "pincode", "tel", "otp"];

/// Lowercased words of a field name, split on separators and camelCase
/// boundaries (`cardPIN` -> `card`, `pin`; `PINCode` -> `pin`, `code`)
fn field_words(field: &str) -> Vec<String> {
    let chars: Vec<char> = field.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Decides whether an event's target holds sensitive data
#[derive(Debug, Clone, Default)]
pub struct SensitiveDataMasker {
    heuristics_enabled: bool,
    extra: Vec<Regex>,
}

impl SensitiveDataMasker {
    pub fn new(heuristics_enabled: bool, extra: Vec<Regex>) -> Self {
        Self {
            heuristics_enabled,
            extra,
        }
    }

    /// Build from recording options; fails on an invalid extra pattern
    pub fn from_options(options: &RecordingOptions) -> Result<Self> {
        let extra = options
            .sensitive_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    EngineError::ConfigError(format!("Invalid sensitive pattern '{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(options.mask_sensitive_data, extra))
    }

    /// Whether values entered into `element` must be redacted
    pub fn is_sensitive(&self, element: Option<&ElementDescriptor>) -> bool {
        let Some(element) = element else {
            return false;
        };

        if element
            .element_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("password"))
        {
            return true;
        }

        let fields = [
            element.name.as_deref(),
            element.id.as_deref(),
            element.element_type.as_deref(),
            element.class_name.as_deref(),
        ];

        fields.iter().flatten().any(|field| {
            let heuristic = self.heuristics_enabled
                && (SENSITIVE_FIELD.as_ref().is_some_and(|re| re.is_match(field))
                    || field_words(field)
                        .iter()
                        .any(|word| SENSITIVE_WORDS.contains(&word.as_str())));
            heuristic || self.extra.iter().any(|re| re.is_match(field))
        })
    }

    /// Redact an event aimed at a sensitive element
    ///
    /// The element's value and text are redacted for every event type; key,
    /// input and change payloads are redacted as well. Returns the (possibly
    /// redacted) payload, element and whether masking happened.
    pub fn apply(
        &self,
        data: EventData,
        element: Option<ElementDescriptor>,
    ) -> (EventData, Option<ElementDescriptor>, bool) {
        if !self.is_sensitive(element.as_ref()) {
            return (data, element, false);
        }

        let element = element.map(|mut element| {
            Self::mask_element(&mut element);
            element
        });
        if !data.event_type().carries_sensitive_input() {
            return (data, element, true);
        }

        let token = || REDACTION_TOKEN.to_string();
        let data = match data {
            EventData::KeyDown { modifiers, .. } => EventData::KeyDown {
                key: token(),
                code: token(),
                modifiers,
            },
            EventData::KeyUp { modifiers, .. } => EventData::KeyUp {
                key: token(),
                code: token(),
                modifiers,
            },
            EventData::KeyPress { modifiers, .. } => EventData::KeyPress {
                key: token(),
                code: token(),
                modifiers,
            },
            EventData::Input { input_type, .. } => EventData::Input {
                value: token(),
                input_type,
            },
            EventData::Change { .. } => EventData::Change { value: token() },
            other => other,
        };

        (data, element, true)
    }

    /// Redact the value and text carried on the element itself
    pub fn mask_element(element: &mut ElementDescriptor) {
        if element.value.is_some() {
            element.value = Some(REDACTION_TOKEN.to_string());
        }
        if element.text.is_some() {
            element.text = Some(REDACTION_TOKEN.to_string());
        }
    }
}
