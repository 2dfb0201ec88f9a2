//! Localizable messages.
//!
//! A message is an opaque catalog key plus named arguments. Translation
//! happens on the client; the only server-side rendering is the
//! default-locale catalog below, kept for callers that still want a plain
//! string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defaults::TODO_I18N_MESSAGE_ID;

/// Named substitution arguments of a message.
pub type MessageArguments = Map<String, Value>;

/// A catalog key plus its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct I18nMessage {
    pub id: String,
    #[serde(default)]
    pub arguments: MessageArguments,
}

impl I18nMessage {
    pub fn new(id: impl Into<String>, arguments: MessageArguments) -> Self {
        Self {
            id: id.into(),
            arguments,
        }
    }

    /// A message without arguments.
    pub fn bare(id: impl Into<String>) -> Self {
        Self::new(id, MessageArguments::new())
    }

    /// Wrap text that was never put through the catalog.
    pub fn todo_i18n(text: impl Into<String>) -> Self {
        let mut arguments = MessageArguments::new();
        arguments.insert("text".to_string(), Value::String(text.into()));
        Self::new(TODO_I18N_MESSAGE_ID, arguments)
    }

    /// Builder-style argument insertion.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

/// English templates for every message id this workspace emits.
const DEFAULT_CATALOG: &[(&str, &str)] = &[
    (
        "kernel.process_result.truncated",
        "Truncated output from {old_number} rows to {new_number}",
    ),
    (
        "kernel.process_result.wrong_types",
        "There is a bug in this module: expected {expected_type} return type, got {type}",
    ),
    (
        "kernel.process_result.big_tuple",
        "There is a bug in this module: expected 2-tuple or 3-tuple return value; got {length}-tuple",
    ),
    (
        "kernel.process_result.invalid_return_type",
        "There is a bug in this module: invalid return type {type}",
    ),
    (
        "kernel.prompting.wrong_column_type.should_be_text",
        "{columns} column(s) must be converted to Text.",
    ),
    (
        "kernel.prompting.wrong_column_type.general",
        "{columns} column(s) must be converted from {found_type} to {best_wanted_type}.",
    ),
    (
        "kernel.prompting.wrong_column_type.quick_fix.should_be_text",
        "Convert to Text.",
    ),
    (
        "kernel.prompting.wrong_column_type.quick_fix.general",
        "Convert {found_type} to {best_wanted_type}.",
    ),
];

// Only the default locale has a catalog; every other locale falls back to it.
fn catalog_template(_locale: &str, id: &str) -> Option<&'static str> {
    DEFAULT_CATALOG
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, template)| *template)
}

/// Render `message` as a plain string.
///
/// Unknown ids render as the id itself so a missing catalog entry is
/// visible instead of silently empty.
pub fn translate_i18n_message(message: &I18nMessage, locale: &str) -> String {
    if message.id == TODO_I18N_MESSAGE_ID {
        return match message.arguments.get("text") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
    }

    match catalog_template(locale, &message.id) {
        Some(template) => substitute(template, &message.arguments),
        None => message.id.clone(),
    }
}

fn substitute(template: &str, arguments: &MessageArguments) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = after[..close].trim();
                match arguments.get(name) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(&after[..close]);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_i18n_renders_text() {
        let message = I18nMessage::todo_i18n("failed");
        assert_eq!(message.id, "TODO_i18n");
        assert_eq!(translate_i18n_message(&message, "en"), "failed");
    }

    #[test]
    fn test_catalog_substitution() {
        let message = I18nMessage::bare("kernel.process_result.truncated")
            .with_arg("old_number", 12)
            .with_arg("new_number", 10);
        assert_eq!(
            translate_i18n_message(&message, "en"),
            "Truncated output from 12 rows to 10"
        );
    }

    #[test]
    fn test_missing_argument_left_in_place() {
        let message = I18nMessage::bare("kernel.process_result.invalid_return_type");
        assert_eq!(
            translate_i18n_message(&message, "en"),
            "There is a bug in this module: invalid return type {type}"
        );
    }

    #[test]
    fn test_unknown_id_renders_id() {
        let message = I18nMessage::bare("nope.nothing");
        assert_eq!(translate_i18n_message(&message, "en"), "nope.nothing");
    }

    #[test]
    fn test_other_locale_falls_back() {
        let message = I18nMessage::bare("kernel.process_result.big_tuple").with_arg("length", 4);
        assert_eq!(
            translate_i18n_message(&message, "el"),
            "There is a bug in this module: expected 2-tuple or 3-tuple return value; got 4-tuple"
        );
    }
}
