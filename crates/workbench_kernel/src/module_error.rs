//! Coercion of module-supplied messages and errors.

use serde_json::{Map, Value};
use workbench_protocol::{self as protocol, I18nMessage};

use crate::error::{KernelError, KernelResult};
use crate::quick_fix::QuickFix;
use crate::value::ModuleValue;

/// One error (or warning) with its quick fixes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResultError {
    pub message: I18nMessage,
    pub quick_fixes: Vec<QuickFix>,
}

impl ProcessResultError {
    pub fn new(message: I18nMessage, quick_fixes: Vec<QuickFix>) -> Self {
        Self {
            message,
            quick_fixes,
        }
    }

    pub fn to_arrow(&self) -> KernelResult<protocol::RenderError> {
        let quick_fixes = self
            .quick_fixes
            .iter()
            .map(QuickFix::to_arrow)
            .collect::<KernelResult<Vec<_>>>()?;
        Ok(protocol::RenderError::new(self.message.clone(), quick_fixes))
    }

    pub fn from_arrow(wire: &protocol::RenderError) -> Self {
        Self::new(
            wire.message.clone(),
            wire.quick_fixes.iter().map(QuickFix::from_arrow).collect(),
        )
    }
}

impl From<I18nMessage> for ProcessResultError {
    fn from(message: I18nMessage) -> Self {
        Self::new(message, Vec::new())
    }
}

/// A string, or an `(id, arguments)` pair.
pub fn coerce_i18n_message(value: &ModuleValue) -> KernelResult<I18nMessage> {
    match value {
        ModuleValue::Str(text) => Ok(I18nMessage::todo_i18n(text.clone())),
        ModuleValue::Tuple(items) => {
            let [id, arguments] = items.as_slice() else {
                return Err(KernelError::value_error(format!(
                    "This tuple cannot be coerced to I18nMessage: {}",
                    value
                )));
            };
            let id = id.as_str().ok_or_else(|| {
                KernelError::type_error(format!("Message ID must be string, got {}", id))
            })?;
            let arguments = match arguments {
                // A dict always serializes to an object.
                ModuleValue::Dict(_) => match arguments.to_json()? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                },
                other => {
                    return Err(KernelError::type_error(format!(
                        "Message arguments must be a dict, got {}",
                        other
                    )))
                }
            };
            Ok(I18nMessage::new(id, arguments))
        }
        other => Err(KernelError::type_error(format!(
            "{} is of type {}, which cannot be coerced to I18nMessage",
            other,
            other.type_name()
        ))),
    }
}

/// Normalize a module error into a list of entries.
///
/// With `allow_nesting`, falsy values mean "no errors" and a list is
/// coerced element by element (without further nesting).
pub fn coerce_error(value: &ModuleValue, allow_nesting: bool) -> KernelResult<Vec<ProcessResultError>> {
    if allow_nesting && !value.is_truthy() {
        return Ok(Vec::new());
    }

    match value {
        ModuleValue::Str(_) | ModuleValue::Tuple(_) => {
            Ok(vec![coerce_i18n_message(value)?.into()])
        }
        ModuleValue::Dict(_) => {
            let (Some(message), Some(quick_fixes)) = (value.get("message"), value.get("quickFixes"))
            else {
                return Err(KernelError::value_error(format!(
                    "Missing 'message' or 'quickFixes' in {}",
                    value
                )));
            };
            let quick_fixes = match quick_fixes {
                ModuleValue::List(items) | ModuleValue::Tuple(items) => items
                    .iter()
                    .map(QuickFix::coerce)
                    .collect::<KernelResult<Vec<_>>>()?,
                other => {
                    return Err(KernelError::type_error(format!(
                        "quickFixes must be a list, got {}",
                        other.type_name()
                    )))
                }
            };
            Ok(vec![ProcessResultError::new(
                coerce_i18n_message(message)?,
                quick_fixes,
            )])
        }
        ModuleValue::List(items) if allow_nesting => {
            let mut errors = Vec::new();
            for item in items {
                match coerce_error(item, false) {
                    Ok(entries) => errors.extend(entries),
                    Err(err) if err.is_type_or_value_error() => {
                        return Err(KernelError::value_error(format!(
                            "The list {} cannot be coerced to module error: {}",
                            value, err
                        )))
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(errors)
        }
        other => Err(KernelError::type_error(format!(
            "The value {} cannot be coerced to module error",
            other
        ))),
    }
}
