//! Quick fixes: one-click suggestions attached to errors.

use serde_json::{json, Map, Value};
use workbench_protocol::defaults::PREPEND_MODULE_ACTION;
use workbench_protocol::{self as protocol, I18nMessage, QuickFixAction};

use crate::error::{KernelError, KernelResult};
use crate::module_error::coerce_i18n_message;
use crate::value::ModuleValue;

const QUICK_FIX_KEYS: &[&str] = &["text", "action", "args"];

/// Button text plus a reducer action and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickFix {
    pub text: I18nMessage,
    /// Reducer action, such as `prependModule`
    pub action: String,
    pub args: Vec<Value>,
}

impl QuickFix {
    pub fn new(text: I18nMessage, action: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            text,
            action: action.into(),
            args,
        }
    }

    /// A fix that adds `module_slug` before the current step.
    pub fn prepend_module(
        text: I18nMessage,
        module_slug: impl Into<String>,
        partial_params: Map<String, Value>,
    ) -> Self {
        Self::new(
            text,
            PREPEND_MODULE_ACTION,
            vec![Value::String(module_slug.into()), Value::Object(partial_params)],
        )
    }

    /// Build from `{"text", "action", "args"?}` or `(text, action, *args)`.
    ///
    /// Every failure is a `Value` error except a malformed `text`, which
    /// keeps its own class.
    pub fn coerce(value: &ModuleValue) -> KernelResult<Self> {
        match value {
            ModuleValue::Dict(entries) => {
                value
                    .to_json()
                    .map_err(|err| KernelError::value_error(err.to_string()))?;

                if let Some((key, _)) = entries.iter().find(|(k, _)| !QUICK_FIX_KEYS.contains(&k.as_str())) {
                    return Err(KernelError::value_error(format!(
                        "QuickFix got an unexpected keyword argument '{}'",
                        key
                    )));
                }
                let text = value
                    .get("text")
                    .ok_or_else(|| KernelError::value_error("Missing text from quick fix"))?;
                let text = coerce_i18n_message(text)?;
                let action = value.get("action").ok_or_else(|| {
                    KernelError::value_error("QuickFix missing required argument: 'action'")
                })?;
                let args = match value.get("args") {
                    None => Vec::new(),
                    Some(args @ (ModuleValue::List(_) | ModuleValue::Tuple(_))) => {
                        json_array(args)?
                    }
                    Some(other) => {
                        return Err(KernelError::value_error(format!(
                            "QuickFix args must be a list, got {}",
                            other.type_name()
                        )))
                    }
                };
                Ok(Self::new(text, action_name(action)?, args))
            }
            ModuleValue::Tuple(items) | ModuleValue::List(items) => {
                if items.len() < 2 {
                    return Err(KernelError::value_error(format!(
                        "not enough values to unpack (expected at least 2, got {})",
                        items.len()
                    )));
                }
                let args = ModuleValue::List(items[2..].to_vec());
                for part in [&items[0], &items[1], &args] {
                    part.to_json()
                        .map_err(|err| KernelError::value_error(err.to_string()))?;
                }
                let text = coerce_i18n_message(&items[0])?;
                Ok(Self::new(text, action_name(&items[1])?, json_array(&args)?))
            }
            other => Err(KernelError::value_error(format!(
                "Cannot build QuickFix from value: {}",
                other
            ))),
        }
    }

    /// `{"text": {"id", "arguments"}, "action", "args"}`
    pub fn to_dict(&self) -> Value {
        json!({
            "text": {"id": self.text.id, "arguments": self.text.arguments},
            "action": self.action,
            "args": self.args,
        })
    }

    /// Wire form. Only `prependModule` with `[module_slug, params]` has one.
    pub fn to_arrow(&self) -> KernelResult<protocol::QuickFix> {
        if self.action != PREPEND_MODULE_ACTION {
            return Err(KernelError::value_error(format!(
                "QuickFix action \"{}\" has no wire form; only \"{}\" does",
                self.action, PREPEND_MODULE_ACTION
            )));
        }
        match self.args.as_slice() {
            [Value::String(module_slug), Value::Object(partial_params)] => Ok(protocol::QuickFix::new(
                self.text.clone(),
                QuickFixAction::prepend_step(module_slug.clone(), partial_params.clone()),
            )),
            _ => Err(KernelError::value_error(format!(
                "{} args must be [module_slug, partial_params], got {}",
                PREPEND_MODULE_ACTION,
                Value::Array(self.args.clone())
            ))),
        }
    }

    pub fn from_arrow(wire: &protocol::QuickFix) -> Self {
        match &wire.action {
            QuickFixAction::PrependStep {
                module_slug,
                partial_params,
            } => Self::prepend_module(wire.button_text.clone(), module_slug.clone(), partial_params.clone()),
        }
    }
}

fn action_name(value: &ModuleValue) -> KernelResult<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        KernelError::value_error(format!(
            "QuickFix action must be a string, got {}",
            value.type_name()
        ))
    })
}

fn json_array(value: &ModuleValue) -> KernelResult<Vec<Value>> {
    match value.to_json() {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Ok(vec![other]),
        Err(err) => Err(KernelError::value_error(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModuleValue {
        ModuleValue::dict([("colnames", ModuleValue::list(["A".into()]))])
    }

    #[test]
    fn test_coerce_dict() {
        let value = ModuleValue::dict([
            ("text", ModuleValue::from("Fix it")),
            ("action", "prependModule".into()),
            ("args", ModuleValue::list(["converttotext".into(), params()])),
        ]);
        let fix = QuickFix::coerce(&value).unwrap();
        assert_eq!(fix.text, I18nMessage::todo_i18n("Fix it"));
        assert_eq!(fix.action, "prependModule");
        assert_eq!(fix.args, vec![json!("converttotext"), json!({"colnames": ["A"]})]);
    }

    #[test]
    fn test_coerce_dict_args_default_to_empty() {
        let value = ModuleValue::dict([("text", ModuleValue::from("t")), ("action", "x".into())]);
        assert!(QuickFix::coerce(&value).unwrap().args.is_empty());
    }

    #[test]
    fn test_coerce_dict_errors() {
        let missing_text = ModuleValue::dict([("action", ModuleValue::from("x"))]);
        assert_eq!(
            QuickFix::coerce(&missing_text).unwrap_err().to_string(),
            "Missing text from quick fix"
        );

        let extra = ModuleValue::dict([
            ("text", ModuleValue::from("t")),
            ("action", "x".into()),
            ("icon", "y".into()),
        ]);
        assert!(QuickFix::coerce(&extra).unwrap_err().to_string().contains("'icon'"));

        let bad_action = ModuleValue::dict([("text", ModuleValue::from("t")), ("action", 3.into())]);
        assert!(!QuickFix::coerce(&bad_action).unwrap_err().is_type_error());
    }

    #[test]
    fn test_coerce_rejects_non_json_args() {
        let value = ModuleValue::dict([
            ("text", ModuleValue::from("t")),
            ("action", "prependModule".into()),
            ("args", ModuleValue::list([ModuleValue::Opaque("Index".to_string())])),
        ]);
        let err = QuickFix::coerce(&value).unwrap_err();
        assert!(matches!(err, KernelError::Value(_)));
        assert!(err.to_string().contains("Index"));
    }

    #[test]
    fn test_coerce_sequence() {
        let value = ModuleValue::tuple([
            ModuleValue::tuple(["my.id".into(), ModuleValue::dict([("n", ModuleValue::from(1))])]),
            "prependModule".into(),
            "converttotext".into(),
            params(),
        ]);
        let fix = QuickFix::coerce(&value).unwrap();
        assert_eq!(fix.text.id, "my.id");
        assert_eq!(fix.text.arguments["n"], json!(1));
        assert_eq!(fix.args.len(), 2);
    }

    #[test]
    fn test_coerce_sequence_too_short() {
        let err = QuickFix::coerce(&ModuleValue::tuple(["t".into()])).unwrap_err();
        assert!(matches!(err, KernelError::Value(_)));
    }

    #[test]
    fn test_coerce_other_shape() {
        let err = QuickFix::coerce(&ModuleValue::from("fix")).unwrap_err();
        assert_eq!(err.to_string(), "Cannot build QuickFix from value: \"fix\"");
    }

    #[test]
    fn test_arrow_roundtrip() {
        let mut partial = Map::new();
        partial.insert("colnames".to_string(), json!(["A"]));
        let fix = QuickFix::prepend_module(I18nMessage::bare("x"), "converttotext", partial);
        let wire = fix.to_arrow().unwrap();
        assert_eq!(QuickFix::from_arrow(&wire), fix);
    }

    #[test]
    fn test_to_arrow_rejects_other_actions() {
        let fix = QuickFix::new(I18nMessage::bare("x"), "selectTab", vec![]);
        assert!(fix.to_arrow().is_err());
        let fix = QuickFix::new(I18nMessage::bare("x"), "prependModule", vec![json!("only-slug")]);
        assert!(fix.to_arrow().is_err());
    }

    #[test]
    fn test_to_dict() {
        let fix = QuickFix::new(I18nMessage::todo_i18n("t"), "prependModule", vec![json!(1)]);
        assert_eq!(
            fix.to_dict(),
            json!({
                "text": {"id": "TODO_i18n", "arguments": {"text": "t"}},
                "action": "prependModule",
                "args": [1]
            })
        );
    }
}
