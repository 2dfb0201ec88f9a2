//! Problems found in a step's input before it renders.
//!
//! Each problem becomes a user-facing message plus one quick fix that
//! prepends a conversion step.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};
use thiserror::Error;
use workbench_protocol::{I18nMessage, QuickFix, QuickFixAction};

use crate::column_type::ColumnTypeKind;
use crate::error::{KernelError, KernelResult};

const SHOULD_BE_TEXT_MESSAGE_ID: &str = "kernel.prompting.wrong_column_type.should_be_text";
const GENERAL_MESSAGE_ID: &str = "kernel.prompting.wrong_column_type.general";
const SHOULD_BE_TEXT_FIX_ID: &str = "kernel.prompting.wrong_column_type.quick_fix.should_be_text";
const GENERAL_FIX_ID: &str = "kernel.prompting.wrong_column_type.quick_fix.general";

/// Selected columns exist but have the wrong type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongColumnType {
    column_names: Vec<String>,
    /// `None` exactly when text is wanted: any type converts to text.
    found_type: Option<ColumnTypeKind>,
    wanted_types: BTreeSet<ColumnTypeKind>,
}

impl WrongColumnType {
    pub fn new(
        column_names: Vec<String>,
        found_type: Option<ColumnTypeKind>,
        wanted_types: impl IntoIterator<Item = ColumnTypeKind>,
    ) -> KernelResult<Self> {
        let wanted_types: BTreeSet<ColumnTypeKind> = wanted_types.into_iter().collect();
        if wanted_types.is_empty() {
            return Err(KernelError::value_error("wanted_types must not be empty"));
        }
        let wants_text = wanted_types.contains(&ColumnTypeKind::Text);
        if found_type.is_none() != wants_text {
            return Err(KernelError::value_error(format!(
                "found_type must be given unless text is wanted (found {:?}, wanted {:?})",
                found_type, wanted_types
            )));
        }
        Ok(Self {
            column_names,
            found_type,
            wanted_types,
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn found_type(&self) -> Option<ColumnTypeKind> {
        self.found_type
    }

    pub fn wanted_types(&self) -> &BTreeSet<ColumnTypeKind> {
        &self.wanted_types
    }

    /// Text, else number, else datetime.
    pub fn best_wanted_type(&self) -> ColumnTypeKind {
        self.wanted_types
            .first()
            .copied()
            .unwrap_or(ColumnTypeKind::Text)
    }

    pub fn as_error_message(&self) -> I18nMessage {
        let mut arguments = Map::new();
        arguments.insert("columns".to_string(), json!(self.column_names.len()));
        for (i, name) in self.column_names.iter().enumerate() {
            arguments.insert(i.to_string(), Value::String(format!("“{}”", name)));
        }

        match self.found_type {
            None => I18nMessage::new(SHOULD_BE_TEXT_MESSAGE_ID, arguments),
            Some(found_type) => I18nMessage::new(GENERAL_MESSAGE_ID, arguments)
                .with_arg("found_type", found_type.as_str())
                .with_arg("best_wanted_type", self.best_wanted_type().as_str()),
        }
    }

    /// A fix that prepends the conversion step for these columns.
    pub fn as_quick_fix(&self) -> QuickFix {
        let button_text = match self.found_type {
            None => I18nMessage::bare(SHOULD_BE_TEXT_FIX_ID),
            Some(found_type) => I18nMessage::bare(GENERAL_FIX_ID)
                .with_arg("found_type", found_type.as_str())
                .with_arg("best_wanted_type", self.best_wanted_type().as_str()),
        };

        let module_slug = match self.best_wanted_type() {
            ColumnTypeKind::Text => "converttotext",
            ColumnTypeKind::Number => "converttexttonumber",
            ColumnTypeKind::Datetime => "convert-date",
        };

        let mut params = Map::new();
        params.insert("colnames".to_string(), json!(self.column_names));
        QuickFix::new(button_text, QuickFixAction::prepend_step(module_slug, params))
    }
}

/// The user must change something before the step can render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("user must change something before we render")]
pub struct PromptingError {
    pub errors: Vec<WrongColumnType>,
}

impl PromptingError {
    pub fn new(errors: Vec<WrongColumnType>) -> Self {
        Self { errors }
    }

    pub fn as_error_messages(&self) -> Vec<I18nMessage> {
        self.errors.iter().map(WrongColumnType::as_error_message).collect()
    }

    /// One quick fix per problem.
    pub fn as_quick_fixes(&self) -> Vec<QuickFix> {
        self.errors.iter().map(WrongColumnType::as_quick_fix).collect()
    }
}
