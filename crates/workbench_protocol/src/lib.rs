//! Workbench wire protocol.
//!
//! Records shared between the result-coercion kernel and the layers around
//! it (execution, caching, the client):
//!
//! - [`types`]: column type descriptors, artifact records, render results
//! - [`i18n`]: localizable messages and the default-locale catalog
//! - [`config`]: kernel tunables
//! - [`defaults`]: canonical constants

pub mod config;
pub mod defaults;
pub mod i18n;
pub mod types;

use thiserror::Error;

pub use config::KernelConfig;
pub use i18n::{translate_i18n_message, I18nMessage, MessageArguments};
pub use types::{
    ArrowTable, Column, ColumnType, QuickFix, QuickFixAction, RenderError, RenderResult, Tab,
    TabOutput, TableMetadata,
};

/// Errors raised while building or parsing protocol records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("{0}")]
    Artifact(String),
    #[error("{0}")]
    Config(String),
}
