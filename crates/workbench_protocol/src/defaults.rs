//! Canonical default values shared by the kernel and its callers.

/// Maximum number of rows a single step may output before truncation.
pub const MAX_ROWS_PER_TABLE: usize = 1_000_000;

/// Locale used for backward-compatible plain-string messages.
pub const DEFAULT_LOCALE: &str = "en";

/// Number format applied when a numeric column has no explicit format.
pub const DEFAULT_NUMBER_FORMAT: &str = "{:,}";

/// Message id for untranslated module text.
pub const TODO_I18N_MESSAGE_ID: &str = "TODO_i18n";

/// Only quick-fix action the client understands.
pub const PREPEND_MODULE_ACTION: &str = "prependModule";
