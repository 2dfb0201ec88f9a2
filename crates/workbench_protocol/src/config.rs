//! Kernel configuration.

use serde::{Deserialize, Serialize};

use crate::defaults::{DEFAULT_LOCALE, MAX_ROWS_PER_TABLE};
use crate::ProtocolError;

/// Tunables for result coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Rows kept by `truncate_in_place_if_too_big`
    pub max_rows_per_table: usize,
    /// Locale used to render plain-string errors
    pub default_locale: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_rows_per_table: MAX_ROWS_PER_TABLE,
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl KernelConfig {
    /// Parse a JSON config document. Missing keys take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ProtocolError> {
        let config: KernelConfig = serde_json::from_str(raw)
            .map_err(|e| ProtocolError::Config(format!("invalid kernel config: {}", e)))?;
        if config.max_rows_per_table == 0 {
            return Err(ProtocolError::Config(
                "max_rows_per_table must be greater than 0".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn with_max_rows_per_table(mut self, max_rows: usize) -> Self {
        self.max_rows_per_table = max_rows;
        self
    }
}
