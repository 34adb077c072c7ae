//! Parameter initialization from configuration
//!
//! Values found in the `parameters` table of a configuration file are applied
//! one by one. An invalid value is logged and skipped; the default stays.

use super::Params;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

impl Params {
    /// Build a store from configuration overrides
    pub fn from_overrides(overrides: &HashMap<String, Value>) -> Self {
        let params = Self::default();
        params.apply_overrides(overrides);
        params
    }

    /// Apply configuration overrides, skipping invalid entries
    pub fn apply_overrides(&self, overrides: &HashMap<String, Value>) {
        for (key, value) in overrides {
            let value_str = match value {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => {
                    warn!("{}: unsupported value {}, keeping default", key, other);
                    continue;
                }
            };
            match self.set_parameter(key, &value_str) {
                Ok(()) => debug!(key = %key, value = %value_str, "Parameter override applied"),
                Err(e) => warn!("{}, keeping default", e),
            }
        }
    }
}
