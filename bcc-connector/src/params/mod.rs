//! Connector parameter store
//!
//! Read-frequently, write-rarely access pattern using RwLock. One `Params`
//! value is created per client and shared (through `Arc`) with every entity
//! the client produces, so a parameter changed after an entity was built is
//! seen by that entity's next lookup.
//!
//! # Usage
//!
//! ```rust
//! use bcc_connector::params::Params;
//!
//! let params = Params::default();
//! assert_eq!(params.page_size(), 150);
//!
//! params.set_parameter("VariableDescription_name_key", "tag").unwrap();
//! assert_eq!(params.get_parameter("VariableDescription_name_key").as_deref(), Some("tag"));
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

mod init;
mod metadata;

/// Default number of entities requested per page
pub const DEFAULT_PAGE_SIZE: usize = 150;

/// Date columns are returned as raw strings unless enabled
pub const DEFAULT_PARSE_DATE: bool = false;

/// Universal key holding an entity id in raw metadata
pub const DEFAULT_ID_KEY: &str = "bcId";

/// Universal key holding an entity display name in raw metadata
pub const DEFAULT_NAME_KEY: &str = "name";

/// Field of raw metadata looked up through the per-type key table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Id,
    Name,
}

impl FieldRole {
    fn suffix(self) -> &'static str {
        match self {
            FieldRole::Id => "bcid",
            FieldRole::Name => "name",
        }
    }

    /// Parameter key holding this role's field name for a type
    pub fn param_key(self, type_name: &str) -> String {
        format!("{}_{}_key", type_name, self.suffix())
    }

    /// Key used when no type in the chain configures one
    pub fn universal_default(self) -> &'static str {
        match self {
            FieldRole::Id => DEFAULT_ID_KEY,
            FieldRole::Name => DEFAULT_NAME_KEY,
        }
    }
}

/// Field keys configured out of the box
const DEFAULT_FIELD_KEYS: &[(&str, &str)] = &[
    ("BaseEntity_bcid_key", DEFAULT_ID_KEY),
    ("BaseEntity_name_key", DEFAULT_NAME_KEY),
    ("VariableDescription_name_key", "standard"),
];

/// Parameter storage
pub struct Params {
    /// Entities requested per page when the caller gives no page size
    ///
    /// Valid range: [1, 10000]
    /// Default: 150
    page_size: RwLock<usize>,

    /// Parse DATETIME columns into timestamps
    ///
    /// Default: false
    parse_date: RwLock<bool>,

    /// `<TypeName>_<bcid|name>_key` → metadata field name
    field_keys: RwLock<HashMap<String, String>>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            page_size: RwLock::new(DEFAULT_PAGE_SIZE),
            parse_date: RwLock::new(DEFAULT_PARSE_DATE),
            field_keys: RwLock::new(default_field_keys()),
        }
    }
}

fn default_field_keys() -> HashMap<String, String> {
    DEFAULT_FIELD_KEYS
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl Params {
    pub fn page_size(&self) -> usize {
        *self.page_size.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn parse_date(&self) -> bool {
        *self.parse_date.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_parse_date(&self, value: bool) {
        *self.parse_date.write().unwrap_or_else(|e| e.into_inner()) = value;
    }

    /// Field name configured for exactly this type, without fallback
    pub fn field_key(&self, type_name: &str, role: FieldRole) -> Option<String> {
        self.field_keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&role.param_key(type_name))
            .cloned()
    }

    pub fn set_field_key(&self, type_name: &str, role: FieldRole, field: &str) {
        self.field_keys
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(role.param_key(type_name), field.to_string());
    }

    /// Restore every parameter to its default
    pub fn reset(&self) {
        *self.page_size.write().unwrap_or_else(|e| e.into_inner()) = DEFAULT_PAGE_SIZE;
        *self.parse_date.write().unwrap_or_else(|e| e.into_inner()) = DEFAULT_PARSE_DATE;
        *self.field_keys.write().unwrap_or_else(|e| e.into_inner()) = default_field_keys();
    }
}

/// Metadata for a single named parameter
///
/// Validators have the signature `fn(&str) -> Result<(), String>` and report
/// errors as `"{param_name}: {specific_reason}"`.
pub struct ParamMetadata {
    pub key: &'static str,
    pub data_type: &'static str,
    pub default_value: &'static str,
    pub description: &'static str,
    pub validator: fn(&str) -> Result<(), String>,
}
