//! Parameter metadata and string-keyed access
//!
//! Single source of truth for parameter validation. Field-key parameters are
//! open-ended (`<TypeName>_name_key`, `<TypeName>_bcid_key`) and share one
//! validator.

use super::{FieldRole, ParamMetadata, Params};
use crate::{Error, Result};

const FIELD_KEY_SUFFIXES: [(&str, FieldRole); 2] =
    [("_bcid_key", FieldRole::Id), ("_name_key", FieldRole::Name)];

fn validate_field_name(s: &str) -> std::result::Result<(), String> {
    if s.trim().is_empty() {
        return Err("field key: value must not be empty".to_string());
    }
    Ok(())
}

/// Split `<TypeName>_<role>_key` into its type name and role
fn parse_field_key(key: &str) -> Option<(&str, FieldRole)> {
    FIELD_KEY_SUFFIXES.iter().find_map(|(suffix, role)| {
        key.strip_suffix(suffix)
            .filter(|type_name| !type_name.is_empty())
            .map(|type_name| (type_name, *role))
    })
}

impl Params {
    /// Metadata for the fixed parameters
    pub fn metadata() -> &'static [ParamMetadata] {
        &[
            ParamMetadata {
                key: "page_size",
                data_type: "usize",
                default_value: "150",
                description: "Entities requested per page of a collection",
                validator: |s| {
                    let v: usize = s
                        .trim()
                        .parse()
                        .map_err(|_| "page_size: invalid number format".to_string())?;
                    if !(1..=10_000).contains(&v) {
                        return Err(format!("page_size: value {} out of range [1, 10000]", v));
                    }
                    Ok(())
                },
            },
            ParamMetadata {
                key: "parse_date",
                data_type: "bool",
                default_value: "false",
                description: "Parse DATETIME data columns",
                validator: |s| {
                    s.trim()
                        .parse::<bool>()
                        .map(|_| ())
                        .map_err(|_| "parse_date: expected true or false".to_string())
                },
            },
        ]
    }

    /// Validate and update page_size
    pub fn set_page_size(&self, value: usize) -> Result<()> {
        self.set_parameter("page_size", &value.to_string())
    }

    /// Validate and update a parameter from its string form
    pub fn set_parameter(&self, key: &str, value: &str) -> Result<()> {
        if let Some((type_name, role)) = parse_field_key(key) {
            validate_field_name(value).map_err(Error::InvalidParameter)?;
            self.set_field_key(type_name, role, value);
            return Ok(());
        }

        let meta = Self::metadata()
            .iter()
            .find(|m| m.key == key)
            .ok_or_else(|| Error::InvalidParameter(format!("{}: unknown parameter", key)))?;
        (meta.validator)(value).map_err(Error::InvalidParameter)?;

        let value = value.trim();
        match meta.key {
            "page_size" => {
                let parsed = value
                    .parse()
                    .map_err(|_| Error::InvalidParameter("page_size: invalid number format".to_string()))?;
                *self.page_size.write().unwrap_or_else(|e| e.into_inner()) = parsed;
            }
            "parse_date" => self.set_parse_date(value == "true"),
            other => {
                return Err(Error::InvalidParameter(format!("{}: no setter", other)));
            }
        }
        Ok(())
    }

    /// Current value of a parameter in string form
    pub fn get_parameter(&self, key: &str) -> Option<String> {
        if let Some((type_name, role)) = parse_field_key(key) {
            return self.field_key(type_name, role);
        }
        match key {
            "page_size" => Some(self.page_size().to_string()),
            "parse_date" => Some(self.parse_date().to_string()),
            _ => None,
        }
    }
}
