//! Load rewrite configuration from TOML
//!
//! Every key is optional. List keys replace the default set; the same
//! key with an `extra_` prefix extends it instead.
//!
//! ```toml
//! extra_exempt = ["track_event"]
//! mutating = ["destroy", "save"]
//! marker_constant = "ActiveSupport::Concern"
//!
//! [extra_associations]
//! has_one_attached = "singular"
//! ```
use crate::core::config::RewriteConfig;
use crate::core::metadata::AssociationKind;
use indexmap::{IndexMap, IndexSet};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use toml::Value;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration toml in {0}: {1}")]
    InvalidToml(String, String),
    #[error("configuration key {0} should be {1}")]
    WrongType(String, &'static str),
    #[error("unknown association kind {1} for {0}")]
    UnknownAssociationKind(String, String),
    #[error("could not read configuration {0}: {1}")]
    Unreadable(String, io::Error),
}

/// Read the configuration file at `path` over the defaults
pub fn load_config(path: &Path) -> Result<RewriteConfig, ConfigError> {
    let name = path.to_string_lossy().to_string();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable(name.clone(), e))?;
    parse_config(&name, &text)
}

/// Parse configuration text over the defaults
pub fn parse_config(name: &str, text: &str) -> Result<RewriteConfig, ConfigError> {
    let value = text
        .parse::<Value>()
        .map_err(|e| ConfigError::InvalidToml(name.to_string(), e.to_string()))?;
    match value {
        Value::Table(table) => apply(RewriteConfig::default(), &table),
        _ => Err(ConfigError::WrongType("(root)".to_string(), "a table")),
    }
}

fn apply(mut config: RewriteConfig, table: &toml::value::Table) -> Result<RewriteConfig, ConfigError> {
    if let Some(v) = table.get("marker_call") {
        config.marker_call = string(v, "marker_call")?;
    }
    if let Some(v) = table.get("marker_constant") {
        config.marker_constant = marker_constant(v)?;
    }
    if let Some(v) = table.get("raw_attributes") {
        config.raw_attributes = string(v, "raw_attributes")?;
    }
    if let Some(v) = table.get("transaction") {
        config.transaction = string(v, "transaction")?;
    }

    names(table, "hooks", &mut config.hooks)?;
    names(table, "dropped_declarations", &mut config.dropped_declarations)?;
    names(table, "exempt", &mut config.exempt)?;
    names(table, "mutating", &mut config.mutating)?;

    if let Some(v) = table.get("associations") {
        config.associations = associations(v, "associations")?;
    }
    if let Some(v) = table.get("extra_associations") {
        config
            .associations
            .extend(associations(v, "extra_associations")?);
    }

    Ok(config)
}

fn string(value: &Value, key: &str) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::WrongType(key.to_string(), "a string"))
}

fn string_list(value: &Value, key: &str) -> Result<Vec<String>, ConfigError> {
    let wrong = || ConfigError::WrongType(key.to_string(), "a list of strings");
    value
        .as_array()
        .ok_or_else(wrong)?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(wrong))
        .collect()
}

/// Apply `key` (replacing) then `extra_key` (extending) to `set`
fn names(
    table: &toml::value::Table,
    key: &str,
    set: &mut IndexSet<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = table.get(key) {
        *set = string_list(v, key)?.into_iter().collect();
    }
    let extra = format!("extra_{}", key);
    if let Some(v) = table.get(&extra) {
        set.extend(string_list(v, &extra)?);
    }
    Ok(())
}

/// `"A::B"` or `["A", "B"]`
fn marker_constant(value: &Value) -> Result<(String, String), ConfigError> {
    let wrong = || ConfigError::WrongType("marker_constant".to_string(), "a two-part constant");
    let parts = match value {
        Value::String(s) => s.split("::").map(str::to_string).collect::<Vec<_>>(),
        v => string_list(v, "marker_constant")?,
    };
    match parts.as_slice() {
        [scope, name] => Ok((scope.clone(), name.clone())),
        _ => Err(wrong()),
    }
}

fn associations(value: &Value, key: &str) -> Result<IndexMap<String, AssociationKind>, ConfigError> {
    let table = value
        .as_table()
        .ok_or_else(|| ConfigError::WrongType(key.to_string(), "a table"))?;
    table
        .iter()
        .map(|(name, kind)| {
            let kind = string(kind, &format!("{}.{}", key, name))?;
            AssociationKind::from_name(&kind)
                .map(|k| (name.clone(), k))
                .ok_or_else(|| ConfigError::UnknownAssociationKind(name.clone(), kind))
        })
        .collect()
}
