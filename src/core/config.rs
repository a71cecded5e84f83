//! Vocabulary consulted by the mixin passes.
//!
//! Everything here is plain configuration passed by reference into
//! the extractor and rewriter, so differently configured rewrites can
//! run side by side.
use crate::core::metadata::AssociationKind;
use indexmap::{IndexMap, IndexSet};

lazy_static! {
    /// Built-ins, constructors and logging primitives that are never
    /// host-qualified
    static ref DEFAULT_EXEMPT: Vec<&'static str> = vec![
        "puts", "print", "p", "pp", "warn", "logger", "debugger", "binding",
        "raise", "fail", "require", "require_relative", "lambda", "proc",
        "loop", "catch", "throw", "format", "sprintf", "rand", "sleep",
        "block_given?", "caller", "exit", "abort", "at_exit",
        "Integer", "Float", "String", "Array", "Hash", "Rational",
    ];

    /// Record operations that mutate persistent state
    static ref DEFAULT_MUTATING: Vec<&'static str> = vec![
        "destroy", "destroy!", "delete", "save", "save!", "update",
        "update!", "update_column", "update_columns", "update_attribute",
        "touch", "increment!", "decrement!", "toggle!",
    ];

    /// Cross-cutting declarations with no meaning outside the host
    static ref DEFAULT_DROPPED: Vec<&'static str> = vec![
        "delegate", "delegate_missing_to", "include", "extend", "prepend",
        "helper_method", "class_attribute", "mattr_accessor",
        "cattr_accessor", "require", "require_relative",
    ];
}

/// Configuration for a mixin rewrite
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteConfig {
    /// Name of the composition marker call (`extend`)
    pub marker_call: String,
    /// Two-level constant the marker call must name
    pub marker_constant: (String, String),
    /// Lifecycle hooks whose blocks are scanned for declarations
    pub hooks: IndexSet<String>,
    /// Declarations that are removed outright
    pub dropped_declarations: IndexSet<String>,
    /// Association declaration names and the kind they declare
    pub associations: IndexMap<String, AssociationKind>,
    /// Names never treated as host calls
    pub exempt: IndexSet<String>,
    /// Known record-mutating operations
    pub mutating: IndexSet<String>,
    /// Raw backing-field container on the host
    pub raw_attributes: String,
    /// Head call name of transactional blocks
    pub transaction: String,
}

fn owned(names: &[&str]) -> IndexSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for RewriteConfig {
    fn default() -> Self {
        RewriteConfig {
            marker_call: "extend".to_string(),
            marker_constant: ("ActiveSupport".to_string(), "Concern".to_string()),
            hooks: owned(&["included", "prepended"]),
            dropped_declarations: owned(&DEFAULT_DROPPED),
            associations: [
                ("has_many", AssociationKind::Plural),
                ("has_and_belongs_to_many", AssociationKind::Plural),
                ("has_one", AssociationKind::Singular),
                ("belongs_to", AssociationKind::LazySingle),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
            exempt: owned(&DEFAULT_EXEMPT),
            mutating: owned(&DEFAULT_MUTATING),
            raw_attributes: "attributes".to_string(),
            transaction: "transaction".to_string(),
        }
    }
}

impl RewriteConfig {
    pub fn is_exempt(&self, name: &str) -> bool {
        self.exempt.contains(name)
    }

    pub fn is_mutating(&self, name: &str) -> bool {
        self.mutating.contains(name)
    }

    pub fn is_hook(&self, name: &str) -> bool {
        self.hooks.contains(name)
    }

    pub fn is_dropped(&self, name: &str) -> bool {
        self.dropped_declarations.contains(name)
    }

    pub fn association_kind(&self, name: &str) -> Option<AssociationKind> {
        self.associations.get(name).copied()
    }

    /// Add further exempt names
    pub fn with_exempt<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exempt
            .extend(names.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Add further mutating operations
    pub fn with_mutating<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mutating
            .extend(names.into_iter().map(|s| s.as_ref().to_string()));
        self
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_defaults() {
        let config = RewriteConfig::default();
        assert!(config.is_exempt("puts"));
        assert!(config.is_exempt("raise"));
        assert!(!config.is_exempt("title"));
        assert!(config.is_mutating("destroy"));
        assert!(config.is_hook("included"));
        assert!(config.is_dropped("delegate"));
        assert_eq!(
            config.association_kind("belongs_to"),
            Some(AssociationKind::LazySingle)
        );
        assert_eq!(config.association_kind("validates"), None);
    }

    #[test]
    pub fn test_extension_keeps_defaults() {
        let config = RewriteConfig::default()
            .with_exempt(["t"])
            .with_mutating(vec!["archive!".to_string()]);
        assert!(config.is_exempt("t"));
        assert!(config.is_exempt("puts"));
        assert!(config.is_mutating("archive!"));
        assert!(config.is_mutating("save"));
    }
}
