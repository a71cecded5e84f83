//! Publication of facts discovered about each mixin module
use crate::core::metadata::{AssociationKind, Extraction};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// What a module declares, for consumers outside the rewrite
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleMetadata {
    pub module: String,
    pub methods: Vec<String>,
    pub associations: IndexMap<String, AssociationKind>,
    pub lazy_singles: Vec<String>,
    /// Enum field to its declared values
    pub enum_values: IndexMap<String, Vec<String>>,
    pub scopes: Vec<String>,
    pub private_methods: Vec<String>,
}

impl ModuleMetadata {
    pub fn new(module: &str, extraction: &Extraction) -> Self {
        let table = &extraction.table;

        let mut enum_values: IndexMap<String, Vec<String>> = IndexMap::new();
        for entry in table.enum_updaters.values() {
            enum_values
                .entry(entry.field.clone())
                .or_default()
                .push(entry.value.clone());
        }

        ModuleMetadata {
            module: module.to_string(),
            methods: extraction.method_names(),
            associations: table.associations.clone(),
            lazy_singles: table.lazy_singles.iter().cloned().collect(),
            enum_values,
            scopes: table.scopes.clone(),
            private_methods: table.private_methods.iter().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        let associations: Map<String, Value> = self
            .associations
            .iter()
            .map(|(k, v)| (k.clone(), json!(v.name())))
            .collect();

        let enum_values: Map<String, Value> = self
            .enum_values
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();

        json!({
            "module": self.module,
            "methods": self.methods,
            "associations": associations,
            "lazy_singles": self.lazy_singles,
            "enum_values": enum_values,
            "scopes": self.scopes,
            "private_methods": self.private_methods,
        })
    }
}

/// Receives module metadata as each module is processed
pub trait MetadataSink {
    fn publish(&mut self, metadata: ModuleMetadata);
}

/// Sink that discards everything
pub struct Discard;

impl MetadataSink for Discard {
    fn publish(&mut self, _metadata: ModuleMetadata) {}
}

/// In-memory metadata keyed by module name
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    modules: IndexMap<String, ModuleMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        MetadataRegistry::default()
    }

    pub fn get(&self, module: &str) -> Option<&ModuleMetadata> {
        self.modules.get(module)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleMetadata> {
        self.modules.values()
    }

    /// All modules as a JSON object keyed by module name
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.modules
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl MetadataSink for MetadataRegistry {
    fn publish(&mut self, metadata: ModuleMetadata) {
        self.modules.insert(metadata.module.clone(), metadata);
    }
}
