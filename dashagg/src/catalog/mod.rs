//! Function, module-type and data-view catalog
//!
//! The catalog is built once at startup, checked for internal consistency and
//! then shared read-only (usually behind an `Arc`) by every validation,
//! compilation and decoding call.

pub mod loader;
pub mod types;

pub use loader::{CatalogFile, CatalogLoader, BUILTIN_CATALOG};
pub use types::{
    AxisRole, BucketKind, DataView, Frequency, FunctionDescriptor, FunctionHandler,
    IndexMapping, MetricKind, ModuleTypeDescriptor, OptionSchema,
};

use crate::error::ConfigError;
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) option_keys: IndexSet<String>,
    pub(crate) indices: IndexMap<String, IndexMapping>,
    pub(crate) data_views: IndexMap<String, DataView>,
    pub(crate) module_types: IndexMap<String, ModuleTypeDescriptor>,
    pub(crate) functions: IndexMap<String, FunctionDescriptor>,
}

impl Catalog {
    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        CatalogFile::from_yaml_str(s)?.resolve()
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn module_type(&self, name: &str) -> Option<&ModuleTypeDescriptor> {
        self.module_types.get(name)
    }

    pub fn data_view(&self, name: &str) -> Option<&DataView> {
        self.data_views.get(name)
    }

    pub fn index(&self, name: &str) -> Option<&IndexMapping> {
        self.indices.get(name)
    }

    /// Whether `key` is in the closed, system-wide option-key set
    pub fn is_known_option(&self, key: &str) -> bool {
        self.option_keys.contains(key)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.functions.values()
    }

    pub fn module_types(&self) -> impl Iterator<Item = &ModuleTypeDescriptor> {
        self.module_types.values()
    }

    pub fn data_views(&self) -> impl Iterator<Item = (&str, &DataView)> {
        self.data_views.iter().map(|(k, v)| (k.as_str(), v))
    }
}
