use super::types::{
    AxisRole, DataView, FunctionDescriptor, FunctionHandler, IndexMapping, ModuleTypeDescriptor,
    OptionSchema,
};
use super::Catalog;
use crate::error::ConfigError;
use crate::Result;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in catalog, compiled into the binary
pub const BUILTIN_CATALOG: &str = include_str!("../../catalog/default.yaml");

const QUERY_TYPES: [&str; 3] = ["search", "aggregation", "count"];

fn default_option_keys() -> Vec<String> {
    [
        "queryType",
        "aggregationType",
        "aggregationField",
        "timeZone",
        "fixed_interval",
        "size",
        "interval",
        "min_doc_count",
        "terms_size",
        "missing",
        "color",
        "order",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// On-disk shape of a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default = "default_option_keys")]
    pub option_keys: Vec<String>,
    #[serde(default)]
    pub indices: IndexMap<String, IndexMapping>,
    #[serde(default)]
    pub data_views: IndexMap<String, DataView>,
    #[serde(default)]
    pub module_types: IndexMap<String, ModuleTypeDescriptor>,
    #[serde(default)]
    pub functions: IndexMap<String, FunctionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub axis: AxisRole,
    #[serde(rename = "validDataTypes", default)]
    pub valid_data_types: Vec<String>,
    #[serde(default)]
    pub options: Option<FunctionOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionOptions {
    #[serde(default)]
    pub required: OptionSchema,
    #[serde(default)]
    pub optional: OptionSchema,
}

impl CatalogFile {
    pub fn from_yaml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check internal consistency and resolve function handlers.
    pub fn resolve(self) -> std::result::Result<Catalog, ConfigError> {
        let option_keys: IndexSet<String> = self.option_keys.into_iter().collect();

        let mut functions = IndexMap::with_capacity(self.functions.len());
        for (id, spec) in self.functions {
            let descriptor = resolve_function(&id, spec, &option_keys)?;
            functions.insert(id, descriptor);
        }

        for (name, view) in &self.data_views {
            if view.mapped_index.as_deref() == Some("") {
                return Err(ConfigError::EmptyMappedIndex(name.clone()));
            }
        }

        let module_types = self
            .module_types
            .into_iter()
            .map(|(id, mut module)| {
                module.id = id.clone();
                (id, module)
            })
            .collect();

        Ok(Catalog {
            option_keys,
            indices: self.indices,
            data_views: self.data_views,
            module_types,
            functions,
        })
    }
}

fn resolve_function(
    id: &str,
    spec: FunctionSpec,
    option_keys: &IndexSet<String>,
) -> std::result::Result<FunctionDescriptor, ConfigError> {
    let options = spec.options.unwrap_or_default();

    for (option, allowed) in options.required.iter().chain(options.optional.iter()) {
        if !option_keys.contains(option) {
            return Err(ConfigError::UndeclaredOptionKey {
                function: id.to_string(),
                option: option.clone(),
            });
        }
        if allowed.as_ref().is_some_and(|values| values.is_empty()) {
            return Err(ConfigError::EmptyAllowedValues {
                function: id.to_string(),
                option: option.clone(),
            });
        }
    }

    if let Some(Some(query_types)) = options.required.get("queryType") {
        if let Some(bad) = query_types
            .iter()
            .find(|q| !QUERY_TYPES.contains(&q.as_str()))
        {
            return Err(ConfigError::InvalidQueryType {
                function: id.to_string(),
                query_type: bad.clone(),
            });
        }
    }

    let handler = match options
        .required
        .get("aggregationType")
        .and_then(|allowed| allowed.as_ref())
        .and_then(|allowed| allowed.first())
    {
        Some(agg_type) => {
            let handler = FunctionHandler::from_aggregation_type(agg_type).ok_or_else(|| {
                ConfigError::UnknownAggregationType {
                    function: id.to_string(),
                    aggregation_type: agg_type.clone(),
                }
            })?;
            if handler.axis_role() != spec.axis {
                return Err(ConfigError::HandlerAxisMismatch {
                    function: id.to_string(),
                    role: spec.axis.as_str().to_string(),
                    handler: handler.to_string(),
                });
            }
            Some(handler)
        }
        None => None,
    };

    Ok(FunctionDescriptor {
        id: id.to_string(),
        name: spec.name,
        description: spec.description,
        axis_role: spec.axis,
        required_options: options.required,
        optional_options: options.optional,
        valid_field_types: spec.valid_data_types,
        handler,
    })
}

/// Loads catalogs from YAML files
pub struct CatalogLoader {
    path: PathBuf,
}

impl CatalogLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<Catalog> {
        let content = fs::read_to_string(&self.path)?;
        let catalog = CatalogFile::from_yaml_str(&content)?.resolve()?;
        tracing::info!(
            path = %self.path.display(),
            functions = catalog.functions.len(),
            module_types = catalog.module_types.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::fs;
    use tempfile::TempDir;

    fn minimal(functions: &str) -> String {
        format!(
            r#"
module_types:
  bar_vertical:
    mainAxisFrequency: Single
    valueAxisFrequency: Multiple
functions:
{}
"#,
            functions
        )
    }

    #[test]
    fn test_builtin_catalog_resolves() {
        let catalog = CatalogFile::from_yaml_str(BUILTIN_CATALOG)
            .unwrap()
            .resolve()
            .unwrap();
        assert!(catalog.function("top_values").is_some());
        assert_eq!(catalog.module_types.len(), 15);
    }

    #[test]
    fn test_unknown_aggregation_type_is_config_error() {
        let yaml = minimal(
            r#"
  weird:
    name: Weird
    axis: value
    options:
      required:
        aggregationType: [geo_centroid]
"#,
        );
        let err = CatalogFile::from_yaml_str(&yaml).unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAggregationType { .. }));
    }

    #[test]
    fn test_handler_on_wrong_axis_is_config_error() {
        let yaml = minimal(
            r#"
  cardinality:
    name: Cardinality
    axis: main
    options:
      required:
        aggregationType: [cardinality]
"#,
        );
        let err = CatalogFile::from_yaml_str(&yaml).unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::HandlerAxisMismatch { .. }));
    }

    #[test]
    fn test_undeclared_option_key_is_config_error() {
        let yaml = minimal(
            r#"
  sum:
    name: Sum
    axis: value
    options:
      required:
        aggregationType: [sum]
      optional:
        precision: ~
"#,
        );
        let err = CatalogFile::from_yaml_str(&yaml).unwrap().resolve().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UndeclaredOptionKey {
                function: "sum".to_string(),
                option: "precision".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_query_type_is_config_error() {
        let yaml = minimal(
            r#"
  sum:
    name: Sum
    axis: value
    options:
      required:
        queryType: [scroll]
        aggregationType: [sum]
"#,
        );
        let err = CatalogFile::from_yaml_str(&yaml).unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQueryType { .. }));
    }

    #[test]
    fn test_function_without_options_has_no_handler() {
        let yaml = minimal(
            r#"
  median:
    name: Median
    axis: value
"#,
        );
        let catalog = CatalogFile::from_yaml_str(&yaml).unwrap().resolve().unwrap();
        assert_eq!(catalog.function("median").unwrap().handler, None);
    }

    #[test]
    fn test_loader_reads_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("catalog.yaml");
        fs::write(&path, BUILTIN_CATALOG)?;

        let catalog = CatalogLoader::new(&path).load()?;
        assert!(catalog.data_view("Call Logs Report").is_some());
        Ok(())
    }

    #[test]
    fn test_loader_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yaml");
        fs::write(&path, "functions: [not, a, map]").unwrap();

        let err = CatalogLoader::new(&path).load().unwrap_err();
        assert!(matches!(err, crate::Error::Config(ConfigError::Parse(_))));
    }
}
