//! Chart grammar validation
//!
//! Checks run in a fixed order and stop at the first violation, so a given
//! malformed chart always yields the same error code.

mod options;

pub use options::check_formats;

use crate::catalog::{Catalog, Frequency, FunctionDescriptor, IndexMapping, ModuleTypeDescriptor};
use crate::chart::{AxisEntry, AxisType, ChartDefinition};
use crate::error::{DataViewFailure, ValidationError};
use indexmap::IndexMap;
use serde_json::Value;

/// Required options filled from the function descriptor when the caller omits them
const INJECTED_OPTIONS: [&str; 2] = ["queryType", "aggregationType"];

const AXES: [AxisType; 2] = [AxisType::Main, AxisType::Value];

pub struct Validator<'a> {
    catalog: &'a Catalog,
}

impl<'a> Validator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Validate a chart definition, returning the first violation found
    #[tracing::instrument(name = "validate", skip_all, fields(module_type = %chart.module_type))]
    pub fn validate(&self, chart: &ChartDefinition) -> Result<(), ValidationError> {
        match self.run(chart) {
            Ok(()) => {
                tracing::debug!("Chart is valid");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(code = e.code(), "Chart rejected: {}", e);
                Err(e)
            }
        }
    }

    fn run(&self, chart: &ChartDefinition) -> Result<(), ValidationError> {
        let index = self.resolve_data_view(&chart.data_view)?;

        let module = self
            .catalog
            .module_type(&chart.module_type)
            .ok_or_else(|| ValidationError::InvalidModuleType(chart.module_type.clone()))?;

        check_axes_present(chart, module)?;
        check_cardinality(chart, module)?;

        for axis in AXES {
            for entry in chart.axis(axis) {
                self.check_entry(entry, axis, index)?;
            }
        }

        Ok(())
    }

    fn resolve_data_view(&self, name: &str) -> Result<&'a IndexMapping, ValidationError> {
        let fail = |failure, message: String| ValidationError::DataView { failure, message };

        let view = self.catalog.data_view(name).ok_or_else(|| {
            fail(
                DataViewFailure::NotFound,
                format!("Data view '{}' does not exist.", name),
            )
        })?;

        let mapped = view
            .mapped_index
            .as_deref()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                fail(
                    DataViewFailure::MappedIndexMissing,
                    format!("Mapped index for data view '{}' does not exist.", name),
                )
            })?;

        let index = self.catalog.index(mapped).ok_or_else(|| {
            fail(
                DataViewFailure::IndexNotRegistered,
                format!(
                    "Index '{}' for data view '{}' is not registered.",
                    mapped, name
                ),
            )
        })?;

        if index.mapping_file.as_deref().is_none_or(str::is_empty) {
            return Err(fail(
                DataViewFailure::MappingFileMissing,
                format!("Mapping file for index '{}' does not exist.", mapped),
            ));
        }

        Ok(index)
    }

    fn check_entry(
        &self,
        entry: &AxisEntry,
        axis: AxisType,
        index: &IndexMapping,
    ) -> Result<(), ValidationError> {
        let function = self
            .catalog
            .function(&entry.function_type)
            .ok_or_else(|| ValidationError::InvalidFunction(entry.function_type.clone()))?;

        if function.axis_role.axis_type() != axis {
            return Err(ValidationError::FunctionAxisMismatch {
                function: function.id.clone(),
                axis,
            });
        }

        if function.handler.is_none() {
            return Err(ValidationError::FunctionNotConfigured(function.id.clone()));
        }

        let mut options = supplied_options(entry);

        if let Some(unknown) = options.keys().find(|k| !self.catalog.is_known_option(k)) {
            return Err(ValidationError::UnknownOption(unknown.clone()));
        }

        for key in INJECTED_OPTIONS {
            if options.contains_key(key) {
                continue;
            }
            if let Some(default) = function.required_default(key) {
                options.insert(key.to_string(), Value::String(default.to_string()));
            }
        }

        check_required(function, &options)?;

        if let Some(unmapped) = options.keys().find(|k| !function.declares(k)) {
            return Err(ValidationError::UnmappedOption {
                function: function.id.clone(),
                option: unmapped.clone(),
            });
        }

        check_formats(|k| options.get(k))?;

        if let Some(field) = entry.aggregation_field.as_deref() {
            if let Some(field_type) = index.fields.get(field) {
                if !function.accepts_field_type(field_type) {
                    return Err(ValidationError::InvalidFieldType {
                        function: function.id.clone(),
                        field: field.to_string(),
                        field_type: field_type.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn check_axes_present(
    chart: &ChartDefinition,
    module: &ModuleTypeDescriptor,
) -> Result<(), ValidationError> {
    for axis in AXES {
        let optional = module.frequency(axis) == Frequency::NotApplicable;
        if chart.axis(axis).is_empty() && !optional {
            return Err(ValidationError::MissingAxis(axis));
        }
    }
    Ok(())
}

fn check_cardinality(
    chart: &ChartDefinition,
    module: &ModuleTypeDescriptor,
) -> Result<(), ValidationError> {
    for axis in AXES {
        let frequency = module.frequency(axis);
        let len = chart.axis(axis).len();
        if !frequency.accepts(len) {
            return Err(ValidationError::InvalidAxisCardinality {
                axis,
                expectation: frequency.expectation(),
                actual: len,
            });
        }
    }
    Ok(())
}

/// Every option the caller wrote on the entry, `aggregationField` first
fn supplied_options(entry: &AxisEntry) -> IndexMap<String, Value> {
    let mut options = IndexMap::with_capacity(entry.options.len() + 3);
    if let Some(field) = &entry.aggregation_field {
        options.insert("aggregationField".to_string(), Value::String(field.clone()));
    }
    for (key, value) in &entry.options {
        options.insert(key.clone(), value.clone());
    }
    options
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn check_required(
    function: &FunctionDescriptor,
    options: &IndexMap<String, Value>,
) -> Result<(), ValidationError> {
    for (option, allowed) in &function.required_options {
        let value = options.get(option);
        if is_missing(value) {
            return Err(ValidationError::MissingRequiredOption {
                function: function.id.clone(),
                option: option.clone(),
            });
        }

        let (Some(allowed), Some(value)) = (allowed, value) else {
            continue;
        };
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if !allowed.iter().any(|a| *a == text) {
            return Err(ValidationError::InvalidOptionValue {
                function: function.id.clone(),
                option: option.clone(),
                value: text,
                allowed: allowed.join(", "),
            });
        }
    }
    Ok(())
}
