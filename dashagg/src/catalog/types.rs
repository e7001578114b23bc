use crate::chart::AxisType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Option name -> allowed values (`None` = any value)
pub type OptionSchema = IndexMap<String, Option<Vec<String>>>;

/// Axis a function may be placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisRole {
    Main,
    Value,
}

impl AxisRole {
    pub fn axis_type(&self) -> AxisType {
        match self {
            Self::Main => AxisType::Main,
            Self::Value => AxisType::Value,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Value => "value",
        }
    }
}

/// How many entries an axis accepts for a module type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Single,
    Multiple,
    #[serde(alias = "N/A")]
    NotApplicable,
}

impl Frequency {
    pub fn accepts(&self, len: usize) -> bool {
        match self {
            Self::Single => len == 1,
            Self::Multiple => len >= 1,
            Self::NotApplicable => len == 0,
        }
    }

    pub fn expectation(&self) -> &'static str {
        match self {
            Self::Single => "must contain exactly one object",
            Self::Multiple => "must contain one or more objects",
            Self::NotApplicable => "must be absent or empty for this module type",
        }
    }
}

/// Bucketing operators usable on the main axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Terms,
    DateHistogram,
    Histogram,
}

/// Single-value metric operators usable on the value axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Avg,
    Sum,
    Min,
    Max,
    ValueCount,
    Cardinality,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::ValueCount => "value_count",
            Self::Cardinality => "cardinality",
        }
    }
}

/// Typed handler a function resolves to at catalog load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionHandler {
    Bucket(BucketKind),
    Metric(MetricKind),
    /// Read from the enclosing bucket's document count; emits no aggregation
    DocCount,
}

impl FunctionHandler {
    pub fn from_aggregation_type(s: &str) -> Option<Self> {
        let handler = match s {
            "terms" => Self::Bucket(BucketKind::Terms),
            "date_histogram" => Self::Bucket(BucketKind::DateHistogram),
            "histogram" => Self::Bucket(BucketKind::Histogram),
            "avg" => Self::Metric(MetricKind::Avg),
            "sum" => Self::Metric(MetricKind::Sum),
            "min" => Self::Metric(MetricKind::Min),
            "max" => Self::Metric(MetricKind::Max),
            "value_count" => Self::Metric(MetricKind::ValueCount),
            "cardinality" => Self::Metric(MetricKind::Cardinality),
            "doc_count" => Self::DocCount,
            _ => return None,
        };
        Some(handler)
    }

    pub fn axis_role(&self) -> AxisRole {
        match self {
            Self::Bucket(_) => AxisRole::Main,
            Self::Metric(_) | Self::DocCount => AxisRole::Value,
        }
    }
}

impl fmt::Display for FunctionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bucket(BucketKind::Terms) => f.write_str("terms"),
            Self::Bucket(BucketKind::DateHistogram) => f.write_str("date_histogram"),
            Self::Bucket(BucketKind::Histogram) => f.write_str("histogram"),
            Self::Metric(kind) => f.write_str(kind.as_str()),
            Self::DocCount => f.write_str("doc_count"),
        }
    }
}

/// A catalog function, resolved
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub axis_role: AxisRole,
    pub required_options: OptionSchema,
    pub optional_options: OptionSchema,
    pub valid_field_types: Vec<String>,
    /// `None` for functions listed without an aggregationType
    pub handler: Option<FunctionHandler>,
}

impl FunctionDescriptor {
    /// Whether `key` is a declared required or optional option
    pub fn declares(&self, key: &str) -> bool {
        self.required_options.contains_key(key) || self.optional_options.contains_key(key)
    }

    pub fn accepts_field_type(&self, field_type: &str) -> bool {
        self.valid_field_types
            .iter()
            .any(|t| t == "all" || t == field_type)
    }

    /// First allowed value of a required option, used to fill injected options
    pub fn required_default(&self, key: &str) -> Option<&str> {
        self.required_options
            .get(key)?
            .as_ref()?
            .first()
            .map(String::as_str)
    }
}

/// A chart kind and its axis cardinality rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleTypeDescriptor {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "graphType", default)]
    pub graph_type: String,
    #[serde(rename = "mainAxisFrequency")]
    pub main_axis_frequency: Frequency,
    #[serde(rename = "valueAxisFrequency")]
    pub value_axis_frequency: Frequency,
    #[serde(rename = "colorAxis", default, skip_serializing_if = "Option::is_none")]
    pub color_axis: Option<String>,
}

impl ModuleTypeDescriptor {
    pub fn frequency(&self, axis: AxisType) -> Frequency {
        match axis {
            AxisType::Main => self.main_axis_frequency,
            AxisType::Value => self.value_axis_frequency,
        }
    }
}

/// A user-facing data view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataView {
    #[serde(rename = "mappedIndex", default)]
    pub mapped_index: Option<String>,
}

/// A physical index pattern and what is known of its mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    #[serde(rename = "mappingFile", default)]
    pub mapping_file: Option<String>,
    /// Field name -> store field type, when declared inline
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_rules() {
        assert!(Frequency::Single.accepts(1));
        assert!(!Frequency::Single.accepts(2));
        assert!(Frequency::Multiple.accepts(4));
        assert!(!Frequency::Multiple.accepts(0));
        assert!(Frequency::NotApplicable.accepts(0));
        assert!(!Frequency::NotApplicable.accepts(1));
    }

    #[test]
    fn test_frequency_accepts_na_alias() {
        let f: Frequency = serde_yaml::from_str("N/A").unwrap();
        assert_eq!(f, Frequency::NotApplicable);
    }

    #[test]
    fn test_handler_resolution() {
        assert_eq!(
            FunctionHandler::from_aggregation_type("terms"),
            Some(FunctionHandler::Bucket(BucketKind::Terms))
        );
        assert_eq!(
            FunctionHandler::from_aggregation_type("value_count"),
            Some(FunctionHandler::Metric(MetricKind::ValueCount))
        );
        assert_eq!(FunctionHandler::from_aggregation_type("nested"), None);
        assert_eq!(FunctionHandler::DocCount.axis_role(), AxisRole::Value);
        assert_eq!(
            FunctionHandler::Bucket(BucketKind::DateHistogram).to_string(),
            "date_histogram"
        );
    }
}
