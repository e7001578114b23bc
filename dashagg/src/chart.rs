//! Chart definition types
//!
//! A chart is a pair of axis lists: the main axis holds grouping dimensions
//! (top values, date histograms) and the value axis holds the metrics computed
//! inside each group.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which axis list an entry or slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AxisType {
    #[serde(rename = "main_axis")]
    Main,
    #[serde(rename = "value_axis")]
    Value,
}

impl AxisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main_axis",
            Self::Value => "value_axis",
        }
    }
}

impl fmt::Display for AxisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One function applied on one axis position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisEntry {
    #[serde(rename = "functionType")]
    pub function_type: String,

    #[serde(
        rename = "aggregationField",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub aggregation_field: Option<String>,

    /// Remaining option keys, in the order the caller supplied them
    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

impl AxisEntry {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key).filter(|v| !v.is_null())
    }

    /// Non-negative integer option; anything else reads as absent
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key)?.as_u64()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Parsed `order` option, if one was supplied
    pub fn order(&self) -> Option<Result<OrderSpec, String>> {
        self.get("order").map(OrderSpec::parse)
    }
}

/// A caller-supplied chart definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDefinition {
    #[serde(default)]
    pub data_view: String,

    #[serde(default)]
    pub module_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_axis: Option<Vec<AxisEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_axis: Option<Vec<AxisEntry>>,
}

impl ChartDefinition {
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn main_axis(&self) -> &[AxisEntry] {
        self.main_axis.as_deref().unwrap_or(&[])
    }

    pub fn value_axis(&self) -> &[AxisEntry] {
        self.value_axis.as_deref().unwrap_or(&[])
    }

    pub fn axis(&self, axis: AxisType) -> &[AxisEntry] {
        match axis {
            AxisType::Main => self.main_axis(),
            AxisType::Value => self.value_axis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// What a terms aggregation is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTarget {
    DocCount,
    /// Position in the value axis, as written by the caller (may be out of range)
    ValueAxis(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSpec {
    pub target: OrderTarget,
    pub direction: SortDirection,
}

impl OrderSpec {
    /// Parse `{"field": "_count" | "value_axis.N", "direction": "asc" | "desc"}`.
    /// Both keys are optional and default to `_count` / `desc`.
    pub fn parse(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("order must be an object, got {}", value))?;

        let target = match obj.get("field") {
            None | Some(Value::Null) => OrderTarget::DocCount,
            Some(Value::String(field)) if field == "_count" => OrderTarget::DocCount,
            Some(Value::String(field)) => {
                let index = field
                    .strip_prefix("value_axis.")
                    .and_then(|n| n.parse::<i64>().ok())
                    .ok_or_else(|| {
                        format!(
                            "order field must be '_count' or 'value_axis.<index>', got '{}'",
                            field
                        )
                    })?;
                OrderTarget::ValueAxis(index)
            }
            Some(other) => return Err(format!("order field must be a string, got {}", other)),
        };

        let direction = match obj.get("direction") {
            None | Some(Value::Null) => SortDirection::Desc,
            Some(Value::String(d)) if d == "asc" => SortDirection::Asc,
            Some(Value::String(d)) if d == "desc" => SortDirection::Desc,
            Some(other) => {
                return Err(format!(
                    "order direction must be 'asc' or 'desc', got {}",
                    other
                ))
            }
        };

        Ok(Self { target, direction })
    }
}
