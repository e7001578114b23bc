//! Aggregation request and slot map wire types

use crate::chart::{AxisType, SortDirection};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sibling aggregations, keyed by aggregation id
pub type Aggregations = IndexMap<String, AggregationNode>;

/// Top-level search body sent to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub aggs: Aggregations,
    pub size: u64,
    pub query: Value,
}

impl AggregationRequest {
    pub fn new(aggs: Aggregations, query: Value) -> Self {
        Self {
            aggs,
            size: 0,
            query,
        }
    }
}

/// Query used when the caller supplies none
pub fn empty_bool_query() -> Value {
    serde_json::json!({
        "bool": {
            "must": [],
            "filter": [],
            "should": [],
            "must_not": []
        }
    })
}

/// One aggregation: an operator plus, for bucket operators, its sub-aggregations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationNode {
    #[serde(flatten)]
    pub op: AggregationOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggs: Option<Aggregations>,
}

impl AggregationNode {
    pub fn bucket(op: AggregationOp, aggs: Aggregations) -> Self {
        Self {
            op,
            aggs: Some(aggs),
        }
    }

    pub fn metric(op: AggregationOp) -> Self {
        Self { op, aggs: None }
    }

    pub fn is_bucket(&self) -> bool {
        self.op.is_bucket()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOp {
    Terms(TermsAgg),
    DateHistogram(DateHistogramAgg),
    Histogram(HistogramAgg),
    Avg(FieldAgg),
    Sum(FieldAgg),
    Min(FieldAgg),
    Max(FieldAgg),
    ValueCount(FieldAgg),
    Cardinality(FieldAgg),
}

impl AggregationOp {
    pub fn is_bucket(&self) -> bool {
        matches!(
            self,
            Self::Terms(_) | Self::DateHistogram(_) | Self::Histogram(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAgg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsAgg {
    pub field: String,
    pub size: u64,
    pub min_doc_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
    /// Sort key (`_count` or a sibling aggregation id) -> direction
    pub order: IndexMap<String, SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateHistogramAgg {
    pub field: String,
    pub fixed_interval: String,
    pub min_doc_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_bounds: Option<ExtendedBounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramAgg {
    pub field: String,
    pub interval: f64,
    pub min_doc_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
}

/// Histogram range forced onto a date histogram, in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedBounds {
    pub min: i64,
    pub max: i64,
}

/// Aggregation id -> slot, mirroring the request's `aggs` tree
pub type SlotMap = IndexMap<String, SlotNode>;

/// Reserved slot id for a value read from the enclosing bucket's `doc_count`
pub const COUNT_SLOT: &str = "count";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotNode {
    #[serde(rename = "axisType")]
    pub axis_type: AxisType,
    #[serde(rename = "axisIndex")]
    pub axis_index: usize,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: SlotMap,
}

impl SlotNode {
    pub fn main(axis_index: usize, children: SlotMap) -> Self {
        Self {
            axis_type: AxisType::Main,
            axis_index,
            children,
        }
    }

    pub fn value(axis_index: usize) -> Self {
        Self {
            axis_type: AxisType::Value,
            axis_index,
            children: SlotMap::new(),
        }
    }
}

/// Compiled chart: the request to run and the slot map to decode its result with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledChart {
    #[serde(rename = "es_query")]
    pub request: AggregationRequest,
    #[serde(rename = "mapping")]
    pub slot_map: SlotMap,
}
