//! Chart definition -> aggregation request compiler
//!
//! Main-axis entries become nested bucket aggregations with ids "0", "1", ...
//! and value-axis entries become metric aggregations under the innermost
//! bucket, numbered after the main axis. A slot map with the same shape records
//! which axis position each id stands for.

use super::types::{
    AggregationNode, AggregationOp, AggregationRequest, Aggregations, CompiledChart,
    DateHistogramAgg, ExtendedBounds, FieldAgg, HistogramAgg, SlotMap, SlotNode, TermsAgg,
    COUNT_SLOT,
};
use crate::catalog::{BucketKind, Catalog, FunctionHandler, MetricKind};
use crate::chart::{AxisEntry, AxisType, ChartDefinition, OrderTarget, SortDirection};
use crate::config::CompilerConfig;
use crate::error::CompileError;
use indexmap::IndexMap;
use serde_json::Value;

/// Per-call inputs that are not part of the chart itself
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Bounds for every date histogram; overrides the configured default
    pub extended_bounds: Option<ExtendedBounds>,
    /// Query clause for the request; overrides the configured default
    pub query: Option<Value>,
}

pub struct QueryCompiler<'a> {
    catalog: &'a Catalog,
    config: CompilerConfig,
}

/// What one value-axis entry compiles to
enum ValueKind {
    Metric(MetricKind),
    DocCount,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Compile a validated chart with the configured defaults
    pub fn compile(&self, chart: &ChartDefinition) -> Result<CompiledChart, CompileError> {
        self.compile_with(chart, &CompileOptions::default())
    }

    #[tracing::instrument(name = "compile", skip_all, fields(module_type = %chart.module_type))]
    pub fn compile_with(
        &self,
        chart: &ChartDefinition,
        options: &CompileOptions,
    ) -> Result<CompiledChart, CompileError> {
        let level = Level {
            main: chart.main_axis(),
            values: chart.value_axis(),
            bounds: options.extended_bounds.or(self.config.extended_bounds),
        };

        let (aggs, slot_map) = if level.main.is_empty() {
            self.value_aggregations(level.values, 1)?
        } else {
            self.main_aggregation(&level, 0)?
        };

        let query = options
            .query
            .clone()
            .unwrap_or_else(|| self.config.default_query());

        tracing::debug!(
            main = level.main.len(),
            values = level.values.len(),
            "Compiled chart"
        );

        Ok(CompiledChart {
            request: AggregationRequest::new(aggs, query),
            slot_map,
        })
    }

    fn handler(&self, entry: &AxisEntry) -> Result<FunctionHandler, CompileError> {
        let function = self
            .catalog
            .function(&entry.function_type)
            .ok_or_else(|| CompileError::UnknownFunction(entry.function_type.clone()))?;
        function
            .handler
            .ok_or_else(|| CompileError::MissingAggregationType(function.id.clone()))
    }

    fn bucket_kind(&self, entry: &AxisEntry) -> Result<BucketKind, CompileError> {
        match self.handler(entry)? {
            FunctionHandler::Bucket(kind) => Ok(kind),
            _ => Err(CompileError::FunctionAxisMismatch {
                function: entry.function_type.clone(),
                axis: AxisType::Main,
            }),
        }
    }

    fn value_kind(&self, entry: &AxisEntry) -> Result<ValueKind, CompileError> {
        match self.handler(entry)? {
            FunctionHandler::Metric(kind) => Ok(ValueKind::Metric(kind)),
            FunctionHandler::DocCount => Ok(ValueKind::DocCount),
            FunctionHandler::Bucket(_) => Err(CompileError::FunctionAxisMismatch {
                function: entry.function_type.clone(),
                axis: AxisType::Value,
            }),
        }
    }

    /// Metric aggregations for the whole value axis, numbered from `start`
    fn value_aggregations(
        &self,
        values: &[AxisEntry],
        start: usize,
    ) -> Result<(Aggregations, SlotMap), CompileError> {
        let mut aggs = Aggregations::new();
        let mut slots = SlotMap::new();

        for (j, entry) in values.iter().enumerate() {
            match self.value_kind(entry)? {
                ValueKind::DocCount => {
                    slots.insert(COUNT_SLOT.to_string(), SlotNode::value(j));
                }
                ValueKind::Metric(kind) => {
                    let id = (start + j).to_string();
                    tracing::trace!(id = %id, function = %entry.function_type, "Metric aggregation");
                    aggs.insert(id.clone(), metric_node(entry, kind));
                    slots.insert(id, SlotNode::value(j));
                }
            }
        }

        Ok((aggs, slots))
    }

    /// The bucket aggregation for main position `i` and everything beneath it
    fn main_aggregation(
        &self,
        level: &Level<'_>,
        i: usize,
    ) -> Result<(Aggregations, SlotMap), CompileError> {
        let entry = &level.main[i];
        let kind = self.bucket_kind(entry)?;

        let (mut children, child_slots) = if level.is_last(i) {
            self.value_aggregations(level.values, level.main.len() + 1)?
        } else {
            self.main_aggregation(level, i + 1)?
        };

        let field = entry.aggregation_field.clone().unwrap_or_default();
        let op = match kind {
            BucketKind::Terms => AggregationOp::Terms(TermsAgg {
                field,
                size: entry
                    .get_u64("terms_size")
                    .or_else(|| entry.get_u64("size"))
                    .unwrap_or(self.config.default_terms_size),
                min_doc_count: entry.get_u64("min_doc_count").unwrap_or(0),
                missing: entry.get("missing").cloned(),
                order: self.terms_order(level, i, &mut children)?,
            }),
            BucketKind::DateHistogram => AggregationOp::DateHistogram(DateHistogramAgg {
                field,
                fixed_interval: entry.get_str("fixed_interval").unwrap_or_default().to_string(),
                min_doc_count: entry.get_u64("min_doc_count").unwrap_or(0),
                time_zone: entry
                    .get_str("timeZone")
                    .or_else(|| self.config.time_zone())
                    .map(str::to_string),
                extended_bounds: level.bounds,
            }),
            BucketKind::Histogram => AggregationOp::Histogram(HistogramAgg {
                field,
                interval: entry.get_f64("interval").unwrap_or_default(),
                min_doc_count: entry.get_u64("min_doc_count").unwrap_or(0),
                missing: entry.get("missing").cloned(),
            }),
        };

        let id = i.to_string();
        tracing::trace!(id = %id, function = %entry.function_type, "Bucket aggregation");

        let mut aggs = Aggregations::new();
        aggs.insert(id.clone(), AggregationNode::bucket(op, children));
        let mut slots = SlotMap::new();
        slots.insert(id, SlotNode::main(i, child_slots));
        Ok((aggs, slots))
    }

    /// Sort clause for a terms aggregation. Ordering by a metric adds that
    /// metric as an auxiliary sibling in `children`.
    fn terms_order(
        &self,
        level: &Level<'_>,
        i: usize,
        children: &mut Aggregations,
    ) -> Result<IndexMap<String, SortDirection>, CompileError> {
        let spec = match level.main[i].order() {
            None => return Ok(order_by(COUNT_KEY, SortDirection::Desc)),
            Some(spec) => spec.map_err(CompileError::InvalidOrder)?,
        };

        let index = match spec.target {
            OrderTarget::DocCount => return Ok(order_by(COUNT_KEY, spec.direction)),
            OrderTarget::ValueAxis(index) => index,
        };

        let position = usize::try_from(index)
            .ok()
            .filter(|n| *n < level.values.len())
            .ok_or(CompileError::OrderIndexOutOfRange {
                index,
                available: level.values.len(),
            })?;

        let target = &level.values[position];
        let metric = match self.value_kind(target)? {
            ValueKind::DocCount => return Ok(order_by(COUNT_KEY, spec.direction)),
            ValueKind::Metric(kind) => metric_node(target, kind),
        };

        let aux_id = if i == 0 { 2 } else { i + position + 2 };
        // at the innermost level the metric already has a sibling id of its own
        let own_id = level
            .is_last(i)
            .then(|| level.main.len() + 1 + position);

        let id = place_auxiliary(children, aux_id, own_id, metric)?;
        Ok(order_by(&id, spec.direction))
    }
}

const COUNT_KEY: &str = "_count";

/// Axis lists and per-call settings shared by every nesting level
struct Level<'c> {
    main: &'c [AxisEntry],
    values: &'c [AxisEntry],
    bounds: Option<ExtendedBounds>,
}

impl Level<'_> {
    fn is_last(&self, i: usize) -> bool {
        i + 1 == self.main.len()
    }
}

fn order_by(key: &str, direction: SortDirection) -> IndexMap<String, SortDirection> {
    let mut order = IndexMap::with_capacity(1);
    order.insert(key.to_string(), direction);
    order
}

fn metric_node(entry: &AxisEntry, kind: MetricKind) -> AggregationNode {
    let agg = FieldAgg {
        field: entry.aggregation_field.clone(),
    };
    let op = match kind {
        MetricKind::Avg => AggregationOp::Avg(agg),
        MetricKind::Sum => AggregationOp::Sum(agg),
        MetricKind::Min => AggregationOp::Min(agg),
        MetricKind::Max => AggregationOp::Max(agg),
        MetricKind::ValueCount => AggregationOp::ValueCount(agg),
        MetricKind::Cardinality => AggregationOp::Cardinality(agg),
    };
    AggregationNode::metric(op)
}

/// Insert an auxiliary order aggregation under `aux_id`, returning the id the
/// terms `order` should reference.
///
/// A sibling already holding the same aggregation is reused. A different
/// sibling is only tolerated when the metric has its own id (`own_id`) to fall
/// back to.
fn place_auxiliary(
    children: &mut Aggregations,
    aux_id: usize,
    own_id: Option<usize>,
    metric: AggregationNode,
) -> Result<String, CompileError> {
    let id = aux_id.to_string();

    match children.get(&id) {
        None => {
            tracing::trace!(id = %id, "Auxiliary order aggregation");
            children.insert(id.clone(), metric);
            Ok(id)
        }
        Some(existing) if *existing == metric => {
            tracing::trace!(id = %id, "Order aggregation shares an existing sibling");
            Ok(id)
        }
        Some(_) => {
            let own = own_id
                .map(|n| n.to_string())
                .filter(|own| children.get(own) == Some(&metric))
                .ok_or_else(|| CompileError::AggregationIdCollision { id: id.clone() })?;
            tracing::debug!(from = %id, to = %own, "Renumbered order aggregation onto its metric");
            Ok(own)
        }
    }
}
