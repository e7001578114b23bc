//! Aggregation query compilation

pub mod compiler;
pub mod types;

pub use compiler::{CompileOptions, QueryCompiler};
pub use types::{
    empty_bool_query, AggregationNode, AggregationOp, AggregationRequest, Aggregations,
    CompiledChart, DateHistogramAgg, ExtendedBounds, FieldAgg, HistogramAgg, SlotMap, SlotNode,
    TermsAgg, COUNT_SLOT,
};
