//! Nested bucket result -> flat rows
//!
//! The decoder walks the store's aggregation result alongside the slot map the
//! request was compiled with. Every combination of main-axis buckets becomes
//! one row holding the bucket keys and the metric values found beneath them.

use crate::chart::AxisType;
use crate::error::DecodeError;
use crate::query::{SlotMap, SlotNode, COUNT_SLOT};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One decoded row, columns in axis order
pub type Row = Map<String, Value>;

/// Column title per axis position: `{"main_axis": {"0": "Top DIDs"}}`
pub type TitleOverrides = HashMap<AxisType, HashMap<usize, String>>;

/// Replacement for raw bucket keys per axis position:
/// `{"main_axis": {"0": {"915223116800": "Main DID"}}}`
pub type ValueOverrides = HashMap<AxisType, HashMap<usize, HashMap<String, Value>>>;

#[derive(Debug, Clone, Default)]
pub struct ResultDecoder {
    titles: TitleOverrides,
    values: ValueOverrides,
}

impl ResultDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_titles(mut self, titles: TitleOverrides) -> Self {
        self.titles = titles;
        self
    }

    pub fn with_values(mut self, values: ValueOverrides) -> Self {
        self.values = values;
        self
    }

    /// Decode a raw search response (`{hits, aggregations}`) into rows
    #[tracing::instrument(name = "decode", skip_all)]
    pub fn decode(&self, raw: &Value, slots: &SlotMap) -> Result<Vec<Row>, DecodeError> {
        let empty = Map::new();
        let root = raw
            .get("aggregations")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let walk = Walk { decoder: self, raw };
        let mut rows = Vec::new();
        walk.level(root, slots, None, "aggregations", Row::new(), &mut rows)?;

        tracing::debug!(rows = rows.len(), "Decoded result");
        Ok(rows)
    }

    fn column(&self, axis: AxisType, index: usize) -> String {
        self.titles
            .get(&axis)
            .and_then(|titles| titles.get(&index))
            .cloned()
            .unwrap_or_else(|| format!("{}.{}", axis, index))
    }

    fn key_value(&self, slot: &SlotNode, key: &Value) -> Value {
        let overridden = self
            .values
            .get(&slot.axis_type)
            .and_then(|by_index| by_index.get(&slot.axis_index))
            .and_then(|by_key| by_key.get(&key_text(key)));
        overridden.unwrap_or(key).clone()
    }
}

/// Bucket keys as override lookup text: strings as-is, integral floats
/// without a fraction (`100.0` -> `"100"`), other values in JSON form
fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

struct Walk<'d> {
    decoder: &'d ResultDecoder,
    raw: &'d Value,
}

impl Walk<'_> {
    /// Decode one nesting level. `container` holds the sibling aggregations
    /// for `slots`; `doc_count` is the enclosing bucket's count, `None` at the root.
    fn level(
        &self,
        container: &Map<String, Value>,
        slots: &SlotMap,
        doc_count: Option<&Value>,
        path: &str,
        mut row: Row,
        rows: &mut Vec<Row>,
    ) -> Result<(), DecodeError> {
        let mut main = None;

        for (id, slot) in slots {
            match slot.axis_type {
                AxisType::Main => main = Some((id, slot)),
                AxisType::Value => {
                    let value = if id == COUNT_SLOT {
                        match doc_count {
                            Some(count) => count.clone(),
                            None => self.total_hits()?,
                        }
                    } else {
                        metric_value(container, id, path)?
                    };
                    row.insert(self.decoder.column(AxisType::Value, slot.axis_index), value);
                }
            }
        }

        let Some((id, slot)) = main else {
            rows.push(row);
            return Ok(());
        };

        let buckets = container
            .get(id)
            .ok_or_else(|| DecodeError::MissingAggregation {
                id: id.clone(),
                path: path.to_string(),
            })?
            .get("buckets")
            .and_then(Value::as_array)
            .ok_or_else(|| DecodeError::NotBucketAggregation {
                id: id.clone(),
                path: path.to_string(),
            })?;

        let column = self.decoder.column(AxisType::Main, slot.axis_index);
        for (n, bucket) in buckets.iter().enumerate() {
            let bucket_path = format!("{}.{}[{}]", path, id, n);
            let malformed = |reason: &str| DecodeError::MalformedBucket {
                id: id.clone(),
                path: bucket_path.clone(),
                reason: reason.to_string(),
            };

            let bucket = bucket
                .as_object()
                .ok_or_else(|| malformed("bucket is not an object"))?;
            let key = bucket.get("key").ok_or_else(|| malformed("no key"))?;
            let count = bucket
                .get("doc_count")
                .filter(|c| c.is_number())
                .ok_or_else(|| malformed("no numeric doc_count"))?;

            let mut next = row.clone();
            next.insert(column.clone(), self.decoder.key_value(slot, key));
            self.level(bucket, &slot.children, Some(count), &bucket_path, next, rows)?;
        }

        Ok(())
    }

    /// Root document count: `hits.total.value`, or a bare numeric `hits.total`
    fn total_hits(&self) -> Result<Value, DecodeError> {
        let total = self
            .raw
            .get("hits")
            .and_then(|hits| hits.get("total"))
            .ok_or(DecodeError::MissingTotalHits)?;
        let value = total.get("value").unwrap_or(total);
        if value.is_number() {
            Ok(value.clone())
        } else {
            Err(DecodeError::MissingTotalHits)
        }
    }
}

fn metric_value(container: &Map<String, Value>, id: &str, path: &str) -> Result<Value, DecodeError> {
    container
        .get(id)
        .ok_or_else(|| DecodeError::MissingAggregation {
            id: id.to_string(),
            path: path.to_string(),
        })?
        .get("value")
        .cloned()
        .ok_or_else(|| DecodeError::MissingMetricValue {
            id: id.to_string(),
            path: path.to_string(),
        })
}
