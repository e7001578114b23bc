//! End-to-end tests: validate, compile, then decode a store response

use dashagg::decode::{TitleOverrides, ValueOverrides};
use dashagg::query::COUNT_SLOT;
use dashagg::{Catalog, ChartDefinition, ErrorBody, QueryCompiler, ResultDecoder, Validator};
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;

fn call_logs_chart(main: Value, value: Value) -> ChartDefinition {
    serde_json::from_value(json!({
        "data_view": "Call Logs Report",
        "module_type": "data_table",
        "main_axis": main,
        "value_axis": value
    }))
    .unwrap()
}

#[test]
fn test_terms_average_scenario() {
    let catalog = Catalog::builtin().unwrap();
    let chart = call_logs_chart(
        json!([{"functionType": "top_values", "aggregationField": "status", "terms_size": 3}]),
        json!([{"functionType": "avg", "aggregationField": "duration"}]),
    );

    Validator::new(&catalog).validate(&chart).unwrap();
    let compiled = QueryCompiler::new(&catalog).compile(&chart).unwrap();

    let output = serde_json::to_value(&compiled).unwrap();
    assert_eq!(
        output["es_query"]["aggs"],
        json!({
            "0": {
                "terms": {"field": "status", "size": 3, "min_doc_count": 0, "order": {"_count": "desc"}},
                "aggs": {"2": {"avg": {"field": "duration"}}}
            }
        })
    );
    assert_eq!(
        output["mapping"],
        json!({
            "0": {
                "axisType": "main_axis",
                "axisIndex": 0,
                "children": {"2": {"axisType": "value_axis", "axisIndex": 0}}
            }
        })
    );
}

#[test]
fn test_rejections_carry_stable_codes() {
    let catalog = Catalog::builtin().unwrap();
    let validator = Validator::new(&catalog);

    let sum_on_main = call_logs_chart(
        json!([{"functionType": "sum", "aggregationField": "holdCount"}]),
        json!([{"functionType": "count"}]),
    );
    let err = validator.validate(&sum_on_main).unwrap_err();
    let body = ErrorBody::from(&err);
    assert_eq!(body.error_code, "INVALID_MODULE_FUNCTION_AXIS");
    assert_eq!(body.status, 400);

    let color_on_terms = call_logs_chart(
        json!([{"functionType": "top_values", "aggregationField": "callStatus", "color": "blue"}]),
        json!([{"functionType": "count"}]),
    );
    let err = validator.validate(&color_on_terms).unwrap_err();
    assert_eq!(err.code(), "UNMAPPED_OPTION_FUNCTION");
}

#[test]
fn test_non_list_axis_is_a_parse_error() {
    let err = ChartDefinition::from_json_str(
        r#"{"data_view": "Call Logs Report", "module_type": "data_table",
            "main_axis": {"functionType": "top_values"}, "value_axis": []}"#,
    )
    .unwrap_err();
    assert_eq!(err.code(), "PARSE_ERROR");
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_two_level_chart_round_trip() {
    let catalog = Catalog::builtin().unwrap();
    let chart = call_logs_chart(
        json!([
            {"functionType": "top_values", "aggregationField": "did", "terms_size": 2},
            {"functionType": "top_values", "aggregationField": "callLiveStatus", "missing": "__missing__"}
        ]),
        json!([
            {"functionType": "avg", "aggregationField": "duration.lastFirst"},
            {"functionType": "count"}
        ]),
    );

    Validator::new(&catalog).validate(&chart).unwrap();
    let compiled = QueryCompiler::new(&catalog).compile(&chart).unwrap();

    let inner_slots = &compiled.slot_map["0"].children["1"].children;
    assert_eq!(inner_slots.keys().collect::<Vec<_>>(), vec!["3", COUNT_SLOT]);

    let response = json!({
        "took": 93,
        "hits": {"total": {"value": 10000, "relation": "gte"}, "hits": []},
        "aggregations": {"0": {"buckets": [
            {"key": "915223116800", "doc_count": 30, "1": {"buckets": [
                {"key": "5", "doc_count": 20, "3": {"value": 22.5}},
                {"key": "21", "doc_count": 10, "3": {"value": null}}
            ]}},
            {"key": "915224948850", "doc_count": 4, "1": {"buckets": [
                {"key": "3", "doc_count": 4, "3": {"value": 88.0}}
            ]}}
        ]}}
    });

    let titles: TitleOverrides = serde_json::from_value(json!({
        "main_axis": {"0": "Top DIDs", "1": "Top Call Status"},
        "value_axis": {"0": "Avg Call Duration", "1": "Doc Count"}
    }))
    .unwrap();
    let values: ValueOverrides = serde_json::from_value(json!({
        "main_axis": {
            "0": {"915223116800": "Main DID"},
            "1": {"3": "Answered", "5": "Pending"}
        }
    }))
    .unwrap();

    let rows = ResultDecoder::new()
        .with_titles(titles)
        .with_values(values)
        .decode(&response, &compiled.slot_map)
        .unwrap();

    let rows: Vec<Value> = rows.into_iter().map(Value::Object).collect();
    assert_eq!(
        rows,
        vec![
            json!({"Top DIDs": "Main DID", "Top Call Status": "Pending", "Avg Call Duration": 22.5, "Doc Count": 20}),
            json!({"Top DIDs": "Main DID", "Top Call Status": "21", "Avg Call Duration": null, "Doc Count": 10}),
            json!({"Top DIDs": "915224948850", "Top Call Status": "Answered", "Avg Call Duration": 88.0, "Doc Count": 4}),
        ]
    );
}

#[test]
fn test_metric_module_counts_root_hits() {
    let catalog = Catalog::builtin().unwrap();
    let chart: ChartDefinition = serde_json::from_value(json!({
        "data_view": "Call Logs Report",
        "module_type": "metric",
        "main_axis": [],
        "value_axis": [{"functionType": "count"}]
    }))
    .unwrap();

    Validator::new(&catalog).validate(&chart).unwrap();
    let compiled = QueryCompiler::new(&catalog).compile(&chart).unwrap();
    assert!(compiled.request.aggs.is_empty());

    let rows = ResultDecoder::new()
        .decode(&json!({"hits": {"total": {"value": 1234}}}), &compiled.slot_map)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(Value::Object(rows[0].clone()), json!({"value_axis.0": 1234}));
}

#[test]
fn test_catalog_shared_across_threads() {
    let catalog = Arc::new(Catalog::builtin().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                let chart = call_logs_chart(
                    json!([{"functionType": "top_values", "aggregationField": "callStatus", "terms_size": n + 1}]),
                    json!([{"functionType": "max", "aggregationField": "holdCount"}]),
                );
                Validator::new(&catalog).validate(&chart).unwrap();
                let compiled = QueryCompiler::new(&catalog).compile(&chart).unwrap();
                serde_json::to_value(&compiled.request).unwrap()["aggs"]["0"]["terms"]["size"]
                    .as_u64()
                    .unwrap()
            })
        })
        .collect();

    let sizes: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(sizes, vec![1, 2, 3, 4]);
}
