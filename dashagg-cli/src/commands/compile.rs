use super::{print_json, read_chart, read_json, report};
use anyhow::Result;
use dashagg::query::ExtendedBounds;
use dashagg::{Catalog, CompileOptions, CompiledChart, Config, QueryCompiler, Validator};
use serde_json::Value;
use std::path::Path;

/// Validate and compile a chart file; prints `{es_query, mapping}` or the error body
pub fn run_compile(
    catalog: &Catalog,
    config: &Config,
    chart: &Path,
    bounds: Option<(i64, i64)>,
    query: Option<&Path>,
) -> Result<bool> {
    let options = CompileOptions {
        extended_bounds: bounds.map(|(min, max)| ExtendedBounds { min, max }),
        query: query.map(read_json::<Value>).transpose()?,
    };

    let compiler = QueryCompiler::new(catalog).with_config(config.compiler.clone());
    let outcome = read_chart(chart)?.and_then(|chart| -> dashagg::Result<CompiledChart> {
        Validator::new(catalog).validate(&chart)?;
        Ok(compiler.compile_with(&chart, &options)?)
    });

    match outcome {
        Ok(compiled) => {
            print_json(&compiled)?;
            Ok(true)
        }
        Err(e) => {
            report(&e)?;
            Ok(false)
        }
    }
}
