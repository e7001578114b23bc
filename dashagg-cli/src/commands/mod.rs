pub mod catalog;
pub mod compile;
pub mod decode;
pub mod validate;

pub use catalog::{run_catalog, CatalogSection};
pub use compile::run_compile;
pub use decode::run_decode;
pub use validate::run_validate;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Read and parse a JSON file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a chart definition file. Parse failures are returned as the inner
/// error so they can be reported like any other rejected chart.
pub(crate) fn read_chart(path: &Path) -> Result<dashagg::Result<dashagg::ChartDefinition>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(dashagg::ChartDefinition::from_json_str(&content))
}

/// Print the caller-facing error body for a rejected chart
pub(crate) fn report(err: &dashagg::Error) -> Result<()> {
    tracing::debug!(code = err.code(), status = err.status_code(), "Request rejected");
    print_json(&dashagg::ErrorBody::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashagg::Catalog;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_chart_separates_io_from_parse_errors() {
        let temp = TempDir::new().unwrap();

        assert!(read_chart(&temp.path().join("missing.json")).is_err());

        let broken = write(&temp, "broken.json", "{\"main_axis\": 3}");
        let parsed = read_chart(&broken).unwrap();
        assert_eq!(parsed.unwrap_err().code(), "PARSE_ERROR");
    }

    #[test]
    fn test_validate_and_compile_commands() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::builtin().unwrap();
        let config = dashagg::Config::default();

        let good = write(
            &temp,
            "good.json",
            r#"{"data_view": "Call Logs Report", "module_type": "bar_vertical",
                "main_axis": [{"functionType": "date_histogram", "aggregationField": "clickTime", "fixed_interval": "1d"}],
                "value_axis": [{"functionType": "count"}]}"#,
        );
        assert!(run_validate(&catalog, &good).unwrap());
        assert!(run_compile(&catalog, &config, &good, Some((0, 86_400_000)), None).unwrap());

        let bad = write(
            &temp,
            "bad.json",
            r#"{"data_view": "Nowhere", "module_type": "bar_vertical"}"#,
        );
        assert!(!run_validate(&catalog, &bad).unwrap());
        assert!(!run_compile(&catalog, &config, &bad, None, None).unwrap());
    }

    #[test]
    fn test_decode_command() {
        let temp = TempDir::new().unwrap();
        let mapping = write(
            &temp,
            "mapping.json",
            r#"{"0": {"axisType": "main_axis", "axisIndex": 0,
                      "children": {"count": {"axisType": "value_axis", "axisIndex": 0}}}}"#,
        );
        let result = write(
            &temp,
            "result.json",
            r#"{"aggregations": {"0": {"buckets": [{"key": "a", "doc_count": 3}]}}}"#,
        );
        let titles = write(&temp, "titles.json", r#"{"value_axis": {"0": "Calls"}}"#);
        assert!(run_decode(&result, &mapping, Some(&titles), None).unwrap());

        let malformed = write(&temp, "malformed.json", r#"{"aggregations": {"0": {}}}"#);
        assert!(!run_decode(&malformed, &mapping, None, None).unwrap());
    }
}
