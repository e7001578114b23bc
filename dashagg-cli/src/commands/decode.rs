use super::{print_json, read_json, report};
use anyhow::Result;
use dashagg::decode::{TitleOverrides, ValueOverrides};
use dashagg::query::SlotMap;
use dashagg::ResultDecoder;
use serde_json::Value;
use std::path::Path;

/// Decode a raw result with its slot map; prints the rows as a JSON array
pub fn run_decode(
    result: &Path,
    mapping: &Path,
    titles: Option<&Path>,
    values: Option<&Path>,
) -> Result<bool> {
    let raw: Value = read_json(result)?;
    let slots: SlotMap = read_json(mapping)?;

    let mut decoder = ResultDecoder::new();
    if let Some(path) = titles {
        decoder = decoder.with_titles(read_json::<TitleOverrides>(path)?);
    }
    if let Some(path) = values {
        decoder = decoder.with_values(read_json::<ValueOverrides>(path)?);
    }

    match decoder.decode(&raw, &slots) {
        Ok(rows) => {
            print_json(&rows)?;
            Ok(true)
        }
        Err(e) => {
            report(&dashagg::Error::from(e))?;
            Ok(false)
        }
    }
}
