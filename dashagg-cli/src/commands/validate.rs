use super::{read_chart, report};
use anyhow::Result;
use dashagg::{Catalog, Validator};
use std::path::Path;

/// Validate a chart file; prints `valid` or the error body
pub fn run_validate(catalog: &Catalog, chart: &Path) -> Result<bool> {
    let outcome = read_chart(chart)?
        .and_then(|chart| Ok(Validator::new(catalog).validate(&chart)?));

    match outcome {
        Ok(()) => {
            println!("valid");
            Ok(true)
        }
        Err(e) => {
            report(&e)?;
            Ok(false)
        }
    }
}
