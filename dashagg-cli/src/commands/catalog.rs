use anyhow::Result;
use clap::ValueEnum;
use dashagg::catalog::Frequency;
use dashagg::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogSection {
    Functions,
    ModuleTypes,
    DataViews,
}

fn frequency(f: Frequency) -> &'static str {
    match f {
        Frequency::Single => "single",
        Frequency::Multiple => "multiple",
        Frequency::NotApplicable => "n/a",
    }
}

/// Print one catalog section, or all of them
pub fn run_catalog(catalog: &Catalog, section: Option<CatalogSection>) -> Result<bool> {
    let sections = match section {
        Some(s) => vec![s],
        None => vec![
            CatalogSection::Functions,
            CatalogSection::ModuleTypes,
            CatalogSection::DataViews,
        ],
    };

    for section in sections {
        match section {
            CatalogSection::Functions => {
                println!("Functions");
                println!("--------------------------------------------------------------------------------");
                for f in catalog.functions() {
                    let handler = f
                        .handler
                        .map(|h| h.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("  {:<16} {:<6} {:<16} {}", f.id, f.axis_role.as_str(), handler, f.name);
                }
            }
            CatalogSection::ModuleTypes => {
                println!("Module types");
                println!("--------------------------------------------------------------------------------");
                for m in catalog.module_types() {
                    println!(
                        "  {:<28} main={:<9} value={:<9} {}",
                        m.id,
                        frequency(m.main_axis_frequency),
                        frequency(m.value_axis_frequency),
                        m.graph_type
                    );
                }
            }
            CatalogSection::DataViews => {
                println!("Data views");
                println!("--------------------------------------------------------------------------------");
                for (name, view) in catalog.data_views() {
                    println!(
                        "  {:<24} -> {}",
                        name,
                        view.mapped_index.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        println!();
    }

    Ok(true)
}
