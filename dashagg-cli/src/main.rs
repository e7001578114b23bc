use anyhow::Result;
use clap::{Parser, Subcommand};
use dashagg::config::{default_config_path, Config};
use dashagg::Catalog;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::CatalogSection;

#[derive(Parser, Debug)]
#[command(name = "dashagg")]
#[command(about = "dashagg - chart definitions to aggregation queries and back")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.dashagg/config.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Catalog YAML file (overrides config)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a chart definition
    Validate {
        /// Chart definition JSON file
        chart: PathBuf,
    },

    /// Validate and compile a chart definition into {es_query, mapping}
    Compile {
        /// Chart definition JSON file
        chart: PathBuf,

        /// Lower date histogram bound, epoch milliseconds
        #[arg(long, requires = "bounds_max")]
        bounds_min: Option<i64>,

        /// Upper date histogram bound, epoch milliseconds
        #[arg(long, requires = "bounds_min")]
        bounds_max: Option<i64>,

        /// JSON file holding the query clause
        #[arg(long)]
        query: Option<PathBuf>,
    },

    /// Decode a raw aggregation result into rows
    Decode {
        /// Raw search response JSON file
        #[arg(short, long)]
        result: PathBuf,

        /// Slot map JSON file (the `mapping` part of `compile` output)
        #[arg(short, long)]
        mapping: PathBuf,

        /// Column titles per axis position
        #[arg(long)]
        titles: Option<PathBuf>,

        /// Bucket key replacements per axis position
        #[arg(long)]
        values: Option<PathBuf>,
    },

    /// List catalog entries
    Catalog {
        #[arg(value_enum)]
        section: Option<CatalogSection>,
    },
}

fn init_logging(config: &Config) -> Result<()> {
    let log_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let format = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| config.observability.log_format.clone());

    let builder = tracing_subscriber::fmt().with_env_filter(log_filter);

    match (&config.logging.file, format.as_str()) {
        (Some(log_file), fmt) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;
            if fmt == "json" {
                builder.json().with_writer(file).init();
            } else {
                builder.with_ansi(false).with_writer(file).init();
            }
        }
        (None, "json") => builder.json().with_writer(std::io::stderr).init(),
        (None, _) => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load_or_default(&config_path)?;
    if let Some(catalog) = cli.catalog {
        config.catalog.path = Some(dashagg::config::expand_tilde(&catalog)?);
    }

    init_logging(&config)?;

    let catalog: Catalog = config.load_catalog()?;
    tracing::debug!(config = %config_path.display(), "Catalog ready");

    let ok = match cli.command {
        Commands::Validate { chart } => commands::run_validate(&catalog, &chart)?,
        Commands::Compile {
            chart,
            bounds_min,
            bounds_max,
            query,
        } => {
            let bounds = bounds_min.zip(bounds_max);
            commands::run_compile(&catalog, &config, &chart, bounds, query.as_deref())?
        }
        Commands::Decode {
            result,
            mapping,
            titles,
            values,
        } => commands::run_decode(&result, &mapping, titles.as_deref(), values.as_deref())?,
        Commands::Catalog { section } => commands::run_catalog(&catalog, section)?,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
