pub mod catalog;
pub mod chart;
pub mod config;
pub mod decode;
pub mod error;
pub mod query;
pub mod validate;

pub use catalog::Catalog;
pub use chart::{AxisEntry, AxisType, ChartDefinition};
pub use config::Config;
pub use decode::{ResultDecoder, Row};
pub use error::{Error, ErrorBody, Result};
pub use query::{CompileOptions, CompiledChart, QueryCompiler};
pub use validate::Validator;
