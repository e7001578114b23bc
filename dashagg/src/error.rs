//! Error types for the chart pipeline
//!
//! Every stage returns its own error enum. Each enum exposes a stable
//! machine-readable code and the HTTP-equivalent status a caller should map it
//! to; [`ErrorBody`] is the JSON shape handed back to callers.

use crate::chart::AxisType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog is internally inconsistent. Fatal at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Catalog parse error: {0}")]
    Parse(String),

    #[error("Function '{function}' declares option '{option}' which is not a recognized option key")]
    UndeclaredOptionKey { function: String, option: String },

    #[error("Function '{function}' declares unknown aggregationType '{aggregation_type}'")]
    UnknownAggregationType {
        function: String,
        aggregation_type: String,
    },

    #[error("Function '{function}' declares invalid queryType '{query_type}'")]
    InvalidQueryType { function: String, query_type: String },

    #[error("Function '{function}' has axis role '{role}' but its handler '{handler}' belongs on the other axis")]
    HandlerAxisMismatch {
        function: String,
        role: String,
        handler: String,
    },

    #[error("Function '{function}' declares option '{option}' with an empty allowed-value set")]
    EmptyAllowedValues { function: String, option: String },

    #[error("Data view '{0}' has an empty mapped index name")]
    EmptyMappedIndex(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "CATALOG_CONFIG_ERROR"
    }

    pub fn status_code(&self) -> u16 {
        500
    }
}

/// Why a data view failed to resolve to a physical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataViewFailure {
    NotFound,
    MappedIndexMissing,
    IndexNotRegistered,
    MappingFileMissing,
}

/// The chart definition violates the grammar. Reported to the caller, never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{message}")]
    DataView {
        failure: DataViewFailure,
        message: String,
    },

    #[error("Invalid module type: {0}.")]
    InvalidModuleType(String),

    #[error("The '{0}' field is required, must be an array, and cannot be empty.")]
    MissingAxis(AxisType),

    #[error("The '{axis}' field {expectation}, got {actual}.")]
    InvalidAxisCardinality {
        axis: AxisType,
        expectation: &'static str,
        actual: usize,
    },

    #[error("Invalid module function: {0}.")]
    InvalidFunction(String),

    #[error("function '{function}' is not valid in '{axis}'")]
    FunctionAxisMismatch { function: String, axis: AxisType },

    #[error("configuration of function '{0}' is incomplete. Contact Admin")]
    FunctionNotConfigured(String),

    #[error("Invalid option found: '{0}'")]
    UnknownOption(String),

    #[error("{option} is required.")]
    MissingRequiredOption { function: String, option: String },

    #[error("For function '{function}', invalid value for '{option}': '{value}'. Allowed values: '{allowed}'.")]
    InvalidOptionValue {
        function: String,
        option: String,
        value: String,
        allowed: String,
    },

    #[error("Options '{option}' is not mapped with Function '{function}'")]
    UnmappedOption { function: String, option: String },

    #[error("Invalid {option}: {value}. {expected}")]
    InvalidOptionFormat {
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("Field '{field}' has type '{field_type}' which function '{function}' does not support")]
    InvalidFieldType {
        function: String,
        field: String,
        field_type: String,
    },
}

impl ValidationError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DataView { failure, .. } => match failure {
                DataViewFailure::NotFound => "DV_DATA_VIEW_NOT_FOUND",
                DataViewFailure::MappedIndexMissing => "DV_MAPPED_INDEX_NOT_FOUND",
                DataViewFailure::IndexNotRegistered => "DV_ESINDEX_KEY_NOT_FOUND",
                DataViewFailure::MappingFileMissing => "DV_ESMAPPING_FILE_NOT_FOUND",
            },
            Self::InvalidModuleType(_) => "INVALID_MODULE_TYPE",
            Self::MissingAxis(AxisType::Main) => "MISSING_OR_INVALID_MAIN_AXIS",
            Self::MissingAxis(AxisType::Value) => "MISSING_OR_INVALID_VALUE_AXIS",
            Self::InvalidAxisCardinality {
                axis: AxisType::Main,
                ..
            } => "INVALID_MAIN_AXIS_SIZE",
            Self::InvalidAxisCardinality {
                axis: AxisType::Value,
                ..
            } => "INVALID_VALUE_AXIS_SIZE",
            Self::InvalidFunction(_) => "INVALID_MODULE_FUNCTION",
            Self::FunctionAxisMismatch { .. } => "INVALID_MODULE_FUNCTION_AXIS",
            Self::FunctionNotConfigured(_) => "MODULE_FUNCTION_CONFIG_MISSING",
            Self::UnknownOption(_) => "UNKNOWN_OPTION",
            Self::MissingRequiredOption { .. } => "MISSING_REQUIRED_OPTION",
            Self::InvalidOptionValue { .. } => "INVALID_REQUIRED_OPTION_VALUE",
            Self::UnmappedOption { .. } => "UNMAPPED_OPTION_FUNCTION",
            Self::InvalidOptionFormat { option, .. } => match option.as_str() {
                "timeZone" => "INVALID_TIMEZONE_FORMAT",
                "fixed_interval" => "INVALID_FIXED_INTERVAL",
                "size" => "INVALID_SIZE",
                "interval" => "INVALID_INTERVAL",
                "min_doc_count" => "INVALID_MIN_DOC_COUNT",
                "terms_size" => "INVALID_TERMS_SIZE",
                "missing" => "INVALID_OPTION_MISSING",
                "order" => "INVALID_ORDER",
                _ => "INVALID_OPTION_VALUE",
            },
            Self::InvalidFieldType { .. } => "INVALID_FIELD_TYPE",
        }
    }

    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Compilation failed on an already-validated chart.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Invalid value_axis index: {index}. The value axis has {available} entries.")]
    OrderIndexOutOfRange { index: i64, available: usize },

    #[error("Invalid order clause: {0}")]
    InvalidOrder(String),

    #[error("Function '{0}' is not present in the catalog")]
    UnknownFunction(String),

    #[error("Function '{0}' has no aggregationType declared")]
    MissingAggregationType(String),

    #[error("function '{function}' is not valid in '{axis}'")]
    FunctionAxisMismatch { function: String, axis: AxisType },

    #[error("Aggregation id '{id}' is already used by a different sibling aggregation")]
    AggregationIdCollision { id: String },
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::OrderIndexOutOfRange { .. } => "INVALID_VALUE_AXIS_INDEX_IN_ORDER",
            Self::InvalidOrder(_) => "INVALID_ORDER",
            Self::UnknownFunction(_) => "UNKNOWN_FUNCTION",
            Self::MissingAggregationType(_) => "MISSING_AGGREGATION_TYPE",
            Self::FunctionAxisMismatch { .. } => "INVALID_MODULE_FUNCTION_AXIS",
            Self::AggregationIdCollision { .. } => "AGGREGATION_ID_COLLISION",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::OrderIndexOutOfRange { .. }
            | Self::InvalidOrder(_)
            | Self::FunctionAxisMismatch { .. } => 400,
            Self::UnknownFunction(_)
            | Self::MissingAggregationType(_)
            | Self::AggregationIdCollision { .. } => 500,
        }
    }
}

/// Slot map and result tree disagree. Always an internal invariant violation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Aggregation '{id}' not found in result at '{path}'")]
    MissingAggregation { id: String, path: String },

    #[error("Aggregation '{id}' at '{path}' has no buckets")]
    NotBucketAggregation { id: String, path: String },

    #[error("Aggregation '{id}' at '{path}' has no value")]
    MissingMetricValue { id: String, path: String },

    #[error("Malformed bucket in aggregation '{id}' at '{path}': {reason}")]
    MalformedBucket {
        id: String,
        path: String,
        reason: String,
    },

    #[error("Result has no total hit count for a root-level count slot")]
    MissingTotalHits,
}

impl DecodeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAggregation { .. } => "MISSING_AGGREGATION",
            Self::NotBucketAggregation { .. } => "NOT_A_BUCKET_AGGREGATION",
            Self::MissingMetricValue { .. } => "MISSING_METRIC_VALUE",
            Self::MalformedBucket { .. } => "MALFORMED_BUCKET",
            Self::MissingTotalHits => "MISSING_TOTAL_HITS",
        }
    }

    pub fn status_code(&self) -> u16 {
        500
    }
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Validation(e) => e.code(),
            Self::Compile(e) => e.code(),
            Self::Decode(e) => e.code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "PARSE_ERROR",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(e) => e.status_code(),
            Self::Compile(e) => e.status_code(),
            Self::Json(_) => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Caller-facing error payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "errorCode")]
    pub error_code: String,
    pub message: String,
    #[serde(skip)]
    pub status: u16,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        let message = match err {
            Error::Validation(e) => e.to_string(),
            Error::Compile(e) => e.to_string(),
            Error::Decode(e) => e.to_string(),
            Error::Config(e) => e.to_string(),
            other => other.to_string(),
        };
        Self {
            error_code: err.code().to_string(),
            message,
            status: err.status_code(),
        }
    }
}

impl From<&ValidationError> for ErrorBody {
    fn from(err: &ValidationError) -> Self {
        Self {
            error_code: err.code().to_string(),
            message: err.to_string(),
            status: err.status_code(),
        }
    }
}
