//! Error types for the convloss loss calculator.
//!
//! This module provides a unified error type [`ConvlossError`] that covers
//! all error conditions that can occur while parsing an operating point
//! description, validating it, evaluating device models and aggregating a
//! modulation cycle.

use thiserror::Error;

use crate::converter::ConfigWarning;

/// Result type alias using [`ConvlossError`].
pub type Result<T> = std::result::Result<T, ConvlossError>;

/// Unified error type for all convloss operations.
#[derive(Error, Debug)]
pub enum ConvlossError {
    // ============ DSL Parsing Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Unknown operating point parameter
    #[error("Unknown parameter '{name}' at line {line}")]
    UnknownParameter { name: String, line: usize },

    /// Invalid device model definition
    #[error("Invalid model '{model}': {message}")]
    InvalidModel { model: String, message: String },

    /// Undefined model reference
    #[error("Undefined model '{model}' referenced at line {line}")]
    UndefinedModel { model: String, line: usize },

    /// Duplicate model name
    #[error("Duplicate model name '{name}'")]
    DuplicateModel { name: String },

    // ============ Configuration Errors ============
    /// One or more operating point invariants do not hold (strict mode)
    #[error("Invalid configuration: {}", format_warnings(.warnings))]
    ConfigurationInvalid { warnings: Vec<ConfigWarning> },

    /// A parameter makes the computation itself impossible
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // ============ Engine Errors ============
    /// An angle could not be placed in any conduction interval
    #[error("Angle {angle} rad does not fall in any conduction interval")]
    IntervalGap { angle: f64 },

    /// A loss curve was queried outside its tabulated range
    #[error("Value {value} is outside the tabulated range [{min}, {max}]")]
    InterpolationDomain { value: f64, min: f64, max: f64 },

    /// The dispatch table violates loss conservation
    #[error("Inconsistent dispatch row for interval {interval}, {polarity} current: {message}")]
    DispatchInconsistent {
        interval: String,
        polarity: String,
        message: String,
    },

    /// No switching period was evaluated, so averages are undefined
    #[error("Invalid configuration: modulation cycle has no switching periods (mf = {mf:.3})")]
    EmptyCycle { mf: f64 },

    /// Output power is zero or negative, so efficiency is undefined
    #[error("Invalid configuration: output power is not positive, efficiency is undefined")]
    ZeroOutputPower,

    // ============ I/O Errors ============
    /// Error reading an operating point description file
    #[error("Failed to read description file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing the report
    #[error("Failed to write report: {message}")]
    OutputError { message: String },

    /// Error serializing the report
    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_warnings(warnings: &[ConfigWarning]) -> String {
    warnings
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConvlossError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid model error
    pub fn invalid_model(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidModel {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}
