use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Domain under which every flow error is reported to the host application.
pub const ERROR_DOMAIN: &str = "com.payflow.error";

/// The closed set of failure categories a host application can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad or missing authentication material.
    InvalidCredentials,
    /// An operation was invoked while the flow or builder does not permit it.
    InvalidState,
    /// A malformed or missing configuration field, or a value of the wrong shape.
    InvalidArgument,
    /// A failure originating from the remote web service.
    HttpError,
}

struct CategoryEntry {
    code: u32,
    prefix: &'static str,
}

// Indexed by the `ErrorCategory` discriminant.
static CATEGORY_TABLE: [CategoryEntry; 4] = [
    CategoryEntry {
        code: 100,
        prefix: "Invalid credentials",
    },
    CategoryEntry {
        code: 200,
        prefix: "Illegal state",
    },
    CategoryEntry {
        code: 300,
        prefix: "Illegal argument",
    },
    CategoryEntry {
        code: 900,
        prefix: "HTTP error",
    },
];

impl ErrorCategory {
    fn entry(self) -> &'static CategoryEntry {
        &CATEGORY_TABLE[self as usize]
    }

    /// Stable numeric code of the category.
    pub fn code(self) -> u32 {
        self.entry().code
    }

    /// Default message prefix used when the error is displayed.
    pub fn prefix(self) -> &'static str {
        self.entry().prefix
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A categorized, immutable failure description.
///
/// `FlowError` is returned instead of panicking everywhere in the crate and is
/// finally handed to the host through the flow delegate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{category}: {message}")]
pub struct FlowError {
    category: ErrorCategory,
    message: String,
}

pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidCredentials, message)
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidState, message)
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidArgument, message)
    }

    pub fn http(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::HttpError, message)
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn code(&self) -> u32 {
        self.category.code()
    }

    pub fn domain(&self) -> &'static str {
        ERROR_DOMAIN
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for FlowError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::http(format!("request failed with status {status}: {err}")),
            None => Self::http(err.to_string()),
        }
    }
}

impl From<csv::Error> for FlowError {
    fn from(err: csv::Error) -> Self {
        Self::illegal_argument(format!("CSV error: {err}"))
    }
}

impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        Self::illegal_argument(format!("IO error: {err}"))
    }
}

/// Describes the JSON shape of `value`, used in shape-check diagnostics.
pub fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Checks that `value` is a sequence before it is processed any further.
pub fn check_array_type<'a>(value: &'a Value, message: Option<&str>) -> Result<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => {
            let detail = format!("expected an array but got {}", shape_of(other));
            Err(FlowError::illegal_argument(match message {
                Some(message) => format!("{message} ({detail})"),
                None => detail,
            }))
        }
    }
}

/// Checks that `value` is a map before it is processed any further.
pub fn check_dictionary_type<'a>(value: &'a Value, message: &str) -> Result<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(FlowError::illegal_argument(format!(
            "{message} (expected an object but got {})",
            shape_of(other)
        ))),
    }
}
