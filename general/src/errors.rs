use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common error for compiling and rendering templates
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum GeneralError {
    #[error("ParseError: {0}")]
    ParseError(ParseError),
    #[error("RenderError: {0}")]
    RenderError(RenderError),
    #[error("OperationError: {0}")]
    OperationError(OperationError),
    #[error("AccessError: {0}")]
    AccessError(AccessError),
    #[error("DataError: {0}")]
    DataError(DataError),
}

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum ParseError {
    #[error("Unmatched partial at {prefix:?}")]
    UnmatchedPartial { prefix: String },
    #[error("Unknown time format field: @{0}")]
    UnknownTimeField(String),
    #[error("Template can not be used as a pattern: {0}")]
    InvalidPattern(String),
}

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum RenderError {
    #[error("Key is not defined in data and has no default: {0}")]
    UndefinedKey(String),
    #[error("Value for array placeholder '{0}' is not a list of mappings")]
    NotAList(String),
    #[error("{0}")]
    Operation(OperationError),
}

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum OperationError {
    #[error("Operation is not defined: {0}")]
    UnknownOperation(String),
    #[error("Unexpected value type {found} for operation {operation}. Expected {expected}")]
    TypeMismatch {
        operation: String,
        expected: String,
        found: String,
    },
    #[error("Money type: {0} is not supported!")]
    UnsupportedCurrency(String),
    #[error("Undefined argument for operation {operation}: {argument}")]
    InvalidArgument { operation: String, argument: String },
}

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum AccessError {
    #[error("Key is not defined in data: {0}")]
    UndefinedPath(String),
}

#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum DataError {
    #[error("Data is not valid {format}: {message}")]
    Malformed { format: String, message: String },
    #[error("Data must be a mapping at the top level, found {0}")]
    NotAMapping(String),
}

impl From<OperationError> for RenderError {
    fn from(e: OperationError) -> Self {
        RenderError::Operation(e)
    }
}

macro_rules! impl_from_error {
    ($($error:tt),+) => {$(
        impl From<$error> for GeneralError {
            fn from(e: $error) -> Self {
                GeneralError::$error(e)
            }
        }
    )+};
}

impl_from_error!(ParseError, RenderError, OperationError, AccessError, DataError);
