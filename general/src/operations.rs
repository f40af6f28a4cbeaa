//! Operations that transform placeholder values
//!
//! Placeholders name an operation with `->` and pass it positional string
//! arguments, e.g. `@(price -> money EUR)`. Every operation checks the kind of
//! value it is given and fails with [OperationError::TypeMismatch] otherwise.
//!
//! | Operation    | Value   | Arguments                              |
//! |--------------|---------|----------------------------------------|
//! | `capitalize` | string  | `first` (default) or `all`             |
//! | `uppercase`  | string  |                                        |
//! | `lowercase`  | string  |                                        |
//! | `money`      | integer | currency code, `USD` (default) or `EUR`|
//! | `time`       | integer | time format, see [crate::timeformat]   |
//! | `split`      | string  | delimiter pattern, newlines by default |
//! | `splitwords` | string  | words per chunk, 10 by default         |

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{errors::OperationError, timeformat::TimeFormat, types::kind};

pub use crate::timeformat::DEFAULT_TIME_FORMAT;

/// Signature shared by every operation
pub type Operation = fn(&Value, &[String]) -> Result<Value, OperationError>;

/// Currency codes supported by `money` and their symbols
pub const MONEY_TYPES: &[(&str, &str)] = &[("USD", "$"), ("EUR", "€")];

pub const DEFAULT_CURRENCY: &str = "USD";

pub const DEFAULT_SPLIT_PATTERN: &str = r"\r?\n";

pub const DEFAULT_WORDS_PER_CHUNK: usize = 10;

/// Every operation that can be named in a placeholder
pub const OPERATIONS: &[(&str, Operation)] = &[
    ("capitalize", capitalize),
    ("uppercase", uppercase),
    ("lowercase", lowercase),
    ("money", money),
    ("time", time),
    ("split", split),
    ("splitwords", splitwords),
];

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\A[\w',.?!()\-:;"]+\s*"#).expect("word pattern is valid")
});

/// Find an operation by name
pub fn lookup(name: &str) -> Result<Operation, OperationError> {
    OPERATIONS
        .iter()
        .find(|(operation_name, _)| *operation_name == name)
        .map(|(_, operation)| *operation)
        .ok_or_else(|| OperationError::UnknownOperation(name.to_string()))
}

/// Apply the named operation to a value
pub fn apply(name: &str, value: &Value, arguments: &[String]) -> Result<Value, OperationError> {
    let operation = lookup(name)?;

    operation(value, arguments)
}

fn expect_string<'a>(operation: &str, value: &'a Value) -> Result<&'a str, OperationError> {
    value
        .as_str()
        .ok_or_else(|| mismatch(operation, "string", value))
}

fn expect_integer(operation: &str, value: &Value) -> Result<i64, OperationError> {
    value
        .as_i64()
        .ok_or_else(|| mismatch(operation, "integer", value))
}

fn mismatch(operation: &str, expected: &str, value: &Value) -> OperationError {
    OperationError::TypeMismatch {
        operation: operation.to_string(),
        expected: expected.to_string(),
        found: kind(value).to_string(),
    }
}

fn invalid_argument(operation: &str, argument: &str) -> OperationError {
    OperationError::InvalidArgument {
        operation: operation.to_string(),
        argument: argument.to_string(),
    }
}

/// Get the only optional argument of an operation, rejecting any extras
fn optional_argument<'a>(
    operation: &str,
    arguments: &'a [String],
) -> Result<Option<&'a str>, OperationError> {
    match arguments {
        [] => Ok(None),
        [argument] => Ok(Some(argument.as_str())),
        [_, extra, ..] => Err(invalid_argument(operation, extra)),
    }
}

fn no_arguments(operation: &str, arguments: &[String]) -> Result<(), OperationError> {
    match arguments.first() {
        Some(extra) => Err(invalid_argument(operation, extra)),
        None => Ok(()),
    }
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();

    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn capitalize(value: &Value, arguments: &[String]) -> Result<Value, OperationError> {
    let string = expect_string("capitalize", value)?;

    let capitalized = match optional_argument("capitalize", arguments)?.unwrap_or("first") {
        "first" => capitalize_word(string),
        "all" => string
            .split_whitespace()
            .map(capitalize_word)
            .collect::<Vec<_>>()
            .join(" "),
        other => return Err(invalid_argument("capitalize", other)),
    };

    Ok(Value::String(capitalized))
}

pub fn uppercase(value: &Value, arguments: &[String]) -> Result<Value, OperationError> {
    let string = expect_string("uppercase", value)?;
    no_arguments("uppercase", arguments)?;

    Ok(Value::String(string.to_uppercase()))
}

pub fn lowercase(value: &Value, arguments: &[String]) -> Result<Value, OperationError> {
    let string = expect_string("lowercase", value)?;
    no_arguments("lowercase", arguments)?;

    Ok(Value::String(string.to_lowercase()))
}

/// Format an amount of cents as currency, e.g. `-150` as `-€1.5`
pub fn money(value: &Value, arguments: &[String]) -> Result<Value, OperationError> {
    let cents = expect_integer("money", value)?;
    let code = optional_argument("money", arguments)?.unwrap_or(DEFAULT_CURRENCY);

    let symbol = MONEY_TYPES
        .iter()
        .find(|(money_type, _)| *money_type == code)
        .map(|(_, symbol)| *symbol)
        .ok_or_else(|| OperationError::UnsupportedCurrency(code.to_string()))?;

    let sign = if cents < 0 { "-" } else { "" };
    let amount = format_cents(cents.unsigned_abs());

    Ok(Value::String(format!("{sign}{symbol}{amount}")))
}

/// Whole units with the shortest fraction that keeps every cent, e.g. `1.0`,
/// `1.5` and `1.05`
fn format_cents(cents: u64) -> String {
    let (whole, fraction) = (cents / 100, cents % 100);

    if fraction % 10 == 0 {
        format!("{whole}.{}", fraction / 10)
    } else {
        format!("{whole}.{fraction:02}")
    }
}

/// Format an amount of seconds as a time of day
pub fn time(value: &Value, arguments: &[String]) -> Result<Value, OperationError> {
    let seconds = expect_integer("time", value)?;
    let format = optional_argument("time", arguments)?.unwrap_or(DEFAULT_TIME_FORMAT);

    let format = TimeFormat::compile(format).map_err(|_| invalid_argument("time", format))?;

    Ok(Value::String(format.apply(seconds)))
}

/// Split a string on a delimiter pattern
pub fn split(value: &Value, arguments: &[String]) -> Result<Value, OperationError> {
    let string = expect_string("split", value)?;
    let pattern = optional_argument("split", arguments)?.unwrap_or(DEFAULT_SPLIT_PATTERN);

    let delimiter = Regex::new(pattern).map_err(|_| invalid_argument("split", pattern))?;

    let mut pieces: Vec<&str> = delimiter.split(string).collect();
    while pieces.last().is_some_and(|piece| piece.is_empty()) {
        pieces.pop();
    }

    Ok(Value::Array(
        pieces
            .into_iter()
            .map(|piece| Value::String(piece.to_string()))
            .collect(),
    ))
}

/// Split a string in to chunks of a number of words
///
/// Words keep their trailing whitespace inside a chunk. Chunking stops at the
/// first character that can't start a word.
pub fn splitwords(value: &Value, arguments: &[String]) -> Result<Value, OperationError> {
    let mut string = expect_string("splitwords", value)?;

    let words = match optional_argument("splitwords", arguments)? {
        Some(words) => words
            .parse::<usize>()
            .ok()
            .filter(|words| *words > 0)
            .ok_or_else(|| invalid_argument("splitwords", words))?,
        None => DEFAULT_WORDS_PER_CHUNK,
    };

    let mut chunks: Vec<String> = vec![];
    let mut buffer = String::new();
    let mut index = 0usize;

    while let Some(word) = WORD.find(string) {
        if index % words == 0 {
            chunks.push(buffer.trim_end().to_string());
            buffer.clear();
        }

        buffer.push_str(word.as_str());
        string = &string[word.end()..];
        index += 1;
    }

    chunks.push(buffer.trim_end().to_string());

    // The first chunk is pushed before any word is read
    Ok(Value::Array(
        chunks.into_iter().skip(1).map(Value::String).collect(),
    ))
}
