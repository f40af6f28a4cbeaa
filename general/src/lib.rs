//! General is a templating system
//!
//! Templates are compiled from a source string in to a list of partials and
//! then applied to data.
//!
//! ```
//! use general::{Data, Template};
//!
//! let template = Template::compile("Hello @(name: world -> capitalize)!").unwrap();
//!
//! let mut data = Data::new();
//! assert_eq!("Hello World!", template.apply(&data).unwrap());
//!
//! data.insert("name", "ada");
//! assert_eq!("Hello Ada!", template.apply(&data).unwrap());
//! ```
//!
//! Template syntax:
//!
//! - `@(name)` a placeholder, optionally with a default, operation and
//!   arguments: `@(price: 0 -> money EUR)`
//! - `@[items] ... @[, ]` an array placeholder, applying the text between the
//!   markers to each item of a list and joining the results with a delimiter
//! - `@at;` and `@arrow;` escape `@` and `->`
//! - any other text is copied as is

pub mod diagnostics;
pub mod errors;
pub mod operations;
pub mod partials;
pub mod prelude;
pub mod span;
pub mod templater;
pub mod timeformat;
pub mod types;

pub use errors::GeneralError;
pub use span::*;
pub use templater::{Template, template};
pub use types::Data;
