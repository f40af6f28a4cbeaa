pub use crate::diagnostics::{get_diagnostics, report};
pub use crate::errors::{
    AccessError, DataError, GeneralError, OperationError, ParseError, RenderError,
};
pub use crate::partials::{ArrayPlaceholder, Escape, Partial, Placeholder};
pub use crate::span::{Span, Spanned};
pub use crate::templater::{Template, template};
pub use crate::timeformat::TimeFormat;
pub use crate::types::Data;
