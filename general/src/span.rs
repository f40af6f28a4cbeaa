use std::ops::Range;

/// A pair of T and the span in the original template source
pub type Spanned<T> = (T, Span);

/// A range representing a location in the original template source
pub type Span = Range<usize>;

/// A span representing no location in the original template source
pub const NO_SPAN: Span = 0..0;

/// Move a span found in a nested template back in to the coordinates of the
/// enclosing template
pub fn offset(span: &Span, by: usize) -> Span {
    (span.start + by)..(span.end + by)
}
