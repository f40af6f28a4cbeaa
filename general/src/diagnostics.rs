use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::SimpleFile,
    term::{self, termcolor::NoColor},
};
use line_col::LineColLookup;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{AccessError, DataError, GeneralError, OperationError, ParseError, RenderError},
    span::{Span, Spanned},
};

/// Get a list of diagnostics from a list of errors
pub fn get_diagnostics(errs: &[Spanned<GeneralError>], source: &str) -> Vec<Diagnosis> {
    errs.iter()
        .map(|(err, span)| Diagnosis {
            range: get_range(source, span),
            severity: Some(DiagnosisSeverity::ERROR),
            message: err.to_string(),
        })
        .collect()
}

/// Render an error as a plain text report pointing at the template source
pub fn report(err: &Spanned<GeneralError>, source: &str, source_name: &str) -> String {
    let (err, span) = err;

    let file = SimpleFile::new(source_name, source);
    let diagnostic = err.as_diagnostic(span);
    let mut writer = NoColor::new(Vec::new());

    match term::emit(&mut writer, &term::Config::default(), &file, &diagnostic) {
        Ok(()) => String::from_utf8_lossy(&writer.into_inner()).into_owned(),
        Err(_) => format!("{source_name}: {err}"),
    }
}

fn get_range(source: &str, span: &Span) -> DiagnosisRange {
    DiagnosisRange {
        start: get_position(source, span.start),
        end: get_position(source, span.end),
    }
}

fn get_position(source: &str, idx: usize) -> DiagnosisPosition {
    let lookup = LineColLookup::new(source);
    let (line, character) = lookup.get(idx.min(source.len()));

    DiagnosisPosition {
        line: (line - 1) as u32,
        character: (character - 1) as u32,
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub range: DiagnosisRange,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<DiagnosisSeverity>,

    pub message: String,
}

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DiagnosisSeverity(i32);
impl DiagnosisSeverity {
    pub const ERROR: DiagnosisSeverity = DiagnosisSeverity(1);
    pub const WARNING: DiagnosisSeverity = DiagnosisSeverity(2);
    pub const INFORMATION: DiagnosisSeverity = DiagnosisSeverity(3);
    pub const HINT: DiagnosisSeverity = DiagnosisSeverity(4);
}

/// Zero based line and character
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Default, Deserialize, Serialize)]
pub struct DiagnosisPosition {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Default, Deserialize, Serialize)]
pub struct DiagnosisRange {
    /// The range's start position (inclusive)
    pub start: DiagnosisPosition,
    /// The range's end position (exclusive)
    pub end: DiagnosisPosition,
}

trait AsDiagnostic {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()>;
}

macro_rules! impl_as_dianostic {
    ($($error:tt),+) => {$(
        impl AsDiagnostic for $error {
            fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
                Diagnostic::error()
                    .with_code(stringify!($error))
                    .with_message(self.to_string())
                    .with_labels(vec![Label::primary((), span.clone())])
            }
        }
    )+};
}

impl_as_dianostic!(ParseError, RenderError, OperationError, AccessError, DataError);

impl AsDiagnostic for GeneralError {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        match self {
            GeneralError::ParseError(e) => e.as_diagnostic(span),
            GeneralError::RenderError(e) => e.as_diagnostic(span),
            GeneralError::OperationError(e) => e.as_diagnostic(span),
            GeneralError::AccessError(e) => e.as_diagnostic(span),
            GeneralError::DataError(e) => e.as_diagnostic(span),
        }
    }
}
