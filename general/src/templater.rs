use std::{collections::HashSet, fmt};

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::{
    errors::{GeneralError, ParseError, RenderError},
    partials::{Defaults, MATCHERS, Partial, breakdown},
    span::{NO_SPAN, Spanned},
    types::Data,
};

/// A compiled template
///
/// Compiled once from a source string and then applied to any number of data
/// mappings. A template is never modified after it is compiled, so it can be
/// shared between threads and rendered concurrently.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    partials: Vec<Partial>,
    defaults: Defaults,
    source_name: Option<String>,
}

impl Template {
    /// Compile a template source string
    pub fn compile(source: &str) -> Result<Self, Spanned<GeneralError>> {
        let partials = breakdown(source, MATCHERS)?;

        let template = Self {
            defaults: collect_defaults(&partials),
            partials,
            source_name: None,
        };

        for partial in &template.partials {
            trace!(kind = partial.kind(), "matched partial");
        }

        debug!(partials = template.partials.len(), "compiled template");

        Ok(template)
    }

    /// Compile a template and remember where its source came from
    ///
    /// The name is only used when reporting errors.
    pub fn compile_named(
        source: &str,
        source_name: impl Into<String>,
    ) -> Result<Self, Spanned<GeneralError>> {
        let source_name = source_name.into();

        let template = Self::compile(source).inspect_err(|(err, span)| {
            debug!(source_name = %source_name, ?span, %err, "failed to compile template");
        })?;

        Ok(Self {
            source_name: Some(source_name),
            ..template
        })
    }

    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    /// Default placeholder values, keyed by placeholder name
    ///
    /// The first placeholder with a name that gives a default sets the
    /// default for every placeholder with that name.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Apply data to the template
    pub fn apply(&self, data: &Data) -> Result<String, GeneralError> {
        self.render(data.as_map()).map_err(|err| {
            debug!(source_name = ?self.source_name, %err, "failed to render template");
            GeneralError::from(err)
        })
    }

    /// Apply each data mapping to the template independently
    pub fn apply_all(&self, items: &[Data]) -> Result<Vec<String>, GeneralError> {
        items.iter().map(|data| self.apply(data)).collect()
    }

    pub(crate) fn render(&self, data: &Map<String, Value>) -> Result<String, RenderError> {
        self.partials
            .iter()
            .map(|partial| partial.apply(data, &self.defaults))
            .collect()
    }

    /// Regular expression source matching text rendered by this template
    ///
    /// The first placeholder or array placeholder with a name captures in a
    /// group of that name. Later ones with the same name match any text, they
    /// are not required to repeat the first value.
    pub fn regex_source(&self) -> String {
        self.pattern(true, false)
    }

    /// Compiled regular expression matching whole texts rendered by this template
    pub fn regex(&self) -> Result<Regex, GeneralError> {
        compile_pattern(&format!(r"\A(?:{})\z", self.regex_source()))
    }

    /// Read data back out of a rendered text
    ///
    /// Placeholder values are extracted as strings and array placeholders as
    /// lists of mappings. Returns `Ok(None)` if the text doesn't match.
    pub fn extract(&self, text: &str) -> Result<Option<Data>, GeneralError> {
        let Some(captures) = self.regex()?.captures(text) else {
            debug!(source_name = ?self.source_name, "text does not match template");
            return Ok(None);
        };

        Ok(self.collect_captures(&captures)?.map(Data::from))
    }

    pub(crate) fn pattern(&self, capture: bool, lazy: bool) -> String {
        let mut names = HashSet::new();

        self.partials
            .iter()
            .map(|partial| partial.pattern(capture.then_some(&mut names), lazy))
            .collect()
    }

    /// Values captured by a pattern built with [Template::pattern]
    pub(crate) fn collect_captures(
        &self,
        captures: &Captures,
    ) -> Result<Option<Map<String, Value>>, GeneralError> {
        let mut values = Map::new();

        for partial in &self.partials {
            match partial {
                Partial::Placeholder(placeholder) if !values.contains_key(&placeholder.name) => {
                    if let Some(value) = captures.name(&placeholder.name) {
                        values.insert(
                            placeholder.name.clone(),
                            Value::String(value.as_str().to_string()),
                        );
                    }
                }
                Partial::ArrayPlaceholder(array) if !values.contains_key(&array.name) => {
                    let Some(text) = captures.name(&array.name) else {
                        continue;
                    };

                    match array.extract(text.as_str())? {
                        Some(items) => {
                            values.insert(array.name.clone(), Value::Array(items));
                        }
                        None => return Ok(None),
                    }
                }
                _ => {}
            }
        }

        Ok(Some(values))
    }
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, GeneralError> {
    Regex::new(pattern).map_err(|err| ParseError::InvalidPattern(err.to_string()).into())
}

fn collect_defaults(partials: &[Partial]) -> Defaults {
    let mut defaults = Defaults::new();

    for partial in partials {
        if let Partial::Placeholder(placeholder) = partial {
            if let Some(default) = &placeholder.default {
                defaults
                    .entry(placeholder.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }

    defaults
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for partial in &self.partials {
            write!(f, "{partial}")?;
        }

        Ok(())
    }
}

/// Compile a template source string and apply data to it
pub fn template(source: &str, data: &Data) -> Result<String, Spanned<GeneralError>> {
    let template = Template::compile(source)?;

    template.apply(data).map_err(|err| (err, NO_SPAN))
}
