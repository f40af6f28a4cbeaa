use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    fmt,
    sync::LazyLock,
};

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    errors::{GeneralError, ParseError, RenderError},
    operations,
    span::{Spanned, offset},
    templater::{Template, compile_pattern},
    types::{lookup, to_text},
};

/// Result of trying to match a partial at the start of the remaining input
///
/// `Ok(None)` means the partial does not start here and the next matcher
/// should be tried. `Ok(Some((partial, length)))` consumes `length` bytes.
pub type MatchResult<P> = Result<Option<(P, usize)>, Spanned<GeneralError>>;

/// Match a partial against the remaining input, which begins at `offset` in
/// the full source
pub type Matcher<P> = fn(&str, usize) -> MatchResult<P>;

/// Default values of placeholders, keyed by placeholder name
pub type Defaults = HashMap<String, String>;

/// Escape keys and the text they produce
pub const ESCAPES: &[(&str, &str)] = &[("at", "@"), ("arrow", "->")];

/// Delimiter used by array placeholders that don't name one
pub const DEFAULT_DELIMITER: &str = " ";

static TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[^@]+").expect("text pattern is valid"));

static ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A@(?<key>\w+);").expect("escape pattern is valid"));

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\A@\(\s*(?<name>[a-zA-Z]\w*)\s*",
        r"(?::\s*(?<default>(?:[^()\->]|-[^()>])+))?\s*",
        r"(?:->\s*(?<operation>\w+)\s*:?)?\s*",
        r#"(?<arguments>(?:(?:\w+|"[^"]*"|'[^']*')\s*)*)"#,
        r"\)",
    ))
    .expect("placeholder pattern is valid")
});

static ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?<word>\w+)|"(?<double>[^"]*)"|'(?<single>[^']*)'"#)
        .expect("argument pattern is valid")
});

static ARRAY_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?s)\A@\[(?<name>[a-zA-Z]\w*)\](?: +|\n+)?",
        r"(?<text>.*?)",
        r"(?: +|\n+)?@\[(?<delimiter>[^\]]+)?\]",
    ))
    .expect("array placeholder pattern is valid")
});

/// Split a source string in to partials
///
/// Matchers are tried in order against the start of the remaining input and
/// the first one that matches wins.
pub fn breakdown<P>(
    source: &str,
    matchers: &[Matcher<P>],
) -> Result<Vec<P>, Spanned<GeneralError>> {
    let mut partials = vec![];
    let mut cursor = 0usize;

    while cursor < source.len() {
        let rest = &source[cursor..];

        let mut matched = None;
        for matcher in matchers {
            if let Some(found) = matcher(rest, cursor)? {
                matched = Some(found);
                break;
            }
        }

        match matched {
            Some((partial, length)) if length > 0 => {
                partials.push(partial);
                cursor += length;
            }
            _ => {
                let (prefix, length) = prefix_of(rest);

                return Err((
                    ParseError::UnmatchedPartial { prefix }.into(),
                    cursor..cursor + length,
                ));
            }
        }
    }

    Ok(partials)
}

/// The start of some unmatched input, as shown in errors
///
/// Returns the shown prefix and the number of bytes of input it covers.
fn prefix_of(rest: &str) -> (String, usize) {
    match rest.char_indices().nth(6) {
        Some((end, _)) => (format!("{}...", &rest[..end]), end),
        None if rest.chars().count() == 6 => (format!("{rest}..."), rest.len()),
        None => (rest.to_string(), rest.len()),
    }
}

/// Match plain text up to the next `@` or the end of input
pub fn match_text(rest: &str) -> Option<&str> {
    TEXT.find(rest).map(|text| text.as_str())
}

/// A compiled fragment of a template
#[derive(Clone, Debug, PartialEq)]
pub enum Partial {
    Text(String),
    Escape(Escape),
    Placeholder(Placeholder),
    ArrayPlaceholder(ArrayPlaceholder),
}

impl Partial {
    pub fn apply(
        &self,
        data: &Map<String, Value>,
        defaults: &Defaults,
    ) -> Result<String, RenderError> {
        match self {
            Partial::Text(text) => Ok(text.clone()),
            Partial::Escape(escape) => Ok(escape.literal.to_string()),
            Partial::Placeholder(placeholder) => placeholder.apply(data, defaults),
            Partial::ArrayPlaceholder(array) => array.apply(data),
        }
    }

    /// Regular expression matching the text this partial renders
    ///
    /// A placeholder captures its value in a group of the same name when its
    /// name is added to `names` for the first time. Placeholders in nested
    /// array templates and later placeholders with a taken name match any text
    /// without capturing.
    pub(crate) fn pattern(&self, names: Option<&mut HashSet<String>>, lazy: bool) -> String {
        let any = if lazy { ".*?" } else { ".*" };

        match self {
            Partial::Text(text) => regex::escape(text),
            Partial::Escape(escape) => regex::escape(escape.literal),
            Partial::Placeholder(placeholder) => {
                if claim(names, &placeholder.name) {
                    format!("(?<{}>{any})", placeholder.name)
                } else {
                    format!("(?:{any})")
                }
            }
            Partial::ArrayPlaceholder(array) => {
                let items = format!(
                    "(?:{}(?:{})?)*",
                    array.template.pattern(false, true),
                    regex::escape(&array.delimiter)
                );

                if claim(names, &array.name) {
                    format!("(?<{}>{items})", array.name)
                } else {
                    items
                }
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Partial::Text(_) => "text",
            Partial::Escape(_) => "escape",
            Partial::Placeholder(_) => "placeholder",
            Partial::ArrayPlaceholder(_) => "array placeholder",
        }
    }
}

/// Whether `name` is new to `names`, adding it if so
fn claim(names: Option<&mut HashSet<String>>, name: &str) -> bool {
    names.is_some_and(|names| names.insert(name.to_string()))
}

impl fmt::Display for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partial::Text(text) => write!(f, "{text}"),
            Partial::Escape(escape) => write!(f, "@{};", escape.key),
            Partial::Placeholder(placeholder) => write!(f, "{placeholder}"),
            Partial::ArrayPlaceholder(array) => write!(f, "{array}"),
        }
    }
}

/// An escaped character sequence, e.g. `@at;` for `@`
#[derive(Clone, Debug, PartialEq)]
pub struct Escape {
    pub key: &'static str,
    pub literal: &'static str,
}

impl Escape {
    pub fn from_key(key: &str) -> Option<Self> {
        ESCAPES
            .iter()
            .find(|(escape_key, _)| *escape_key == key)
            .map(|&(key, literal)| Escape { key, literal })
    }
}

/// A named value, e.g. `@(name: default -> operation arguments)`
#[derive(Clone, Debug, PartialEq)]
pub struct Placeholder {
    pub name: String,
    /// Default written at this occurrence. The default used when rendering is
    /// the template's, see [Template::defaults].
    pub default: Option<String>,
    pub operation: Option<String>,
    pub arguments: Vec<String>,
}

impl Placeholder {
    fn from_captures(captures: &Captures) -> Self {
        let arguments = captures
            .name("arguments")
            .map(|arguments| {
                ARGUMENT
                    .captures_iter(arguments.as_str())
                    .filter_map(|argument| {
                        argument
                            .name("word")
                            .or_else(|| argument.name("double"))
                            .or_else(|| argument.name("single"))
                            .map(|text| text.as_str().to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: captures["name"].to_string(),
            default: captures
                .name("default")
                .map(|default| unquote(default.as_str().trim()).to_string()),
            operation: captures
                .name("operation")
                .map(|operation| operation.as_str().to_string()),
            arguments,
        }
    }

    pub fn apply(
        &self,
        data: &Map<String, Value>,
        defaults: &Defaults,
    ) -> Result<String, RenderError> {
        let value = lookup(data, &self.name).map(Cow::Borrowed).or_else(|| {
            defaults
                .get(&self.name)
                .map(|default| Cow::Owned(Value::String(default.clone())))
        });

        let Some(operation_name) = &self.operation else {
            return Ok(value.map(|value| to_text(&value)).unwrap_or_default());
        };

        let operation = operations::lookup(operation_name)?;
        let value = value.ok_or_else(|| RenderError::UndefinedKey(self.name.clone()))?;

        trace!(placeholder = %self.name, operation = %operation_name, "applying operation");

        let result = operation(&value, &self.arguments)?;

        Ok(to_text(&result))
    }
}

/// Remove one pair of matching surrounding quotes
fn unquote(text: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            text.strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(text)
}

/// Quote a default when compiling it again would change it
fn quote_default(default: &str) -> Cow<'_, str> {
    if !default.is_empty() && default.trim() == default && unquote(default) == default {
        Cow::Borrowed(default)
    } else if default.contains('"') {
        Cow::Owned(format!("'{default}'"))
    } else {
        Cow::Owned(format!("\"{default}\""))
    }
}

fn quote_argument(argument: &str) -> String {
    let is_word = !argument.is_empty()
        && argument
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_');

    if is_word {
        argument.to_string()
    } else if argument.contains('"') {
        format!("'{argument}'")
    } else {
        format!("\"{argument}\"")
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@({}", self.name)?;

        if let Some(default) = &self.default {
            write!(f, ": {}", quote_default(default))?;
        }

        if let Some(operation) = &self.operation {
            write!(f, " -> {operation}")?;
        }

        for argument in &self.arguments {
            write!(f, " {}", quote_argument(argument))?;
        }

        write!(f, ")")
    }
}

/// A nested template applied to each item of a list, e.g.
/// `@[items] @(name) @[, ]`
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayPlaceholder {
    pub name: String,
    pub template: Template,
    pub delimiter: String,
}

impl ArrayPlaceholder {
    pub fn apply(&self, data: &Map<String, Value>) -> Result<String, RenderError> {
        let items = lookup(data, &self.name)
            .ok_or_else(|| RenderError::UndefinedKey(self.name.clone()))?
            .as_array()
            .ok_or_else(|| RenderError::NotAList(self.name.clone()))?;

        let rendered = items
            .iter()
            .map(|item| match item {
                Value::Object(item) => self.template.render(item),
                _ => Err(RenderError::NotAList(self.name.clone())),
            })
            .collect::<Result<Vec<String>, RenderError>>()?;

        Ok(rendered.join(&self.delimiter))
    }

    /// Take rendered items back apart, e.g. `a, b` in to `[{..}, {..}]`
    ///
    /// Returns `Ok(None)` if the text is not a list of rendered items.
    pub fn extract(&self, text: &str) -> Result<Option<Vec<Value>>, GeneralError> {
        let item = compile_pattern(&format!(
            r"\A(?:{})(?:{}|\z)",
            self.template.pattern(true, true),
            regex::escape(&self.delimiter)
        ))?;

        let mut items = vec![];
        let mut rest = text;

        while !rest.is_empty() {
            let Some(captures) = item.captures(rest) else {
                return Ok(None);
            };

            let length = captures[0].len();
            if length == 0 {
                return Ok(None);
            }

            match self.template.collect_captures(&captures)? {
                Some(values) => items.push(Value::Object(values)),
                None => return Ok(None),
            }

            rest = &rest[length..];
        }

        Ok(Some(items))
    }
}

impl fmt::Display for ArrayPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.template.to_string();

        // Whitespace next to the array markers is dropped when compiling, so the
        // separator must differ from whitespace the nested template keeps.
        let leading = if text.starts_with(' ') { "\n" } else { " " };
        let trailing = if text.ends_with(' ') { "\n" } else { " " };

        write!(
            f,
            "@[{}]{leading}{text}{trailing}@[{}]",
            self.name, self.delimiter
        )
    }
}

fn match_template_text(rest: &str, _offset: usize) -> MatchResult<Partial> {
    Ok(match_text(rest).map(|text| (Partial::Text(text.to_string()), text.len())))
}

fn match_escape(rest: &str, _offset: usize) -> MatchResult<Partial> {
    Ok(ESCAPE.captures(rest).and_then(|captures| {
        Escape::from_key(&captures["key"])
            .map(|escape| (Partial::Escape(escape), captures[0].len()))
    }))
}

fn match_placeholder(rest: &str, _offset: usize) -> MatchResult<Partial> {
    Ok(PLACEHOLDER.captures(rest).map(|captures| {
        (
            Partial::Placeholder(Placeholder::from_captures(&captures)),
            captures[0].len(),
        )
    }))
}

fn match_array_placeholder(rest: &str, cursor: usize) -> MatchResult<Partial> {
    let Some(captures) = ARRAY_PLACEHOLDER.captures(rest) else {
        return Ok(None);
    };

    let text = captures
        .name("text")
        .map(|text| (text.as_str(), text.start()))
        .unwrap_or_default();

    let template = Template::compile(text.0)
        .map_err(|(err, span)| (err, offset(&span, cursor + text.1)))?;

    let delimiter = captures
        .name("delimiter")
        .map(|delimiter| delimiter.as_str())
        .unwrap_or(DEFAULT_DELIMITER);

    Ok(Some((
        Partial::ArrayPlaceholder(ArrayPlaceholder {
            name: captures["name"].to_string(),
            template,
            delimiter: delimiter.to_string(),
        }),
        captures[0].len(),
    )))
}

/// Template matchers in priority order. Text is the fallback.
pub const MATCHERS: &[Matcher<Partial>] = &[
    match_escape,
    match_placeholder,
    match_array_placeholder,
    match_template_text,
];

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn placeholder(name: &str) -> Placeholder {
        Placeholder {
            name: name.to_string(),
            default: None,
            operation: None,
            arguments: vec![],
        }
    }

    macro_rules! breakdown_test {
        ($test_name:ident, $source:expr, $result:expr) => {
            #[test]
            fn $test_name() {
                assert_eq!($result, breakdown($source, MATCHERS));
            }
        };
    }

    breakdown_test!(
        text_only,
        "plain text",
        Ok(vec![Partial::Text("plain text".to_string())])
    );

    breakdown_test!(empty, "", Ok(vec![]));

    breakdown_test!(
        escapes,
        "a@at;b@arrow;",
        Ok(vec![
            Partial::Text("a".to_string()),
            Partial::Escape(Escape {
                key: "at",
                literal: "@"
            }),
            Partial::Text("b".to_string()),
            Partial::Escape(Escape {
                key: "arrow",
                literal: "->"
            }),
        ])
    );

    breakdown_test!(
        simple_placeholder,
        "Hello @(name)!",
        Ok(vec![
            Partial::Text("Hello ".to_string()),
            Partial::Placeholder(placeholder("name")),
            Partial::Text("!".to_string()),
        ])
    );

    breakdown_test!(
        full_placeholder,
        "@( amount : 100 -> money EUR )",
        Ok(vec![Partial::Placeholder(Placeholder {
            name: "amount".to_string(),
            default: Some("100".to_string()),
            operation: Some("money".to_string()),
            arguments: vec!["EUR".to_string()],
        })])
    );

    breakdown_test!(
        placeholder_with_colon_before_arguments,
        "@(amount -> money: EUR)",
        Ok(vec![Partial::Placeholder(Placeholder {
            name: "amount".to_string(),
            default: None,
            operation: Some("money".to_string()),
            arguments: vec!["EUR".to_string()],
        })])
    );

    breakdown_test!(
        placeholder_with_quoted_arguments,
        r#"@(at -> time "@HH:@MM (24h)" 'x y')"#,
        Ok(vec![Partial::Placeholder(Placeholder {
            name: "at".to_string(),
            default: None,
            operation: Some("time".to_string()),
            arguments: vec!["@HH:@MM (24h)".to_string(), "x y".to_string()],
        })])
    );

    breakdown_test!(
        placeholder_with_quoted_default,
        r#"@(name: "fallback")"#,
        Ok(vec![Partial::Placeholder(Placeholder {
            default: Some("fallback".to_string()),
            ..placeholder("name")
        })])
    );

    breakdown_test!(
        placeholder_default_with_hyphen,
        "@(date: 2016-07-30 -> uppercase)",
        Ok(vec![Partial::Placeholder(Placeholder {
            default: Some("2016-07-30".to_string()),
            operation: Some("uppercase".to_string()),
            ..placeholder("date")
        })])
    );

    breakdown_test!(
        unknown_escape,
        "@nope;",
        Err((
            GeneralError::ParseError(ParseError::UnmatchedPartial {
                prefix: "@nope;...".to_string()
            }),
            0..6
        ))
    );

    breakdown_test!(
        unclosed_placeholder,
        "ok @(name",
        Err((
            GeneralError::ParseError(ParseError::UnmatchedPartial {
                prefix: "@(name...".to_string()
            }),
            3..9
        ))
    );

    breakdown_test!(
        long_unmatched_input,
        "@(1abc) and more",
        Err((
            GeneralError::ParseError(ParseError::UnmatchedPartial {
                prefix: "@(1abc...".to_string()
            }),
            0..6
        ))
    );

    breakdown_test!(
        nested_error_is_offset,
        "xy @[items] a @oops @[, ]",
        Err((
            GeneralError::ParseError(ParseError::UnmatchedPartial {
                prefix: "@oops".to_string()
            }),
            14..19
        ))
    );

    #[test]
    fn array_placeholder() {
        let partials = breakdown("@[item] @(item) @[, ]", MATCHERS).unwrap();

        assert_eq!(
            vec![Partial::ArrayPlaceholder(ArrayPlaceholder {
                name: "item".to_string(),
                template: Template::compile("@(item)").unwrap(),
                delimiter: ", ".to_string(),
            })],
            partials
        );
    }

    #[test]
    fn array_placeholder_default_delimiter() {
        let partials = breakdown("@[rows]\n@(row)\n@[]", MATCHERS).unwrap();

        assert_eq!(
            vec![Partial::ArrayPlaceholder(ArrayPlaceholder {
                name: "rows".to_string(),
                template: Template::compile("@(row)").unwrap(),
                delimiter: DEFAULT_DELIMITER.to_string(),
            })],
            partials
        );
    }

    #[test]
    fn it_applies_placeholders() {
        let data = json!({"name": "X", "amount": 1050});
        let data = data.as_object().unwrap();
        let defaults = Defaults::from([("other".to_string(), "fallback".to_string())]);

        assert_eq!(Ok("X".to_string()), placeholder("name").apply(data, &defaults));
        assert_eq!(
            Ok("fallback".to_string()),
            placeholder("other").apply(data, &defaults)
        );
        assert_eq!(Ok("".to_string()), placeholder("missing").apply(data, &defaults));
        assert_eq!(
            Ok("$10.5".to_string()),
            Placeholder {
                operation: Some("money".to_string()),
                ..placeholder("amount")
            }
            .apply(data, &defaults)
        );
        assert_eq!(
            Err(RenderError::UndefinedKey("missing".to_string())),
            Placeholder {
                operation: Some("uppercase".to_string()),
                ..placeholder("missing")
            }
            .apply(data, &defaults)
        );
    }

    #[test]
    fn it_displays_partials() {
        let partials = breakdown(
            "a@at;@(x: y -> time \"@HH h\") @[list] @(v) @[; ]",
            MATCHERS,
        )
        .unwrap();

        let displayed: String = partials.iter().map(|p| p.to_string()).collect();

        assert_eq!("a@at;@(x: y -> time \"@HH h\") @[list] @(v) @[; ]", displayed);
    }

    #[test]
    fn it_shows_short_prefixes_whole() {
        assert_eq!(("@x".to_string(), 2), prefix_of("@x"));
        assert_eq!(("@abcd".to_string(), 5), prefix_of("@abcd"));
        assert_eq!(("@abcde...".to_string(), 6), prefix_of("@abcde"));
    }
}
