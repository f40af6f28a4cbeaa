use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::{
    errors::{GeneralError, ParseError},
    partials::{MatchResult, Matcher, breakdown, match_text},
    span::Spanned,
};

/// Format used by the `time` operation when none is given
pub const DEFAULT_TIME_FORMAT: &str = "@I:@MM:@SS @A";

static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A@(?<name>[A-Z]+)").expect("time field pattern is valid"));

/// A compiled time format
///
/// Renders a count of seconds as a time of day, e.g. `@HH:@MM` renders
/// `3661` as `01:01`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeFormat {
    fragments: Vec<TimeFragment>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TimeFragment {
    Text(String),
    Field(TimeField),
}

/// A `@` field in a time format
///
/// The width of the field is the length of its letter run (`@HH` is two
/// digits wide).
#[derive(Clone, Debug, PartialEq)]
pub struct TimeField {
    pub unit: TimeUnit,
    pub width: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Hour24,
    Hour12,
    Minute,
    Second,
    Meridiem,
}

impl TimeUnit {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'H' => Some(TimeUnit::Hour24),
            'I' => Some(TimeUnit::Hour12),
            'M' => Some(TimeUnit::Minute),
            'S' => Some(TimeUnit::Second),
            'A' => Some(TimeUnit::Meridiem),
            _ => None,
        }
    }

    fn letter(&self) -> char {
        match self {
            TimeUnit::Hour24 => 'H',
            TimeUnit::Hour12 => 'I',
            TimeUnit::Minute => 'M',
            TimeUnit::Second => 'S',
            TimeUnit::Meridiem => 'A',
        }
    }
}

impl TimeField {
    pub fn apply(&self, value: i64) -> String {
        let hours = value.div_euclid(3600);
        let within_hour = value.rem_euclid(3600);

        let number = match self.unit {
            TimeUnit::Hour24 => hours,
            TimeUnit::Hour12 => hours.rem_euclid(12) + 1,
            TimeUnit::Minute => within_hour / 60,
            TimeUnit::Second => within_hour % 60,
            TimeUnit::Meridiem => return if hours > 11 { "PM" } else { "AM" }.to_string(),
        };

        format!("{number:0width$}", width = self.width)
    }
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: String = std::iter::repeat_n(self.unit.letter(), self.width).collect();
        write!(f, "@{letters}")
    }
}

fn match_time_text(rest: &str, _offset: usize) -> MatchResult<TimeFragment> {
    Ok(match_text(rest).map(|text| (TimeFragment::Text(text.to_string()), text.len())))
}

fn match_time_field(rest: &str, offset: usize) -> MatchResult<TimeFragment> {
    let Some(captures) = FIELD.captures(rest) else {
        return Ok(None);
    };

    let whole = &captures[0];
    let name = &captures["name"];

    let unit = name
        .chars()
        .next()
        .and_then(TimeUnit::from_letter)
        .ok_or_else(|| {
            (
                GeneralError::from(ParseError::UnknownTimeField(name.to_string())),
                offset..offset + whole.len(),
            )
        })?;

    Ok(Some((
        TimeFragment::Field(TimeField {
            unit,
            width: name.len(),
        }),
        whole.len(),
    )))
}

const MATCHERS: &[Matcher<TimeFragment>] = &[match_time_field, match_time_text];

impl TimeFormat {
    pub fn compile(format: &str) -> Result<Self, Spanned<GeneralError>> {
        let fragments = breakdown(format, MATCHERS)?;

        Ok(Self { fragments })
    }

    pub fn fragments(&self) -> &[TimeFragment] {
        &self.fragments
    }

    /// Render a count of seconds with this format
    pub fn apply(&self, value: i64) -> String {
        self.fragments
            .iter()
            .map(|fragment| match fragment {
                TimeFragment::Text(text) => text.clone(),
                TimeFragment::Field(field) => field.apply(value),
            })
            .collect()
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            match fragment {
                TimeFragment::Text(text) => write!(f, "{text}")?,
                TimeFragment::Field(field) => write!(f, "{field}")?,
            }
        }

        Ok(())
    }
}
