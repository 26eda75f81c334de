//! Conversion-pattern layouts
//!
//! Patterns are parsed once into segments and then rendered per record.
//!
//! Supported conversions: `%p` level, `%c` logger name, `%m` message,
//! `%t` thread name, `%d` / `%d{strftime}` local timestamp, `%X{key}`
//! diagnostic context value and `%%` for a literal percent sign. A width
//! may precede the conversion letter (`%5p`, `%-5p`), up to [`MAX_WIDTH`].

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::CharIndices;

use chrono::format::{Item, StrftimeItems};
use thiserror::Error;

use super::record::Record;

/// Pattern used when none is configured
pub const DEFAULT_PATTERN: &str = "%p %c - %m";

/// Timestamp format for a bare `%d`
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Largest padding width a conversion may request
pub const MAX_WIDTH: usize = 1024;

/// Errors from parsing a conversion pattern
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("pattern ends with a lone '%' at position {position}")]
    DanglingPercent { position: usize },

    #[error("unknown conversion '%{conversion}' at position {position}")]
    UnknownConversion { conversion: char, position: usize },

    #[error("unterminated '{{' option at position {position}")]
    UnterminatedOption { position: usize },

    #[error("'%X' at position {position} needs a key, e.g. %X{{host}}")]
    MissingContextKey { position: usize },

    #[error("width at position {position} exceeds the maximum of {max}")]
    WidthTooLarge { position: usize, max: usize },

    #[error("invalid date format '{format}'")]
    InvalidDateFormat { format: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Conversion {
    Level,
    Logger,
    Message,
    Thread,
    Date(String),
    Context(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Width {
    min: usize,
    left_justify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Convert {
        conversion: Conversion,
        width: Option<Width>,
    },
}

/// A parsed conversion pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternLayout {
    pattern: String,
    segments: Vec<Segment>,
}

impl Default for PatternLayout {
    fn default() -> Self {
        let convert = |conversion| Segment::Convert {
            conversion,
            width: None,
        };
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            segments: vec![
                convert(Conversion::Level),
                Segment::Literal(" ".to_string()),
                convert(Conversion::Logger),
                Segment::Literal(" - ".to_string()),
                convert(Conversion::Message),
            ],
        }
    }
}

impl PatternLayout {
    /// Parse a conversion pattern
    pub fn new(pattern: &str) -> Result<Self, LayoutError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            if matches!(chars.peek(), Some((_, '%'))) {
                chars.next();
                literal.push('%');
                continue;
            }

            let width = parse_width(&mut chars, position)?;
            let (_, letter) = chars
                .next()
                .ok_or(LayoutError::DanglingPercent { position })?;

            let conversion = match letter {
                'p' => Conversion::Level,
                'c' => Conversion::Logger,
                'm' => Conversion::Message,
                't' => Conversion::Thread,
                'd' => {
                    let format = parse_option(&mut chars, position)?
                        .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
                    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
                        return Err(LayoutError::InvalidDateFormat { format });
                    }
                    Conversion::Date(format)
                }
                'X' => {
                    let key = parse_option(&mut chars, position)?
                        .filter(|k| !k.is_empty())
                        .ok_or(LayoutError::MissingContextKey { position })?;
                    Conversion::Context(key)
                }
                other => {
                    return Err(LayoutError::UnknownConversion {
                        conversion: other,
                        position,
                    })
                }
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Convert { conversion, width });
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// The pattern this layout was parsed from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render a record into a single line, without the line break
    pub fn format(&self, record: &Record) -> String {
        let mut out = String::with_capacity(self.pattern.len() + record.message.len() + 16);

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Convert { conversion, width } => {
                    let value = match conversion {
                        Conversion::Level => record.level.as_str().to_string(),
                        Conversion::Logger => record.logger.clone(),
                        Conversion::Message => record.message.clone(),
                        Conversion::Thread => record
                            .thread
                            .clone()
                            .unwrap_or_else(|| "unnamed".to_string()),
                        Conversion::Date(format) => record.timestamp.format(format).to_string(),
                        Conversion::Context(key) => {
                            record.context.get(key).cloned().unwrap_or_default()
                        }
                    };
                    push_padded(&mut out, &value, *width);
                }
            }
        }

        out
    }
}

fn parse_width(
    chars: &mut Peekable<CharIndices<'_>>,
    position: usize,
) -> Result<Option<Width>, LayoutError> {
    let left_justify = if matches!(chars.peek(), Some((_, '-'))) {
        chars.next();
        true
    } else {
        false
    };

    let mut min = 0usize;
    let mut seen_digit = false;
    while let Some(&(_, c)) = chars.peek() {
        match c.to_digit(10) {
            Some(d) => {
                min = min.saturating_mul(10).saturating_add(d as usize);
                if min > MAX_WIDTH {
                    return Err(LayoutError::WidthTooLarge {
                        position,
                        max: MAX_WIDTH,
                    });
                }
                seen_digit = true;
                chars.next();
            }
            None => break,
        }
    }

    // "%-p" without digits behaves like "%p"
    Ok(seen_digit.then_some(Width { min, left_justify }))
}

fn parse_option(
    chars: &mut Peekable<CharIndices<'_>>,
    position: usize,
) -> Result<Option<String>, LayoutError> {
    if !matches!(chars.peek(), Some((_, '{'))) {
        return Ok(None);
    }
    chars.next();

    let mut option = String::new();
    for (_, c) in chars.by_ref() {
        if c == '}' {
            return Ok(Some(option));
        }
        option.push(c);
    }
    Err(LayoutError::UnterminatedOption { position })
}

fn push_padded(out: &mut String, value: &str, width: Option<Width>) {
    match width {
        Some(Width {
            min,
            left_justify: true,
        }) => {
            let _ = write!(out, "{value:<min$}");
        }
        Some(Width {
            min,
            left_justify: false,
        }) => {
            let _ = write!(out, "{value:>min$}");
        }
        None => out.push_str(value),
    }
}
