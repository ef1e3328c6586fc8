use crate::DatePattern;

/// Why an expression is not a usable template.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("no `#{{...}}` serial field")]
    MissingSerial,
    #[error("more than one `#{{...}}` serial field")]
    MultipleSerials,
    #[error("the serial field `#{{}}` has zero width")]
    EmptySerial,
}

/// One piece of a parsed [`Template`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Copied verbatim.
    Literal(String),
    /// `${YYYY}` and friends: the current time.
    Date(DatePattern),
    /// `${name}`: a caller-supplied value.
    Param(String),
    /// `#{0000}`: the counter, zero padded to `width`.
    Serial { width: usize },
}

impl Segment {
    /// Rendered length in characters, if it does not depend on the request.
    pub(crate) fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Literal(text) => Some(text.chars().count()),
            Self::Date(pattern) => Some(pattern.width()),
            Self::Param(_) => None,
            Self::Serial { width } => Some(*width),
        }
    }
}

/// A parsed numbering expression.
///
/// The syntax has two placeholder forms:
///
/// - `${X}`: a date pattern (see [`DatePattern`]) when `X` names one,
///   otherwise a named parameter.
/// - `#{digits}`: the serial field. It must appear exactly once; the length
///   of `digits` is the zero-padded width of the counter.
///
/// An opening `${` or `#{` without a closing `}` is kept as literal text.
///
/// # Example
///
/// ```
/// use seqcode::{DatePattern, Segment, Template};
///
/// let template = Template::parse("ORD${YYYY}-${dept}#{0000}").unwrap();
/// assert_eq!(template.serial_width(), 4);
/// assert_eq!(template.date_patterns().collect::<Vec<_>>(), [DatePattern::Year]);
/// assert_eq!(template.param_names().collect::<Vec<_>>(), ["dept"]);
/// assert_eq!(template.segments()[0], Segment::Literal("ORD".to_string()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    serial_index: usize,
    serial_width: usize,
}

enum Token<'a> {
    Text(&'a str),
    Param(&'a str),
    Serial(&'a str),
}

/// First pass: split the source on `${...}` / `#{...}` boundaries.
fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Some(open) = find_open(rest) {
        let (sigil, after) = (rest.as_bytes()[open], &rest[open + 2..]);
        let Some(close) = after.find('}') else {
            break;
        };
        if open > 0 {
            tokens.push(Token::Text(&rest[..open]));
        }
        let body = &after[..close];
        tokens.push(if sigil == b'$' {
            Token::Param(body)
        } else {
            Token::Serial(body)
        });
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest));
    }
    tokens
}

fn find_open(s: &str) -> Option<usize> {
    s.as_bytes()
        .windows(2)
        .position(|w| (w[0] == b'$' || w[0] == b'#') && w[1] == b'{')
}

impl Template {
    /// Parses `source` into segments.
    ///
    /// # Errors
    ///
    /// Fails unless the source contains exactly one non-empty serial field.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut serial = None;

        // Second pass: classify placeholders and merge adjacent text.
        for token in tokenize(source) {
            let segment = match token {
                Token::Text(text) => {
                    if let Some(Segment::Literal(prev)) = segments.last_mut() {
                        prev.push_str(text);
                        continue;
                    }
                    Segment::Literal(text.to_string())
                }
                Token::Param(name) => DatePattern::from_placeholder(name)
                    .map_or_else(|| Segment::Param(name.to_string()), Segment::Date),
                Token::Serial(digits) => {
                    if serial.is_some() {
                        return Err(TemplateError::MultipleSerials);
                    }
                    let width = digits.chars().count();
                    if width == 0 {
                        return Err(TemplateError::EmptySerial);
                    }
                    serial = Some((segments.len(), width));
                    Segment::Serial { width }
                }
            };
            segments.push(segment);
        }

        let (serial_index, serial_width) = serial.ok_or(TemplateError::MissingSerial)?;
        Ok(Self {
            source: source.to_string(),
            segments,
            serial_index,
            serial_width,
        })
    }

    /// The expression this template was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Zero-padded width of the serial field.
    pub const fn serial_width(&self) -> usize {
        self.serial_width
    }

    pub(crate) const fn serial_index(&self) -> usize {
        self.serial_index
    }

    pub fn date_patterns(&self) -> impl Iterator<Item = DatePattern> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Date(pattern) => Some(*pattern),
            _ => None,
        })
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Returns `true` if `serial` has more decimal digits than the field.
    pub fn overflows(&self, serial: u64) -> bool {
        decimal_len(serial) > self.serial_width
    }
}

pub(crate) fn decimal_len(n: u64) -> usize {
    n.checked_ilog10().map_or(1, |log| log as usize + 1)
}
