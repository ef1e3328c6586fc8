use chrono::NaiveDateTime;

/// A `${...}` placeholder that renders the current time instead of a named
/// parameter.
///
/// Placeholder names are matched case-insensitively. Each pattern renders a
/// fixed number of characters, which lets calibration find the serial field
/// inside a persisted code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatePattern {
    /// `YYYY`
    Year,
    /// `YYYYMM`
    YearMonth,
    /// `YYYYMMDD`
    Day,
    /// `YYYYMMDDHH`
    Hour,
    /// `YYYYMMDDHHmm`
    Minute,
    /// `YYYYMMDDHHmmss`
    Second,
    /// `YYYYMMddHHmmssSSS`
    Millisecond,
}

const PLACEHOLDERS: [(&str, DatePattern); 7] = [
    ("YYYY", DatePattern::Year),
    ("YYYYMM", DatePattern::YearMonth),
    ("YYYYMMDD", DatePattern::Day),
    ("YYYYMMDDHH", DatePattern::Hour),
    ("YYYYMMDDHHmm", DatePattern::Minute),
    ("YYYYMMDDHHmmss", DatePattern::Second),
    ("YYYYMMddHHmmssSSS", DatePattern::Millisecond),
];

impl DatePattern {
    /// Classifies a placeholder name, returning `None` for named parameters.
    pub fn from_placeholder(name: &str) -> Option<Self> {
        PLACEHOLDERS
            .iter()
            .find(|(placeholder, _)| placeholder.eq_ignore_ascii_case(name))
            .map(|&(_, pattern)| pattern)
    }

    /// Number of characters the pattern renders to.
    pub const fn width(self) -> usize {
        match self {
            Self::Year => 4,
            Self::YearMonth => 6,
            Self::Day => 8,
            Self::Hour => 10,
            Self::Minute => 12,
            Self::Second => 14,
            Self::Millisecond => 17,
        }
    }

    const fn strftime(self) -> &'static str {
        match self {
            Self::Year => "%Y",
            Self::YearMonth => "%Y%m",
            Self::Day => "%Y%m%d",
            Self::Hour => "%Y%m%d%H",
            Self::Minute => "%Y%m%d%H%M",
            Self::Second => "%Y%m%d%H%M%S",
            Self::Millisecond => "%Y%m%d%H%M%S%3f",
        }
    }

    pub fn format(self, now: NaiveDateTime) -> String {
        now.format(self.strftime()).to_string()
    }
}
