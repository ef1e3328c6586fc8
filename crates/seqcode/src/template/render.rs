use core::fmt::Write as _;
use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::{CalibrationError, Error, Result, Segment, Template};

/// Caller-supplied values for named `${...}` parameters.
pub type Params = HashMap<String, String>;

/// Text rendered in place of a parameter the caller did not supply, under
/// [`ParamPolicy::Lenient`].
pub const ABSENT_PARAM_MARKER: &str = "null";

/// What to do when a named parameter has no value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParamPolicy {
    /// Substitute [`ABSENT_PARAM_MARKER`].
    #[default]
    Lenient,
    /// Fail with [`Error::MissingParameter`].
    Strict,
}

impl Template {
    /// Renders the template for one issued `serial`.
    ///
    /// Date placeholders are formatted from `now`. The serial is zero padded
    /// to the field width; a serial wider than the field is written out in
    /// full. Rollover is the issuer's job, not the renderer's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] under [`ParamPolicy::Strict`] when a
    /// named parameter is absent from `params`.
    pub fn render(
        &self,
        serial: u64,
        now: NaiveDateTime,
        params: &Params,
        policy: ParamPolicy,
    ) -> Result<String> {
        let mut out = String::with_capacity(self.source().len() + self.serial_width());

        for segment in self.segments() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Date(pattern) => out.push_str(&pattern.format(now)),
                Segment::Param(name) => match (params.get(name), policy) {
                    (Some(value), _) => out.push_str(value),
                    (None, ParamPolicy::Lenient) => out.push_str(ABSENT_PARAM_MARKER),
                    (None, ParamPolicy::Strict) => {
                        return Err(Error::MissingParameter { name: name.clone() });
                    }
                },
                &Segment::Serial { width } => {
                    // Writing into a `String` cannot fail.
                    let _ = write!(out, "{serial:0width$}");
                }
            }
        }
        Ok(out)
    }

    /// Fails the way [`render`](Self::render) would for missing parameters,
    /// without rendering.
    ///
    /// Lets callers reject a request before a counter is advanced for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] for the first absent parameter
    /// under [`ParamPolicy::Strict`].
    pub fn check_params(&self, params: &Params, policy: ParamPolicy) -> Result<()> {
        if policy == ParamPolicy::Lenient {
            return Ok(());
        }
        match self.param_names().find(|name| !params.contains_key(*name)) {
            Some(name) => Err(Error::MissingParameter {
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Reads the serial number back out of a code rendered from this template.
    ///
    /// The field is located from the end of the code when everything after it
    /// has a fixed width, otherwise from the start when everything before it
    /// does. Named parameters have no fixed width, so a template with
    /// parameters on both sides of the serial field cannot be read back.
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] when the field cannot be located or is
    /// not numeric.
    pub fn extract_serial(&self, code: &str) -> Result<u64, CalibrationError> {
        let chars: Vec<char> = code.chars().collect();
        let width = self.serial_width();
        let (before, after) = self.segments().split_at(self.serial_index());

        let start = if let Some(suffix) = fixed_width(&after[1..]) {
            chars.len().checked_sub(suffix + width)
        } else if let Some(prefix) = fixed_width(before) {
            (prefix + width <= chars.len()).then_some(prefix)
        } else {
            None
        };
        let start = start.ok_or_else(|| CalibrationError::Unlocatable {
            code: code.to_string(),
            width,
        })?;

        let digits: String = chars[start..start + width].iter().collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CalibrationError::NotNumeric {
                code: code.to_string(),
                digits,
            });
        }
        digits.parse().map_err(|_| CalibrationError::NotNumeric {
            code: code.to_string(),
            digits: digits.clone(),
        })
    }
}

fn fixed_width(segments: &[Segment]) -> Option<usize> {
    segments.iter().map(Segment::fixed_width).sum()
}
