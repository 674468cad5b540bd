// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IGES free-format field parser using nom
//!
//! Splits parameter data on the file's delimiters and converts every token
//! to a typed [`Field`]. Conversion is total: anything that is not a number
//! stays text.

use nom::{
    branch::alt,
    bytes::complete::{take, take_till},
    character::complete::{digit1, one_of, satisfy, space0},
    combinator::{eof, map, map_res, peek, value},
    sequence::{delimited, terminated},
    IResult,
};

/// Parameter and record delimiters declared in the Global section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delimiters {
    pub parameter: char,
    pub record: char,
}

impl Delimiters {
    pub fn new(parameter: char, record: char) -> Self {
        Self { parameter, record }
    }

    /// True if `c` terminates a field
    #[inline]
    pub fn ends_field(&self, c: char) -> bool {
        c == self.parameter || c == self.record
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new(',', ';')
    }
}

/// Typed value of one parameter field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    /// Integer: 126, -3
    Integer(i64),
    /// Real: 1.5, 0., 1.0D-3
    Real(f64),
    /// Hollerith constant or unparsable token
    Text(String),
    /// Empty field (IGES default value)
    Empty,
}

impl Field {
    /// Convert a raw token to a typed field. Never fails.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() {
            return Field::Empty;
        }

        let unsigned = token.strip_prefix('+').unwrap_or(token);

        if token.contains(['.', 'E', 'e', 'D', 'd']) {
            // FORTRAN-style double exponent: 1.0D2 -> 1.0E2
            let normalized = unsigned.replace(['D', 'd'], "E");
            return match fast_float::parse::<f64, _>(&normalized) {
                Ok(value) => Field::Real(value),
                Err(_) => Field::Text(token.to_string()),
            };
        }

        match lexical_core::parse::<i64>(unsigned.as_bytes()) {
            Ok(value) => Field::Integer(value),
            Err(_) => Field::Text(token.to_string()),
        }
    }

    /// Get as integer. Empty fields read as the IGES default 0; integral
    /// reals are accepted because some writers emit counts as `2.`.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Field::Integer(i) => Some(*i),
            Field::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Field::Empty => Some(0),
            _ => None,
        }
    }

    /// Get as real. Empty fields read as 0.0.
    #[inline]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Field::Real(f) => Some(*f),
            Field::Integer(i) => Some(*i as f64),
            Field::Empty => Some(0.0),
            Field::Text(_) => None,
        }
    }

    /// Get as text
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Field::Empty)
    }
}

/// Hollerith constant: 5HHELLO
fn hollerith(input: &str) -> IResult<&str, &str> {
    let (rest, count) = map_res(digit1, |s: &str| s.parse::<usize>())(input)?;
    let (rest, _) = one_of("Hh")(rest)?;
    take(count)(rest)
}

/// Hollerith constant that fills the whole field
fn hollerith_field(delimiters: Delimiters) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| {
        terminated(
            delimited(space0, hollerith, space0),
            peek(alt((
                value((), satisfy(move |c: char| delimiters.ends_field(c))),
                value((), eof),
            ))),
        )(input)
    }
}

/// Parse one field up to (not including) the next delimiter
fn field(delimiters: Delimiters) -> impl FnMut(&str) -> IResult<&str, Field> {
    move |input| {
        alt((
            map(hollerith_field(delimiters), |s: &str| Field::Text(s.to_string())),
            map(
                take_till(move |c: char| delimiters.ends_field(c)),
                Field::from_token,
            ),
        ))(input)
    }
}

/// Split a parameter string into typed fields.
///
/// Stops at the record delimiter; anything after it (comments) is ignored.
pub fn parse_fields(data: &str, delimiters: Delimiters) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut input = data;
    let mut parse_one = field(delimiters);

    while let Ok((rest, parsed)) = parse_one(input) {
        fields.push(parsed);
        match rest.chars().next() {
            Some(c) if c == delimiters.parameter => input = &rest[c.len_utf8()..],
            _ => break,
        }
    }

    fields
}
