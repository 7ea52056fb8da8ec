use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::char,
    combinator::{all_consuming, map, opt},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use super::lexer::{number_literal, ws};
use crate::data::Value;

const MISSING_MARKERS: &[&str] = &["", "-", "--", "na", "n/a", "nan", "null", "none"];

/// Parse one raw cell into a [`Value`].
///
/// Numbers may carry a currency prefix (`₹`, `$`, `Rs.`), comma grouping, a
/// leading sign or accounting parentheses, and a `%` or `Cr` suffix. The
/// suffix is a unit marker only: `"17%"` parses as `17.0`. Anything that is
/// not entirely a number stays text.
pub fn parse_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    if MISSING_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Value::Missing;
    }

    match all_consuming(terminated(amount, unit_suffix))(trimmed) {
        Ok((_, v)) => Value::Number(v),
        Err(_) => Value::Text(trimmed.to_string()),
    }
}

fn currency(input: &str) -> IResult<&str, &str> {
    alt((
        tag("₹"),
        tag("$"),
        tag("€"),
        tag("£"),
        tag_no_case("rs."),
        tag_no_case("rs"),
    ))(input)
}

fn unsigned_amount(input: &str) -> IResult<&str, f64> {
    preceded(opt(ws(currency)), number_literal)(input)
}

fn amount(input: &str) -> IResult<&str, f64> {
    alt((
        // Accounting negative: (971)
        map(
            delimited(ws(char('(')), unsigned_amount, ws(char(')'))),
            |v| -v,
        ),
        map(
            pair(opt(ws(alt((char('-'), char('+'))))), unsigned_amount),
            |(sign, v)| if sign == Some('-') { -v } else { v },
        ),
    ))(input)
}

fn unit_suffix(input: &str) -> IResult<&str, Option<&str>> {
    opt(ws(alt((tag("%"), tag_no_case("crores"), tag_no_case("cr")))))(input)
}
