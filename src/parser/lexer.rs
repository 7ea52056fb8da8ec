use nom::{
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0},
    combinator::{opt, recognize},
    error::ParseError,
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O, E: ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

/// Digits with optional comma grouping: `23,204` or Indian-style `8,99,041`
pub fn grouped_digits(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, many0(preceded(char(','), digit1))))(input)
}

/// Unsigned decimal literal with optional grouping, returned without commas
pub fn number_literal(input: &str) -> IResult<&str, f64> {
    let (rest, text) = recognize(pair(grouped_digits, opt(preceded(tag("."), digit1))))(input)?;
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) => Ok((rest, v)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_literal_grouped() {
        assert_eq!(number_literal("23,204"), Ok(("", 23204.0)));
        assert_eq!(number_literal("8,99,041 Cr"), Ok((" Cr", 899041.0)));
        assert_eq!(number_literal("9.69%"), Ok(("%", 9.69)));
    }

    #[test]
    fn test_number_literal_rejects_text() {
        assert!(number_literal("FY 2022").is_err());
    }

    #[test]
    fn test_ws() {
        let mut p = ws(tag::<_, _, nom::error::Error<&str>>("%"));
        assert_eq!(p("  %  x"), Ok(("x", "%")));
    }
}
