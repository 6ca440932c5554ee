use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::char,
    combinator::map,
    error::{Error, ErrorKind},
    multi::separated_list1,
    sequence::delimited,
    IResult,
};

/// Characters allowed in an unquoted identifier.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Case-insensitive keyword that must not run into a following identifier
/// character (`TABLE` matches `TABLE users` but not `TABLES`).
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| {
        let (rest, matched) = tag_no_case::<_, _, Error<&'a str>>(kw)(input)?;
        if rest.starts_with(is_ident_char) {
            return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)));
        }
        Ok((rest, matched))
    }
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('`'), take_while(|c: char| c != '`'), char('`')),
    ))(input)
}

/// One identifier segment. Quoted segments keep their case; unquoted ones
/// are folded to lower case, as Postgres does.
fn ident_segment(input: &str) -> IResult<&str, String> {
    alt((
        map(quoted, str::to_string),
        map(take_while1(is_ident_char), str::to_lowercase),
    ))(input)
}

/// Parse a possibly schema-qualified, possibly quoted identifier and return
/// its last segment without quotes: `"public"."Users"` yields `Users`,
/// `public.Users` yields `users`.
pub fn qualified_identifier(input: &str) -> IResult<&str, String> {
    map(separated_list1(char('.'), ident_segment), |mut parts: Vec<String>| {
        parts.pop().unwrap_or_default()
    })(input)
}

/// Normalize a raw identifier token (schema prefix and quotes removed).
pub fn normalize_identifier(raw: &str) -> String {
    let raw = raw.trim();
    match qualified_identifier(raw) {
        Ok((_, name)) if !name.is_empty() => name,
        _ => raw.trim_matches(|c| c == '"' || c == '`').to_string(),
    }
}

/// Parse content inside balanced delimiters, handling nesting.
/// The opening delimiter must already be consumed; the closing one is left
/// for the caller.
pub fn take_until_balanced(open: char, close: char) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input: &str| {
        let mut depth = 1;
        for (idx, c) in input.char_indices() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[idx..], &input[..idx]));
                }
            }
        }
        // EOF before closing delimiter
        Err(nom::Err::Error(Error::new(input, ErrorKind::TakeUntil)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_boundary() {
        assert!(keyword("TABLE")("table users").is_ok());
        assert!(keyword("TABLE")("TABLES").is_err());
        assert_eq!(keyword("add")("ADD(x int)").unwrap().0, "(x int)");
    }

    #[test]
    fn test_qualified_identifier() {
        assert_eq!(qualified_identifier("users (").unwrap().1, "users");
        assert_eq!(qualified_identifier("public.users").unwrap().1, "users");
        assert_eq!(qualified_identifier("\"public\".\"User Data\" x").unwrap().1, "User Data");
        assert_eq!(qualified_identifier("`orders`").unwrap().1, "orders");
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("  \"Email\" "), "Email");
        assert_eq!(normalize_identifier("app.accounts"), "accounts");
        assert_eq!(normalize_identifier("id"), "id");
    }

    #[test]
    fn test_unquoted_identifiers_fold_to_lower_case() {
        assert_eq!(qualified_identifier("Public.Users (").unwrap().1, "users");
        assert_eq!(normalize_identifier("CreatedAt"), "createdat");
        assert_eq!(normalize_identifier("\"CreatedAt\""), "CreatedAt");
    }

    #[test]
    fn test_take_until_balanced() {
        let (rest, body) = take_until_balanced('(', ')')("a NUMERIC(10, 2), b INT) tail").unwrap();
        assert_eq!(body, "a NUMERIC(10, 2), b INT");
        assert_eq!(rest, ") tail");
        assert!(take_until_balanced('(', ')')("a INT").is_err());
    }
}
