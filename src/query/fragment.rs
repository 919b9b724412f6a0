//! Condition Fragment Parser
//!
//! Scans SQL-ish condition text into attribute/value pairs. Only a
//! conjunction of simple equality clauses is accepted; anything outside
//! that subset makes the whole fragment non-canonicalizable.

use std::iter::Peekable;
use std::str::Chars;

use super::value::ScalarValue;

// == Tokens ==
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    QuotedIdent(String),
    Str(String),
    Int(i64),
    Eq,
    Dot,
    Placeholder,
}

// == Parser Entry Point ==
/// Parses condition text into attribute/value pairs.
///
/// Placeholders (`?`) bind positionally against `params`; literal values
/// are accepted alongside them. An unbound placeholder, an unused
/// parameter, or any clause that is not `identifier = value` joined by
/// `AND` yields None.
///
/// # Arguments
/// * `text` - The condition text, possibly empty
/// * `params` - Values for positional placeholders, in order
pub(crate) fn parse_conditions(
    text: &str,
    params: &[ScalarValue],
) -> Option<Vec<(String, ScalarValue)>> {
    let tokens = tokenize(text)?;
    let mut cursor = 0usize;
    let mut bound = 0usize;
    let mut pairs = Vec::new();

    if tokens.is_empty() {
        return if params.is_empty() { Some(pairs) } else { None };
    }

    loop {
        let attribute = parse_attribute(&tokens, &mut cursor)?;
        if tokens.get(cursor) != Some(&Token::Eq) {
            return None;
        }
        cursor += 1;
        let value = parse_value(&tokens, &mut cursor, params, &mut bound)?;
        pairs.push((attribute, value));

        match tokens.get(cursor) {
            None => break,
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("and") => cursor += 1,
            _ => return None,
        }
    }

    if bound != params.len() {
        return None;
    }
    Some(pairs)
}

// == Clause Parsing ==
/// Parses a possibly qualified identifier and returns the attribute name.
///
/// Accepts `attr`, `table.attr` and the backquoted spellings of either
/// part. The qualifier is dropped; the attribute is lowercased.
fn parse_attribute(tokens: &[Token], cursor: &mut usize) -> Option<String> {
    let first = identifier_part(tokens.get(*cursor)?)?;
    *cursor += 1;

    if tokens.get(*cursor) == Some(&Token::Dot) {
        *cursor += 1;
        let second = identifier_part(tokens.get(*cursor)?)?;
        *cursor += 1;
        return Some(second);
    }

    Some(first)
}

fn identifier_part(token: &Token) -> Option<String> {
    match token {
        Token::Word(w) => Some(w.to_ascii_lowercase()),
        Token::QuotedIdent(q) => Some(q.to_ascii_lowercase()),
        _ => None,
    }
}

/// Parses a right-hand side value.
///
/// Integers, single-quoted strings, TRUE/FALSE and placeholders are the
/// whole value domain. A bare NULL is rejected: equality against NULL
/// never matches a row.
fn parse_value(
    tokens: &[Token],
    cursor: &mut usize,
    params: &[ScalarValue],
    bound: &mut usize,
) -> Option<ScalarValue> {
    let value = match tokens.get(*cursor)? {
        Token::Int(n) => ScalarValue::Integer(*n),
        Token::Str(s) => ScalarValue::Text(s.clone()),
        Token::Placeholder => {
            let param = params.get(*bound)?.clone();
            *bound += 1;
            param
        }
        Token::Word(w) if w.eq_ignore_ascii_case("true") => ScalarValue::Bool(true),
        Token::Word(w) if w.eq_ignore_ascii_case("false") => ScalarValue::Bool(false),
        _ => return None,
    };
    *cursor += 1;
    Some(value)
}

// == Scanner ==
/// Splits condition text into tokens, or None on any character outside
/// the supported subset.
fn tokenize(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '?' => {
                chars.next();
                tokens.push(Token::Placeholder);
            }
            '`' => {
                chars.next();
                tokens.push(Token::QuotedIdent(scan_quoted_ident(&mut chars)?));
            }
            '\'' => {
                chars.next();
                tokens.push(Token::Str(scan_string(&mut chars)?));
            }
            '-' => {
                chars.next();
                tokens.push(scan_integer(&mut chars, true)?);
            }
            c if c.is_ascii_digit() => tokens.push(scan_integer(&mut chars, false)?),
            c if c.is_ascii_alphabetic() || c == '_' => tokens.push(scan_word(&mut chars)),
            _ => return None,
        }
    }

    Some(tokens)
}

/// Scans digits into an integer token. The sign character, if any, was
/// already consumed by the caller.
fn scan_integer(chars: &mut Peekable<Chars<'_>>, negative: bool) -> Option<Token> {
    let mut digits = String::new();
    if negative {
        digits.push('-');
    }
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if digits.is_empty() || digits == "-" {
        return None;
    }
    digits.parse::<i64>().ok().map(Token::Int)
}

fn scan_word(chars: &mut Peekable<Chars<'_>>) -> Token {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            chars.next();
        } else {
            break;
        }
    }
    Token::Word(word)
}

/// Scans a backquoted identifier. The opening backquote was already
/// consumed. Empty or unterminated identifiers are invalid.
fn scan_quoted_ident(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut ident = String::new();
    for c in chars.by_ref() {
        if c == '`' {
            if ident.is_empty() {
                return None;
            }
            return Some(ident);
        }
        ident.push(c);
    }
    None
}

/// Scans a single-quoted string literal. The opening quote was already
/// consumed. A doubled quote is an escaped quote; an unterminated literal
/// is invalid.
fn scan_string(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut text = String::new();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                text.push('\'');
            } else {
                return Some(text);
            }
        } else {
            text.push(c);
        }
    }
    None
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(text: &str) -> Option<Vec<(String, ScalarValue)>> {
        parse_conditions(text, &[])
    }

    #[test]
    fn test_bare_equality() {
        let parsed = pairs("id = 5").unwrap();
        assert_eq!(parsed, vec![("id".to_string(), ScalarValue::Integer(5))]);
    }

    #[test]
    fn test_qualified_forms_are_equivalent() {
        let expected = vec![("id".to_string(), ScalarValue::Integer(5))];
        assert_eq!(pairs("stories.id = 5").unwrap(), expected);
        assert_eq!(pairs("`stories`.id = 5").unwrap(), expected);
        assert_eq!(pairs("`stories`.`id` = 5").unwrap(), expected);
    }

    #[test]
    fn test_attribute_names_lowercase() {
        let parsed = pairs("Title = 'x'").unwrap();
        assert_eq!(parsed[0].0, "title");
    }

    #[test]
    fn test_conjunction_case_insensitive() {
        let parsed = pairs("id = 1 AND title = 'a' and draft = TRUE").unwrap();
        assert_eq!(
            parsed,
            vec![
                ("id".to_string(), ScalarValue::Integer(1)),
                ("title".to_string(), ScalarValue::Text("a".to_string())),
                ("draft".to_string(), ScalarValue::Bool(true)),
            ]
        );
    }

    #[test]
    fn test_string_escape() {
        let parsed = pairs("title = 'it''s one'").unwrap();
        assert_eq!(parsed[0].1, ScalarValue::Text("it's one".to_string()));
    }

    #[test]
    fn test_negative_integer() {
        let parsed = pairs("delta = -12").unwrap();
        assert_eq!(parsed[0].1, ScalarValue::Integer(-12));
    }

    #[test]
    fn test_empty_text_is_empty_conjunction() {
        assert_eq!(pairs("").unwrap(), vec![]);
        assert_eq!(pairs("   ").unwrap(), vec![]);
    }

    #[test]
    fn test_placeholders_bind_in_order() {
        let params = vec![ScalarValue::Integer(1), ScalarValue::Text("a".to_string())];
        let parsed = parse_conditions("id = ? AND title = ?", &params).unwrap();
        assert_eq!(parsed[0].1, ScalarValue::Integer(1));
        assert_eq!(parsed[1].1, ScalarValue::Text("a".to_string()));
    }

    #[test]
    fn test_literal_beside_placeholder() {
        let params = vec![ScalarValue::Text("a".to_string())];
        let parsed = parse_conditions("id = 3 AND title = ?", &params).unwrap();
        assert_eq!(parsed[0].1, ScalarValue::Integer(3));
    }

    #[test]
    fn test_param_count_mismatch_rejected() {
        let params = vec![ScalarValue::Integer(1)];
        assert!(parse_conditions("id = ? AND title = ?", &params).is_none());
        assert!(parse_conditions("id = 3", &params).is_none());
    }

    #[test]
    fn test_rejects_inequality() {
        assert!(pairs("progress <= 5").is_none());
        assert!(pairs("id > 1").is_none());
    }

    #[test]
    fn test_rejects_is_null() {
        assert!(pairs("type IS NULL").is_none());
    }

    #[test]
    fn test_rejects_null_literal() {
        assert!(pairs("type = NULL").is_none());
    }

    #[test]
    fn test_rejects_or() {
        assert!(pairs("id = 1 OR id = 2").is_none());
    }

    #[test]
    fn test_rejects_dangling_and() {
        assert!(pairs("id = 1 AND").is_none());
    }

    #[test]
    fn test_rejects_float() {
        assert!(pairs("progress = 0.6").is_none());
    }

    #[test]
    fn test_rejects_double_quoted_literal() {
        assert!(pairs(r#"title = "x""#).is_none());
    }

    #[test]
    fn test_rejects_function_call() {
        assert!(pairs("lower(title) = 'x'").is_none());
    }

    #[test]
    fn test_rejects_unterminated_string() {
        assert!(pairs("title = 'oops").is_none());
    }

    #[test]
    fn test_rejects_bare_word_value() {
        assert!(pairs("title = untitled").is_none());
    }
}
