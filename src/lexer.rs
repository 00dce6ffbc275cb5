// ABOUTME: Tokenizer turning NumFu source text into a span-tagged token stream

use crate::error::{NumfuError, Span};
use crate::number::Number;
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while},
    character::complete::{char, digit1, none_of, one_of},
    combinator::{opt, recognize, value},
    multi::many0,
    IResult, Parser,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(Number),
    Bool(bool),
    Str(String),
    Ident(String),
    Underscore,
    Dollar,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Semicolon,
    Ellipsis,
    Assign, // =
    Arrow,    // ->
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Compose, // >>
    PipeOp,  // |>
    Assert,  // --->
    Eof,
}

/// A token tagged with its source span. `line` is used by the parser to apply
/// the newline-sensitive indexing rule in §4.1.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

struct Pos {
    line: usize,
    column: usize,
}

/// Reserved identifiers that can never be bound by user code (§6).
pub const RESERVED: &[&str] = &[
    "let", "in", "const", "if", "then", "else", "true", "false", "import", "export", "from",
    "del",
];

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn lex_number(input: &str) -> IResult<&str, TokenKind> {
    let (rest, text) = recognize((
        opt(char('-')),
        alt((
            recognize((digit1, opt((char('.'), digit1)))),
            recognize((char('.'), digit1)),
        )),
    ))
    .parse(input)?;
    let n = Number::parse(text).ok_or(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Digit,
    )))?;
    Ok((rest, TokenKind::Number(n)))
}

fn lex_string(input: &str) -> IResult<&str, TokenKind> {
    let (input, _) = char('"')(input)?;
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('"')(input) {
        return Ok((rest, TokenKind::Str(String::new())));
    }
    let (input, content) = escaped_transform(
        none_of("\"\\"),
        '\\',
        alt((
            value("\"", tag("\"")),
            value("\\", tag("\\")),
            value("\n", tag("n")),
            value("\t", tag("t")),
        )),
    )(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, TokenKind::Str(content)))
}

fn lex_ident(input: &str) -> IResult<&str, TokenKind> {
    let (rest, first) = one_of("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ")(input)?;
    let (rest, tail) = take_while(is_ident_continue)(rest)?;
    let mut name = String::new();
    name.push(first);
    name.push_str(tail);
    let kind = match name.as_str() {
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        _ => TokenKind::Ident(name),
    };
    Ok((rest, kind))
}

fn lex_underscore_or_ident(input: &str) -> IResult<&str, TokenKind> {
    let (rest, _) = char('_')(input)?;
    let (rest, tail) = take_while(is_ident_continue)(rest)?;
    if tail.is_empty() {
        Ok((rest, TokenKind::Underscore))
    } else {
        Ok((rest, TokenKind::Ident(format!("_{tail}"))))
    }
}

fn lex_symbol(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Assert, tag("--->")),
        value(TokenKind::Ellipsis, tag("...")),
        value(TokenKind::Arrow, tag("->")),
        value(TokenKind::Compose, tag(">>")),
        value(TokenKind::PipeOp, tag("|>")),
        value(TokenKind::AndAnd, tag("&&")),
        value(TokenKind::OrOr, tag("||")),
        value(TokenKind::Le, tag("<=")),
        value(TokenKind::Ge, tag(">=")),
        value(TokenKind::EqEq, tag("==")),
        value(TokenKind::NotEq, tag("!=")),
        value(TokenKind::Assign, tag("=")),
        value(TokenKind::LParen, tag("(")),
        value(TokenKind::RParen, tag(")")),
        value(TokenKind::LBracket, tag("[")),
        value(TokenKind::RBracket, tag("]")),
        value(TokenKind::LBrace, tag("{")),
        value(TokenKind::RBrace, tag("}")),
        value(TokenKind::Comma, tag(",")),
        value(TokenKind::Colon, tag(":")),
        value(TokenKind::Dot, tag(".")),
        value(TokenKind::Semicolon, tag(";")),
        value(TokenKind::Plus, tag("+")),
        value(TokenKind::Minus, tag("-")),
        value(TokenKind::Star, tag("*")),
        value(TokenKind::Slash, tag("/")),
        value(TokenKind::Percent, tag("%")),
        value(TokenKind::Caret, tag("^")),
        value(TokenKind::Bang, tag("!")),
        value(TokenKind::Lt, tag("<")),
        value(TokenKind::Gt, tag(">")),
    ))
    .parse(input)
}

fn lex_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char('#')(input)?;
    let (input, _) = take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

/// Tokenize the full source text, tracking (line, column) for every token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, NumfuError> {
    let mut tokens = Vec::new();
    let mut pos = Pos { line: 1, column: 1 };
    let mut rest = source;

    loop {
        // Skip whitespace and comments, tracking line/column.
        loop {
            if let Some(c) = rest.chars().next() {
                if c == '\n' {
                    pos.line += 1;
                    pos.column = 1;
                    rest = &rest[1..];
                    continue;
                } else if c.is_whitespace() {
                    pos.column += 1;
                    rest = &rest[1..];
                    continue;
                }
            }
            if let Ok((r, _)) = lex_comment(rest) {
                let consumed = rest.len() - r.len();
                pos.column += consumed;
                rest = r;
                continue;
            }
            break;
        }

        if rest.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(pos.line, pos.column, 0),
            });
            break;
        }

        let start_line = pos.line;
        let start_col = pos.column;

        let result: IResult<&str, TokenKind> = alt((
            lex_number,
            lex_string,
            lex_ident,
            lex_underscore_or_ident,
            |i| {
                if i.starts_with('$') {
                    Ok((&i[1..], TokenKind::Dollar))
                } else {
                    Err(nom::Err::Error(nom::error::Error::new(
                        i,
                        nom::error::ErrorKind::Char,
                    )))
                }
            },
            lex_symbol,
        ))
        .parse(rest);

        match result {
            Ok((next_rest, kind)) => {
                let consumed = rest.len() - next_rest.len();
                let width = rest[..consumed].chars().count();
                tokens.push(Token {
                    kind,
                    span: Span::new(start_line, start_col, width),
                });
                pos.column += width;
                rest = next_rest;
            }
            Err(_) => {
                let bad = rest.chars().next().unwrap();
                return Err(NumfuError::syntax(format!(
                    "unexpected character '{bad}'"
                ))
                .at(Span::new(start_line, start_col, 1)));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_numbers_and_operators() {
        let ks = kinds("1 + 2.5 * -3");
        assert!(matches!(ks[0], TokenKind::Number(_)));
        assert!(matches!(ks[1], TokenKind::Plus));
        assert!(matches!(ks[2], TokenKind::Number(_)));
        assert!(matches!(ks[3], TokenKind::Star));
        assert!(matches!(ks[4], TokenKind::Minus));
    }

    #[test]
    fn tokenizes_placeholder_and_dollar() {
        let ks = kinds("f(_, $)");
        assert!(ks.contains(&TokenKind::Underscore));
        assert!(ks.contains(&TokenKind::Dollar));
    }

    #[test]
    fn tokenizes_chained_comparisons() {
        let ks = kinds("a < b <= c");
        assert!(matches!(ks[1], TokenKind::Lt));
        assert!(matches!(ks[3], TokenKind::Le));
    }

    #[test]
    fn assignment_arrow_and_assertion_do_not_clash() {
        let ks = kinds("{x -> x} ---> $ == 1");
        assert!(ks.contains(&TokenKind::Arrow));
        assert!(ks.contains(&TokenKind::Assert));
    }

    #[test]
    fn reports_line_and_column() {
        let toks = tokenize("1\n  2").unwrap();
        assert_eq!(toks[0].span.line, 1);
        assert_eq!(toks[1].span.line, 2);
        assert_eq!(toks[1].span.column, 3);
    }
}
