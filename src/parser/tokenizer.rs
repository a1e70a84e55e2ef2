// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tokenizer for lambda terms

use super::error::{ParseError, ParseResult};
use super::span::{Span, Spanned};
use std::fmt;

/// Token types of the term language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Literals
    Natural(u64),
    Identifier(String),

    // Structure
    /// `λ`, `\` or `lambda`
    Lambda,
    Dot,
    Comma,
    LeftParen,
    RightParen,
    /// `:=`
    Assign,

    // Operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Implies,
    Equivalent,

    // Keywords
    True,
    False,
    Error,
    TypeError,
    If,
    Then,
    Else,
    Let,
    LetRec,
    In,
    Rec,
    And,
    Or,
    Not,
}

impl Token {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::True
                | Token::False
                | Token::Error
                | Token::TypeError
                | Token::If
                | Token::Then
                | Token::Else
                | Token::Let
                | Token::LetRec
                | Token::In
                | Token::Rec
                | Token::And
                | Token::Or
                | Token::Not
        )
    }

    /// Get keyword from string
    pub fn from_keyword(s: &str) -> Option<Token> {
        match s {
            "true" => Some(Token::True),
            "false" => Some(Token::False),
            "error" => Some(Token::Error),
            "typeerror" => Some(Token::TypeError),
            "if" => Some(Token::If),
            "then" => Some(Token::Then),
            "else" => Some(Token::Else),
            "let" => Some(Token::Let),
            "letrec" => Some(Token::LetRec),
            "in" => Some(Token::In),
            "rec" => Some(Token::Rec),
            "and" => Some(Token::And),
            "or" => Some(Token::Or),
            "not" => Some(Token::Not),
            "lambda" => Some(Token::Lambda),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Natural(n) => return write!(f, "{n}"),
            Token::Identifier(name) => return f.write_str(name),
            Token::Lambda => "λ",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Assign => ":=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Multiply => "*",
            Token::Divide => "/",
            Token::Modulo => "%",
            Token::Equal => "=",
            Token::NotEqual => "!=",
            Token::LessThan => "<",
            Token::LessThanOrEqual => "<=",
            Token::GreaterThan => ">",
            Token::GreaterThanOrEqual => ">=",
            Token::Implies => "=>",
            Token::Equivalent => "<=>",
            Token::True => "true",
            Token::False => "false",
            Token::Error => "error",
            Token::TypeError => "typeerror",
            Token::If => "if",
            Token::Then => "then",
            Token::Else => "else",
            Token::Let => "let",
            Token::LetRec => "letrec",
            Token::In => "in",
            Token::Rec => "rec",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
        };
        f.write_str(text)
    }
}

/// Tokenize a term
pub fn tokenize(input: &str) -> ParseResult<Vec<Spanned<Token>>> {
    let span = Span::new(input);
    let (_, tokens) = tokenize_all(span).map_err(|e| match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => unrecognized(input, e),
        nom::Err::Incomplete(_) => ParseError::UnexpectedEndOfInput {
            position: input.len(),
        },
    })?;
    Ok(tokens)
}

/// Leftover input after the last token means no token rule matched there
fn unrecognized(input: &str, error: ParseError) -> ParseError {
    match error {
        ParseError::NomError { position, .. } => match input[position..].chars().next() {
            Some(character) => ParseError::UnrecognizedCharacter {
                character,
                position,
            },
            None => ParseError::UnexpectedEndOfInput { position },
        },
        other => other,
    }
}

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, map, recognize},
    multi::many0,
    sequence::{pair, preceded, terminated},
};
use unicode_xid::UnicodeXID;

fn tokenize_all(input: Span) -> IResult<Span, Vec<Spanned<Token>>, ParseError> {
    all_consuming(terminated(many0(preceded(multispace0, token)), multispace0)).parse(input)
}

fn token(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    alt((
        token_natural,
        token_lambda,
        token_identifier_or_keyword,
        token_multi_char_op,
        token_single_char,
    ))
    .parse(input)
}

fn token_natural(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    use super::span::helpers::*;

    let start = input;
    let (input, digits) = take_while1(|c: char| c.is_ascii_digit()).parse(input)?;
    let text = digits.fragment();
    let value = text.parse::<u64>().map_err(|_| {
        nom::Err::Failure(ParseError::InvalidLiteral {
            literal_type: "natural".to_string(),
            value: text.to_string(),
            position: position(&start),
        })
    })?;

    Ok((input, spanned(&start, &input, Token::Natural(value))))
}

fn token_lambda(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    use super::span::helpers::*;

    let start = input;
    let (input, _) = alt((char('λ'), char('\\'))).parse(input)?;
    Ok((input, spanned(&start, &input, Token::Lambda)))
}

fn is_identifier_start(c: char) -> bool {
    (c.is_xid_start() || c == '_') && c != 'λ'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_xid_continue() && c != 'λ'
}

fn token_identifier_or_keyword(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    use super::span::helpers::*;

    let start = input;
    let (input, ident) = recognize(pair(
        satisfy(is_identifier_start),
        take_while(is_identifier_continue),
    ))
    .parse(input)?;

    let ident_str = ident.fragment();
    let token =
        Token::from_keyword(ident_str).unwrap_or_else(|| Token::Identifier(ident_str.to_string()));

    Ok((input, spanned(&start, &input, token)))
}

fn token_multi_char_op(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    use super::span::helpers::*;

    let start = input;
    let (input, token) = alt((
        map(tag("<=>"), |_| Token::Equivalent),
        map(tag("<="), |_| Token::LessThanOrEqual),
        map(tag(">="), |_| Token::GreaterThanOrEqual),
        map(tag("!="), |_| Token::NotEqual),
        map(tag("=>"), |_| Token::Implies),
        map(tag(":="), |_| Token::Assign),
    ))
    .parse(input)?;

    Ok((input, spanned(&start, &input, token)))
}

fn token_single_char(input: Span) -> IResult<Span, Spanned<Token>, ParseError> {
    use super::span::helpers::*;

    let start = input;
    let (input, token) = alt((
        map(char('+'), |_| Token::Plus),
        map(char('-'), |_| Token::Minus),
        map(char('*'), |_| Token::Multiply),
        map(char('/'), |_| Token::Divide),
        map(char('%'), |_| Token::Modulo),
        map(char('='), |_| Token::Equal),
        map(char('<'), |_| Token::LessThan),
        map(char('>'), |_| Token::GreaterThan),
        map(char('('), |_| Token::LeftParen),
        map(char(')'), |_| Token::RightParen),
        map(char('.'), |_| Token::Dot),
        map(char(','), |_| Token::Comma),
    ))
    .parse(input)?;

    Ok((input, spanned(&start, &input, token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_lambda_spellings() {
        let expected = vec![
            Token::Lambda,
            Token::Identifier("x".to_string()),
            Token::Dot,
            Token::Identifier("x".to_string()),
        ];
        assert_eq!(values("λx.x"), expected);
        assert_eq!(values("\\x.x"), expected);
        assert_eq!(values("lambda x.x"), expected);
    }

    #[test]
    fn test_identifiers_and_keywords() {
        assert_eq!(
            values("letrec f1 in rec iffy"),
            vec![
                Token::LetRec,
                Token::Identifier("f1".to_string()),
                Token::In,
                Token::Rec,
                Token::Identifier("iffy".to_string()),
            ]
        );
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        assert_eq!(
            values("a <=> b <= c => d := e != f >= g"),
            vec![
                Token::Identifier("a".to_string()),
                Token::Equivalent,
                Token::Identifier("b".to_string()),
                Token::LessThanOrEqual,
                Token::Identifier("c".to_string()),
                Token::Implies,
                Token::Identifier("d".to_string()),
                Token::Assign,
                Token::Identifier("e".to_string()),
                Token::NotEqual,
                Token::Identifier("f".to_string()),
                Token::GreaterThanOrEqual,
                Token::Identifier("g".to_string()),
            ]
        );
    }

    #[test]
    fn test_tuple_projection() {
        assert_eq!(
            values("<1, 2>.2"),
            vec![
                Token::LessThan,
                Token::Natural(1),
                Token::Comma,
                Token::Natural(2),
                Token::GreaterThan,
                Token::Dot,
                Token::Natural(2),
            ]
        );
    }

    #[test]
    fn test_spans_and_surrounding_whitespace() {
        let tokens = tokenize("  λx . x  ").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!((tokens[0].start, tokens[0].end), (2, 4));
        assert_eq!((tokens[1].start, tokens[1].end), (4, 5));
        assert_eq!(tokens[3].start, 8);
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_character() {
        assert_eq!(
            tokenize("x ? y").unwrap_err(),
            ParseError::UnrecognizedCharacter {
                character: '?',
                position: 2
            }
        );
    }

    #[test]
    fn test_natural_overflow() {
        let err = tokenize("99999999999999999999999").unwrap_err();
        assert!(matches!(err, ParseError::InvalidLiteral { position: 0, .. }));
    }
}
