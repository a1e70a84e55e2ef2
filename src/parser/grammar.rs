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

//! Recursive-descent parser building terms directly into an [`ExprArena`]
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := binary(0)
//! binary  := unary (op binary)*            precedence climbing
//! unary   := '-' unary | 'not' unary | app
//! app     := head | postfix+ head?         juxtaposition, left-associative
//! head    := 'λ' ident+ '.' expr
//!          | 'let' pattern ':=' expr (',' pattern ':=' expr)* 'in' expr
//!          | 'letrec' ident ':=' expr (',' ident ':=' expr)* 'in' expr
//!          | 'if' expr 'then' expr 'else' expr
//!          | 'rec' expr
//! postfix := atom ('.' natural)*
//! atom    := ident | natural | 'true' | 'false' | 'error' | 'typeerror'
//!          | '(' expr ')' | '<' expr (',' expr)* '>'
//! ```
//!
//! Head forms extend as far to the right as possible. In argument position
//! `<` opens a tuple only when written flush against the next token, so
//! `f <a, b>` applies `f` to a tuple while `a < b` compares.

use super::error::{ParseError, ParseResult};
use super::span::Spanned;
use super::tokenizer::{Token, tokenize};
use crate::ast::{BinaryOperator, ErrorTerm, ExprArena, NodeId, Pattern, UnaryOperator};

/// Parser over the token stream of one input
pub struct Parser<'a> {
    arena: &'a mut ExprArena,
    tokens: Vec<Spanned<Token>>,
    current: usize,
    input_len: usize,
    /// Inside `<...>` a bare `>` closes the tuple instead of comparing
    in_tuple: bool,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a mut ExprArena, input: &str) -> ParseResult<Self> {
        Ok(Self {
            arena,
            tokens: tokenize(input)?,
            current: 0,
            input_len: input.len(),
            in_tuple: false,
        })
    }

    /// Parse the whole input as one term
    pub fn parse(mut self) -> ParseResult<NodeId> {
        let expr = self.parse_expression()?;
        match self.tokens.get(self.current) {
            Some(extra) => Err(ParseError::UnexpectedToken {
                token: extra.value.to_string(),
                position: extra.start,
            }),
            None => Ok(expr),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset).map(|t| &t.value)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current)?.value.clone();
        self.current += 1;
        Some(token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.current)
            .map_or(self.input_len, |t| t.start)
    }

    /// Error for whatever sits at the cursor
    fn unexpected(&self) -> ParseError {
        match self.tokens.get(self.current) {
            Some(token) => ParseError::UnexpectedToken {
                token: token.value.to_string(),
                position: token.start,
            },
            None => ParseError::UnexpectedEndOfInput {
                position: self.input_len,
            },
        }
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        match self.tokens.get(self.current) {
            Some(token) if token.value == expected => {
                self.current += 1;
                Ok(())
            }
            Some(token) => Err(ParseError::ExpectedToken {
                expected: format!("'{expected}'"),
                found: token.value.to_string(),
                position: token.start,
            }),
            None => Err(ParseError::UnexpectedEndOfInput {
                position: self.input_len,
            }),
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.current += 1;
                Ok(name)
            }
            Some(other) => Err(ParseError::ExpectedToken {
                expected: "identifier".to_string(),
                found: other.to_string(),
                position: self.position(),
            }),
            None => Err(ParseError::UnexpectedEndOfInput {
                position: self.input_len,
            }),
        }
    }

    /// Run `f` with the tuple flag set to `in_tuple`, restoring it afterwards
    fn nested<T>(
        &mut self,
        in_tuple: bool,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved = std::mem::replace(&mut self.in_tuple, in_tuple);
        let result = f(self);
        self.in_tuple = saved;
        result
    }

    pub fn parse_expression(&mut self) -> ParseResult<NodeId> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<NodeId> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.peek_binary_operator() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.current += 1;
            let next = if op.is_left_associative() {
                precedence + 1
            } else {
                precedence
            };
            let right = self.parse_binary(next)?;
            left = self.arena.binary_op(op, left, right);
        }

        Ok(left)
    }

    fn peek_binary_operator(&self) -> Option<BinaryOperator> {
        let op = match self.peek()? {
            Token::Plus => BinaryOperator::Add,
            Token::Minus => BinaryOperator::Subtract,
            Token::Multiply => BinaryOperator::Multiply,
            Token::Divide => BinaryOperator::Divide,
            Token::Modulo => BinaryOperator::Modulo,
            Token::Equal => BinaryOperator::Equal,
            Token::NotEqual => BinaryOperator::NotEqual,
            Token::LessThan => BinaryOperator::LessThan,
            Token::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
            Token::GreaterThan if !self.in_tuple => BinaryOperator::GreaterThan,
            Token::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
            Token::And => BinaryOperator::And,
            Token::Or => BinaryOperator::Or,
            Token::Implies => BinaryOperator::Implies,
            Token::Equivalent => BinaryOperator::Equivalent,
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary(&mut self) -> ParseResult<NodeId> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOperator::Minus,
            Some(Token::Not) => UnaryOperator::Not,
            _ => return self.parse_application(),
        };
        self.current += 1;
        let operand = self.parse_unary()?;
        Ok(self.arena.unary_op(op, operand))
    }

    fn parse_application(&mut self) -> ParseResult<NodeId> {
        if self.at_head_form() {
            return self.parse_head_form();
        }

        let mut expr = self.parse_postfix()?;
        loop {
            if self.at_argument() {
                let argument = self.parse_postfix()?;
                expr = self.arena.app(expr, argument);
            } else if self.at_head_form() {
                let argument = self.parse_head_form()?;
                expr = self.arena.app(expr, argument);
                break;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn at_head_form(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Lambda | Token::Let | Token::LetRec | Token::If | Token::Rec)
        )
    }

    fn at_argument(&self) -> bool {
        match self.peek() {
            Some(
                Token::Identifier(_)
                | Token::Natural(_)
                | Token::True
                | Token::False
                | Token::Error
                | Token::TypeError
                | Token::LeftParen,
            ) => true,
            Some(Token::LessThan) => self.tuple_ahead(),
            _ => false,
        }
    }

    /// Whether the `<` at the cursor opens a tuple: it must sit flush against
    /// the next token and have a matching `>` before the enclosing construct ends
    fn tuple_ahead(&self) -> bool {
        let (Some(open), Some(next)) = (
            self.tokens.get(self.current),
            self.tokens.get(self.current + 1),
        ) else {
            return false;
        };
        if next.start != open.end {
            return false;
        }

        let mut angles = 1usize;
        let mut parens = 0usize;
        for token in self.tokens.iter().skip(self.current + 1) {
            match token.value {
                Token::LeftParen => parens += 1,
                Token::RightParen if parens == 0 => return false,
                Token::RightParen => parens -= 1,
                Token::LessThan if parens == 0 => angles += 1,
                Token::GreaterThan if parens == 0 => {
                    angles -= 1;
                    if angles == 0 {
                        return true;
                    }
                }
                Token::Assign | Token::In | Token::Then | Token::Else if parens == 0 => {
                    return false;
                }
                _ => {}
            }
        }
        false
    }

    fn parse_head_form(&mut self) -> ParseResult<NodeId> {
        match self.peek() {
            Some(Token::Lambda) => self.parse_lambda(),
            Some(Token::Let) => self.parse_let(),
            Some(Token::LetRec) => self.parse_letrec(),
            Some(Token::If) => self.parse_conditional(),
            Some(Token::Rec) => {
                self.current += 1;
                let inner = self.parse_expression()?;
                Ok(self.arena.rec(inner))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// `λx y z.body` is `λx.λy.λz.body`
    fn parse_lambda(&mut self) -> ParseResult<NodeId> {
        self.expect(Token::Lambda)?;
        let mut binders = vec![self.expect_identifier()?];
        while let Some(Token::Identifier(_)) = self.peek() {
            binders.push(self.expect_identifier()?);
        }
        self.expect(Token::Dot)?;

        let mut body = self.parse_expression()?;
        for binder in binders.into_iter().rev() {
            body = self.arena.lam(binder, body);
        }
        Ok(body)
    }

    fn parse_let(&mut self) -> ParseResult<NodeId> {
        self.expect(Token::Let)?;
        let mut definitions = Vec::new();
        loop {
            let pattern = self.parse_pattern()?;
            self.expect(Token::Assign)?;
            let value = self.nested(false, Self::parse_expression)?;
            definitions.push((pattern, value));
            if self.peek() != Some(&Token::Comma) {
                break;
            }
            self.current += 1;
        }
        self.expect(Token::In)?;
        let body = self.parse_expression()?;
        Ok(self.arena.let_in(definitions, body))
    }

    fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        let position = self.position();
        match self.advance() {
            Some(Token::Identifier(name)) => Ok(Pattern::Var(name)),
            Some(Token::LessThan) => {
                let mut items = vec![self.parse_pattern()?];
                while self.peek() == Some(&Token::Comma) {
                    self.current += 1;
                    items.push(self.parse_pattern()?);
                }
                self.expect(Token::GreaterThan)?;
                Ok(Pattern::Tuple(items))
            }
            Some(other) => Err(ParseError::InvalidPattern {
                message: format!("expected a name or '<', found '{other}'"),
                position,
            }),
            None => Err(ParseError::UnexpectedEndOfInput { position }),
        }
    }

    fn parse_letrec(&mut self) -> ParseResult<NodeId> {
        self.expect(Token::LetRec)?;
        let mut definitions = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            self.expect(Token::Assign)?;
            let value = self.nested(false, Self::parse_expression)?;
            definitions.push((name, value));
            if self.peek() != Some(&Token::Comma) {
                break;
            }
            self.current += 1;
        }
        self.expect(Token::In)?;
        let body = self.parse_expression()?;
        Ok(self.arena.let_rec(definitions, body))
    }

    fn parse_conditional(&mut self) -> ParseResult<NodeId> {
        self.expect(Token::If)?;
        let condition = self.nested(false, Self::parse_expression)?;
        self.expect(Token::Then)?;
        let then_branch = self.nested(false, Self::parse_expression)?;
        self.expect(Token::Else)?;
        let else_branch = self.parse_expression()?;
        Ok(self.arena.conditional(condition, then_branch, else_branch))
    }

    fn parse_postfix(&mut self) -> ParseResult<NodeId> {
        let mut expr = self.parse_atom()?;
        while self.peek() == Some(&Token::Dot) {
            self.current += 1;
            let position = self.position();
            match self.advance() {
                Some(Token::Natural(index)) if index > 0 => {
                    let index = usize::try_from(index).map_err(|_| ParseError::InvalidLiteral {
                        literal_type: "tuple index".to_string(),
                        value: index.to_string(),
                        position,
                    })?;
                    expr = self.arena.tuple_index(expr, index);
                }
                Some(Token::Natural(index)) => {
                    return Err(ParseError::InvalidLiteral {
                        literal_type: "tuple index".to_string(),
                        value: index.to_string(),
                        position,
                    });
                }
                Some(other) => {
                    return Err(ParseError::ExpectedToken {
                        expected: "tuple index".to_string(),
                        found: other.to_string(),
                        position,
                    });
                }
                None => return Err(ParseError::UnexpectedEndOfInput { position }),
            }
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> ParseResult<NodeId> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected());
        };
        let node = match token {
            Token::Identifier(name) => self.arena.var(name),
            Token::Natural(value) => self.arena.natural(value),
            Token::True => self.arena.boolean(true),
            Token::False => self.arena.boolean(false),
            Token::Error => self.arena.error_term(ErrorTerm::Error),
            Token::TypeError => self.arena.error_term(ErrorTerm::TypeError),
            Token::LeftParen => {
                self.current += 1;
                let inner = self.nested(false, Self::parse_expression)?;
                self.expect(Token::RightParen)?;
                return Ok(inner);
            }
            Token::LessThan => return self.parse_tuple(),
            _ => return Err(self.unexpected()),
        };
        self.current += 1;
        Ok(node)
    }

    fn parse_tuple(&mut self) -> ParseResult<NodeId> {
        self.expect(Token::LessThan)?;
        let mut items = Vec::new();
        if self.peek() == Some(&Token::GreaterThan) {
            self.current += 1;
            return Ok(self.arena.tuple(items));
        }
        loop {
            items.push(self.nested(true, Self::parse_expression)?);
            match self.peek() {
                Some(Token::Comma) => self.current += 1,
                Some(Token::GreaterThan) => {
                    self.current += 1;
                    break;
                }
                Some(other) => {
                    return Err(ParseError::ExpectedToken {
                        expected: "',' or '>'".to_string(),
                        found: other.to_string(),
                        position: self.position(),
                    });
                }
                None => {
                    return Err(ParseError::UnexpectedEndOfInput {
                        position: self.input_len,
                    });
                }
            }
        }
        Ok(self.arena.tuple(items))
    }
}

/// Parse `input` into `arena`, returning the root of the new term
///
/// Nothing is left behind in the arena when parsing fails.
pub fn parse_expression(arena: &mut ExprArena, input: &str) -> ParseResult<NodeId> {
    let mark = arena.mark();
    let result = Parser::new(&mut *arena, input).and_then(Parser::parse);
    if let Err(err) = &result {
        log::debug!("parse of {input:?} failed: {err}");
        arena.discard_from(mark);
    }
    result
}

/// Parse `input` into a fresh arena
pub fn parse(input: &str) -> ParseResult<(ExprArena, NodeId)> {
    let mut arena = ExprArena::new();
    let root = parse_expression(&mut arena, input)?;
    Ok((arena, root))
}
