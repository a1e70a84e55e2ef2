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

//! Parser error types

use super::span::Span;
use nom::error::{ErrorKind, ParseError as NomParseError};
use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse error with location information
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unexpected token
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token that was found
        token: String,
        /// Position where the token was found
        position: usize,
    },

    /// Input ended while more was expected
    #[error("Unexpected end of input at position {position}")]
    UnexpectedEndOfInput {
        /// Position where more input was expected
        position: usize,
    },

    /// Expected token
    #[error("Expected {expected} at position {position}, found '{found}'")]
    ExpectedToken {
        /// The expected token description
        expected: String,
        /// What was there instead
        found: String,
        /// Position where the token was expected
        position: usize,
    },

    /// A character that starts no token
    #[error("Unrecognized character '{character}' at position {position}")]
    UnrecognizedCharacter {
        /// The offending character
        character: char,
        /// Position of the character
        position: usize,
    },

    /// Invalid literal value
    #[error("Invalid {literal_type} literal at position {position}: {value}")]
    InvalidLiteral {
        /// Type of literal that failed to parse
        literal_type: String,
        /// The invalid value that was encountered
        value: String,
        /// Position where the invalid literal was found
        position: usize,
    },

    /// A `let` pattern that is neither a name nor a tuple of patterns
    #[error("Invalid pattern at position {position}: {message}")]
    InvalidPattern {
        /// What was wrong
        message: String,
        /// Position of the pattern
        position: usize,
    },

    /// Generic nom error
    #[error("Parse error at position {position}: {kind:?}")]
    NomError {
        /// Position where the parse error occurred
        position: usize,
        /// The nom error kind
        kind: ErrorKind,
    },
}

impl ParseError {
    /// Byte offset the error refers to
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEndOfInput { position }
            | ParseError::ExpectedToken { position, .. }
            | ParseError::UnrecognizedCharacter { position, .. }
            | ParseError::InvalidLiteral { position, .. }
            | ParseError::InvalidPattern { position, .. }
            | ParseError::NomError { position, .. } => *position,
        }
    }
}

impl<'a> NomParseError<Span<'a>> for ParseError {
    fn from_error_kind(input: Span<'a>, kind: ErrorKind) -> Self {
        ParseError::NomError {
            position: input.location_offset(),
            kind,
        }
    }

    fn append(_input: Span<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}
