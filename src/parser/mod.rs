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

//! Term parser
//!
//! A nom-based tokenizer feeds a recursive-descent parser that allocates
//! the term straight into an [`ExprArena`](crate::ast::ExprArena).
//! Every rendering produced by [`ExprArena::display`](crate::ast::ExprArena::display)
//! parses back to the same term.

pub mod error;
mod grammar;
pub mod span;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use grammar::{Parser, parse, parse_expression};
pub use span::{Span, Spanned};
pub use tokenizer::{Token, tokenize};
