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

//! Untyped lambda calculus engine
//!
//! Terms live in an [`ExprArena`] and are addressed by [`NodeId`]. The crate
//! offers capture-avoiding substitution, redex enumeration with single-step
//! beta reduction, two iterative reduction drivers and recursive normal-order
//! and eager evaluators for the calculus extended with constants, operators,
//! tuples and local definitions.
//!
//! ```
//! use lamedh::{EvalConfig, Evaluator, parse};
//!
//! let (mut arena, term) = parse("(λx.λy.x) a b").unwrap();
//! let evaluator = Evaluator::new(EvalConfig::default());
//! let normal = evaluator.goto_normal_form(&mut arena, term).unwrap();
//! assert_eq!(arena.display(normal).to_string(), "a");
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod reduction;

pub use ast::{ExprArena, ExpressionNode, NodeId};
pub use error::{LambdaError, Result};
pub use evaluator::{EvalConfig, Evaluator, Strategy};
pub use parser::{ParseError, parse, parse_expression};
pub use reduction::{RedexList, RedexOrder, SubstitutionMap};
