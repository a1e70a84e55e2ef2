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

//! Source location tracking for the tokenizer

use nom_locate::LocatedSpan;
use std::fmt;

/// Located input of the tokenizer
pub type Span<'a> = LocatedSpan<&'a str>;

/// A value with the byte range it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    /// The value
    pub value: T,
    /// Start offset in the input
    pub start: usize,
    /// End offset in the input
    pub end: usize,
}

impl<T> Spanned<T> {
    pub fn new(value: T, start: usize, end: usize) -> Self {
        Self { value, start, end }
    }

    /// Length of the source range
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Helper functions for working with spans
pub mod helpers {
    use super::*;

    /// Byte offset of a span
    pub fn position(span: &Span<'_>) -> usize {
        span.location_offset()
    }

    /// Spanned value covering `start` up to `end`
    pub fn spanned<T>(start: &Span<'_>, end: &Span<'_>, value: T) -> Spanned<T> {
        Spanned::new(value, position(start), position(end))
    }
}
