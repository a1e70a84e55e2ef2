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

//! Fresh variable names

/// Split `name` into its stem and trailing decimal suffix (`x12` -> `("x", Some(12))`)
pub fn split_numeric_suffix(name: &str) -> (&str, Option<u64>) {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if stem.is_empty() || stem.len() == name.len() {
        return (name, None);
    }
    match name[stem.len()..].parse() {
        Ok(n) => (stem, Some(n)),
        Err(_) => (name, None),
    }
}

/// First name derived from `base` by bumping its numeric suffix for which `is_taken` is false:
/// `w` -> `w1`, `w2`, ...; `x1` -> `x2`, `x3`, ...
pub fn fresh_name(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let (stem, suffix) = split_numeric_suffix(base);
    let mut counter = suffix.map_or(1, |n| n.saturating_add(1));
    loop {
        let candidate = format!("{stem}{counter}");
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
