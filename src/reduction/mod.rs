//! Beta reduction: capture-avoiding substitution, redex discovery and the
//! in-place reducer

mod redex;
mod substitute;

pub use redex::{RedexList, RedexOrder};
pub use substitute::SubstitutionMap;
