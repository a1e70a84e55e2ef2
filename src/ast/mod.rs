//! Term representation for the lambda engine
//!
//! Terms are trees of [`ExpressionNode`]s stored in an [`ExprArena`] and
//! addressed by [`NodeId`] handles. Parent links live in the arena, so the
//! node kinds themselves only describe their children.

mod arena;
mod display;
mod expression;
pub mod names;
mod operator;
mod variables;

pub use arena::*;
pub use display::*;
pub use expression::*;
pub use operator::*;
