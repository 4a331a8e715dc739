#![warn(clippy::all)]

pub mod ast;
pub mod markup;
pub mod precedence;
pub mod symbol;
pub mod token;
pub mod visitor;
