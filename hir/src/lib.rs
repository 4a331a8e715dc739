#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod container;
pub mod internal;
pub mod nodes;
pub mod visit;

pub use crate::container::*;
pub use crate::internal::{InternalNode, InternalNodeKind};
pub use crate::nodes::*;
