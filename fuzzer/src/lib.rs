#![warn(clippy::all)]
#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod markup_fuzz;

pub use markup_fuzz::{FuzzNodeChoice, MarkupFuzzer};
