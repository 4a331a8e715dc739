#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod chars;
pub mod diagnostics;
pub mod files;
pub mod pos;
pub mod reader;

pub use files::{FileId, Files};
pub use pos::Position;
pub use reader::{normalize_line_feed, SourceReader};
