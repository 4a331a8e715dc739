#![warn(
    clippy::all,
    clippy::pedantic,
)]
#![allow(clippy::must_use_candidate)]

pub mod diagnostics;
pub use diagnostics::*;
pub use source::diagnostics::{Diagnostic, Label};

pub type ParseResult<T> = std::result::Result<T, Diagnostic>;
