#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod expr;
pub mod formatter;
pub mod generator;
pub mod internal;
pub mod module;
pub mod template;

pub use formatter::{DebugFormatter, Formatter, ReleaseFormatter};
pub use generator::{generate, GeneratedCode, GeneratorConfig};
pub use module::{create_module_processor, Dependencies, ModuleGenerator};
