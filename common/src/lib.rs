#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub mod unique_name;

pub use unique_name::FunctionNames;
