#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub mod attributes;
pub mod names;
mod traverse;

pub use crate::traverse::{traverse, Context, TraverseConfig};
