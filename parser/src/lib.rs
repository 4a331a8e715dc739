#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub mod markup;
pub mod options;
mod parser;
pub mod patch;
pub mod text;
pub mod validate;
pub mod whitespace;

pub use crate::markup::parse;
pub use crate::options::{html_tag_descriptor, ParserOptions, TagDescriptor};
pub use crate::parser::*;
pub use crate::text::{has_mustache, parse_text, single_expression, TextChunk};
pub use crate::validate::{validate, Site};
