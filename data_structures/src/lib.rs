#![warn(clippy::all)]

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod ordered_map;

pub use ordered_map::OrderedMap;

pub use fxhash::FxHashMap as HashMap;
pub use fxhash::FxHashSet as HashSet;
