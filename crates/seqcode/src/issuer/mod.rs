mod advance;
mod basic;
mod interface;

pub use basic::*;
pub use interface::*;

pub(crate) use advance::{advance, wrap};
