mod cache;
mod date;
mod parse;
mod render;
#[cfg(test)]
mod tests;

pub use cache::*;
pub use date::*;
pub use parse::*;
pub use render::*;
