#![doc = include_str!("../README.md")]

mod barcode;
mod cache;
mod calibrate;
mod clock;
mod cycle;
mod error;
mod generator;
mod issuer;
mod model;
mod publish;
mod resolver;
mod service;
mod store;
mod template;
#[cfg(test)]
mod test_support;

pub use crate::barcode::*;
pub use crate::cache::*;
pub use crate::calibrate::*;
pub use crate::clock::*;
pub use crate::cycle::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::issuer::*;
pub use crate::model::*;
pub use crate::publish::*;
pub use crate::resolver::*;
pub use crate::service::*;
pub use crate::store::*;
pub use crate::template::*;
