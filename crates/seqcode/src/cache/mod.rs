mod interface;
mod keys;
#[cfg(feature = "memory")]
mod memory;

pub use interface::*;
pub use keys::*;
#[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
#[cfg(feature = "memory")]
pub use memory::*;
