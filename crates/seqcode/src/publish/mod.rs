#[cfg(feature = "async-tokio")]
mod channel;
mod interface;

#[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
#[cfg(feature = "async-tokio")]
pub use channel::*;
pub use interface::*;
