//! Domain error types.

mod load_error;
mod transport_error;

pub use load_error::{LoadError, LoadResult};
pub use transport_error::{TransportError, TransportErrorKind};
