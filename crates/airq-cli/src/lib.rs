//! Library components of the `airq` loader: logging setup and batch stores.

pub mod logging;
pub mod store;
