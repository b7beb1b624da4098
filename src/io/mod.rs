//! Mesh export.

#[cfg(feature = "stl-io")]
mod stl;

#[cfg(feature = "stl-io")]
pub use stl::{to_stl_ascii, to_stl_binary};
