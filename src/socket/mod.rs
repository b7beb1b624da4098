//! Prosthetic socket shells: hollowed hull of the limb, opened at the top,
//! then combined with user primitives.

pub mod builder;
pub mod config;
pub mod engine;

pub use builder::{SocketShellBuilder, offset_points};
pub use config::SocketConfig;
pub use engine::{BooleanEngine, BspBooleanEngine};

use crate::indexed_mesh::IndexedMesh;
use crate::primitive::{BooleanOp, PrimitiveId};

/// A non-fatal problem met while building a socket.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SocketWarning {
    /// A primitive's boolean failed; the shell was left as it was before it.
    #[error("primitive {id} ({operation}) skipped: {reason}")]
    PrimitiveSkipped {
        id: PrimitiveId,
        operation: BooleanOp,
        reason: String,
    },

    /// The opening cut failed; the shell is returned closed.
    #[error("top opening skipped: {reason}")]
    TopCutSkipped { reason: String },
}

/// A socket mesh plus the warnings collected while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketOutput {
    pub mesh: IndexedMesh,
    pub warnings: Vec<SocketWarning>,
}

impl SocketOutput {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
