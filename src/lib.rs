//! Residual-limb modelling and **prosthetic socket** generation.
//!
//! Height-tagged 2D occupancy slices are lofted into a voxel skeleton,
//! meshed either as blocky cuboids or as a smooth marching-cubes iso-surface,
//! and turned into an open, thickness-walled socket shell with BSP mesh
//! booleans against user-placed primitives.
//!
//! ```text
//! slices ──loft──▶ VoxelSkeleton ──LimbMesher──▶ limb IndexedMesh
//!                                                   │
//!                        primitives ──▶ SocketShellBuilder ──▶ socket IndexedMesh
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` export
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon to sample the marching-cubes field

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod indexed_mesh;
pub mod io;
pub mod loft;
pub mod mesh;
pub mod mesher;
pub mod pipeline;
pub mod primitive;
pub mod sketch;
pub mod socket;
pub mod state;
pub mod traits;
pub mod triangulated;

#[cfg(any(
    all(feature = "f64", feature = "f32"),
    not(any(feature = "f64", feature = "f32"))
))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use errors::{GeometryError, GeometryResult};
pub use indexed_mesh::IndexedMesh;
pub use loft::{LoftConfig, Slice, VoxelSkeleton, loft};
pub use mesher::{GridFrame, LimbMesher, MarchingCubesConfig, MarchingCubesMesher, VoxelMesher};
pub use pipeline::{Regenerator, generate_limb_mesh, generate_socket};
pub use primitive::{BooleanOp, Primitive, PrimitiveId, PrimitiveKind, build_primitive};
pub use sketch::{GridCell, OccupancyGrid};
pub use socket::{BooleanEngine, BspBooleanEngine, SocketConfig, SocketOutput, SocketShellBuilder};
pub use state::{LimbMode, ModelState, PipelineSettings};
pub use traits::CSG;
