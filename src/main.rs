// main.rs
//
// Builds a small limb from four slices, derives a socket with a couple of
// primitives and writes every stage to stl/.

use limbshell::sketch::GridCell;
use limbshell::state::{LimbMode, ModelState, PipelineSettings};
use limbshell::primitive::{BooleanOp, PrimitiveKind, PrimitivePatch};
use limbshell::{GeometryResult, generate_limb_mesh, generate_socket};
use nalgebra::Vector3;
use std::fs;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn build_model() -> GeometryResult<ModelState> {
    // a 2x2 square in the middle of the 20x20 grid
    let square = [
        GridCell::new(9, 9),
        GridCell::new(9, 10),
        GridCell::new(10, 10),
        GridCell::new(10, 9),
    ];

    let state = ModelState::new(PipelineSettings::default())
        .with_empty_slice(1, 1.0)?
        .with_empty_slice(2, 0.75)?
        .with_empty_slice(3, 0.5)?
        .with_empty_slice(4, 0.25)?
        .with_brush_stroke(2, &square, true)?
        .with_brush_stroke(3, &square, true)?;

    let (state, vent) = state.with_new_primitive(PrimitiveKind::Cylinder);
    let state = state.with_primitive_update(
        &vent,
        &PrimitivePatch::default()
            .position(Vector3::new(0.0, 6.0, 0.0))
            .scale(Vector3::new(0.6, 4.0, 0.6))
            .operation(BooleanOp::Subtract),
    )?;

    let (state, strap) = state.with_new_primitive(PrimitiveKind::parse("sphere"));
    state.with_primitive_update(
        &strap,
        &PrimitivePatch::default()
            .position(Vector3::new(2.0, 6.5, 0.0))
            .operation(BooleanOp::Union),
    )
}

fn write(path: &str, bytes: impl AsRef<[u8]>) {
    if let Err(err) = fs::write(path, bytes) {
        warn!(path, error = %err, "could not write file");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Ensure the /stl folder exists
    let _ = fs::create_dir_all("stl");

    let state = match build_model() {
        Ok(state) => state,
        Err(err) => {
            error!(error = %err, "could not build the demo model");
            return;
        },
    };

    let voxel = generate_limb_mesh(state.slices(), state.with_limb_mode(LimbMode::Voxel).settings());
    write("stl/limb_voxel.stl", voxel.to_stl_ascii("limb_voxel"));

    let limb = generate_limb_mesh(state.slices(), state.settings());
    write("stl/limb_smooth.stl", limb.to_stl_ascii("limb_smooth"));

    match generate_socket(&limb, &[], &state.settings().socket) {
        Ok(plain) => write("stl/socket_plain.stl", plain.mesh.to_stl_ascii("socket_plain")),
        Err(err) => warn!(error = %err, "plain socket failed"),
    }

    match generate_socket(&limb, state.primitives(), &state.settings().socket) {
        Ok(output) => {
            for warning in &output.warnings {
                warn!(%warning, "socket warning");
            }
            match output.mesh.to_stl_binary("socket") {
                Ok(bytes) => write("stl/socket.stl", bytes),
                Err(err) => warn!(error = %err, "could not encode socket"),
            }
            info!(
                limb_triangles = limb.triangle_count(),
                socket_triangles = output.mesh.triangle_count(),
                "done"
            );
        },
        Err(err) => error!(error = %err, "socket generation failed"),
    }
}
