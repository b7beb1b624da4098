//! Slices → limb mesh → socket, plus a background worker that keeps only the
//! newest result.

use crate::errors::GeometryResult;
use crate::indexed_mesh::IndexedMesh;
use crate::loft::{Slice, loft};
use crate::mesher::{LimbMesher, MarchingCubesMesher, VoxelMesher};
use crate::primitive::Primitive;
use crate::socket::{SocketConfig, SocketOutput, SocketShellBuilder};
use crate::state::{LimbMode, MeshCache, ModelState, PipelineSettings};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Loft the slices and mesh the skeleton with the configured mesher.
///
/// No active slice gives the empty sentinel.
pub fn generate_limb_mesh(slices: &[Slice], settings: &PipelineSettings) -> IndexedMesh {
    let skeleton = loft(slices, &settings.loft);
    let mesh = match settings.mode {
        LimbMode::Voxel => VoxelMesher::new().mesh(&skeleton, &settings.frame),
        LimbMode::Smooth => MarchingCubesMesher::new(settings.marching_cubes).mesh(&skeleton, &settings.frame),
    };
    info!(
        mode = ?settings.mode,
        skeleton = skeleton.len(),
        triangles = mesh.triangle_count(),
        "limb mesh generated"
    );
    mesh
}

/// Build the socket shell around `limb` with the default boolean engine.
pub fn generate_socket(
    limb: &IndexedMesh,
    primitives: &[Primitive],
    config: &SocketConfig,
) -> GeometryResult<SocketOutput> {
    SocketShellBuilder::new(*config).build(limb, primitives)
}

/// Limb mesh of `state`, reusing the cached one when its inputs are unchanged.
pub fn cached_limb_mesh<'a>(state: &ModelState, cache: &'a mut MeshCache) -> &'a IndexedMesh {
    cache.limb_or_insert_with(state.limb_fingerprint(), || {
        generate_limb_mesh(state.slices(), state.settings())
    })
}

/// Socket of `state`, reusing the cached one when its inputs are unchanged.
///
/// On failure the cache keeps the previous socket, see
/// [`MeshCache::last_socket`].
pub fn cached_socket<'a>(state: &ModelState, cache: &'a mut MeshCache) -> GeometryResult<&'a SocketOutput> {
    let limb = cached_limb_mesh(state, cache).clone();
    cache.socket_or_try_insert_with(state.socket_fingerprint(), || {
        generate_socket(&limb, state.primitives(), &state.settings().socket)
    })
}

/// What a regeneration request should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Limb,
    LimbAndSocket,
}

struct Job {
    ticket: u64,
    state: Arc<ModelState>,
    target: Target,
}

/// Result of one regeneration request.
#[derive(Debug, Clone)]
pub struct Regenerated {
    pub ticket: u64,
    pub revision: u64,
    pub limb: IndexedMesh,
    /// `None` when only the limb was requested.
    pub socket: Option<GeometryResult<SocketOutput>>,
}

/// Runs the pipelines on a worker thread.
///
/// Every request gets a ticket from a monotonically increasing counter. The
/// worker skips queued requests that have already been superseded, and
/// [`Regenerator::poll`] / [`Regenerator::wait`] drop any result whose
/// ticket is not the newest, so a slow stale result never replaces a newer
/// one.
pub struct Regenerator {
    jobs: Option<Sender<Job>>,
    results: Receiver<Regenerated>,
    latest: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl Default for Regenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Regenerator {
    pub fn new() -> Self {
        let (job_tx, job_rx) = channel::<Job>();
        let (result_tx, result_rx) = channel();
        let latest = Arc::new(AtomicU64::new(0));
        let worker_latest = Arc::clone(&latest);

        let worker = std::thread::spawn(move || {
            while let Ok(mut job) = job_rx.recv() {
                // only the newest queued request is worth computing
                while let Ok(newer) = job_rx.try_recv() {
                    job = newer;
                }
                if job.ticket < worker_latest.load(Ordering::Acquire) {
                    debug!(ticket = job.ticket, "skipping superseded regeneration");
                    continue;
                }
                let result = run_job(&job);
                if result_tx.send(result).is_err() {
                    break;
                }
            }
        });

        Regenerator {
            jobs: Some(job_tx),
            results: result_rx,
            latest,
            worker: Some(worker),
        }
    }

    /// Queue a regeneration of `state`; returns its ticket.
    pub fn request(&self, state: &ModelState, target: Target) -> u64 {
        let ticket = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        let job = Job {
            ticket,
            state: Arc::new(state.clone()),
            target,
        };
        match &self.jobs {
            Some(jobs) if jobs.send(job).is_ok() => {},
            _ => warn!(ticket, "regeneration worker is gone"),
        }
        ticket
    }

    /// Newest ticket handed out so far.
    pub fn latest_ticket(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    fn is_current(&self, result: &Regenerated) -> bool {
        let current = result.ticket == self.latest_ticket();
        if !current {
            debug!(
                ticket = result.ticket,
                latest = self.latest_ticket(),
                "dropping stale regeneration result"
            );
        }
        current
    }

    /// The result of the newest request if it has finished, without blocking.
    pub fn poll(&self) -> Option<Regenerated> {
        let mut found = None;
        while let Ok(result) = self.results.try_recv() {
            if self.is_current(&result) {
                found = Some(result);
            }
        }
        found
    }

    /// Block until the newest request finishes or `timeout` passes.
    pub fn wait(&self, timeout: Duration) -> Option<Regenerated> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(result) if self.is_current(&result) => return Some(result),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

impl Drop for Regenerator {
    fn drop(&mut self) {
        // closing the job channel ends the worker loop
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("regeneration worker panicked");
            }
        }
    }
}

fn run_job(job: &Job) -> Regenerated {
    let state = &job.state;
    let limb = generate_limb_mesh(state.slices(), state.settings());
    let socket = match job.target {
        Target::Limb => None,
        Target::LimbAndSocket => Some(generate_socket(&limb, state.primitives(), &state.settings().socket)),
    };
    Regenerated {
        ticket: job.ticket,
        revision: state.revision(),
        limb,
        socket,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::MarchingCubesConfig;
    use crate::sketch::GridCell;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            marching_cubes: MarchingCubesConfig::default().with_resolution(16),
            ..PipelineSettings::default()
        }
    }

    fn limb_state() -> ModelState {
        let square = [GridCell::new(9, 9), GridCell::new(9, 10), GridCell::new(10, 9), GridCell::new(10, 10)];
        ModelState::new(settings())
            .with_empty_slice(1, 0.75)
            .and_then(|s| s.with_empty_slice(2, 0.5))
            .and_then(|s| s.with_brush_stroke(1, &square, true))
            .and_then(|s| s.with_brush_stroke(2, &square, true))
            .expect("model")
    }

    #[test]
    fn no_slices_give_sentinel() {
        let mesh = generate_limb_mesh(&[], &settings());
        assert_eq!(mesh.vertex_count(), 1);
        assert!(mesh.is_empty());
    }

    #[test]
    fn voxel_mode_uses_cuboids() {
        let state = limb_state().with_limb_mode(LimbMode::Voxel);
        let mesh = generate_limb_mesh(state.slices(), state.settings());
        assert_eq!(mesh.triangle_count() % 12, 0);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn cache_reuses_unchanged_limb() {
        let state = limb_state();
        let mut cache = MeshCache::new();
        let first = cached_limb_mesh(&state, &mut cache).clone();
        let (with_prim, _) = state.with_new_primitive(crate::primitive::PrimitiveKind::Cube);
        let second = cached_limb_mesh(&with_prim, &mut cache).clone();
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn regenerator_returns_newest_result() {
        let regen = Regenerator::new();
        let empty = ModelState::new(settings());
        regen.request(&empty, Target::Limb);
        let ticket = regen.request(&limb_state(), Target::Limb);
        let result = regen.wait(Duration::from_secs(60)).expect("result");
        assert_eq!(result.ticket, ticket);
        assert!(!result.limb.is_empty());
        assert!(result.socket.is_none());
    }

    #[test]
    fn regenerator_builds_sockets() {
        let regen = Regenerator::new();
        let ticket = regen.request(&limb_state(), Target::LimbAndSocket);
        let result = regen.wait(Duration::from_secs(60)).expect("result");
        assert_eq!(result.ticket, ticket);
        let socket = result.socket.expect("requested").expect("socket");
        assert!(!socket.mesh.is_empty());
    }
}
