//! Immutable model snapshots and the mesh cache keyed by their content.
//!
//! Every edit returns a new [`ModelState`]; nothing is mutated in place, so a
//! snapshot can be handed to a worker thread while the caller keeps editing.

use crate::errors::{GeometryError, GeometryResult};
use crate::float_types::Real;
use crate::indexed_mesh::IndexedMesh;
use crate::loft::{LoftConfig, Slice};
use crate::mesher::{GridFrame, MarchingCubesConfig};
use crate::primitive::{Primitive, PrimitiveId, PrimitiveKind, PrimitivePatch};
use crate::sketch::{GridCell, OccupancyGrid, apply_convex_brush};
use crate::socket::{SocketConfig, SocketOutput};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Which mesher produces the limb surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LimbMode {
    /// One cuboid per skeleton point.
    Voxel,
    /// Marching cubes iso-surface.
    #[default]
    Smooth,
}

/// Every parameter the two pipelines read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineSettings {
    pub loft: LoftConfig,
    pub frame: GridFrame,
    pub marching_cubes: MarchingCubesConfig,
    pub socket: SocketConfig,
    pub mode: LimbMode,
}

impl PipelineSettings {
    pub fn validate(&self) -> GeometryResult<()> {
        self.loft.validate()?;
        self.frame.validate()?;
        self.marching_cubes.validate()?;
        self.socket.validate()?;
        if self.loft.grid_size != self.frame.grid_size {
            return Err(GeometryError::GridSizeMismatch {
                expected: self.loft.grid_size,
                found: self.frame.grid_size,
            });
        }
        Ok(())
    }
}

/// Content hash of pipeline inputs. Equal inputs give equal fingerprints
/// within one build of the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

fn hash_real<H: Hasher>(value: Real, state: &mut H) {
    value.to_bits().hash(state);
}

fn hash_vector<H: Hasher>(v: &nalgebra::Vector3<Real>, state: &mut H) {
    for c in v.iter() {
        hash_real(*c, state);
    }
}

/// Snapshot of everything the user has edited.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelState {
    revision: u64,
    /// Kept sorted by id.
    slices: Vec<Slice>,
    /// In creation order, which is also the order they apply to the socket.
    primitives: Vec<Primitive>,
    selected: Option<PrimitiveId>,
    next_primitive: u64,
    settings: PipelineSettings,
}

impl ModelState {
    pub fn new(settings: PipelineSettings) -> Self {
        ModelState {
            settings,
            ..Self::default()
        }
    }

    /// Incremented by every edit.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn slice(&self, id: u32) -> Option<&Slice> {
        self.slices.iter().find(|s| s.id == id)
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn primitive(&self, id: &PrimitiveId) -> Option<&Primitive> {
        self.primitives.iter().find(|p| &p.id == id)
    }

    pub const fn selected(&self) -> Option<&PrimitiveId> {
        self.selected.as_ref()
    }

    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn bumped(mut self) -> Self {
        self.revision += 1;
        self
    }

    fn slice_index(&self, id: u32) -> GeometryResult<usize> {
        self.slices
            .iter()
            .position(|s| s.id == id)
            .ok_or(GeometryError::UnknownSlice(id))
    }

    fn primitive_index(&self, id: &PrimitiveId) -> GeometryResult<usize> {
        self.primitives
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| GeometryError::UnknownPrimitive(id.to_string()))
    }

    fn check_grid(&self, grid: &OccupancyGrid) -> GeometryResult<()> {
        let expected = self.settings.loft.grid_size;
        if grid.size() != expected {
            return Err(GeometryError::GridSizeMismatch {
                expected,
                found: grid.size(),
            });
        }
        Ok(())
    }

    /// Add a slice. Its id must be new and its grid must match the loft grid size.
    pub fn with_slice(&self, slice: Slice) -> GeometryResult<Self> {
        if self.slice(slice.id).is_some() {
            return Err(GeometryError::DuplicateSlice(slice.id));
        }
        self.check_grid(&slice.grid)?;
        let mut next = self.clone();
        let at = next.slices.partition_point(|s| s.id < slice.id);
        next.slices.insert(at, slice);
        Ok(next.bumped())
    }

    /// Add an empty slice at `height`.
    pub fn with_empty_slice(&self, id: u32, height: Real) -> GeometryResult<Self> {
        self.with_slice(Slice::new(id, height, OccupancyGrid::new(self.settings.loft.grid_size)))
    }

    pub fn without_slice(&self, id: u32) -> GeometryResult<Self> {
        let at = self.slice_index(id)?;
        let mut next = self.clone();
        next.slices.remove(at);
        Ok(next.bumped())
    }

    /// Replace a slice's whole grid.
    pub fn with_slice_grid(&self, id: u32, grid: OccupancyGrid) -> GeometryResult<Self> {
        let at = self.slice_index(id)?;
        self.check_grid(&grid)?;
        let mut next = self.clone();
        next.slices[at].grid = grid;
        Ok(next.bumped())
    }

    /// Set a single cell of a slice.
    pub fn with_cell(&self, id: u32, row: usize, col: usize, value: bool) -> GeometryResult<Self> {
        let at = self.slice_index(id)?;
        let grid = self.slices[at].grid.with_cell(row, col, value)?;
        let mut next = self.clone();
        next.slices[at].grid = grid;
        Ok(next.bumped())
    }

    /// Paint (or erase) a convex brush stroke on a slice.
    pub fn with_brush_stroke(&self, id: u32, stroke: &[GridCell], value: bool) -> GeometryResult<Self> {
        let at = self.slice_index(id)?;
        let grid = apply_convex_brush(&self.slices[at].grid, stroke, value);
        let mut next = self.clone();
        next.slices[at].grid = grid;
        Ok(next.bumped())
    }

    pub fn with_slice_height(&self, id: u32, height: Real) -> GeometryResult<Self> {
        let at = self.slice_index(id)?;
        let mut next = self.clone();
        next.slices[at].height = height;
        Ok(next.bumped())
    }

    /// Add a unit primitive at the origin. The new primitive gets a fresh id
    /// and becomes the selection.
    pub fn with_new_primitive(&self, kind: PrimitiveKind) -> (Self, PrimitiveId) {
        let mut next = self.clone();
        let id = loop {
            next.next_primitive += 1;
            let candidate = PrimitiveId::new(format!("primitive-{}", next.next_primitive));
            if next.primitive(&candidate).is_none() {
                break candidate;
            }
        };
        next.primitives.push(Primitive::new(id.clone(), kind));
        next.selected = Some(id.clone());
        debug!(primitive = %id, %kind, "primitive added");
        (next.bumped(), id)
    }

    pub fn with_primitive_update(&self, id: &PrimitiveId, patch: &PrimitivePatch) -> GeometryResult<Self> {
        let at = self.primitive_index(id)?;
        let mut next = self.clone();
        next.primitives[at] = patch.apply(&self.primitives[at]);
        Ok(next.bumped())
    }

    /// Remove a primitive. Removing the selected one clears the selection;
    /// any other selection is kept.
    pub fn without_primitive(&self, id: &PrimitiveId) -> GeometryResult<Self> {
        let at = self.primitive_index(id)?;
        let mut next = self.clone();
        next.primitives.remove(at);
        if next.selected.as_ref() == Some(id) {
            next.selected = None;
        }
        Ok(next.bumped())
    }

    /// Select a primitive, or clear the selection with `None`.
    pub fn with_selection(&self, id: Option<&PrimitiveId>) -> GeometryResult<Self> {
        if let Some(id) = id {
            self.primitive_index(id)?;
        }
        let mut next = self.clone();
        next.selected = id.cloned();
        Ok(next.bumped())
    }

    pub fn with_limb_mode(&self, mode: LimbMode) -> Self {
        let mut next = self.clone();
        next.settings.mode = mode;
        next.bumped()
    }

    pub fn with_socket_config(&self, config: SocketConfig) -> GeometryResult<Self> {
        config.validate()?;
        let mut next = self.clone();
        next.settings.socket = config;
        Ok(next.bumped())
    }

    /// Replace all settings. Existing slices must still match the grid size.
    pub fn with_settings(&self, settings: PipelineSettings) -> GeometryResult<Self> {
        settings.validate()?;
        if let Some(bad) = self
            .slices
            .iter()
            .find(|s| s.grid.size() != settings.loft.grid_size)
        {
            return Err(GeometryError::GridSizeMismatch {
                expected: settings.loft.grid_size,
                found: bad.grid.size(),
            });
        }
        let mut next = self.clone();
        next.settings = settings;
        Ok(next.bumped())
    }

    fn hash_limb_inputs<H: Hasher>(&self, state: &mut H) {
        for slice in &self.slices {
            slice.id.hash(state);
            hash_real(slice.height, state);
            slice.grid.hash(state);
        }
        let s = &self.settings;
        s.loft.grid_size.hash(state);
        s.loft.interpolation_steps.hash(state);
        hash_real(s.loft.height_scale, state);
        s.frame.grid_size.hash(state);
        hash_real(s.frame.cell_size, state);
        s.mode.hash(state);
        if s.mode == LimbMode::Smooth {
            let mc = &s.marching_cubes;
            mc.resolution.hash(state);
            hash_real(mc.shell_thickness, state);
            hash_real(mc.inflation, state);
            mc.smooth_normals.hash(state);
            mc.padding.map(Real::to_bits).hash(state);
            mc.interpolate_edges.hash(state);
        }
    }

    /// Fingerprint of everything the limb mesh depends on. Labels, primitives
    /// and the selection are excluded.
    pub fn limb_fingerprint(&self) -> Fingerprint {
        let mut hasher = DefaultHasher::new();
        self.hash_limb_inputs(&mut hasher);
        Fingerprint(hasher.finish())
    }

    /// Fingerprint of everything the socket depends on: the limb inputs plus
    /// socket settings and the ordered primitives.
    pub fn socket_fingerprint(&self) -> Fingerprint {
        let mut hasher = DefaultHasher::new();
        self.hash_limb_inputs(&mut hasher);
        let socket = &self.settings.socket;
        hash_real(socket.thickness, &mut hasher);
        socket.use_convex_hull.hash(&mut hasher);
        hash_real(socket.top_cut_epsilon, &mut hasher);
        socket.primitive_segments.hash(&mut hasher);
        for p in &self.primitives {
            p.id.hash(&mut hasher);
            p.kind.hash(&mut hasher);
            hash_vector(&p.position, &mut hasher);
            hash_vector(&p.scale, &mut hasher);
            p.operation.hash(&mut hasher);
        }
        Fingerprint(hasher.finish())
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Last generated limb and socket, each tagged with the fingerprint it was
/// built from. A lookup with a different fingerprint misses.
#[derive(Debug, Clone, Default)]
pub struct MeshCache {
    limb: Option<(Fingerprint, IndexedMesh)>,
    socket: Option<(Fingerprint, SocketOutput)>,
    stats: CacheStats,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limb(&mut self, key: Fingerprint) -> Option<&IndexedMesh> {
        match &self.limb {
            Some((k, mesh)) if *k == key => {
                self.stats.hits += 1;
                Some(mesh)
            },
            _ => {
                self.stats.misses += 1;
                None
            },
        }
    }

    pub fn put_limb(&mut self, key: Fingerprint, mesh: IndexedMesh) {
        self.limb = Some((key, mesh));
    }

    pub fn socket(&mut self, key: Fingerprint) -> Option<&SocketOutput> {
        match &self.socket {
            Some((k, output)) if *k == key => {
                self.stats.hits += 1;
                Some(output)
            },
            _ => {
                self.stats.misses += 1;
                None
            },
        }
    }

    pub fn put_socket(&mut self, key: Fingerprint, output: SocketOutput) {
        self.socket = Some((key, output));
    }

    /// Cached limb for `key`, building and storing it on a miss.
    pub fn limb_or_insert_with<F>(&mut self, key: Fingerprint, build: F) -> &IndexedMesh
    where
        F: FnOnce() -> IndexedMesh,
    {
        let entry = match self.limb.take() {
            Some((k, mesh)) if k == key => {
                self.stats.hits += 1;
                (k, mesh)
            },
            _ => {
                self.stats.misses += 1;
                (key, build())
            },
        };
        &self.limb.insert(entry).1
    }

    /// Cached socket for `key`, building it on a miss. A failed build leaves
    /// the previous entry in place.
    pub fn socket_or_try_insert_with<F>(&mut self, key: Fingerprint, build: F) -> GeometryResult<&SocketOutput>
    where
        F: FnOnce() -> GeometryResult<SocketOutput>,
    {
        match self.socket.take() {
            Some((k, output)) if k == key => {
                self.stats.hits += 1;
                Ok(&self.socket.insert((k, output)).1)
            },
            previous => {
                self.stats.misses += 1;
                match build() {
                    Ok(output) => Ok(&self.socket.insert((key, output)).1),
                    Err(err) => {
                        self.socket = previous;
                        Err(err)
                    },
                }
            },
        }
    }

    /// The last socket stored, whatever its fingerprint; shown while a newer
    /// one fails to build.
    pub fn last_socket(&self) -> Option<&SocketOutput> {
        self.socket.as_ref().map(|(_, output)| output)
    }

    pub fn last_limb(&self) -> Option<&IndexedMesh> {
        self.limb.as_ref().map(|(_, mesh)| mesh)
    }

    pub fn invalidate(&mut self) {
        self.limb = None;
        self.socket = None;
    }

    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::BooleanOp;
    use nalgebra::Vector3;

    fn model() -> ModelState {
        ModelState::default()
            .with_empty_slice(1, 1.0)
            .and_then(|s| s.with_empty_slice(2, 0.5))
            .expect("slices")
    }

    #[test]
    fn edits_return_new_snapshots() {
        let before = model();
        let after = before.with_cell(1, 3, 4, true).expect("edit");
        assert!(!before.slice(1).map(|s| s.grid.get(3, 4)).unwrap_or(true));
        assert!(after.slice(1).map(|s| s.grid.get(3, 4)).unwrap_or(false));
        assert_eq!(after.revision(), before.revision() + 1);
    }

    #[test]
    fn slice_errors() {
        let state = model();
        assert_eq!(state.with_empty_slice(1, 0.2), Err(GeometryError::DuplicateSlice(1)));
        assert_eq!(state.without_slice(9), Err(GeometryError::UnknownSlice(9)));
        assert!(matches!(
            state.with_cell(1, 20, 0, true),
            Err(GeometryError::CellOutOfBounds { .. })
        ));
        assert!(matches!(
            state.with_slice_grid(1, OccupancyGrid::new(8)),
            Err(GeometryError::GridSizeMismatch { expected: 20, found: 8 })
        ));
    }

    #[test]
    fn slices_stay_sorted_by_id() {
        let state = model().with_empty_slice(0, 0.9).expect("slice");
        let ids: Vec<u32> = state.slices().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn adding_selects_and_ids_are_unique() {
        let (state, a) = model().with_new_primitive(PrimitiveKind::Sphere);
        let (state, b) = state.with_new_primitive(PrimitiveKind::Cube);
        assert_ne!(a, b);
        assert_eq!(state.selected(), Some(&b));
        assert_eq!(state.primitives().len(), 2);
    }

    #[test]
    fn deleting_selected_clears_selection() {
        let (state, a) = model().with_new_primitive(PrimitiveKind::Sphere);
        let state = state.without_primitive(&a).expect("delete");
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn deleting_other_keeps_selection() {
        let (state, a) = model().with_new_primitive(PrimitiveKind::Sphere);
        let (state, b) = state.with_new_primitive(PrimitiveKind::Cylinder);
        let state = state.without_primitive(&a).expect("delete");
        assert_eq!(state.selected(), Some(&b));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (state, a) = model().with_new_primitive(PrimitiveKind::Cube);
        let state = state.without_primitive(&a).expect("delete");
        let (_, b) = state.with_new_primitive(PrimitiveKind::Cube);
        assert_ne!(a, b);
    }

    #[test]
    fn update_unknown_primitive_fails() {
        let err = model()
            .with_primitive_update(&PrimitiveId::from("nope"), &PrimitivePatch::default())
            .expect_err("unknown");
        assert_eq!(err, GeometryError::UnknownPrimitive("nope".into()));
    }

    #[test]
    fn fingerprints_track_relevant_inputs() {
        let state = model();
        let painted = state.with_cell(2, 5, 5, true).expect("edit");
        assert_ne!(state.limb_fingerprint(), painted.limb_fingerprint());

        let (with_prim, id) = painted.with_new_primitive(PrimitiveKind::Cube);
        assert_eq!(with_prim.limb_fingerprint(), painted.limb_fingerprint());
        assert_ne!(with_prim.socket_fingerprint(), painted.socket_fingerprint());

        let moved = with_prim
            .with_primitive_update(
                &id,
                &PrimitivePatch::default()
                    .position(Vector3::new(1.0, 0.0, 0.0))
                    .operation(BooleanOp::Subtract),
            )
            .expect("update");
        assert_ne!(moved.socket_fingerprint(), with_prim.socket_fingerprint());

        // selection is not a geometry input
        let deselected = moved.with_selection(None).expect("select");
        assert_eq!(deselected.socket_fingerprint(), moved.socket_fingerprint());
    }

    #[test]
    fn cache_hits_only_on_matching_fingerprint() {
        let mut cache = MeshCache::new();
        let state = model();
        let key = state.limb_fingerprint();
        assert!(cache.limb(key).is_none());
        cache.put_limb(key, IndexedMesh::empty());
        assert!(cache.limb(key).is_some());

        let edited = state.with_cell(1, 0, 0, true).expect("edit");
        assert!(cache.limb(edited.limb_fingerprint()).is_none());
        assert!(cache.last_limb().is_some());
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 2 });
    }
}
