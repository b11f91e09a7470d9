//! # Collaborators
//!
//! Strategies the scheduler is built with: where surfaces come from, how
//! finished buffers become objects, and optional per-surface hooks.

use std::sync::Arc;

use glam::Mat4;
use mesh_slicer::{MeshSurface, Plane, Side};

use crate::error::SliceResult;
use crate::shared::SharedSurface;
use crate::task::{Executor, JobHandle};

/// Surfaces of one object, with the jobs still populating them.
#[derive(Debug, Clone)]
pub struct SurfaceSet {
    /// One entry per surface.
    pub surfaces: Vec<SharedSurface>,
    /// One prerequisite per surface; a cut reads its surface after this.
    pub pending: Vec<JobHandle>,
    /// Maps world-space planes into the surfaces' local space.
    pub world_to_local: Mat4,
}

impl SurfaceSet {
    /// Surfaces that are ready now, in world space.
    pub fn ready(surfaces: Vec<MeshSurface>) -> Self {
        let pending = vec![JobHandle::completed(); surfaces.len()];
        Self {
            surfaces: surfaces.into_iter().map(SharedSurface::new).collect(),
            pending,
            world_to_local: Mat4::IDENTITY,
        }
    }

    /// Overrides the world-to-local transform.
    pub fn with_world_to_local(mut self, world_to_local: Mat4) -> Self {
        self.world_to_local = world_to_local;
        self
    }
}

/// Supplies the current surfaces of an object.
///
/// Called once per new tree, never for additive cuts.
pub trait SurfaceProvider<K> {
    /// Surfaces of `object`; population may be scheduled on `executor`.
    fn surfaces(&mut self, object: &K, executor: &Executor) -> SliceResult<SurfaceSet>;
}

impl<K, F> SurfaceProvider<K> for F
where
    F: FnMut(&K, &Executor) -> SliceResult<SurfaceSet>,
{
    fn surfaces(&mut self, object: &K, executor: &Executor) -> SliceResult<SurfaceSet> {
        self(object, executor)
    }
}

/// Turns finished buffers into objects.
pub trait PieceFactory<K> {
    /// Creates a piece derived from `source`.
    ///
    /// `piece_index` 0 means the source is reused in place. Returning `None`
    /// discards the buffers and no callback fires.
    fn create_piece(&mut self, source: &K, surfaces: Vec<MeshSurface>, piece_index: usize)
        -> Option<K>;
}

impl<K, F> PieceFactory<K> for F
where
    F: FnMut(&K, Vec<MeshSurface>, usize) -> Option<K>,
{
    fn create_piece(&mut self, source: &K, surfaces: Vec<MeshSurface>, piece_index: usize) -> Option<K> {
        self(source, surfaces, piece_index)
    }
}

/// Post-processing run on every destination surface after its clip and cap.
///
/// Runs on a worker thread with exclusive access to the surface.
pub trait SliceHook: Send + Sync {
    /// Adjusts a freshly cut surface.
    fn after_slice(&self, surface: &mut MeshSurface, side: Side, plane: &Plane);
}

/// Payload of a slice callback.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceEvent<K> {
    /// The piece produced.
    pub object: K,
    /// Side of the cut the piece came from.
    pub side: Side,
    /// World-space plane of the cut.
    pub plane: Plane,
}

/// Callback fired once per terminal piece.
pub type SliceCallback<K> = Arc<dyn Fn(&SliceEvent<K>) + Send + Sync>;

/// Wraps a closure as a [`SliceCallback`].
pub fn callback<K, F>(f: F) -> SliceCallback<K>
where
    F: Fn(&SliceEvent<K>) + Send + Sync + 'static,
{
    Arc::new(f)
}
