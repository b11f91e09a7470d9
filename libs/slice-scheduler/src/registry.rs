//! # Surface Registry
//!
//! In-memory store of pieces that acts as both [`SurfaceProvider`] and
//! [`PieceFactory`]. Source surfaces are copied on a worker before a cut
//! reads them, so the stored piece stays untouched until it is replaced.

use std::collections::HashMap;
use std::sync::Arc;

use config::constants::DEFAULT_MINIMUM_PIECE_VOLUME;
use glam::Mat4;
use mesh_slicer::MeshSurface;
use parking_lot::Mutex;

use crate::collaborators::{PieceFactory, SurfaceProvider, SurfaceSet};
use crate::error::{SliceError, SliceResult};
use crate::shared::SharedSurface;
use crate::task::{Executor, JobHandle};

/// Identity of a stored piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u64);

#[derive(Debug, Clone)]
struct Piece {
    surfaces: Arc<Vec<MeshSurface>>,
    world_to_local: Mat4,
}

#[derive(Debug, Default)]
struct Inner {
    pieces: HashMap<PieceId, Piece>,
    next_id: u64,
}

impl Inner {
    fn mint(&mut self) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Shared store of pieces. Clones refer to the same store.
#[derive(Debug, Clone)]
pub struct SurfaceRegistry {
    inner: Arc<Mutex<Inner>>,
    minimum_volume: f32,
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceRegistry {
    /// Empty registry with the default minimum piece volume.
    pub fn new() -> Self {
        Self::with_minimum_volume(DEFAULT_MINIMUM_PIECE_VOLUME)
    }

    /// Empty registry that vetoes pieces whose bounds are smaller than `volume`.
    pub fn with_minimum_volume(volume: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            minimum_volume: volume,
        }
    }

    /// Stores a world-space piece.
    pub fn insert(&self, surfaces: Vec<MeshSurface>) -> PieceId {
        self.insert_with_transform(surfaces, Mat4::IDENTITY)
    }

    /// Stores a piece whose surfaces live in the space of `world_to_local`.
    pub fn insert_with_transform(&self, surfaces: Vec<MeshSurface>, world_to_local: Mat4) -> PieceId {
        let mut inner = self.inner.lock();
        let id = inner.mint();
        inner.pieces.insert(
            id,
            Piece {
                surfaces: Arc::new(surfaces),
                world_to_local,
            },
        );
        id
    }

    /// Surfaces of a piece.
    pub fn get(&self, id: PieceId) -> Option<Vec<MeshSurface>> {
        let inner = self.inner.lock();
        inner.pieces.get(&id).map(|p| p.surfaces.as_ref().clone())
    }

    /// True if `id` is stored.
    pub fn contains(&self, id: PieceId) -> bool {
        self.inner.lock().pieces.contains_key(&id)
    }

    /// Removes a piece, returning its surfaces.
    pub fn remove(&self, id: PieceId) -> Option<Vec<MeshSurface>> {
        let piece = self.inner.lock().pieces.remove(&id)?;
        Some(Arc::try_unwrap(piece.surfaces).unwrap_or_else(|shared| shared.as_ref().clone()))
    }

    /// Number of stored pieces.
    pub fn len(&self) -> usize {
        self.inner.lock().pieces.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored ids in ascending order.
    pub fn ids(&self) -> Vec<PieceId> {
        let mut ids: Vec<PieceId> = self.inner.lock().pieces.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Enclosed volume of one piece.
    pub fn volume(&self, id: PieceId) -> Option<f32> {
        let inner = self.inner.lock();
        inner
            .pieces
            .get(&id)
            .map(|p| p.surfaces.iter().map(MeshSurface::volume).sum())
    }

    /// Enclosed volume of every piece.
    pub fn total_volume(&self) -> f32 {
        let inner = self.inner.lock();
        inner
            .pieces
            .values()
            .flat_map(|p| p.surfaces.iter())
            .map(MeshSurface::volume)
            .sum()
    }
}

impl SurfaceProvider<PieceId> for SurfaceRegistry {
    fn surfaces(&mut self, object: &PieceId, executor: &Executor) -> SliceResult<SurfaceSet> {
        let piece = self
            .inner
            .lock()
            .pieces
            .get(object)
            .cloned()
            .ok_or_else(|| SliceError::invalid_configuration(format!("unknown piece {object:?}")))?;

        let mut surfaces = Vec::with_capacity(piece.surfaces.len());
        let mut pending = Vec::with_capacity(piece.surfaces.len());
        for (i, surface) in piece.surfaces.iter().enumerate() {
            let shared = SharedSurface::empty(surface.layout());
            let (destination, stored) = (shared.clone(), Arc::clone(&piece.surfaces));
            pending.push(executor.schedule(&JobHandle::completed(), move || {
                if let Some(source) = stored.get(i) {
                    *destination.write() = source.clone();
                }
            }));
            surfaces.push(shared);
        }
        Ok(SurfaceSet {
            surfaces,
            pending,
            world_to_local: piece.world_to_local,
        })
    }
}

impl PieceFactory<PieceId> for SurfaceRegistry {
    fn create_piece(
        &mut self,
        source: &PieceId,
        surfaces: Vec<MeshSurface>,
        piece_index: usize,
    ) -> Option<PieceId> {
        let bounds = surfaces
            .iter()
            .filter(|s| !s.is_empty())
            .map(MeshSurface::bounds)
            .reduce(|a, b| a.union(&b))?;
        if bounds.volume() < self.minimum_volume {
            log::trace!("piece of {source:?} vetoed: bounds volume {}", bounds.volume());
            return None;
        }

        let mut inner = self.inner.lock();
        let world_to_local = inner
            .pieces
            .get(source)
            .map_or(Mat4::IDENTITY, |p| p.world_to_local);
        let id = if piece_index == 0 { *source } else { inner.mint() };
        inner.pieces.insert(
            id,
            Piece {
                surfaces: Arc::new(surfaces),
                world_to_local,
            },
        );
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_slicer::primitives::unit_cube;
    use mesh_slicer::surface::VertexLayout;

    fn cube() -> MeshSurface {
        unit_cube(VertexLayout::position_normal())
    }

    #[test]
    fn test_insert_and_query() {
        let registry = SurfaceRegistry::new();
        let a = registry.insert(vec![cube()]);
        let b = registry.insert(vec![cube(), cube()]);

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec![a, b]);
        assert_relative_eq!(registry.volume(b).unwrap(), 2.0, epsilon = 1e-4);
        assert_relative_eq!(registry.total_volume(), 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_remove() {
        let registry = SurfaceRegistry::new();
        let a = registry.insert(vec![cube()]);
        assert_eq!(registry.remove(a).map(|s| s.len()), Some(1));
        assert!(!registry.contains(a));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_provider_copies_surfaces() {
        let mut registry = SurfaceRegistry::new();
        let a = registry.insert(vec![cube()]);
        let executor = Executor::new(1).unwrap();

        let set = registry.surfaces(&a, &executor).unwrap();
        assert_eq!(set.surfaces.len(), 1);
        set.pending[0].wait();
        assert_eq!(set.surfaces[0].read().triangle_count(), 12);
    }

    #[test]
    fn test_provider_unknown_piece() {
        let mut registry = SurfaceRegistry::new();
        let executor = Executor::new(1).unwrap();
        assert!(matches!(
            registry.surfaces(&PieceId(42), &executor),
            Err(SliceError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_factory_reuses_source_for_index_zero() {
        let mut registry = SurfaceRegistry::new();
        let a = registry.insert(vec![cube()]);

        assert_eq!(registry.create_piece(&a, vec![cube()], 0), Some(a));
        let b = registry.create_piece(&a, vec![cube()], 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_factory_vetoes_empty_and_small() {
        let mut registry = SurfaceRegistry::with_minimum_volume(2.0);
        let a = registry.insert(vec![cube()]);

        let empty = MeshSurface::new(VertexLayout::position_normal());
        assert_eq!(registry.create_piece(&a, vec![empty], 1), None);
        assert_eq!(registry.create_piece(&a, vec![cube()], 1), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_factory_keeps_transform() {
        let mut registry = SurfaceRegistry::new();
        let transform = Mat4::from_translation(glam::Vec3::X);
        let a = registry.insert_with_transform(vec![cube()], transform);
        let b = registry.create_piece(&a, vec![cube()], 1).unwrap();

        let executor = Executor::new(1).unwrap();
        let set = registry.surfaces(&b, &executor).unwrap();
        assert_eq!(set.world_to_local, transform);
    }
}
