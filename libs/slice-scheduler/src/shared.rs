//! # Shared Surfaces
//!
//! A surface shared between the scheduler and the task writing it.

use std::sync::Arc;

use mesh_slicer::surface::VertexLayout;
use mesh_slicer::MeshSurface;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A [`MeshSurface`] behind a lock, with its layout readable without locking.
///
/// Exactly one task writes a destination surface; the sources it reads are
/// finished before the task starts.
#[derive(Debug, Clone)]
pub struct SharedSurface {
    layout: VertexLayout,
    inner: Arc<RwLock<MeshSurface>>,
}

impl SharedSurface {
    /// Wraps a surface.
    pub fn new(surface: MeshSurface) -> Self {
        Self {
            layout: surface.layout(),
            inner: Arc::new(RwLock::new(surface)),
        }
    }

    /// An empty surface for `layout`.
    pub fn empty(layout: VertexLayout) -> Self {
        Self::new(MeshSurface::new(layout))
    }

    /// Layout the surface was created with.
    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    /// Shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, MeshSurface> {
        self.inner.read()
    }

    /// Read access if no writer holds the lock.
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, MeshSurface>> {
        self.inner.try_read()
    }

    /// Exclusive write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, MeshSurface> {
        self.inner.write()
    }

    /// Takes the surface out, cloning only if another owner remains.
    pub fn into_surface(self) -> MeshSurface {
        match Arc::try_unwrap(self.inner) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.read().clone(),
        }
    }
}
