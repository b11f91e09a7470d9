//! # Slice Scheduler
//!
//! Asynchronous, additive slicing of objects built from [`MeshSurface`]s.
//!
//! ## Architecture
//!
//! ```text
//! slice(object, plane) ──► SurfaceProvider ──► node (outside, inside)
//!                                                 │
//!            clip → cap → bounds → hooks  (rayon) │
//!                                                 ▼
//! update() / complete() ──► PieceFactory ──► callbacks
//! ```
//!
//! Cutting an object again before its previous cut has materialized splits
//! every pending leaf instead, so a cube cut twice yields four pieces either
//! way.
//!
//! ## Usage
//!
//! ```rust
//! use glam::Vec3;
//! use mesh_slicer::primitives::unit_cube;
//! use mesh_slicer::surface::VertexLayout;
//! use mesh_slicer::Plane;
//! use slice_scheduler::{SchedulerConfig, SliceScheduler, SurfaceRegistry};
//!
//! let registry = SurfaceRegistry::new();
//! let cube = registry.insert(vec![unit_cube(VertexLayout::position_normal())]);
//!
//! let mut scheduler = SliceScheduler::new(
//!     SchedulerConfig::default(),
//!     registry.clone(),
//!     registry.clone(),
//! )
//! .unwrap();
//! let handle = scheduler.slice(cube, Plane::new(Vec3::X, 0.5), None).unwrap();
//! scheduler.complete(handle);
//!
//! assert!(scheduler.is_completed(handle));
//! assert_eq!(registry.len(), 2);
//! ```
//!
//! [`MeshSurface`]: mesh_slicer::MeshSurface

pub mod collaborators;
pub mod error;
pub mod node;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod shared;
pub mod task;

pub use collaborators::{
    callback, PieceFactory, SliceCallback, SliceEvent, SliceHook, SurfaceProvider, SurfaceSet,
};
pub use error::{SliceError, SliceResult};
pub use node::SliceHandle;
pub use registry::{PieceId, SurfaceRegistry};
pub use scheduler::SliceScheduler;
pub use settings::{AdditiveSettings, SchedulerConfig, SlicerSettings};
pub use shared::SharedSurface;
pub use task::{Executor, JobHandle};
