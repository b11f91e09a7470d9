//! # Slice Scheduler
//!
//! Tracks one binary tree of cuts per object. Each node runs an outside and
//! an inside task chain per surface:
//!
//! ```text
//! prerequisite → clip → cap (linear fill only) → bounds + hooks
//! ```
//!
//! Cutting an object that still has a pending tree deepens every leaf of
//! that tree instead of starting a new one. Finished trees are materialized
//! depth-first, outside before inside, through the [`PieceFactory`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use glam::Mat4;
use mesh_slicer::{cap_surface, slice_surface, Plane, Side, SliceRequest};
use parking_lot::Mutex;

use crate::collaborators::{
    PieceFactory, SliceCallback, SliceEvent, SliceHook, SurfaceProvider,
};
use crate::error::{SliceError, SliceResult};
use crate::node::{Node, NodePool, SliceHandle};
use crate::settings::SchedulerConfig;
use crate::shared::SharedSurface;
use crate::task::{Executor, JobHandle};

/// Asynchronous, additive slicing of objects keyed by `K`.
pub struct SliceScheduler<K, P, F>
where
    K: Clone + Eq + Hash,
    P: SurfaceProvider<K>,
    F: PieceFactory<K>,
{
    config: SchedulerConfig,
    executor: Executor,
    provider: P,
    factory: F,
    hooks: Vec<Arc<dyn SliceHook>>,
    nodes: NodePool<Node<K>>,
    active: Vec<SliceHandle>,
    handles: HashMap<K, SliceHandle>,
    tick: u64,
}

impl<K, P, F> SliceScheduler<K, P, F>
where
    K: Clone + Eq + Hash,
    P: SurfaceProvider<K>,
    F: PieceFactory<K>,
{
    /// Creates a scheduler with its own worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidConfiguration`] for invalid settings and
    /// [`SliceError::ThreadPool`] when the pool cannot be built.
    pub fn new(config: SchedulerConfig, provider: P, factory: F) -> SliceResult<Self> {
        config.validate()?;
        let executor = Executor::new(config.worker_threads)?;
        Self::with_executor(config, executor, provider, factory)
    }

    /// Creates a scheduler on an existing executor.
    pub fn with_executor(
        config: SchedulerConfig,
        executor: Executor,
        provider: P,
        factory: F,
    ) -> SliceResult<Self> {
        config.validate()?;
        log::debug!(
            "slice scheduler on {} workers, max task age {}, max depth {}",
            executor.threads(),
            config.max_task_age,
            config.settings.additive.max_depth
        );
        Ok(Self {
            config,
            executor,
            provider,
            factory,
            hooks: Vec::new(),
            nodes: NodePool::new(),
            active: Vec::new(),
            handles: HashMap::new(),
            tick: 0,
        })
    }

    /// Adds a hook run on every destination surface.
    pub fn with_hook(mut self, hook: Arc<dyn SliceHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Executor running the tasks.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// The surface provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The piece factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Current tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of trees waiting to be materialized.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Live handle of the pending tree of `object`, if any.
    pub fn handle_of(&self, object: &K) -> Option<SliceHandle> {
        self.handles
            .get(object)
            .copied()
            .filter(|h| self.nodes.contains(*h))
    }

    /// True iff `handle` no longer refers to a pending cut.
    pub fn is_completed(&self, handle: SliceHandle) -> bool {
        !self.nodes.contains(handle)
    }

    // =========================================================================
    // SLICE
    // =========================================================================

    /// Cuts `object` with a world-space `plane`.
    ///
    /// Starts a new tree when `object` has no pending cut. Otherwise every
    /// leaf of the pending tree is split again and the existing handle is
    /// returned; at the depth limit the cut is ignored.
    ///
    /// # Errors
    ///
    /// [`SliceError::InvalidConfiguration`] for a degenerate plane, mismatched
    /// provider output, or surfaces failing validation. Provider errors are
    /// passed through. Nothing is scheduled on error.
    pub fn slice(
        &mut self,
        object: K,
        plane: Plane,
        callback: Option<SliceCallback<K>>,
    ) -> SliceResult<SliceHandle> {
        if !plane.is_valid() {
            return Err(SliceError::invalid_configuration(format!(
                "plane {plane:?} is degenerate"
            )));
        }

        if let Some(handle) = self.handle_of(&object) {
            self.deepen(handle, plane, callback)?;
            return Ok(handle);
        }

        let set = self.provider.surfaces(&object, &self.executor)?;
        if set.surfaces.len() != set.pending.len() {
            return Err(SliceError::invalid_configuration(format!(
                "{} surfaces but {} pending jobs",
                set.surfaces.len(),
                set.pending.len()
            )));
        }
        let local = local_plane(&plane, &set.world_to_local)?;
        check_sources(&set.surfaces, &set.pending)?;

        let callbacks = callback.into_iter().collect();
        let node = self.build_node(
            object.clone(),
            set.surfaces,
            &set.pending,
            plane,
            local,
            set.world_to_local,
            callbacks,
        );
        let handle = self.nodes.allocate(node);
        self.active.push(handle);
        self.handles.insert(object, handle);
        log::debug!("slice scheduled as {handle:?} at tick {}", self.tick);
        Ok(handle)
    }

    fn deepen(
        &mut self,
        handle: SliceHandle,
        plane: Plane,
        callback: Option<SliceCallback<K>>,
    ) -> SliceResult<()> {
        let depth = self.depth(handle);
        let max_depth = self.config.settings.additive.max_depth;
        if depth >= max_depth {
            log::debug!("{handle:?} already {depth} levels deep; cut ignored");
            return Ok(());
        }
        let world_to_local = self
            .nodes
            .get(handle)
            .map_or(Mat4::IDENTITY, |n| n.world_to_local);
        let local = local_plane(&plane, &world_to_local)?;
        self.deepen_node(handle, plane, local, &callback);
        log::debug!("{handle:?} deepened to {} levels", depth + 1);
        Ok(())
    }

    fn deepen_node(
        &mut self,
        handle: SliceHandle,
        plane: Plane,
        local: Plane,
        callback: &Option<SliceCallback<K>>,
    ) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        if !node.is_leaf() {
            let children: Vec<SliceHandle> = node.children().collect();
            for child in children {
                self.deepen_node(child, plane, local, callback);
            }
            return;
        }

        let object = node.object.clone();
        let world_to_local = node.world_to_local;
        let mut callbacks = node.callbacks.clone();
        callbacks.extend(callback.iter().cloned());
        let halves = [node.outside.clone(), node.inside.clone()];
        let dependency = vec![node.job.clone(); halves[0].len()];

        let [outside, inside] = halves.map(|sources| {
            let child = self.build_node(
                object.clone(),
                sources,
                &dependency,
                plane,
                local,
                world_to_local,
                callbacks.clone(),
            );
            self.nodes.allocate(child)
        });
        if let Some(node) = self.nodes.get_mut(handle) {
            node.child_outside = Some(outside);
            node.child_inside = Some(inside);
        }
    }

    /// Number of levels below and including `handle`.
    fn depth(&self, handle: SliceHandle) -> u32 {
        self.nodes.get(handle).map_or(0, |node| {
            1 + node.children().map(|c| self.depth(c)).max().unwrap_or(0)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_node(
        &self,
        object: K,
        sources: Vec<SharedSurface>,
        dependencies: &[JobHandle],
        plane: Plane,
        local: Plane,
        world_to_local: Mat4,
        callbacks: Vec<SliceCallback<K>>,
    ) -> Node<K> {
        let mut outside = Vec::with_capacity(sources.len());
        let mut inside = Vec::with_capacity(sources.len());
        let mut jobs = Vec::with_capacity(sources.len() * 2);
        for (source, dependency) in sources.iter().zip(dependencies) {
            for side in Side::BOTH {
                let request = self.config.settings.request(local, side);
                let destination = SharedSurface::empty(source.layout());
                jobs.push(self.schedule_chain(source, &destination, request, dependency));
                match side {
                    Side::Outside => outside.push(destination),
                    Side::Inside => inside.push(destination),
                }
            }
        }
        Node {
            object,
            sources,
            outside,
            inside,
            job: JobHandle::combine(&jobs),
            child_outside: None,
            child_inside: None,
            callbacks,
            plane,
            world_to_local,
            created: self.tick,
        }
    }

    fn schedule_chain(
        &self,
        source: &SharedSurface,
        destination: &SharedSurface,
        request: SliceRequest,
        dependency: &JobHandle,
    ) -> JobHandle {
        let ring = Arc::new(Mutex::new(None));

        let clip = {
            let (source, destination, ring) = (source.clone(), destination.clone(), Arc::clone(&ring));
            self.executor.schedule(dependency, move || {
                let source = source.read();
                let mut destination = destination.write();
                match slice_surface(&source, &request, &mut destination) {
                    Ok(fill) => *ring.lock() = Some(fill),
                    Err(e) => {
                        log::error!("clip {:?} failed: {e}", request.side);
                        destination.clear();
                    }
                }
            })
        };

        let capped = if request.wants_cap() {
            let (destination, ring) = (destination.clone(), Arc::clone(&ring));
            self.executor.schedule(&clip, move || {
                let Some(fill) = ring.lock().take() else {
                    return;
                };
                let mut destination = destination.write();
                if let Err(e) = cap_surface(&mut destination, &fill, &request) {
                    log::error!("cap {:?} failed: {e}", request.side);
                    destination.clear();
                }
            })
        } else {
            clip
        };

        let destination = destination.clone();
        let hooks = self.hooks.clone();
        self.executor.schedule(&capped, move || {
            let mut destination = destination.write();
            destination.recalculate_bounds();
            for hook in &hooks {
                hook.after_slice(&mut destination, request.side, &request.plane);
            }
            log::trace!(
                "{:?} chain done: {} triangles",
                request.side,
                destination.triangle_count()
            );
        })
    }

    // =========================================================================
    // COMPLETION
    // =========================================================================

    /// Waits for the whole tree of `handle` and materializes it.
    ///
    /// Invalid handles are ignored. A handle inside a tree that is not yet a
    /// root is waited for but left to its root.
    pub fn complete(&mut self, handle: SliceHandle) {
        if !self.nodes.contains(handle) {
            return;
        }
        self.wait_subtree(handle);
        let Some(position) = self.active.iter().position(|h| *h == handle) else {
            log::warn!("{handle:?} is not a tree root; materialized with its root");
            return;
        };
        self.active.swap_remove(position);
        self.materialize_root(handle);
    }

    /// Completes every pending tree.
    pub fn complete_all(&mut self) {
        while let Some(handle) = self.active.pop() {
            self.wait_subtree(handle);
            self.materialize_root(handle);
        }
    }

    /// Advances one tick and materializes finished trees.
    ///
    /// Trees unfinished after `max_task_age` ticks are waited for here.
    pub fn update(&mut self) {
        self.tick += 1;
        let heads = std::mem::take(&mut self.active);
        let mut waiting = Vec::with_capacity(heads.len());

        for handle in heads {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            let age = self.tick.saturating_sub(node.created);
            if age >= self.config.max_task_age && !self.subtree_completed(handle) {
                log::warn!("{handle:?} unfinished after {age} ticks; forcing completion");
                self.wait_subtree(handle);
            }
            if !self.nodes.get(handle).is_some_and(|n| n.job.is_completed()) {
                waiting.push(handle);
                continue;
            }
            if !self.config.settings.additive.partial_results && !self.subtree_completed(handle) {
                waiting.push(handle);
                continue;
            }
            self.materialize_root(handle);
        }

        // Children promoted during materialization were pushed meanwhile.
        waiting.append(&mut self.active);
        self.active = waiting;
    }

    fn subtree_jobs(&self, handle: SliceHandle, jobs: &mut Vec<JobHandle>) {
        if let Some(node) = self.nodes.get(handle) {
            jobs.push(node.job.clone());
            for child in node.children() {
                self.subtree_jobs(child, jobs);
            }
        }
    }

    fn wait_subtree(&self, handle: SliceHandle) {
        let mut jobs = Vec::new();
        self.subtree_jobs(handle, &mut jobs);
        for job in &jobs {
            job.wait();
        }
    }

    fn subtree_completed(&self, handle: SliceHandle) -> bool {
        let mut jobs = Vec::new();
        self.subtree_jobs(handle, &mut jobs);
        jobs.iter().all(JobHandle::is_completed)
    }

    fn materialize_root(&mut self, handle: SliceHandle) {
        let Some(object) = self.nodes.get(handle).map(|n| n.object.clone()) else {
            return;
        };
        if self.handles.get(&object) == Some(&handle) {
            self.handles.remove(&object);
        }
        let mut pieces = 0;
        self.materialize(handle, &object, &mut pieces);
        log::debug!("{handle:?} materialized into {pieces} pieces");
    }

    fn materialize(&mut self, handle: SliceHandle, source: &K, pieces: &mut usize) {
        let Some(node) = self.nodes.release(handle) else {
            return;
        };
        log::trace!(
            "materializing {handle:?}: {} surfaces per side",
            node.sources.len()
        );

        let sides = [
            (Side::Outside, node.child_outside, node.outside),
            (Side::Inside, node.child_inside, node.inside),
        ];
        for (side, child, surfaces) in sides {
            let Some(child) = child else {
                let buffers = surfaces.into_iter().map(SharedSurface::into_surface).collect();
                if let Some(piece) = self.factory.create_piece(source, buffers, *pieces) {
                    *pieces += 1;
                    let event = SliceEvent {
                        object: piece,
                        side,
                        plane: node.plane,
                    };
                    for callback in &node.callbacks {
                        callback(&event);
                    }
                }
                continue;
            };

            let child_finished = self
                .nodes
                .get(child)
                .map_or(true, |c| c.job.is_completed());
            if child_finished {
                self.materialize(child, source, pieces);
                continue;
            }

            // Publish the intermediate piece and hand it the pending child.
            let buffers = surfaces.into_iter().map(SharedSurface::into_surface).collect();
            let owner = match self.factory.create_piece(source, buffers, *pieces) {
                Some(piece) => {
                    *pieces += 1;
                    piece
                }
                None => source.clone(),
            };
            if let Some(node) = self.nodes.get_mut(child) {
                node.object = owner.clone();
            }
            self.handles.insert(owner, child);
            self.active.push(child);
        }
    }
}

impl<K, P, F> Drop for SliceScheduler<K, P, F>
where
    K: Clone + Eq + Hash,
    P: SurfaceProvider<K>,
    F: PieceFactory<K>,
{
    fn drop(&mut self) {
        for node in self.nodes.iter() {
            node.job.wait();
        }
    }
}

fn local_plane(plane: &Plane, world_to_local: &Mat4) -> SliceResult<Plane> {
    plane.transformed(world_to_local).ok_or_else(|| {
        SliceError::invalid_configuration(format!("plane {plane:?} collapses in local space"))
    })
}

/// Validates surfaces whose prerequisite has already finished.
fn check_sources(surfaces: &[SharedSurface], pending: &[JobHandle]) -> SliceResult<()> {
    for (i, (surface, job)) in surfaces.iter().zip(pending).enumerate() {
        if !job.is_completed() {
            continue;
        }
        let Some(guard) = surface.try_read() else {
            continue;
        };
        if guard.layout() != surface.layout() {
            return Err(SliceError::invalid_configuration(format!(
                "surface {i} layout {:?} differs from declared {:?}",
                guard.layout().attributes(),
                surface.layout().attributes()
            )));
        }
        guard
            .validate()
            .map_err(|e| SliceError::invalid_configuration(format!("surface {i}: {e}")))?;
    }
    Ok(())
}
