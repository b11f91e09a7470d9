//! # Node Pool
//!
//! Slice tree nodes live in an index-addressed pool. A [`SliceHandle`] names
//! a slot together with the generation it was issued for; releasing a slot
//! bumps its generation, so every earlier handle turns permanently invalid.

use glam::Mat4;
use mesh_slicer::Plane;

use crate::collaborators::SliceCallback;
use crate::shared::SharedSurface;
use crate::task::JobHandle;

// =============================================================================
// HANDLE
// =============================================================================

/// Identity of one scheduled cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SliceHandle {
    index: u32,
    generation: u32,
}

impl SliceHandle {
    /// A handle that never refers to a live node.
    pub const NULL: SliceHandle = SliceHandle {
        index: 0,
        generation: 0,
    };

    /// Slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// True for [`SliceHandle::NULL`].
    pub fn is_null(&self) -> bool {
        self.generation == 0
    }
}

// =============================================================================
// POOL
// =============================================================================

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generation-checked slot pool with a free list.
pub struct NodePool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for NodePool<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> NodePool<T> {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, reusing a released slot when one exists.
    pub fn allocate(&mut self, value: T) -> SliceHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return SliceHandle {
                index,
                generation: slot.generation,
            };
        }
        // Generations start at 1 so NULL is never live.
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        SliceHandle {
            index: (self.slots.len() - 1) as u32,
            generation: 1,
        }
    }

    /// Takes the value out and retires the handle.
    pub fn release(&mut self, handle: SliceHandle) -> Option<T> {
        let slot = self.slot_mut(handle)?;
        let value = slot.value.take();
        slot.generation = slot.generation.checked_add(1).unwrap_or(1);
        self.free.push(handle.index);
        value
    }

    fn slot_mut(&mut self, handle: SliceHandle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.value.is_some())
    }

    /// Value behind a live handle.
    pub fn get(&self, handle: SliceHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    /// Mutable value behind a live handle.
    pub fn get_mut(&mut self, handle: SliceHandle) -> Option<&mut T> {
        self.slot_mut(handle).and_then(|s| s.value.as_mut())
    }

    /// True when `handle` refers to a live value.
    pub fn contains(&self, handle: SliceHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live values.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Iterates live values.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }
}

// =============================================================================
// NODE
// =============================================================================

/// One scheduled cut of a tree.
pub(crate) struct Node<K> {
    /// Object the tree belongs to; meaningful on roots.
    pub object: K,
    /// Surfaces being cut.
    pub sources: Vec<SharedSurface>,
    /// Outside results, one per source.
    pub outside: Vec<SharedSurface>,
    /// Inside results, one per source.
    pub inside: Vec<SharedSurface>,
    /// Join of every task chain of this node.
    pub job: JobHandle,
    /// Further cut of the outside results.
    pub child_outside: Option<SliceHandle>,
    /// Further cut of the inside results.
    pub child_inside: Option<SliceHandle>,
    /// Callbacks accumulated from the root down to this node.
    pub callbacks: Vec<SliceCallback<K>>,
    /// World-space plane.
    pub plane: Plane,
    /// Transform used to bring planes into the surfaces' space.
    pub world_to_local: Mat4,
    /// Tick the node was scheduled at.
    pub created: u64,
}

impl<K> Node<K> {
    pub fn children(&self) -> impl Iterator<Item = SliceHandle> {
        self.child_outside.into_iter().chain(self.child_inside)
    }

    pub fn is_leaf(&self) -> bool {
        self.child_outside.is_none() && self.child_inside.is_none()
    }
}
