//! # Configuration Constants
//!
//! Centralized constants for the mesh slicing pipeline. Quantization grids,
//! scheduling budgets, and piece limits are defined here.
//!
//! ## Categories
//!
//! - **Precision**: Quantization grid and floating-point tolerances
//! - **Fill**: Cap placement defaults
//! - **Scheduling**: Additive depth, task age, worker pool sizing
//! - **Pieces**: Limits applied when finished buffers become objects

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons.
///
/// Used for volume and area checks where exact grid equality is not
/// available.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f32, b: f32) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(0.5, 0.5 + 1e-7));
/// ```
pub const EPSILON: f32 = 1e-5;

/// Default quantization grid for plane coefficients and cut vertices.
///
/// A plane `(normal, distance)` is snapped to multiples of `1 / precision`
/// before any signed distance is evaluated, and every signed distance is
/// snapped again. Two tasks cutting the same geometry with the same nominal
/// plane therefore produce bit-identical seam vertices.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_PRECISION;
///
/// let snap = |v: f32| (v * DEFAULT_PRECISION as f32).round() / DEFAULT_PRECISION as f32;
/// assert_eq!(snap(0.50004), 0.5);
/// ```
pub const DEFAULT_PRECISION: u32 = 10_000;

/// Smallest accepted quantization grid.
pub const MIN_PRECISION: u32 = 1_000;

/// Largest accepted quantization grid.
///
/// Above this, `position * precision` starts losing integer exactness in
/// `f32` for meshes a few hundred units across.
pub const MAX_PRECISION: u32 = 20_000;

// =============================================================================
// FILL CONSTANTS
// =============================================================================

/// Default submesh index receiving cap triangles.
///
/// An index at or beyond the number of geometric submeshes appends a
/// dedicated fill submesh. Single-submesh inputs get their cap as submesh 1.
pub const DEFAULT_FILL_SUBMESH: usize = 1;

/// Default for restricting caps to convex cross-sections.
pub const DEFAULT_FILL_CONVEX_ONLY: bool = true;

// =============================================================================
// SCHEDULING CONSTANTS
// =============================================================================

/// Default number of additive levels a single tree may grow to.
///
/// The root cut counts as the first level.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Hard upper bound for the additive depth setting.
///
/// Each level doubles the number of leaves, so this caps a tree at
/// `2^MAX_DEPTH_LIMIT` pieces per surface.
pub const MAX_DEPTH_LIMIT: u32 = 16;

/// Whether an unfinished subtree may materialize its finished ancestors.
pub const DEFAULT_PARTIAL_RESULTS: bool = true;

/// Number of ticks a root may stay unfinished before it is force-completed.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_MAX_TASK_AGE;
///
/// let created = 10u64;
/// let now = 14u64;
/// assert!(now - created >= DEFAULT_MAX_TASK_AGE);
/// ```
pub const DEFAULT_MAX_TASK_AGE: u64 = 4;

/// Upper bound on worker threads used by the slice executor.
pub const MAX_WORKER_THREADS: usize = 16;

// =============================================================================
// PIECE CONSTANTS
// =============================================================================

/// Minimum bounding-box volume for a finished piece to be kept.
///
/// Pieces smaller than this are vetoed by the default piece factory.
pub const DEFAULT_MINIMUM_PIECE_VOLUME: f32 = 0.01;

/// Default subdivision level of generated icospheres and icocapsules.
pub const DEFAULT_SPHERE_SUBDIVISIONS: u32 = 2;

/// Maximum subdivision level of generated icospheres.
///
/// Triangle count grows as `20 * 4^n`.
pub const MAX_SPHERE_SUBDIVISIONS: u32 = 6;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Returns the number of worker threads for a new slice executor.
///
/// Uses the available parallelism of the host, clamped to
/// `1..=MAX_WORKER_THREADS`.
///
/// # Example
///
/// ```rust
/// use config::constants::{thread_pool_size, MAX_WORKER_THREADS};
///
/// let n = thread_pool_size();
/// assert!(n >= 1 && n <= MAX_WORKER_THREADS);
/// ```
pub fn thread_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_WORKER_THREADS)
}

/// Checks whether a precision value lies in the accepted range.
///
/// # Example
///
/// ```rust
/// use config::constants::is_valid_precision;
///
/// assert!(is_valid_precision(10_000));
/// assert!(!is_valid_precision(10));
/// ```
pub fn is_valid_precision(precision: u32) -> bool {
    (MIN_PRECISION..=MAX_PRECISION).contains(&precision)
}

/// Snaps a value to the `1 / precision` grid.
///
/// # Example
///
/// ```rust
/// use config::constants::quantize;
///
/// assert_eq!(quantize(0.123456, 1000), 0.123);
/// ```
pub fn quantize(value: f32, precision: u32) -> f32 {
    let p = precision as f32;
    (value * p).round() / p
}
