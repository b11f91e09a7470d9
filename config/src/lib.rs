//! # Config Crate
//!
//! Centralized configuration constants for the mesh slicing pipeline.
//! Quantization grids, scheduling budgets and piece limits are defined here
//! so that the slicer and the scheduler agree on the same defaults.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION};
//!
//! // Quantize a coordinate to the default slicing grid
//! let value: f32 = 0.123456;
//! let snapped = (value * DEFAULT_PRECISION as f32).round() / DEFAULT_PRECISION as f32;
//! assert!((snapped - 0.1235).abs() < 1e-6);
//! assert!((MIN_PRECISION..=MAX_PRECISION).contains(&DEFAULT_PRECISION));
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Deterministic**: Grid sizes are integers so every task snaps identically
//! - **Well-Documented**: Every constant has clear documentation

pub mod constants;
