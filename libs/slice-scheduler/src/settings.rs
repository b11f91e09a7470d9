//! # Scheduler Settings
//!
//! Configuration records for slicing, additive trees and task aging.

use config::constants::{
    thread_pool_size, DEFAULT_MAX_DEPTH, DEFAULT_MAX_TASK_AGE, DEFAULT_PARTIAL_RESULTS,
    MAX_DEPTH_LIMIT, MAX_WORKER_THREADS,
};
use mesh_slicer::{Division, Fill, Plane, Side, SliceRequest};
use serde::{Deserialize, Serialize};

use crate::error::{SliceError, SliceResult};

/// Limits on additive slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditiveSettings {
    /// Maximum number of levels in one tree, the root cut included.
    pub max_depth: u32,
    /// Whether finished ancestors may materialize before their subtree.
    pub partial_results: bool,
}

impl Default for AdditiveSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            partial_results: DEFAULT_PARTIAL_RESULTS,
        }
    }
}

/// Settings applied to every cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlicerSettings {
    /// Division mode and grid.
    pub division: Division,
    /// Cap settings.
    pub fill: Fill,
    /// Additive limits.
    pub additive: AdditiveSettings,
}

impl SlicerSettings {
    /// Request for one side of a cut through `plane` (local space).
    pub fn request(&self, plane: Plane, side: Side) -> SliceRequest {
        SliceRequest {
            plane,
            division: self.division,
            fill: self.fill,
            side,
        }
    }

    /// Checks precision and depth.
    pub fn validate(&self) -> SliceResult<()> {
        self.division
            .validate()
            .map_err(|e| SliceError::invalid_configuration(e.to_string()))?;
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.additive.max_depth) {
            return Err(SliceError::invalid_configuration(format!(
                "max depth {} outside 1..={MAX_DEPTH_LIMIT}",
                self.additive.max_depth
            )));
        }
        Ok(())
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Settings applied to every cut.
    pub settings: SlicerSettings,
    /// Ticks a root may stay unfinished before it is force-completed.
    pub max_task_age: u64,
    /// Worker threads of the executor.
    pub worker_threads: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            settings: SlicerSettings::default(),
            max_task_age: DEFAULT_MAX_TASK_AGE,
            worker_threads: thread_pool_size(),
        }
    }
}

impl SchedulerConfig {
    /// Checks every field.
    pub fn validate(&self) -> SliceResult<()> {
        self.settings.validate()?;
        if !(1..=MAX_WORKER_THREADS).contains(&self.worker_threads) {
            return Err(SliceError::invalid_configuration(format!(
                "worker threads {} outside 1..={MAX_WORKER_THREADS}",
                self.worker_threads
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::constants::DEFAULT_PRECISION;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_task_age, DEFAULT_MAX_TASK_AGE);
        assert_eq!(config.settings.additive.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.settings.additive.partial_results);
        assert_eq!(config.settings.division.precision, DEFAULT_PRECISION);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_depth() {
        let mut config = SchedulerConfig::default();
        config.settings.additive.max_depth = 0;
        assert!(matches!(
            config.validate(),
            Err(SliceError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_precision() {
        let mut config = SchedulerConfig::default();
        config.settings.division.precision = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = SchedulerConfig {
            worker_threads: 0,
            ..SchedulerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_carries_settings() {
        let settings = SlicerSettings::default();
        let plane = Plane::new(glam::Vec3::Y, 1.0);
        let request = settings.request(plane, Side::Inside);
        assert_eq!(request.side, Side::Inside);
        assert_eq!(request.fill, settings.fill);
        assert_eq!(request.plane, plane);
    }
}
