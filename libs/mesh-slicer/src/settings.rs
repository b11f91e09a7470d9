//! # Slice Settings
//!
//! Division, fill and side selection for one clip task.

use config::constants::{
    is_valid_precision, DEFAULT_FILL_CONVEX_ONLY, DEFAULT_FILL_SUBMESH, DEFAULT_PRECISION,
    MAX_PRECISION, MIN_PRECISION,
};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::geometry::Plane;

/// One of the two halves produced by a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The half the plane normal points toward.
    Outside,
    /// The opposite half.
    Inside,
}

impl Side {
    /// Both sides, outside first.
    pub const BOTH: [Side; 2] = [Side::Outside, Side::Inside];

    /// The other side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Outside => Side::Inside,
            Side::Inside => Side::Outside,
        }
    }
}

/// How triangles crossing the plane are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DivisionType {
    /// No subdivision; crossing triangles are dropped.
    Discrete,
    /// Crossing triangles are split with interpolated attributes.
    #[default]
    Linear,
}

/// Division mode and quantization grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Division {
    /// Division mode.
    pub kind: DivisionType,
    /// Grid size used to quantize plane coefficients and cut distances.
    pub precision: u32,
}

impl Default for Division {
    fn default() -> Self {
        Self {
            kind: DivisionType::Linear,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Division {
    /// Checks the precision range.
    pub fn validate(&self) -> MeshResult<()> {
        if !is_valid_precision(self.precision) {
            return Err(MeshError::invalid_settings(format!(
                "precision {} outside {MIN_PRECISION}..={MAX_PRECISION}",
                self.precision
            )));
        }
        Ok(())
    }
}

/// Cap generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fill {
    /// Whether a cap is generated.
    pub enabled: bool,
    /// Whether the cross-section is assumed convex.
    pub convex_only: bool,
    /// Submesh receiving the cap triangles.
    pub target_submesh: usize,
}

impl Default for Fill {
    fn default() -> Self {
        Self {
            enabled: true,
            convex_only: DEFAULT_FILL_CONVEX_ONLY,
            target_submesh: DEFAULT_FILL_SUBMESH,
        }
    }
}

impl Fill {
    /// Fill disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Parameters of one clip task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceRequest {
    /// Cutting plane in the surface's local space.
    pub plane: Plane,
    /// Division mode and grid.
    pub division: Division,
    /// Cap settings.
    pub fill: Fill,
    /// Half to produce.
    pub side: Side,
}

impl SliceRequest {
    /// Request with default division and fill.
    pub fn new(plane: Plane, side: Side) -> Self {
        Self {
            plane,
            division: Division::default(),
            fill: Fill::default(),
            side,
        }
    }

    /// Overrides the division.
    pub fn with_division(mut self, division: Division) -> Self {
        self.division = division;
        self
    }

    /// Overrides the fill.
    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    /// Same request for the other side.
    pub fn opposite(&self) -> Self {
        Self {
            side: self.side.opposite(),
            ..*self
        }
    }

    /// True when a cap task follows the clip.
    pub fn wants_cap(&self) -> bool {
        self.fill.enabled && self.division.kind == DivisionType::Linear
    }

    /// Checks the plane and division.
    pub fn validate(&self) -> MeshResult<()> {
        if !self.plane.is_valid() {
            return Err(MeshError::invalid_settings(format!(
                "plane {:?} is degenerate",
                self.plane
            )));
        }
        self.division.validate()
    }
}
