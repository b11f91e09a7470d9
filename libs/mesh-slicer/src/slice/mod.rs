//! # Plane Slice
//!
//! Clips a surface against a plane and keeps one side.
//!
//! ## Algorithm
//!
//! 1. Quantize the plane coefficients to the division grid
//! 2. Compute grid-snapped signed distances for every vertex
//! 3. Per triangle: keep whole, drop, or split through two new vertices
//! 4. Collect the vertices lying on the cut into a [`FillRing`]
//!
//! Quantization makes an outside task and an inside task, scheduled
//! independently, produce bit-identical seam vertices.

use config::constants::quantize;

use crate::error::{MeshError, MeshResult};
use crate::geometry::Plane;
use crate::settings::{DivisionType, Side, SliceRequest};
use crate::surface::{MeshSurface, Topology};

/// Sentinel for source vertices not yet copied to the destination.
const UNMAPPED: u32 = u32::MAX;

/// Destination vertices lying on the cut, in discovery order.
///
/// May contain duplicates; the cap stage deduplicates on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRing {
    /// Destination vertex indices.
    pub indices: Vec<u32>,
    /// Quantized plane the ring lies on.
    pub plane: Plane,
}

impl FillRing {
    /// True when nothing touched the plane.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Clips `source` against `request.plane` and writes `request.side` into
/// `destination`, replacing its contents.
///
/// One destination submesh is emitted per source submesh, in order. An empty
/// source, or one lying entirely on the plane, yields an empty side.
///
/// # Errors
///
/// - [`MeshError::LayoutMismatch`] when the layouts differ
/// - [`MeshError::InvalidTopology`] for non-triangle submeshes
/// - [`MeshError::IndexOutOfRange`] for malformed index buffers
/// - [`MeshError::InvalidSettings`] for a degenerate plane or precision
pub fn slice_surface(
    source: &MeshSurface,
    request: &SliceRequest,
    destination: &mut MeshSurface,
) -> MeshResult<FillRing> {
    request.validate()?;
    if destination.layout() != source.layout() {
        return Err(MeshError::layout_mismatch(format!(
            "source {:?} vs destination {:?}",
            source.layout().attributes(),
            destination.layout().attributes()
        )));
    }
    source.validate()?;
    destination.clear();

    let precision = request.division.precision;
    let plane = request.plane.quantized(precision);
    let distances: Vec<f32> = source
        .vertices()
        .positions()
        .map(|p| quantize(plane.signed_distance(p), precision))
        .collect();

    let mut clipper = Clipper {
        source,
        destination,
        remap: vec![UNMAPPED; source.vertex_count()],
        ring: Vec::new(),
        side: request.side,
        collect_ring: request.fill.enabled,
    };

    for index in 0..source.submeshes().len() {
        clipper.destination.begin_submesh(Topology::Triangles);
        for triangle in source.submesh_triangles(index) {
            let d = triangle.map(|i| distances[i as usize]);
            match request.division.kind {
                DivisionType::Linear => clipper.clip_linear(*triangle, d)?,
                DivisionType::Discrete => clipper.clip_discrete(*triangle, d)?,
            }
        }
    }

    log::trace!(
        "sliced {:?}: {} -> {} triangles, {} ring vertices",
        request.side,
        source.triangle_count(),
        clipper.destination.triangle_count(),
        clipper.ring.len()
    );

    Ok(FillRing {
        indices: clipper.ring,
        plane,
    })
}

/// How a triangle relates to the plane.
enum Placement {
    /// Every vertex on the plane.
    Coplanar,
    /// No vertex inside; kept by the outside half.
    Outside,
    /// No vertex outside; kept by the inside half.
    Inside,
    /// Crosses the plane; the isolated vertex is at this corner.
    Crossing(usize),
}

fn classify(d: [f32; 3]) -> Placement {
    if d.iter().all(|&x| x == 0.0) {
        return Placement::Coplanar;
    }
    let signs = d.map(|x| x >= 0.0);
    if signs.iter().all(|&s| s) {
        return Placement::Outside;
    }
    if d.iter().all(|&x| x <= 0.0) {
        return Placement::Inside;
    }
    let isolated = (0..3)
        .find(|&k| signs[(k + 1) % 3] == signs[(k + 2) % 3])
        .unwrap_or(0);
    Placement::Crossing(isolated)
}

struct Clipper<'a> {
    source: &'a MeshSurface,
    destination: &'a mut MeshSurface,
    remap: Vec<u32>,
    ring: Vec<u32>,
    side: Side,
    collect_ring: bool,
}

impl Clipper<'_> {
    /// Destination index of source vertex `index`, copying it on first use.
    fn map(&mut self, index: u32) -> MeshResult<u32> {
        let slot = &mut self.remap[index as usize];
        if *slot == UNMAPPED {
            *slot = self
                .destination
                .vertices_mut()
                .push_copy(self.source.vertices(), index as usize)?;
        }
        Ok(*slot)
    }

    fn keep(&mut self, triangle: [u32; 3], d: [f32; 3]) -> MeshResult<()> {
        let mapped = [self.map(triangle[0])?, self.map(triangle[1])?, self.map(triangle[2])?];
        self.destination.add_triangle(mapped);

        // An edge lying on the plane borders the cap.
        if self.collect_ring && d.iter().filter(|&&x| x == 0.0).count() == 2 {
            for k in 0..3 {
                if d[k] == 0.0 {
                    self.ring.push(mapped[k]);
                }
            }
        }
        Ok(())
    }

    fn clip_discrete(&mut self, triangle: [u32; 3], d: [f32; 3]) -> MeshResult<()> {
        match (classify(d), self.side) {
            (Placement::Outside, Side::Outside) | (Placement::Inside, Side::Inside) => {
                self.keep(triangle, d)
            }
            _ => Ok(()),
        }
    }

    fn clip_linear(&mut self, triangle: [u32; 3], d: [f32; 3]) -> MeshResult<()> {
        let k = match classify(d) {
            Placement::Crossing(k) => k,
            _ => return self.clip_discrete(triangle, d),
        };
        let (c, a, b) = (k, (k + 1) % 3, (k + 2) % 3);
        let t0 = d[a] / (d[a] - d[c]);
        let t1 = d[b] / (d[b] - d[c]);

        let (src, dst) = (self.source.vertices(), self.destination.vertices_mut());
        let n0 = dst.push_interpolated(src, triangle[a] as usize, triangle[c] as usize, t0)?;
        let n1 = dst.push_interpolated(src, triangle[b] as usize, triangle[c] as usize, t1)?;
        if self.collect_ring {
            self.ring.push(n1);
            self.ring.push(n0);
        }

        let isolated_outside = d[c] >= 0.0;
        let wants_isolated = match self.side {
            Side::Outside => isolated_outside,
            Side::Inside => !isolated_outside,
        };

        if wants_isolated {
            let vc = self.map(triangle[c])?;
            self.destination.add_triangle([vc, n0, n1]);
        } else {
            let va = self.map(triangle[a])?;
            let vb = self.map(triangle[b])?;
            self.destination.add_triangle([va, vb, n1]);
            self.destination.add_triangle([va, n1, n0]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
