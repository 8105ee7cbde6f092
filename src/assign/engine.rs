use geo::{Area, BooleanOps, BoundingRect, Geometry, Intersects, MultiPolygon};
use tracing::{info, warn};

use crate::{
    assign::Assignment,
    error::{Error, Result},
    geom::{areal, areal_with_area, representative_point, Geometries},
    layer::Layer,
};

/// Check that two layers can be compared: both non-empty, same CRS when known, overlapping extents.
fn check_compatible(source: &Layer, target: &Layer) -> Result<()> {
    for layer in [source, target] {
        if layer.is_empty() {
            return Err(Error::EmptyInput { layer: layer.name().to_string() });
        }
    }

    if let (Some(a), Some(b)) = (source.epsg(), target.epsg()) {
        if a != b {
            return Err(Error::GeometryMismatch(format!(
                "layer {:?} uses EPSG:{a} but layer {:?} uses EPSG:{b}", source.name(), target.name()
            )));
        }
    }

    match (source.bounds(), target.bounds()) {
        (Some(a), Some(b)) if a.intersects(&b) => Ok(()),
        (Some(_), Some(_)) => Err(Error::GeometryMismatch(format!(
            "extents of layers {:?} and {:?} do not overlap", source.name(), target.name()
        ))),
        _ => Err(Error::GeometryMismatch(format!(
            "layer {:?} or {:?} has no non-empty geometry", source.name(), target.name()
        ))),
    }
}

/// Pick the target for one source shape, or None if it falls outside every target.
fn assign_one(shape: &Geometry<f64>, targets: &Geometries, polygons: &[Option<MultiPolygon<f64>>]) -> Option<u32> {
    let rect = shape.bounding_rect()?;
    let candidates = targets.candidates(&rect);

    if let Some(multi) = areal_with_area(shape) {
        // Greatest overlap area wins; candidates are ascending so exact ties keep the lower row.
        let mut best: Option<(usize, f64)> = None;
        for j in candidates {
            let Some(polygon) = &polygons[j] else { continue };
            let overlap = polygon.intersection(&multi).unsigned_area();
            if overlap > best.map_or(0.0, |(_, area)| area) {
                best = Some((j, overlap));
            }
        }
        return best.map(|(j, _)| j as u32);
    }

    // Points, lines and degenerate shapes go by their representative point (boundary inclusive).
    let point = representative_point(shape)?;
    candidates.into_iter()
        .find(|&j| polygons[j].as_ref().is_some_and(|polygon| polygon.intersects(&point)))
        .map(|j| j as u32)
}

/// For each row in `source`, find the row in `target` that contains it (or overlaps it most).
///
/// Areal source rows go to the target with the greatest intersection area, with exact ties
/// resolved to the lower target row; rows that overlap no target stay unassigned. Point-like
/// source rows go to the first target (in row order) whose closed area contains them.
/// The result is deterministic for a fixed pair of inputs.
pub fn assign(source: &Layer, target: &Layer) -> Result<Assignment> {
    check_compatible(source, target)?;

    let polygons = target.shapes().iter().map(areal).collect::<Vec<_>>();
    let targets = target.geoms();

    let assignment = Assignment::new(source.shapes().iter()
        .map(|shape| assign_one(shape, targets, &polygons))
        .collect());

    let unassigned = assignment.num_unassigned();
    if unassigned > 0 {
        warn!(source = source.name(), target = target.name(), unassigned, "some source rows fall outside every target");
    }
    info!(
        source = source.name(),
        target = target.name(),
        rows = assignment.len(),
        unassigned,
        "computed assignment",
    );

    Ok(assignment)
}
