use anyhow::Result;
use geo::{BooleanOps, BoundingRect, LineString, MultiPolygon, Relate};

use super::{areal, Geometries};

/// Planar length of a ring.
fn ring_length(ring: &LineString<f64>) -> f64 {
    ring.lines().map(|line| line.dx().hypot(line.dy())).sum()
}

/// Planar perimeter of a multipolygon, including hole boundaries.
fn perimeter(multi: &MultiPolygon<f64>) -> f64 {
    multi.iter()
        .map(|polygon| ring_length(polygon.exterior()) + polygon.interiors().iter().map(ring_length).sum::<f64>())
        .sum()
}

/// Length of shared boundary between two (mutually adjacent) multipolygons.
fn shared_perimeter(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    let perimeter = (perimeter(a) + perimeter(b) - perimeter(&a.union(b))) / 2.0;
    if perimeter > 1e-9 { perimeter } else { 0.0 }
}

impl Geometries {
    /// Rook contiguity (shared edge with positive length) with shared perimeter weights.
    /// Uses DE-9IM: require `touches` AND boundary/boundary has dimension 1.
    /// Non-areal rows have no neighbors. Neighbor lists are sorted ascending.
    pub(crate) fn rook_adjacencies(&self) -> Result<(Vec<Vec<u32>>, Vec<Vec<f64>>)> {
        let polygons = self.shapes().iter().map(areal).collect::<Vec<_>>();

        let mut adjacencies = vec![Vec::new(); self.len()];
        for (i, polygon) in polygons.iter().enumerate() {
            let Some(polygon) = polygon else { continue };
            let Some(rect) = polygon.bounding_rect() else { continue };

            for j in self.candidates(&rect) {
                if j <= i { continue } // check each unordered pair once
                let Some(other) = &polygons[j] else { continue };

                // In the 9-char DE-9IM string, index 4 is Boundary/Boundary.
                let im = polygon.relate(other);
                if im.is_touches() && im.matches("****1****")? {
                    adjacencies[i].push(j as u32);
                    adjacencies[j].push(i as u32);
                }
            }
        }

        let mut weights = Vec::with_capacity(adjacencies.len());
        for (i, neighbors) in adjacencies.iter_mut().enumerate() {
            neighbors.sort_unstable();
            weights.push(neighbors.iter()
                .map(|&j| match (&polygons[i], &polygons[j as usize]) {
                    (Some(a), Some(b)) => shared_perimeter(a, b),
                    _ => 0.0,
                })
                .collect());
        }

        Ok((adjacencies, weights))
    }
}
