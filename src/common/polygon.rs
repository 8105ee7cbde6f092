use geo::{Coord, Geometry, GeometryCollection, LineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile::{PolygonRing, Shape};

/// Group shapefile rings into polygons: each outer ring owns the inner rings that follow it.
/// Inner rings that appear before any outer ring are kept as polygons of their own.
fn rings_to_multipolygon<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
    }

    let mut polys = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes = Vec::new();

    for ring in rings {
        let mut coords = ring.points().iter().map(&xy).collect::<Vec<_>>();
        ensure_closed(&mut coords);
        let ls = LineString(coords);

        match (ring, current_exterior.is_some()) {
            (PolygonRing::Outer(_), _) => {
                if let Some(ext) = current_exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
                current_exterior = Some(ls);
            }
            (PolygonRing::Inner(_), true) => current_holes.push(ls),
            (PolygonRing::Inner(_), false) => polys.push(Polygon::new(ls, vec![])),
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    MultiPolygon(polys)
}

fn points_to_multipoint<P>(points: &[P], xy: impl Fn(&P) -> Coord<f64>) -> MultiPoint<f64> {
    MultiPoint(points.iter().map(|p| Point(xy(p))).collect())
}

/// Convert a shapefile shape into a geo geometry, dropping any M or Z values.
/// Null shapes become an empty geometry collection.
pub(crate) fn shape_to_geometry(shape: Shape) -> anyhow::Result<Geometry<f64>> {
    Ok(match shape {
        Shape::NullShape => Geometry::GeometryCollection(GeometryCollection::default()),
        Shape::Point(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointM(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointZ(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::Multipoint(mp) => Geometry::MultiPoint(points_to_multipoint(mp.points(), |p| Coord { x: p.x, y: p.y })),
        Shape::MultipointM(mp) => Geometry::MultiPoint(points_to_multipoint(mp.points(), |p| Coord { x: p.x, y: p.y })),
        Shape::MultipointZ(mp) => Geometry::MultiPoint(points_to_multipoint(mp.points(), |p| Coord { x: p.x, y: p.y })),
        Shape::Polygon(poly) => Geometry::MultiPolygon(rings_to_multipolygon(poly.rings(), |p| Coord { x: p.x, y: p.y })),
        Shape::PolygonM(poly) => Geometry::MultiPolygon(rings_to_multipolygon(poly.rings(), |p| Coord { x: p.x, y: p.y })),
        Shape::PolygonZ(poly) => Geometry::MultiPolygon(rings_to_multipolygon(poly.rings(), |p| Coord { x: p.x, y: p.y })),
        other => anyhow::bail!("[common::polygon] Unsupported shape type: {:?}", other.shapetype()),
    })
}
