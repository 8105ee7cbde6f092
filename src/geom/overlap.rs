use geo::{Area, Geometry, InteriorPoint, MultiPolygon, Point};

/// Areal form of a geometry, or `None` for points, lines and collections.
pub(crate) fn areal(shape: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match shape {
        Geometry::Polygon(polygon) => Some(MultiPolygon(vec![polygon.clone()])),
        Geometry::MultiPolygon(multi) => Some(multi.clone()),
        Geometry::Rect(rect) => Some(MultiPolygon(vec![rect.to_polygon()])),
        Geometry::Triangle(triangle) => Some(MultiPolygon(vec![triangle.to_polygon()])),
        _ => None,
    }
}

/// Areal form with strictly positive area.
pub(crate) fn areal_with_area(shape: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    areal(shape).filter(|multi| multi.unsigned_area() > 0.0)
}

/// Representative point: guaranteed interior point for areal shapes, the point itself for points.
/// Returns None for empty geometry.
pub(crate) fn representative_point(shape: &Geometry<f64>) -> Option<Point<f64>> {
    shape.interior_point()
}
