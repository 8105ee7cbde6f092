use geo::{BoundingRect, Coord, Geometry, Rect};
use rstar::{
    primitives::{GeomWithData, Rectangle},
    RTree, AABB,
};

/// A row's bounding rectangle, tagged with the row index.
type RowEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Geometries is a collection of per-row shapes indexed by an R-tree of their bounding boxes.
/// Rows with empty geometry have no bounding box and never appear in queries.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<Geometry<f64>>,
    rtree: RTree<RowEnvelope>,
    epsg: Option<u32>, // EPSG code, if known
}

impl Geometries {
    /// Construct a Geometries object from a vector of shapes.
    pub(crate) fn new(shapes: Vec<Geometry<f64>>, epsg: Option<u32>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect()
                        .map(|rect| RowEnvelope::new(Rectangle::from_corners(rect.min().into(), rect.max().into()), i)))
                    .collect()
            ),
            shapes,
            epsg,
        }
    }

    /// Get the number of shapes.
    #[inline] pub(crate) fn len(&self) -> usize { self.shapes.len() }

    /// Get a reference to the list of shapes.
    #[inline] pub(crate) fn shapes(&self) -> &[Geometry<f64>] { &self.shapes }

    /// Get the EPSG code, if one was detected for the source.
    #[inline] pub(crate) fn epsg(&self) -> Option<u32> { self.epsg }

    /// Rows whose bounding boxes intersect `rect`, in ascending row order.
    pub(crate) fn candidates(&self, rect: &Rect<f64>) -> Vec<usize> {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut rows = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|row| row.data)
            .collect::<Vec<_>>();
        rows.sort_unstable();
        rows
    }

    /// Compute the bounding rectangle of all shapes.
    pub(crate) fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|shape| shape.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }
}

#[cfg(test)]
mod tests {
    use geo::{point, polygon, Geometry};

    use super::*;

    fn square(x: f64, y: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x, y: y), (x: x + 1.0, y: y), (x: x + 1.0, y: y + 1.0), (x: x, y: y + 1.0), (x: x, y: y),
        ])
    }

    #[test]
    fn candidates_are_sorted_and_filtered() {
        let geoms = Geometries::new(vec![square(2.0, 0.0), square(0.0, 0.0), square(1.0, 0.0)], None);

        let probe = Rect::new(Coord { x: 0.5, y: 0.5 }, Coord { x: 1.5, y: 0.5 });
        assert_eq!(geoms.candidates(&probe), vec![1, 2]);

        let far = Rect::new(Coord { x: 10.0, y: 10.0 }, Coord { x: 11.0, y: 11.0 });
        assert!(geoms.candidates(&far).is_empty());
    }

    #[test]
    fn empty_geometry_is_not_indexed() {
        let geoms = Geometries::new(vec![
            Geometry::GeometryCollection(geo::GeometryCollection(vec![])),
            Geometry::Point(point!(x: 0.5, y: 0.5)),
        ], Some(4269));

        assert_eq!(geoms.len(), 2);
        assert_eq!(geoms.epsg(), Some(4269));
        let probe = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        assert_eq!(geoms.candidates(&probe), vec![1]);
    }

    #[test]
    fn bounds_cover_all_shapes() {
        let geoms = Geometries::new(vec![square(0.0, 0.0), square(3.0, 2.0)], None);
        let bounds = geoms.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 4.0, y: 3.0 });

        assert!(Geometries::new(vec![], None).bounds().is_none());
    }
}
