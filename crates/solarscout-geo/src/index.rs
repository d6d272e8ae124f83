use geo::{BoundingRect, Distance, Euclidean, Geometry, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// Indexed geometry with ID
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGeometry {
    /// Caller-assigned identifier, usually a position in the owning dataset
    pub id: usize,

    /// The geometry itself
    pub geometry: Geometry<f64>,

    /// Bounding box for spatial indexing
    envelope: AABB<[f64; 2]>,
}

impl IndexedGeometry {
    /// Create a new indexed geometry, or `None` for an empty geometry
    pub fn new(id: usize, geometry: Geometry<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        Some(Self { id, geometry, envelope })
    }
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Result of a nearest-feature query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub id: usize,
    pub distance: f64,
}

/// R-tree over planar geometries.
///
/// Bounding-box queries narrow overlay candidates; nearest queries refine
/// envelope candidates with exact geometry-to-geometry distance.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedGeometry>,
    bounds: Option<Rect<f64>>,
}

impl SpatialIndex {
    /// Create a new empty spatial index
    pub fn new() -> Self {
        Self { tree: RTree::new(), bounds: None }
    }

    /// Create a spatial index from a collection of geometries.
    ///
    /// Empty geometries have no envelope and are left out.
    pub fn from_geometries(geometries: Vec<(usize, Geometry<f64>)>) -> Self {
        let indexed: Vec<IndexedGeometry> = geometries
            .into_iter()
            .filter_map(|(id, geometry)| {
                let entry = IndexedGeometry::new(id, geometry);
                if entry.is_none() {
                    tracing::debug!(id, "Skipping empty geometry in spatial index");
                }
                entry
            })
            .collect();

        let bounds = indexed.iter().map(|entry| envelope_rect(&entry.envelope)).reduce(merge_rects);

        Self { tree: RTree::bulk_load(indexed), bounds }
    }

    /// Query geometries whose envelope intersects a bounding box
    pub fn query_bbox(&self, min: [f64; 2], max: [f64; 2]) -> Vec<&IndexedGeometry> {
        let bbox = AABB::from_corners(min, max);
        self.tree.locate_in_envelope_intersecting(&bbox).collect()
    }

    /// Query geometries whose envelope intersects `rect` grown by `margin` on every side
    pub fn query_rect(&self, rect: &Rect<f64>, margin: f64) -> Vec<&IndexedGeometry> {
        self.query_bbox(
            [rect.min().x - margin, rect.min().y - margin],
            [rect.max().x + margin, rect.max().y + margin],
        )
    }

    /// Find the indexed geometry closest to `geometry` and its exact planar distance.
    ///
    /// With `max_distance`, geometries farther away are ignored and `None` is
    /// returned when nothing lies within reach. Ties go to the lower id.
    pub fn nearest(&self, geometry: &Geometry<f64>, max_distance: Option<f64>) -> Option<Nearest> {
        let rect = geometry.bounding_rect()?;
        let bounds = self.bounds?;

        // A window grown by `reach` covers every indexed envelope
        let span = merge_rects(rect, bounds);
        let reach = span.width().hypot(span.height());
        let limit = max_distance.map_or(reach, |d| d.min(reach)).max(0.0);

        let mut radius = match max_distance {
            Some(_) => limit,
            None => (reach / 1024.0).max(1.0).min(limit),
        };

        loop {
            let best = self
                .query_rect(&rect, radius)
                .into_iter()
                .map(|entry| Nearest {
                    id: entry.id,
                    distance: Euclidean.distance(geometry, &entry.geometry),
                })
                .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));

            match best {
                // Anything closer than `best` has its envelope inside the searched window
                Some(best) if best.distance <= radius => {
                    return match max_distance {
                        Some(max) if best.distance > max => None,
                        _ => Some(best),
                    };
                }
                Some(best) => {
                    if max_distance.is_some_and(|max| best.distance > max) {
                        return None;
                    }
                    radius = best.distance;
                }
                None if radius >= limit => return None,
                None => radius = (radius * 2.0).min(limit),
            }
        }
    }

    /// Get the total number of geometries in the index
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn envelope_rect(envelope: &AABB<[f64; 2]>) -> Rect<f64> {
    let lower = envelope.lower();
    let upper = envelope.upper();
    Rect::new((lower[0], lower[1]), (upper[0], upper[1]))
}

fn merge_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
        (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
    )
}
