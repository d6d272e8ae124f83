//! CRS transformation

use geo::{Coord, MapCoords};
use proj::Proj;
use solarscout_core::error::{Result, SolarscoutError};

/// Reprojects geometries between two EPSG-coded CRS.
///
/// Equal source and target CRS make an identity transformer that never
/// touches PROJ.
pub struct CrsTransformer {
    from_srid: u32,
    to_srid: u32,
    proj: Option<Proj>,
}

impl CrsTransformer {
    pub fn new(from_srid: u32, to_srid: u32) -> Result<Self> {
        if from_srid == to_srid {
            return Ok(Self::identity(from_srid));
        }

        let from = format!("EPSG:{}", from_srid);
        let to = format!("EPSG:{}", to_srid);
        let proj =
            Proj::new_known_crs(&from, &to, None).map_err(|e| SolarscoutError::Projection {
                from_srid,
                to_srid,
                reason: format!("Failed to create projection: {}", e),
            })?;

        Ok(Self {
            from_srid,
            to_srid,
            proj: Some(proj),
        })
    }

    pub fn identity(srid: u32) -> Self {
        Self {
            from_srid: srid,
            to_srid: srid,
            proj: None,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    /// Transform every coordinate of a geometry
    pub fn transform<G>(&self, geometry: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G> + Clone,
    {
        let Some(proj) = &self.proj else {
            return Ok(geometry.clone());
        };

        geometry
            .try_map_coords(|coord: Coord<f64>| {
                proj.convert((coord.x, coord.y)).map(|(x, y)| Coord { x, y })
            })
            .map_err(|e| SolarscoutError::Projection {
                from_srid: self.from_srid,
                to_srid: self.to_srid,
                reason: format!("Projection failed: {}", e),
            })
    }
}

impl std::fmt::Debug for CrsTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsTransformer")
            .field("from_srid", &self.from_srid)
            .field("to_srid", &self.to_srid)
            .field("identity", &self.is_identity())
            .finish()
    }
}
