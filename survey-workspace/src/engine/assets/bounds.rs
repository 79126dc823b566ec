use crate::geometry::WorldPoint;
use bevy::math::DVec3;
use serde::{Deserialize, Serialize};

/// 3D spatial bounds in survey coordinates (x east, y north, z up).
/// Used for camera framing and to decide where ground projection is valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsData {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl BoundsData {
    /// Smallest box enclosing every finite point, `None` when there are none.
    pub fn from_points(points: impl IntoIterator<Item = WorldPoint>) -> Option<Self> {
        points
            .into_iter()
            .filter(|p| p.is_finite())
            .fold(None, |acc: Option<Self>, p| {
                Some(match acc {
                    Some(bounds) => bounds.including(p),
                    None => Self::point(p),
                })
            })
    }

    pub fn point(p: WorldPoint) -> Self {
        Self {
            min_x: p.x,
            max_x: p.x,
            min_y: p.y,
            max_y: p.y,
            min_z: p.z,
            max_z: p.z,
        }
    }

    pub fn including(&self, p: WorldPoint) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            max_x: self.max_x.max(p.x),
            min_y: self.min_y.min(p.y),
            max_y: self.max_y.max(p.y),
            min_z: self.min_z.min(p.z),
            max_z: self.max_z.max(p.z),
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// Calculate centre point for camera positioning.
    pub fn center(&self) -> WorldPoint {
        DVec3::new(
            (self.max_x + self.min_x) * 0.5,
            (self.max_y + self.min_y) * 0.5,
            (self.max_z + self.min_z) * 0.5,
        )
    }

    pub fn size(&self) -> DVec3 {
        DVec3::new(
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }

    /// Lowest height in the extent, used as the projection plane.
    pub fn ground_height(&self) -> f64 {
        self.min_z
    }

    /// Horizontal containment test (height ignored).
    pub fn contains_xy(&self, p: WorldPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Raster extent as published by the imagery service: west, south, east, north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl RasterBounds {
    /// Accepts `[w, s, e, n]` only when it describes a non-empty area.
    pub fn from_array(values: [f64; 4]) -> Option<Self> {
        let [west, south, east, north] = values;
        let finite = values.iter().all(|v| v.is_finite());
        (finite && west < east && south < north).then_some(Self {
            west,
            south,
            east,
            north,
        })
    }

    /// Flat box at `height` covering the raster.
    pub fn to_bounds(&self, height: f64) -> BoundsData {
        BoundsData {
            min_x: self.west,
            max_x: self.east,
            min_y: self.south,
            max_y: self.north,
            min_z: height,
            max_z: height,
        }
    }
}

/// Bounding sphere of a mesh tileset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: WorldPoint,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn to_bounds(&self) -> BoundsData {
        let r = DVec3::splat(self.radius);
        let min = self.center - r;
        let max = self.center + r;
        BoundsData {
            min_x: min.x,
            max_x: max.x,
            min_y: min.y,
            max_y: max.y,
            min_z: min.z,
            max_z: max.z,
        }
    }
}
