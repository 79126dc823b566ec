use crate::engine::assets::bounds::BoundsData;
use crate::engine::scene::entity::{Geometry, PropertyBag};
use crate::geometry::WorldPoint;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// GeoJSON position: easting, northing and an optional height.
pub type Position = Vec<f64>;

/// GeoJSON feature collection loaded as the 2D vector layer.
#[derive(Asset, TypePath, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorDocument {
    #[serde(default)]
    pub features: Vec<GeoJsonFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<GeoJsonGeometry> },
}

impl VectorDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Every renderable part with the properties of the feature it came from.
    /// Multi-part geometries yield one part per member.
    pub fn parts(&self) -> Vec<(Geometry, PropertyBag)> {
        let mut parts = Vec::new();
        for feature in &self.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let properties = feature.property_bag();
            let mut shapes = Vec::new();
            geometry.collect_shapes(&mut shapes);
            parts.extend(shapes.into_iter().map(|shape| (shape, properties.clone())));
        }
        parts
    }

    pub fn bounds(&self) -> Option<BoundsData> {
        BoundsData::from_points(
            self.parts()
                .iter()
                .flat_map(|(shape, _)| shape.vertices().to_vec()),
        )
    }
}

impl GeoJsonFeature {
    fn property_bag(&self) -> PropertyBag {
        let mut bag = self
            .properties
            .clone()
            .map(PropertyBag::from_json)
            .unwrap_or_default();
        if let Some(id) = &self.id {
            if bag.get("id").is_none() {
                bag.insert("id", id.clone());
            }
        }
        bag
    }
}

impl GeoJsonGeometry {
    fn collect_shapes(&self, out: &mut Vec<Geometry>) {
        match self {
            Self::Point { coordinates } => out.extend(to_point(coordinates).map(Geometry::Point)),
            Self::MultiPoint { coordinates } => {
                out.extend(coordinates.iter().filter_map(to_point).map(Geometry::Point))
            }
            Self::LineString { coordinates } => push_line(out, coordinates),
            Self::MultiLineString { coordinates } => {
                for line in coordinates {
                    push_line(out, line);
                }
            }
            Self::Polygon { coordinates } => push_polygon(out, coordinates),
            Self::MultiPolygon { coordinates } => {
                for polygon in coordinates {
                    push_polygon(out, polygon);
                }
            }
            Self::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.collect_shapes(out);
                }
            }
        }
    }
}

fn to_point(position: &Position) -> Option<WorldPoint> {
    match position.as_slice() {
        [x, y] => Some(WorldPoint::new(*x, *y, 0.0)),
        [x, y, z, ..] => Some(WorldPoint::new(*x, *y, *z)),
        _ => None,
    }
}

fn push_line(out: &mut Vec<Geometry>, coordinates: &[Position]) {
    let points: Vec<WorldPoint> = coordinates.iter().filter_map(to_point).collect();
    if points.len() >= 2 {
        out.push(Geometry::Polyline(points));
    }
}

// Holes are not rendered, only the outer ring.
fn push_polygon(out: &mut Vec<Geometry>, rings: &[Vec<Position>]) {
    let Some(outer) = rings.first() else {
        return;
    };
    let mut points: Vec<WorldPoint> = outer.iter().filter_map(to_point).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() >= 3 {
        out.push(Geometry::Polygon(points));
    }
}
