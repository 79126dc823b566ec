use crate::engine::assets::bounds::{BoundingSphere, BoundsData, RasterBounds};
use crate::geometry::WorldPoint;
use bevy::color::{Alpha, Color};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque reference to an entity owned by a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

/// Pointer position in logical pixels, origin at the top-left of the canvas.
pub type ScreenPoint = Vec2;

/// Fill or stroke appearance of a scene entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    pub colour: Color,
}

impl SurfaceMaterial {
    pub const fn solid(colour: Color) -> Self {
        Self { colour }
    }

    pub fn translucent(colour: Color, opacity: f32) -> Self {
        Self {
            colour: colour.with_alpha(opacity.clamp(0.0, 1.0)),
        }
    }

    pub fn opacity(&self) -> f32 {
        self.colour.alpha()
    }
}

/// Positional data of an entity that can change after creation.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(WorldPoint),
    Polyline(Vec<WorldPoint>),
    Polygon(Vec<WorldPoint>),
}

impl Geometry {
    pub fn vertices(&self) -> &[WorldPoint] {
        match self {
            Self::Point(point) => std::slice::from_ref(point),
            Self::Polyline(points) | Self::Polygon(points) => points,
        }
    }

    pub fn bounds(&self) -> Option<BoundsData> {
        BoundsData::from_points(self.vertices().iter().copied())
    }
}

/// Coarse classification of scene entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Marker,
    Line,
    Area,
    Label,
    Feature,
    Imagery,
    Tileset,
}

/// Everything a scene needs to create an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntitySpec {
    Marker {
        position: WorldPoint,
        colour: Color,
        pixel_size: f32,
    },
    Polyline {
        positions: Vec<WorldPoint>,
        colour: Color,
        width: f32,
    },
    Polygon {
        hierarchy: Vec<WorldPoint>,
        material: SurfaceMaterial,
    },
    Label {
        position: WorldPoint,
        text: String,
        colour: Color,
        font_size: f32,
        pixel_offset: Vec2,
    },
    /// Pickable vector feature carrying its source attributes.
    Feature {
        geometry: Geometry,
        material: SurfaceMaterial,
        properties: PropertyBag,
    },
    Imagery {
        source: String,
        bounds: Option<RasterBounds>,
    },
    Tileset {
        source: String,
        bounding_volume: BoundingSphere,
    },
}

impl EntitySpec {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Marker { .. } => EntityKind::Marker,
            Self::Polyline { .. } => EntityKind::Line,
            Self::Polygon { .. } => EntityKind::Area,
            Self::Label { .. } => EntityKind::Label,
            Self::Feature { .. } => EntityKind::Feature,
            Self::Imagery { .. } => EntityKind::Imagery,
            Self::Tileset { .. } => EntityKind::Tileset,
        }
    }

    /// Initial geometry, for entities whose geometry can be updated.
    pub fn geometry(&self) -> Option<Geometry> {
        match self {
            Self::Marker { position, .. } | Self::Label { position, .. } => {
                Some(Geometry::Point(*position))
            }
            Self::Polyline { positions, .. } => Some(Geometry::Polyline(positions.clone())),
            Self::Polygon { hierarchy, .. } => Some(Geometry::Polygon(hierarchy.clone())),
            Self::Feature { geometry, .. } => Some(geometry.clone()),
            Self::Imagery { .. } | Self::Tileset { .. } => None,
        }
    }

    pub fn material(&self) -> Option<SurfaceMaterial> {
        match self {
            Self::Marker { colour, .. }
            | Self::Polyline { colour, .. }
            | Self::Label { colour, .. } => Some(SurfaceMaterial::solid(*colour)),
            Self::Polygon { material, .. } | Self::Feature { material, .. } => Some(*material),
            Self::Imagery { .. } | Self::Tileset { .. } => None,
        }
    }

    pub fn properties(&self) -> Option<&PropertyBag> {
        match self {
            Self::Feature { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Survey extent the entity occupies.
    pub fn extent(&self) -> Option<BoundsData> {
        match self {
            Self::Imagery { bounds, .. } => bounds.map(|raster| raster.to_bounds(0.0)),
            Self::Tileset {
                bounding_volume, ..
            } => Some(bounding_volume.to_bounds()),
            _ => self.geometry().and_then(|geometry| geometry.bounds()),
        }
    }
}

/// Attribute bag attached to a feature, in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyBag(Vec<(String, serde_json::Value)>);

impl PropertyBag {
    pub fn from_json(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map.into_iter().collect())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_bag_keeps_insertion_order() {
        let mut bag = PropertyBag::default();
        bag.insert("b", json!(1));
        bag.insert("a", json!(2));
        bag.insert("b", json!(3));

        let keys: Vec<&str> = bag.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(bag.get("b"), Some(&json!(3)));
    }

    #[test]
    fn translucent_material_clamps_opacity() {
        let material = SurfaceMaterial::translucent(Color::srgb(1.0, 0.0, 0.0), 1.7);
        assert_eq!(material.opacity(), 1.0);
    }

    #[test]
    fn spec_reports_initial_state() {
        let spec = EntitySpec::Polyline {
            positions: vec![WorldPoint::ZERO, WorldPoint::X],
            colour: Color::WHITE,
            width: 2.0,
        };
        assert_eq!(spec.kind(), EntityKind::Line);
        assert_eq!(
            spec.geometry(),
            Some(Geometry::Polyline(vec![WorldPoint::ZERO, WorldPoint::X]))
        );
        assert!(spec.properties().is_none());
    }
}
