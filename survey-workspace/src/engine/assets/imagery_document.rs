use crate::engine::assets::bounds::RasterBounds;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// TileJSON description of the orthophoto raster layer.
#[derive(Asset, TypePath, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageryDocument {
    #[serde(default)]
    pub tilejson: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tiles: Vec<String>,
    /// West, south, east, north.
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,
    #[serde(default)]
    pub minzoom: Option<u8>,
    #[serde(default)]
    pub maxzoom: Option<u8>,
}

impl ImageryDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Published extent, if the service advertised a usable one.
    pub fn raster_bounds(&self) -> Option<RasterBounds> {
        self.bounds.and_then(RasterBounds::from_array)
    }

    /// Tile URL template handed to the renderer.
    pub fn tile_template(&self) -> Option<&str> {
        self.tiles.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bounds_and_tiles() {
        let imagery = ImageryDocument::from_json(
            r#"{
                "tilejson": "2.2.0",
                "tiles": ["https://tiles.example/ortho/{z}/{x}/{y}.png"],
                "bounds": [500.0, 1000.0, 900.0, 1400.0],
                "minzoom": 12,
                "maxzoom": 22
            }"#,
        )
        .unwrap();

        let bounds = imagery.raster_bounds().unwrap();
        assert_eq!((bounds.west, bounds.north), (500.0, 1400.0));
        assert_eq!(
            imagery.tile_template(),
            Some("https://tiles.example/ortho/{z}/{x}/{y}.png")
        );
    }

    #[test]
    fn bounds_are_optional() {
        let imagery = ImageryDocument::from_json(r#"{"tiles": []}"#).unwrap();
        assert!(imagery.raster_bounds().is_none());
        assert!(imagery.tile_template().is_none());
    }
}
