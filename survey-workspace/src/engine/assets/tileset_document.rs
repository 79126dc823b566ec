use crate::engine::assets::bounds::BoundingSphere;
use bevy::math::{DMat4, DVec3};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Root description of a 3D Tiles mesh tileset.
#[derive(Asset, TypePath, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetDocument {
    pub asset: TilesetAsset,
    #[serde(default)]
    pub geometric_error: f64,
    pub root: TileNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilesetAsset {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileNode {
    pub bounding_volume: BoundingVolumeData,
    #[serde(default)]
    pub geometric_error: f64,
    /// Column-major 4x4 transform applied to the root content.
    #[serde(default)]
    pub transform: Option<[f64; 16]>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundingVolumeData {
    /// Centre followed by three half-axis vectors.
    #[serde(default, rename = "box")]
    pub oriented_box: Option<[f64; 12]>,
    #[serde(default)]
    pub sphere: Option<[f64; 4]>,
    /// Geographic region in radians; not usable in projected survey space.
    #[serde(default)]
    pub region: Option<[f64; 6]>,
}

impl TilesetDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Root bounding sphere in survey space, `None` for region-only volumes.
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        let volume = &self.root.bounding_volume;

        let local = if let Some([x, y, z, radius]) = volume.sphere {
            BoundingSphere {
                center: DVec3::new(x, y, z),
                radius,
            }
        } else if let Some(b) = volume.oriented_box {
            let half_axes = [
                DVec3::new(b[3], b[4], b[5]),
                DVec3::new(b[6], b[7], b[8]),
                DVec3::new(b[9], b[10], b[11]),
            ];
            BoundingSphere {
                center: DVec3::new(b[0], b[1], b[2]),
                radius: half_axes.iter().map(|a| a.length_squared()).sum::<f64>().sqrt(),
            }
        } else {
            return None;
        };

        let sphere = match self.root.transform {
            Some(columns) => {
                let transform = DMat4::from_cols_array(&columns);
                BoundingSphere {
                    center: transform.transform_point3(local.center),
                    radius: local.radius,
                }
            }
            None => local,
        };

        (sphere.center.is_finite() && sphere.radius.is_finite() && sphere.radius > 0.0)
            .then_some(sphere)
    }
}
