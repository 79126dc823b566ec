use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One versioned capture of a survey project.
///
/// Layer URLs are project-relative paths; an absent or empty URL means the iteration has
/// no layer of that kind. Field aliases accept the project service's own naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub revision: String,
    pub modified_time: DateTime<Utc>,
    #[serde(default, alias = "tile_3d_url", deserialize_with = "non_empty")]
    pub mesh_url: Option<String>,
    #[serde(default, alias = "geojson_url", deserialize_with = "non_empty")]
    pub vector_url: Option<String>,
    #[serde(default, alias = "ortho_photo_url", deserialize_with = "non_empty")]
    pub raster_url: Option<String>,
}

impl Iteration {
    pub fn has_mesh(&self) -> bool {
        self.mesh_url.is_some()
    }

    pub fn has_vector(&self) -> bool {
        self.vector_url.is_some()
    }

    pub fn has_raster(&self) -> bool {
        self.raster_url.is_some()
    }

    /// Parse the iteration list served by the project endpoint.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|url| !url.trim().is_empty()))
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}
