//! Runtime configuration: built-in defaults, then an optional JSON file named by
//! `SURVEY_WORKSPACE_CONFIG`, then individual environment overrides.

use crate::error::WorkspaceError;
use bevy::color::{Color, Srgba};
use bevy::prelude::*;
use constants::render_settings::{
    DEFAULT_FLY_DURATION_SECS, DEFAULT_VECTOR_COLOUR_HEX, DEFAULT_VECTOR_OPACITY,
};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "SURVEY_WORKSPACE_CONFIG";
pub const API_BASE_URL_ENV: &str = "SURVEY_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStyleConfig {
    /// `#RRGGBB` fill applied to vector features.
    pub colour: String,
    pub opacity: f32,
}

impl Default for VectorStyleConfig {
    fn default() -> Self {
        Self {
            colour: DEFAULT_VECTOR_COLOUR_HEX.to_string(),
            opacity: DEFAULT_VECTOR_OPACITY,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Prefix for every layer request. Empty means same-origin relative paths.
    pub api_base_url: String,
    pub project_endpoint: String,
    pub vector_document: String,
    pub tileset_document: String,
    pub imagery_document: String,
    pub vector_style: VectorStyleConfig,
    pub fly_duration_secs: f32,
    /// CSS selector of the canvas the scene mounts into.
    pub canvas: String,
    /// JSON iteration list loaded at startup on native builds.
    pub iterations_file: Option<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            project_endpoint: "/project".to_string(),
            vector_document: "doc.geojson".to_string(),
            tileset_document: "tileset.json".to_string(),
            imagery_document: "tilejson.json".to_string(),
            vector_style: VectorStyleConfig::default(),
            fly_duration_secs: DEFAULT_FLY_DURATION_SECS,
            canvas: "#bevy".to_string(),
            iterations_file: None,
        }
    }
}

impl WorkspaceConfig {
    pub fn load() -> Result<Self, WorkspaceError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)
                    .map_err(|e| WorkspaceError::Config(format!("{path}: {e}")))?;
                info!("Loading workspace config from {}", path);
                Self::from_json_str(&json)?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, WorkspaceError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| WorkspaceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_BASE_URL_ENV) {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
    }

    pub fn validate(&self) -> Result<(), WorkspaceError> {
        let opacity = self.vector_style.opacity;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(WorkspaceError::Config(format!(
                "vector opacity {opacity} is outside 0..=1"
            )));
        }
        self.vector_colour()?;
        if !self.fly_duration_secs.is_finite() || self.fly_duration_secs < 0.0 {
            return Err(WorkspaceError::Config(format!(
                "fly duration {} must be a non-negative number of seconds",
                self.fly_duration_secs
            )));
        }
        Ok(())
    }

    pub fn vector_colour(&self) -> Result<Color, WorkspaceError> {
        parse_hex_colour(&self.vector_style.colour).ok_or_else(|| {
            WorkspaceError::Config(format!(
                "`{}` is not a #RRGGBB colour",
                self.vector_style.colour
            ))
        })
    }
}

pub fn parse_hex_colour(hex: &str) -> Option<Color> {
    Srgba::hex(hex.trim()).ok().map(Color::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_project_layout() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.project_endpoint, "/project");
        assert_eq!(config.vector_document, "doc.geojson");
        assert_eq!(config.fly_duration_secs, 2.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.vector_colour().unwrap(), Color::srgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn file_overrides_only_named_fields() {
        let config = WorkspaceConfig::from_json_str(
            r##"{"api_base_url": "https://api.example", "vector_style": {"opacity": 0.8}}"##,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.example");
        assert_eq!(config.vector_style.opacity, 0.8);
        assert_eq!(config.vector_style.colour, "#FF0000");
        assert_eq!(config.canvas, "#bevy");
    }

    #[test]
    fn environment_wins_over_file() {
        let mut config = WorkspaceConfig::default();
        config.apply_overrides(|key| match key {
            API_BASE_URL_ENV => Some("https://survey.example:8443/".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://survey.example:8443");
    }

    #[test]
    fn web_client_fields_are_ignored() {
        let config = WorkspaceConfig::from_json_str(
            r##"{"canvas": "#viewer", "trusted_servers": ["survey.example:8443"]}"##,
        )
        .unwrap();
        assert_eq!(config.canvas, "#viewer");
        assert_eq!(config.project_endpoint, "/project");
    }

    #[test]
    fn invalid_style_is_rejected() {
        assert!(WorkspaceConfig::from_json_str(r#"{"vector_style": {"opacity": 1.5}}"#).is_err());
        assert!(
            WorkspaceConfig::from_json_str(r#"{"vector_style": {"colour": "crimson"}}"#).is_err()
        );
    }
}
