use crate::engine::scene::adapter::SceneAdapter;
use crate::engine::scene::entity::{EntityHandle, PropertyBag, ScreenPoint, SurfaceMaterial};
use bevy::prelude::*;
use serde::Serialize;

/// Engine bookkeeping that can leak into a feature's property bag.
const HIDDEN_PROPERTY_MARKERS: [&str; 3] = ["propertyNames", "definitionChanged", "Subscription"];

/// The selected entity and the material it wore before selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub entity: EntityHandle,
    pub original_material: SurfaceMaterial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureAttribute {
    pub key: String,
    pub value: String,
}

/// Attributes of the picked feature, ready for an attribute panel.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PickedFeatureInfo {
    pub attributes: Vec<FeatureAttribute>,
}

impl PickedFeatureInfo {
    pub fn from_properties(properties: &PropertyBag) -> Self {
        let attributes = properties
            .iter()
            .filter(|(key, _)| !HIDDEN_PROPERTY_MARKERS.iter().any(|m| key.contains(m)))
            .map(|(key, value)| FeatureAttribute {
                key: key.strip_prefix('_').unwrap_or(key).to_string(),
                value: match value {
                    serde_json::Value::String(text) => text.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                },
            })
            .collect();
        Self { attributes }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.key == key)
            .map(|attribute| attribute.value.as_str())
    }
}

/// Click-to-select over vector features with a single exclusive highlight.
#[derive(Debug)]
pub struct PickingTool {
    highlight: Option<Highlight>,
    highlight_material: SurfaceMaterial,
    picked: Option<PickedFeatureInfo>,
}

impl PickingTool {
    pub fn new(highlight_material: SurfaceMaterial) -> Self {
        Self {
            highlight: None,
            highlight_material,
            picked: None,
        }
    }

    /// Select whatever feature lies under `point`, or clear the selection on a miss.
    /// Returns the new selection.
    pub fn pick(
        &mut self,
        scene: &mut dyn SceneAdapter,
        point: ScreenPoint,
    ) -> Option<&PickedFeatureInfo> {
        let hit = scene
            .pick_at(point)
            .and_then(|entity| scene.properties(entity).map(|props| (entity, props)));

        self.restore(scene);

        match hit {
            Some((entity, properties)) => {
                if let Some(original_material) = scene.material(entity) {
                    scene.set_material(entity, self.highlight_material);
                    self.highlight = Some(Highlight {
                        entity,
                        original_material,
                    });
                }
                let info = PickedFeatureInfo::from_properties(&properties);
                debug!("Picked feature {:?} ({} attributes)", entity, info.attributes.len());
                self.picked = Some(info);
            }
            None => self.picked = None,
        }

        self.picked.as_ref()
    }

    /// Put the highlighted entity back in its original material and drop the highlight.
    /// The picked info is left alone.
    pub fn restore(&mut self, scene: &mut dyn SceneAdapter) {
        if let Some(highlight) = self.highlight.take() {
            scene.set_material(highlight.entity, highlight.original_material);
        }
    }

    /// Restore and forget the selection entirely.
    pub fn clear(&mut self, scene: &mut dyn SceneAdapter) {
        self.restore(scene);
        self.picked = None;
    }

    /// Drop the selection without touching the scene, for when its entity is gone.
    pub fn forget(&mut self) {
        self.highlight = None;
        self.picked = None;
    }

    pub fn set_highlight_material(&mut self, scene: &mut dyn SceneAdapter, material: SurfaceMaterial) {
        self.highlight_material = material;
        if let Some(highlight) = &self.highlight {
            scene.set_material(highlight.entity, material);
        }
    }

    /// Change what a later restore of `entity` puts back.
    pub fn replace_original_material(&mut self, entity: EntityHandle, material: SurfaceMaterial) -> bool {
        match &mut self.highlight {
            Some(highlight) if highlight.entity == entity => {
                highlight.original_material = material;
                true
            }
            _ => false,
        }
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn picked(&self) -> Option<&PickedFeatureInfo> {
        self.picked.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scene::adapter::SceneContainer;
    use crate::engine::scene::entity::{EntitySpec, Geometry};
    use crate::engine::scene::recording::RecordingScene;
    use crate::geometry::WorldPoint;
    use serde_json::json;

    fn feature(scene: &mut RecordingScene, name: &str, colour: Color) -> EntityHandle {
        let mut properties = PropertyBag::default();
        properties.insert("name", json!(name));
        properties.insert("area", json!(12.5));
        scene.add_entity(EntitySpec::Feature {
            geometry: Geometry::Point(WorldPoint::ZERO),
            material: SurfaceMaterial::translucent(colour, 0.5),
            properties,
        })
    }

    fn setup() -> (RecordingScene, PickingTool) {
        let mut scene = RecordingScene::default();
        scene.create(&SceneContainer::new("test"));
        let tool = PickingTool::new(SurfaceMaterial::translucent(Color::srgb(1.0, 1.0, 0.0), 0.5));
        (scene, tool)
    }

    #[test]
    fn selecting_b_restores_a_exactly() {
        let (mut scene, mut tool) = setup();
        let red = Color::srgb(1.0, 0.0, 0.0);
        let blue = Color::srgb(0.0, 0.0, 1.0);
        let a = feature(&mut scene, "a", red);
        let b = feature(&mut scene, "b", blue);
        scene.script_pick(Vec2::new(1.0, 1.0), a);
        scene.script_pick(Vec2::new(2.0, 2.0), b);
        let a_before = scene.material(a).unwrap();
        let b_before = scene.material(b).unwrap();

        tool.pick(&mut scene, Vec2::new(1.0, 1.0));
        assert_eq!(scene.material(a), Some(tool.highlight_material));

        let info = tool.pick(&mut scene, Vec2::new(2.0, 2.0)).unwrap();
        assert_eq!(info.get("name"), Some("b"));
        assert_eq!(scene.material(a), Some(a_before));
        assert_eq!(scene.material(b), Some(tool.highlight_material));
        assert_eq!(
            tool.highlight(),
            Some(&Highlight {
                entity: b,
                original_material: b_before
            })
        );
    }

    #[test]
    fn miss_restores_and_clears() {
        let (mut scene, mut tool) = setup();
        let a = feature(&mut scene, "a", Color::srgb(1.0, 0.0, 0.0));
        scene.script_pick(Vec2::new(1.0, 1.0), a);
        let before = scene.material(a);

        tool.pick(&mut scene, Vec2::new(1.0, 1.0));
        assert!(tool.pick(&mut scene, Vec2::new(50.0, 50.0)).is_none());

        assert_eq!(scene.material(a), before);
        assert!(tool.highlight().is_none());
        assert!(tool.picked().is_none());
    }

    #[test]
    fn non_feature_entities_are_not_pickable() {
        let (mut scene, mut tool) = setup();
        let marker = scene.add_entity(EntitySpec::Marker {
            position: WorldPoint::ZERO,
            colour: Color::WHITE,
            pixel_size: 5.0,
        });
        scene.script_pick(Vec2::new(1.0, 1.0), marker);

        assert!(tool.pick(&mut scene, Vec2::new(1.0, 1.0)).is_none());
        assert_eq!(scene.material(marker), Some(SurfaceMaterial::solid(Color::WHITE)));
    }

    #[test]
    fn attributes_hide_engine_bookkeeping() {
        let mut properties = PropertyBag::default();
        properties.insert("_name", json!("Block A"));
        properties.insert("propertyNames", json!(["name"]));
        properties.insert("_definitionChanged", json!({}));
        properties.insert("_nameSubscription", json!(null));
        properties.insert("levels", json!(3));

        let info = PickedFeatureInfo::from_properties(&properties);
        assert_eq!(
            info.attributes,
            vec![
                FeatureAttribute {
                    key: "name".into(),
                    value: "Block A".into()
                },
                FeatureAttribute {
                    key: "levels".into(),
                    value: "3".into()
                },
            ]
        );
    }

    #[test]
    fn restyled_original_is_what_comes_back() {
        let (mut scene, mut tool) = setup();
        let a = feature(&mut scene, "a", Color::srgb(1.0, 0.0, 0.0));
        scene.script_pick(Vec2::new(1.0, 1.0), a);
        tool.pick(&mut scene, Vec2::new(1.0, 1.0));

        let green = SurfaceMaterial::translucent(Color::srgb(0.0, 1.0, 0.0), 0.8);
        assert!(tool.replace_original_material(a, green));
        tool.clear(&mut scene);
        assert_eq!(scene.material(a), Some(green));
    }
}
