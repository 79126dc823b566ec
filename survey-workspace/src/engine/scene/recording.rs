//! In-memory [`SceneAdapter`] for exercising tools and the workspace without a renderer.
//!
//! Projection maps a screen point `(x, y)` straight to the ground position `(x, y, 0)`
//! unless the point has been scripted as sky. Picks only hit points scripted with
//! [`RecordingScene::script_pick`].

use crate::engine::scene::adapter::{CameraTarget, SceneAdapter, SceneContainer};
use crate::engine::scene::entity::{
    EntityHandle, EntityKind, EntitySpec, Geometry, PropertyBag, ScreenPoint, SurfaceMaterial,
};
use crate::geometry::WorldPoint;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEntity {
    pub spec: EntitySpec,
    pub geometry: Option<Geometry>,
    pub material: Option<SurfaceMaterial>,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct RecordingScene {
    container: Option<SceneContainer>,
    next_handle: u64,
    entities: BTreeMap<EntityHandle, RecordedEntity>,
    picks: Vec<(ScreenPoint, EntityHandle)>,
    sky: Vec<ScreenPoint>,
    flights: Vec<(CameraTarget, f32)>,
    created: usize,
    destroyed: usize,
    writes_while_dead: usize,
}

impl RecordingScene {
    /// Make `point` pick `handle`.
    pub fn script_pick(&mut self, point: ScreenPoint, handle: EntityHandle) {
        self.picks.retain(|(p, _)| *p != point);
        self.picks.push((point, handle));
    }

    /// Make `point` project onto nothing.
    pub fn script_sky(&mut self, point: ScreenPoint) {
        self.sky.push(point);
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&RecordedEntity> {
        self.entities.get(&handle)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityHandle, &RecordedEntity)> {
        self.entities.iter().map(|(handle, entity)| (*handle, entity))
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities
            .values()
            .filter(|entity| entity.spec.kind() == kind)
            .count()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn handles_of(&self, kind: EntityKind) -> Vec<EntityHandle> {
        self.entities()
            .filter(|(_, entity)| entity.spec.kind() == kind)
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Text of every label currently in the scene.
    pub fn label_texts(&self) -> Vec<String> {
        self.entities
            .values()
            .filter_map(|entity| match &entity.spec {
                EntitySpec::Label { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn flights(&self) -> &[(CameraTarget, f32)] {
        &self.flights
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    /// Entity writes that arrived while no scene existed. Always zero for a correct caller.
    pub fn writes_while_dead(&self) -> usize {
        self.writes_while_dead
    }

    fn note_write(&mut self) -> bool {
        if self.container.is_none() {
            self.writes_while_dead += 1;
            return false;
        }
        true
    }
}

impl SceneAdapter for RecordingScene {
    fn create(&mut self, container: &SceneContainer) {
        self.container = Some(container.clone());
        self.created += 1;
    }

    fn destroy(&mut self) {
        self.container = None;
        self.entities.clear();
        self.destroyed += 1;
    }

    fn is_live(&self) -> bool {
        self.container.is_some()
    }

    fn add_entity(&mut self, spec: EntitySpec) -> EntityHandle {
        self.next_handle += 1;
        let handle = EntityHandle(self.next_handle);
        if self.note_write() {
            self.entities.insert(
                handle,
                RecordedEntity {
                    geometry: spec.geometry(),
                    material: spec.material(),
                    visible: true,
                    spec,
                },
            );
        }
        handle
    }

    fn remove_entity(&mut self, handle: EntityHandle) {
        if self.note_write() {
            self.entities.remove(&handle);
        }
    }

    fn set_geometry(&mut self, handle: EntityHandle, geometry: Geometry) {
        if self.note_write() {
            if let Some(entity) = self.entities.get_mut(&handle) {
                entity.geometry = Some(geometry);
            }
        }
    }

    fn set_visible(&mut self, handle: EntityHandle, visible: bool) {
        if self.note_write() {
            if let Some(entity) = self.entities.get_mut(&handle) {
                entity.visible = visible;
            }
        }
    }

    fn material(&self, handle: EntityHandle) -> Option<SurfaceMaterial> {
        self.entities.get(&handle).and_then(|entity| entity.material)
    }

    fn set_material(&mut self, handle: EntityHandle, material: SurfaceMaterial) {
        if self.note_write() {
            if let Some(entity) = self.entities.get_mut(&handle) {
                entity.material = Some(material);
            }
        }
    }

    fn properties(&self, handle: EntityHandle) -> Option<PropertyBag> {
        self.entities
            .get(&handle)
            .and_then(|entity| entity.spec.properties().cloned())
    }

    fn pick_at(&self, point: ScreenPoint) -> Option<EntityHandle> {
        self.picks
            .iter()
            .find(|(p, handle)| {
                *p == point
                    && self
                        .entities
                        .get(handle)
                        .is_some_and(|entity| entity.visible)
            })
            .map(|(_, handle)| *handle)
    }

    fn project_to_world(&self, point: ScreenPoint) -> Option<WorldPoint> {
        if self.container.is_none() || self.sky.contains(&point) {
            return None;
        }
        Some(WorldPoint::new(point.x as f64, point.y as f64, 0.0))
    }

    fn fly_to(&mut self, target: CameraTarget, duration_secs: f32) {
        if self.note_write() {
            self.flights.push((target, duration_secs));
        }
    }
}
