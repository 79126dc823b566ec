//! Loads the layers of one iteration into the scene.
//!
//! [`LayerResolver::resolve`] issues one request per layer the view needs and returns a
//! [`PendingResolve`] that is polled every frame. Layers are independent: a failed layer is
//! recorded and the rest still load. Once every request has settled the camera is flown to
//! the best available extent (mesh, then raster with bounds, then vector). Completions that
//! arrive after the scene was destroyed or replaced are discarded without touching it.

use crate::engine::assets::bounds::{BoundingSphere, BoundsData, RasterBounds};
use crate::engine::assets::iteration::Iteration;
use crate::engine::core::config::WorkspaceConfig;
use crate::engine::loading::progress::{LayerLoadState, LoadingProgress};
use crate::engine::loading::resource_source::{
    LayerKind, LayerResource, LoadStatus, RequestId, ResourceRequest, ResourceSource,
};
use crate::engine::scene::adapter::{CameraTarget, SceneAdapter};
use crate::engine::scene::entity::{EntityHandle, EntitySpec, SurfaceMaterial};
use crate::engine::scene::mount::{LivenessToken, SceneMount};
use crate::error::{LayerLoadError, WorkspaceError};
use crate::workspace::view::ActiveView;
use bevy::prelude::*;
use constants::render_settings::{
    DEFAULT_VECTOR_COLOUR, DEFAULT_VECTOR_OPACITY, HIGHLIGHT_COLOUR,
};

/// Fill colour and opacity of the vector layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorStyle {
    pub colour: Color,
    pub opacity: f32,
}

impl Default for VectorStyle {
    fn default() -> Self {
        Self {
            colour: DEFAULT_VECTOR_COLOUR,
            opacity: DEFAULT_VECTOR_OPACITY,
        }
    }
}

impl VectorStyle {
    pub fn from_config(config: &WorkspaceConfig) -> Result<Self, WorkspaceError> {
        Ok(Self {
            colour: config.vector_colour()?,
            opacity: config.vector_style.opacity,
        })
    }

    pub fn fill(&self) -> SurfaceMaterial {
        SurfaceMaterial::translucent(self.colour, self.opacity)
    }

    /// Selection colour at the layer's opacity.
    pub fn highlight(&self) -> SurfaceMaterial {
        SurfaceMaterial::translucent(HIGHLIGHT_COLOUR, self.opacity)
    }
}

/// How the vector layer should look when it lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorPresentation {
    pub style: VectorStyle,
    pub visible: bool,
}

impl Default for VectorPresentation {
    fn default() -> Self {
        Self {
            style: VectorStyle::default(),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    pub features: Vec<EntityHandle>,
    pub bounds: Option<BoundsData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    pub entity: EntityHandle,
    pub bounds: Option<RasterBounds>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshLayer {
    pub entity: EntityHandle,
    pub bounding_volume: BoundingSphere,
}

/// Layers of the current iteration that made it into the scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadResult {
    pub vector: Option<VectorLayer>,
    pub raster: Option<RasterLayer>,
    pub mesh: Option<MeshLayer>,
    pub failures: Vec<LayerLoadError>,
}

impl LoadResult {
    /// Where to point the camera once loading settles.
    pub fn camera_target(&self) -> Option<CameraTarget> {
        if let Some(mesh) = &self.mesh {
            return Some(CameraTarget::TopDown {
                center: mesh.bounding_volume.center,
                radius: mesh.bounding_volume.radius,
            });
        }

        let vector_bounds = self.vector.as_ref().and_then(|layer| layer.bounds);
        if let Some(raster) = self.raster.as_ref().and_then(|layer| layer.bounds) {
            let ground = vector_bounds.map_or(0.0, |bounds| bounds.ground_height());
            return Some(CameraTarget::Bounds(raster.to_bounds(ground)));
        }

        vector_bounds.map(CameraTarget::Bounds)
    }

    pub fn loaded_kinds(&self) -> Vec<LayerKind> {
        let mut kinds = Vec::new();
        if self.vector.is_some() {
            kinds.push(LayerKind::Vector);
        }
        if self.raster.is_some() {
            kinds.push(LayerKind::Raster);
        }
        if self.mesh.is_some() {
            kinds.push(LayerKind::Mesh);
        }
        kinds
    }

    pub fn vector_features(&self) -> &[EntityHandle] {
        self.vector
            .as_ref()
            .map_or(&[], |layer| layer.features.as_slice())
    }
}

/// Where layer documents live.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEndpoints {
    pub api_base_url: String,
    pub project_endpoint: String,
    pub vector_document: String,
    pub tileset_document: String,
    pub imagery_document: String,
}

impl ResourceEndpoints {
    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            project_endpoint: config.project_endpoint.trim_end_matches('/').to_string(),
            vector_document: config.vector_document.clone(),
            tileset_document: config.tileset_document.clone(),
            imagery_document: config.imagery_document.clone(),
        }
    }

    /// `{base}{endpoint}/{layer_url}/{document}`
    pub fn request_for(&self, kind: LayerKind, layer_url: &str) -> ResourceRequest {
        let document = match kind {
            LayerKind::Vector => &self.vector_document,
            LayerKind::Raster => &self.imagery_document,
            LayerKind::Mesh => &self.tileset_document,
        };
        let layer_url = layer_url.trim_matches('/');
        let path = format!(
            "{}{}/{}/{}",
            self.api_base_url, self.project_endpoint, layer_url, document
        );
        ResourceRequest { kind, path }
    }
}

pub fn layer_url(iteration: &Iteration, kind: LayerKind) -> Option<&str> {
    match kind {
        LayerKind::Vector => iteration.vector_url.as_deref(),
        LayerKind::Raster => iteration.raster_url.as_deref(),
        LayerKind::Mesh => iteration.mesh_url.as_deref(),
    }
}

pub struct LayerResolver {
    endpoints: ResourceEndpoints,
}

impl LayerResolver {
    pub fn new(endpoints: ResourceEndpoints) -> Self {
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &ResourceEndpoints {
        &self.endpoints
    }

    /// Request every layer `view` shows for `iteration`.
    pub fn resolve(
        &self,
        token: LivenessToken,
        iteration: &Iteration,
        view: ActiveView,
        source: &mut dyn ResourceSource,
    ) -> PendingResolve {
        let mut progress = LoadingProgress::default();
        let layers = view
            .layer_kinds()
            .iter()
            .filter_map(|kind| {
                let url = layer_url(iteration, *kind)?;
                let request = self.endpoints.request_for(*kind, url);
                info!("Requesting {} layer: {}", kind, request.path);
                progress.mark(*kind, LayerLoadState::Requested);
                Some(PendingLayer {
                    kind: *kind,
                    id: source.request(&request),
                    path: request.path,
                })
            })
            .collect();

        PendingResolve {
            token,
            iteration_id: iteration.id.clone(),
            layers,
            progress,
            result: LoadResult::default(),
            settled: false,
        }
    }
}

#[derive(Debug)]
struct PendingLayer {
    kind: LayerKind,
    id: RequestId,
    path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveEvent {
    Loaded(LayerKind),
    Failed(LayerLoadError),
    /// Every layer has settled; carries the kinds that loaded.
    Settled(Vec<LayerKind>),
}

/// In-flight load of one iteration into one scene lifetime.
#[derive(Debug)]
pub struct PendingResolve {
    token: LivenessToken,
    iteration_id: String,
    layers: Vec<PendingLayer>,
    progress: LoadingProgress,
    result: LoadResult,
    settled: bool,
}

impl PendingResolve {
    pub fn token(&self) -> LivenessToken {
        self.token
    }

    pub fn iteration_id(&self) -> &str {
        &self.iteration_id
    }

    pub fn progress(&self) -> &LoadingProgress {
        &self.progress
    }

    pub fn result(&self) -> &LoadResult {
        &self.result
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Apply whatever has arrived. Returns nothing once the scene is no longer the one
    /// this load was started for.
    pub fn poll(
        &mut self,
        mount: &SceneMount,
        source: &mut dyn ResourceSource,
        scene: &mut dyn SceneAdapter,
        vector: &VectorPresentation,
        fly_duration_secs: f32,
    ) -> Vec<ResolveEvent> {
        if !mount.is_live(self.token) {
            for layer in self.layers.drain(..) {
                debug!("Discarding stale {} load: {}", layer.kind, layer.path);
                source.release(layer.id);
            }
            self.settled = true;
            return Vec::new();
        }
        if self.settled {
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut waiting = Vec::new();

        for layer in std::mem::take(&mut self.layers) {
            let outcome = match source.poll(layer.id) {
                LoadStatus::Pending => {
                    waiting.push(layer);
                    continue;
                }
                LoadStatus::Loaded(resource) => self.apply(resource, &layer, scene, vector),
                LoadStatus::Failed(reason) => Err(LayerLoadError::Fetch {
                    kind: layer.kind,
                    path: layer.path.clone(),
                    reason,
                }),
            };

            match outcome {
                Ok(()) => {
                    info!("Loaded {} layer for iteration {}", layer.kind, self.iteration_id);
                    self.progress.mark(layer.kind, LayerLoadState::Loaded);
                    events.push(ResolveEvent::Loaded(layer.kind));
                }
                Err(error) => {
                    warn!("{}", error);
                    self.progress.mark(layer.kind, LayerLoadState::Failed);
                    self.result.failures.push(error.clone());
                    events.push(ResolveEvent::Failed(error));
                }
            }
        }
        self.layers = waiting;

        if self.layers.is_empty() {
            self.settled = true;
            if let Some(target) = self.result.camera_target() {
                info!("Framing iteration {} on {:?}", self.iteration_id, target);
                scene.fly_to(target, fly_duration_secs);
            }
            events.push(ResolveEvent::Settled(self.result.loaded_kinds()));
        }
        events
    }

    fn apply(
        &mut self,
        resource: LayerResource,
        layer: &PendingLayer,
        scene: &mut dyn SceneAdapter,
        vector: &VectorPresentation,
    ) -> Result<(), LayerLoadError> {
        if resource.kind() != layer.kind {
            return Err(LayerLoadError::Fetch {
                kind: layer.kind,
                path: layer.path.clone(),
                reason: format!("expected a {} document, got {}", layer.kind, resource.kind()),
            });
        }

        match resource {
            LayerResource::Vector(document) => {
                let parts = document.parts();
                if parts.is_empty() {
                    return Err(LayerLoadError::EmptyDocument {
                        kind: layer.kind,
                        path: layer.path.clone(),
                    });
                }
                let features = parts
                    .into_iter()
                    .map(|(geometry, properties)| {
                        let handle = scene.add_entity(EntitySpec::Feature {
                            geometry,
                            material: vector.style.fill(),
                            properties,
                        });
                        if !vector.visible {
                            scene.set_visible(handle, false);
                        }
                        handle
                    })
                    .collect();
                self.result.vector = Some(VectorLayer {
                    features,
                    bounds: document.bounds(),
                });
            }
            LayerResource::Raster(document) => {
                let source = document.tile_template().map(str::to_string).ok_or_else(|| {
                    LayerLoadError::EmptyDocument {
                        kind: layer.kind,
                        path: layer.path.clone(),
                    }
                })?;
                let bounds = document.raster_bounds();
                if bounds.is_none() {
                    warn!("{} has no bounds; the camera will not frame it", layer.path);
                }
                let entity = scene.add_entity(EntitySpec::Imagery { source, bounds });
                self.result.raster = Some(RasterLayer { entity, bounds });
            }
            LayerResource::Mesh(document) => {
                let bounding_volume = document.bounding_sphere().ok_or_else(|| {
                    LayerLoadError::UnsupportedBoundingVolume {
                        path: layer.path.clone(),
                    }
                })?;
                let entity = scene.add_entity(EntitySpec::Tileset {
                    source: layer.path.clone(),
                    bounding_volume,
                });
                self.result.mesh = Some(MeshLayer {
                    entity,
                    bounding_volume,
                });
            }
        }
        Ok(())
    }

    /// Stop waiting on outstanding requests, keeping what already landed.
    pub fn cancel(mut self, source: &mut dyn ResourceSource) -> LoadResult {
        for layer in self.layers.drain(..) {
            debug!("Cancelling {} load: {}", layer.kind, layer.path);
            source.release(layer.id);
        }
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::imagery_document::ImageryDocument;
    use crate::engine::assets::tileset_document::TilesetDocument;
    use crate::engine::assets::vector_document::VectorDocument;
    use crate::engine::scene::adapter::SceneContainer;
    use crate::engine::scene::entity::EntityKind;
    use crate::engine::scene::recording::RecordingScene;
    use crate::engine::loading::static_source::StaticResourceSource;
    use chrono::DateTime;

    const VECTOR_PATH: &str = "/project/it-1/vector/doc.geojson";
    const RASTER_PATH: &str = "/project/it-1/ortho/tilejson.json";
    const MESH_PATH: &str = "/project/it-1/mesh/tileset.json";

    fn iteration() -> Iteration {
        Iteration {
            id: "it-1".into(),
            revision: "r1".into(),
            modified_time: DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
                .unwrap()
                .to_utc(),
            mesh_url: Some("/it-1/mesh".into()),
            vector_url: Some("/it-1/vector".into()),
            raster_url: Some("it-1/ortho/".into()),
        }
    }

    fn parcels() -> LayerResource {
        LayerResource::Vector(
            VectorDocument::from_json(
                r#"{"features": [
                    {"properties": {"name": "A"}, "geometry": {"type": "Polygon",
                        "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 0]]]}},
                    {"properties": {"name": "B"}, "geometry": {"type": "Point",
                        "coordinates": [20, 20]}}
                ]}"#,
            )
            .unwrap(),
        )
    }

    fn ortho(bounds: Option<[f64; 4]>) -> LayerResource {
        LayerResource::Raster(ImageryDocument {
            tiles: vec!["ortho/{z}/{x}/{y}.png".into()],
            bounds,
            ..Default::default()
        })
    }

    fn mesh() -> LayerResource {
        LayerResource::Mesh(
            TilesetDocument::from_json(
                r#"{"asset": {"version": "1.0"},
                    "root": {"boundingVolume": {"sphere": [5, 5, 1, 30]}}}"#,
            )
            .unwrap(),
        )
    }

    fn mounted() -> (SceneMount, RecordingScene) {
        let mut scene = RecordingScene::default();
        let mut mount = SceneMount::default();
        mount.mount(SceneContainer::new("#bevy"), &mut scene).unwrap();
        (mount, scene)
    }

    fn resolver() -> LayerResolver {
        LayerResolver::new(ResourceEndpoints::from_config(&WorkspaceConfig::default()))
    }

    #[test]
    fn request_paths_follow_project_layout() {
        let mut config = WorkspaceConfig::default();
        config.api_base_url = "https://api.survey.example".into();
        let endpoints = ResourceEndpoints::from_config(&config);

        let request = endpoints.request_for(LayerKind::Mesh, "/abc/3d/");
        assert_eq!(
            request.path,
            "https://api.survey.example/project/abc/3d/tileset.json"
        );

        let relative = resolver().endpoints().request_for(LayerKind::Vector, "abc");
        assert_eq!(relative.path, "/project/abc/doc.geojson");
    }

    #[test]
    fn two_d_view_survives_a_failed_raster() {
        let (mount, mut scene) = mounted();
        let mut source = StaticResourceSource::default();
        source.stage_loaded(VECTOR_PATH, parcels());
        source.stage_failed(RASTER_PATH, "404 Not Found");

        let mut pending = resolver().resolve(mount.token(), &iteration(), ActiveView::TwoD, &mut source);
        assert_eq!(source.requested_paths(), vec![VECTOR_PATH, RASTER_PATH]);

        let events = pending.poll(&mount, &mut source, &mut scene, &VectorPresentation::default(), 2.0);

        assert!(pending.is_settled());
        assert_eq!(scene.count(EntityKind::Feature), 2);
        assert_eq!(scene.count(EntityKind::Imagery), 0);
        assert_eq!(pending.result().failures.len(), 1);
        assert_eq!(pending.result().failures[0].kind(), LayerKind::Raster);
        assert_eq!(events.last(), Some(&ResolveEvent::Settled(vec![LayerKind::Vector])));

        // Framed on the vector extent since the raster never arrived.
        let (target, duration) = scene.flights()[0];
        let CameraTarget::Bounds(bounds) = target else {
            panic!("expected bounds target, got {target:?}");
        };
        assert_eq!((bounds.max_x, bounds.max_y), (20.0, 20.0));
        assert_eq!(duration, 2.0);
    }

    #[test]
    fn raster_bounds_take_priority_over_vector() {
        let (mount, mut scene) = mounted();
        let mut source = StaticResourceSource::default();
        source.stage_loaded(VECTOR_PATH, parcels());
        source.stage_loaded(RASTER_PATH, ortho(Some([-50.0, -50.0, 50.0, 50.0])));

        let mut pending = resolver().resolve(mount.token(), &iteration(), ActiveView::TwoD, &mut source);
        pending.poll(&mount, &mut source, &mut scene, &VectorPresentation::default(), 2.0);

        assert_eq!(
            scene.flights()[0].0,
            CameraTarget::Bounds(RasterBounds::from_array([-50.0, -50.0, 50.0, 50.0]).unwrap().to_bounds(0.0))
        );
    }

    #[test]
    fn three_d_view_flies_top_down_to_mesh() {
        let (mount, mut scene) = mounted();
        let mut source = StaticResourceSource::default();
        source.stage_loaded(MESH_PATH, mesh());

        let mut pending = resolver().resolve(mount.token(), &iteration(), ActiveView::ThreeD, &mut source);
        assert_eq!(source.requested_paths(), vec![MESH_PATH]);
        pending.poll(&mount, &mut source, &mut scene, &VectorPresentation::default(), 2.0);

        assert_eq!(scene.count(EntityKind::Tileset), 1);
        assert_eq!(
            scene.flights()[0].0,
            CameraTarget::TopDown {
                center: bevy::math::DVec3::new(5.0, 5.0, 1.0),
                radius: 30.0
            }
        );
    }

    #[test]
    fn region_volume_fails_only_the_mesh() {
        let (mount, mut scene) = mounted();
        let mut source = StaticResourceSource::default();
        source.stage_loaded(
            MESH_PATH,
            LayerResource::Mesh(
                TilesetDocument::from_json(
                    r#"{"asset": {"version": "1.0"},
                        "root": {"boundingVolume": {"region": [0, 0, 1, 1, 0, 10]}}}"#,
                )
                .unwrap(),
            ),
        );

        let mut pending = resolver().resolve(mount.token(), &iteration(), ActiveView::ThreeD, &mut source);
        let events = pending.poll(&mount, &mut source, &mut scene, &VectorPresentation::default(), 2.0);

        assert!(matches!(
            events[0],
            ResolveEvent::Failed(LayerLoadError::UnsupportedBoundingVolume { .. })
        ));
        assert!(scene.flights().is_empty());
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn completion_after_remount_is_discarded() {
        let (mut mount, mut scene) = mounted();
        let mut source = StaticResourceSource::default();

        let mut pending = resolver().resolve(mount.token(), &iteration(), ActiveView::TwoD, &mut source);
        assert!(pending.poll(&mount, &mut source, &mut scene, &VectorPresentation::default(), 2.0).iter().all(|e| !matches!(e, ResolveEvent::Settled(_))));

        mount.remount(&mut scene).unwrap();
        source.stage_loaded(VECTOR_PATH, parcels());
        source.stage_loaded(RASTER_PATH, ortho(None));

        let events = pending.poll(&mount, &mut source, &mut scene, &VectorPresentation::default(), 2.0);
        assert!(events.is_empty());
        assert_eq!(scene.entity_count(), 0);
        assert!(scene.flights().is_empty());
        assert_eq!(source.released().len(), 2);
    }

    #[test]
    fn hidden_vector_layer_lands_hidden() {
        let (mount, mut scene) = mounted();
        let mut source = StaticResourceSource::default();
        source.stage_loaded(VECTOR_PATH, parcels());
        source.stage_loaded(RASTER_PATH, ortho(None));

        let presentation = VectorPresentation {
            visible: false,
            ..Default::default()
        };
        let mut pending = resolver().resolve(mount.token(), &iteration(), ActiveView::TwoD, &mut source);
        pending.poll(&mount, &mut source, &mut scene, &presentation, 2.0);

        assert!(scene
            .entities()
            .filter(|(_, e)| e.spec.kind() == EntityKind::Feature)
            .all(|(_, e)| !e.visible));
    }

    #[test]
    fn iteration_without_layers_settles_immediately() {
        let (mount, mut scene) = mounted();
        let mut source = StaticResourceSource::default();
        let mut bare = iteration();
        bare.mesh_url = None;

        let mut pending = resolver().resolve(mount.token(), &bare, ActiveView::ThreeD, &mut source);
        let events = pending.poll(&mount, &mut source, &mut scene, &VectorPresentation::default(), 2.0);

        assert_eq!(events, vec![ResolveEvent::Settled(Vec::new())]);
        assert!(source.requests().is_empty());
    }

    #[test]
    fn empty_vector_document_is_a_failed_layer() {
        let (mount, mut scene) = mounted();
        let mut source = StaticResourceSource::default();
        source.stage_loaded(
            VECTOR_PATH,
            LayerResource::Vector(VectorDocument::from_json(r#"{"features": []}"#).unwrap()),
        );
        source.stage_loaded(RASTER_PATH, ortho(Some([0.0, 0.0, 10.0, 10.0])));

        let mut pending = resolver().resolve(mount.token(), &iteration(), ActiveView::TwoD, &mut source);
        let events = pending.poll(&mount, &mut source, &mut scene, &VectorPresentation::default(), 2.0);

        assert!(events.contains(&ResolveEvent::Failed(LayerLoadError::EmptyDocument {
            kind: LayerKind::Vector,
            path: VECTOR_PATH.into(),
        })));
        assert_eq!(events.last(), Some(&ResolveEvent::Settled(vec![LayerKind::Raster])));
    }
}
