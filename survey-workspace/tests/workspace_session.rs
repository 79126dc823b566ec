use bevy::math::DVec3;
use bevy::prelude::*;
use std::sync::{Arc, Mutex};
use survey_workspace::engine::assets::iteration::Iteration;
use survey_workspace::engine::assets::vector_document::VectorDocument;
use survey_workspace::engine::core::config::WorkspaceConfig;
use survey_workspace::engine::loading::layer_resolver::VectorStyle;
use survey_workspace::engine::loading::resource_source::{LayerKind, LayerResource};
use survey_workspace::engine::loading::static_source::StaticResourceSource;
use survey_workspace::engine::scene::adapter::{CameraTarget, SceneContainer};
use survey_workspace::engine::scene::entity::{EntityHandle, EntityKind};
use survey_workspace::engine::scene::recording::RecordingScene;
use survey_workspace::tools::draw::ShapeKind;
use survey_workspace::tools::picking::PickedFeatureInfo;
use survey_workspace::tools::pointer::PointerEvent;
use survey_workspace::tools::tool_manager::{InteractionMode, ToolSession};
use survey_workspace::workspace::events::WorkspaceEvent;
use survey_workspace::workspace::orchestrator::Workspace;
use survey_workspace::workspace::view::ActiveView;

struct Session {
    workspace: Workspace,
    scene: RecordingScene,
    source: StaticResourceSource,
}

impl Session {
    fn mounted() -> Self {
        let mut workspace = Workspace::new(WorkspaceConfig::default()).unwrap();
        let mut scene = RecordingScene::default();
        let mut source = StaticResourceSource::default();
        workspace
            .mount(SceneContainer::new("#bevy"), &mut scene, &mut source)
            .unwrap();
        Self {
            workspace,
            scene,
            source,
        }
    }

    fn mode(&mut self, mode: InteractionMode) {
        self.workspace
            .set_interaction_mode(mode, &mut self.scene)
            .unwrap();
    }

    /// Queue `events` and run one frame.
    fn frame(&mut self, events: &[PointerEvent]) {
        for event in events {
            self.workspace.push_pointer(*event);
        }
        self.workspace.tick(&mut self.scene, &mut self.source);
    }

    fn load(&mut self, iterations: Vec<Iteration>) {
        self.workspace
            .load_iterations(iterations, &mut self.scene, &mut self.source)
            .unwrap();
    }

    fn select(&mut self, id: &str) {
        self.workspace
            .select_iteration(id, &mut self.scene, &mut self.source)
            .unwrap();
    }

    fn features(&self) -> Vec<EntityHandle> {
        self.scene.handles_of(EntityKind::Feature)
    }

    fn colour_of(&self, handle: EntityHandle) -> Color {
        self.scene.entity(handle).unwrap().material.unwrap().colour
    }
}

fn click(x: f32, y: f32) -> PointerEvent {
    PointerEvent::Primary(Vec2::new(x, y))
}

fn hover(x: f32, y: f32) -> PointerEvent {
    PointerEvent::Move(Vec2::new(x, y))
}

fn finish() -> PointerEvent {
    PointerEvent::Secondary(Vec2::ZERO)
}

fn iteration(
    id: &str,
    modified: &str,
    mesh: Option<&str>,
    vector: Option<&str>,
    raster: Option<&str>,
) -> Iteration {
    Iteration {
        id: id.to_string(),
        revision: format!("{id}-rev"),
        modified_time: modified.parse().unwrap(),
        mesh_url: mesh.map(str::to_string),
        vector_url: vector.map(str::to_string),
        raster_url: raster.map(str::to_string),
    }
}

fn parcels() -> LayerResource {
    LayerResource::Vector(
        VectorDocument::from_json(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"name": "North", "_owner": "council"},
                 "geometry": {"type": "Polygon",
                    "coordinates": [[[0, 0], [40, 0], [40, 30], [0, 30], [0, 0]]]}},
                {"type": "Feature", "properties": {"name": "South"},
                 "geometry": {"type": "Polygon",
                    "coordinates": [[[0, -30], [40, -30], [40, 0], [0, 0], [0, -30]]]}}
            ]}"#,
        )
        .unwrap(),
    )
}

/// Session on a vector-only iteration whose two parcels have loaded.
fn with_parcels() -> Session {
    let mut session = Session::mounted();
    session.source.stage_loaded("/project/site/vector/doc.geojson", parcels());
    session.load(vec![iteration(
        "site",
        "2024-05-01T09:00:00Z",
        None,
        Some("site/vector"),
        None,
    )]);
    session.frame(&[]);
    assert_eq!(session.features().len(), 2);
    session.workspace.drain_events();
    session
}

#[test]
fn polygon_is_finalized_without_the_floating_vertex() {
    let mut session = Session::mounted();
    session.mode(InteractionMode::DrawPolygon);

    session.frame(&[click(0.0, 0.0), click(10.0, 0.0), click(10.0, 10.0)]);
    session.frame(&[hover(0.0, 25.0)]);
    assert_eq!(session.scene.count(EntityKind::Marker), 3);
    let Some(ToolSession::Draw(draw)) = session.workspace.tools().session() else {
        panic!("expected a draw session");
    };
    assert_eq!(draw.committed_vertices().len(), 3);
    assert_eq!(draw.floating_vertex(), Some(DVec3::new(0.0, 25.0, 0.0)));

    session.frame(&[finish()]);

    let shapes = session.workspace.finalized_shapes();
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].kind, ShapeKind::Polygon);
    assert_eq!(shapes[0].vertices.len(), 3);
    assert_eq!(session.scene.count(EntityKind::Area), 1);
    assert_eq!(session.scene.count(EntityKind::Marker), 0);

    let published = session.workspace.drain_events();
    let Some(WorkspaceEvent::ShapeFinalized(shape)) = published.last() else {
        panic!("expected a finalized shape, got {published:?}");
    };
    assert_eq!(shape.to_json()["area"], 50.0);
}

#[test]
fn switching_mode_mid_measurement_leaves_a_clean_draw_session() {
    let mut session = Session::mounted();
    session.mode(InteractionMode::Measure);
    session.frame(&[click(3.0, 4.0)]);
    assert_eq!(session.scene.count(EntityKind::Marker), 1);

    session.mode(InteractionMode::DrawLine);

    assert_eq!(session.scene.entity_count(), 0);
    let Some(ToolSession::Draw(draw)) = session.workspace.tools().session() else {
        panic!("expected a draw session");
    };
    assert_eq!(draw.kind(), ShapeKind::Line);
    assert!(draw.committed_vertices().is_empty());
    assert!(session.workspace.last_measurement().is_none());
}

#[test]
fn measurement_is_recorded_and_labelled() {
    let mut session = Session::mounted();
    session.mode(InteractionMode::Measure);
    session.frame(&[click(0.0, 0.0)]);
    session.frame(&[hover(3.0, 0.0)]);
    session.frame(&[click(6.0, 8.0)]);

    let measurement = session.workspace.last_measurement().unwrap();
    assert_eq!(measurement.distance, 10.0);
    assert_eq!(session.scene.label_texts(), vec!["10.00 meters".to_string()]);
    assert_eq!(session.scene.count(EntityKind::Line), 1);

    let methods: Vec<&str> = session
        .workspace
        .drain_events()
        .iter()
        .map(|event| event.method())
        .collect();
    assert_eq!(
        methods,
        vec![
            "interaction_mode_changed",
            "measure_started",
            "measure_updated",
            "measure_completed"
        ]
    );
}

#[test]
fn picking_moves_the_highlight_and_clears_on_empty_ground() {
    let mut session = with_parcels();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session
        .workspace
        .on_feature_picked(Box::new(move |info: Option<&PickedFeatureInfo>| {
            let name = info.and_then(|info| info.get("name")).map(str::to_string);
            sink.lock().unwrap().push(name);
        }));

    let [north, south] = session.features()[..] else {
        panic!("expected two parcels");
    };
    let fill = session.colour_of(north);
    let highlight = VectorStyle::default().highlight().colour;
    session.scene.script_pick(Vec2::new(10.0, 10.0), north);
    session.scene.script_pick(Vec2::new(10.0, -10.0), south);

    session.frame(&[click(10.0, 10.0)]);
    assert_eq!(session.colour_of(north), highlight);
    assert_eq!(
        session.workspace.picked_feature().unwrap().get("owner"),
        Some("council")
    );

    session.frame(&[click(10.0, -10.0)]);
    assert_eq!(session.colour_of(north), fill);
    assert_eq!(session.colour_of(south), highlight);

    session.frame(&[click(500.0, 500.0)]);
    assert_eq!(session.colour_of(south), fill);
    assert!(session.workspace.picked_feature().is_none());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some("North".to_string()), Some("South".to_string()), None]
    );
}

#[test]
fn restyling_keeps_the_highlight_until_deselection() {
    let mut session = with_parcels();
    let [north, south] = session.features()[..] else {
        panic!("expected two parcels");
    };
    session.scene.script_pick(Vec2::new(5.0, 5.0), north);
    session.frame(&[click(5.0, 5.0)]);

    let style = VectorStyle {
        colour: Color::srgb(0.1, 0.2, 0.9),
        opacity: 0.4,
    };
    session.workspace.set_vector_style(style, &mut session.scene);

    assert_eq!(session.colour_of(north), style.highlight().colour);
    assert_eq!(session.colour_of(south), style.fill().colour);

    session.frame(&[click(500.0, 500.0)]);
    assert_eq!(session.colour_of(north), style.fill().colour);
}

#[test]
fn hiding_the_vector_layer_drops_the_selection() {
    let mut session = with_parcels();
    let north = session.features()[0];
    session.scene.script_pick(Vec2::new(5.0, 5.0), north);
    session.frame(&[click(5.0, 5.0)]);
    session.workspace.drain_events();

    session.workspace.set_vector_visible(false, &mut session.scene);

    assert!(session.workspace.picked_feature().is_none());
    assert!(!session.scene.entity(north).unwrap().visible);
    assert_eq!(
        session.workspace.drain_events(),
        vec![WorkspaceEvent::FeaturePicked(None)]
    );
}

#[test]
fn interaction_mode_survives_an_iteration_switch() {
    let mut session = Session::mounted();
    session.load(vec![
        iteration("march", "2024-03-01T00:00:00Z", None, Some("march/v"), None),
        iteration("april", "2024-04-01T00:00:00Z", None, Some("april/v"), None),
    ]);
    session.mode(InteractionMode::Measure);
    session.frame(&[click(1.0, 1.0)]);
    assert_eq!(session.scene.count(EntityKind::Marker), 1);

    session.select("march");

    assert_eq!(session.scene.created_count(), 3);
    assert_eq!(session.workspace.interaction_mode(), InteractionMode::Measure);
    assert_eq!(session.scene.count(EntityKind::Marker), 0);
    assert_eq!(session.workspace.tools().session().unwrap().uncommitted_points(), 0);

    session.workspace.drain_events();
    session.frame(&[click(2.0, 2.0)]);
    assert!(matches!(
        session.workspace.drain_events().as_slice(),
        [WorkspaceEvent::MeasurementStarted(_)]
    ));
    assert_eq!(session.scene.writes_while_dead(), 0);
}

#[test]
fn load_for_a_replaced_iteration_is_discarded() {
    let mut session = Session::mounted();
    session.load(vec![
        iteration("march", "2024-03-01T00:00:00Z", None, Some("march/v"), None),
        iteration("april", "2024-04-01T00:00:00Z", None, Some("april/v"), None),
    ]);
    assert_eq!(
        session.source.requested_paths(),
        vec!["/project/april/v/doc.geojson"]
    );

    session.select("march");
    assert_eq!(session.source.in_flight_count(), 1);
    session.source.stage_loaded("/project/april/v/doc.geojson", parcels());
    session.source.stage_loaded("/project/march/v/doc.geojson", parcels());
    session.workspace.drain_events();
    session.frame(&[]);

    assert!(session.workspace.loading_progress().is_none());
    assert_eq!(session.source.released().len(), 1);
    assert_eq!(session.features().len(), 2);
    let settled: Vec<String> = session
        .workspace
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            WorkspaceEvent::LayersSettled { iteration_id, .. } => Some(iteration_id),
            _ => None,
        })
        .collect();
    assert_eq!(settled, vec!["march".to_string()]);
}

#[test]
fn missing_orthophoto_still_shows_the_vector_layer() {
    let mut session = Session::mounted();
    session.source.stage_loaded("/project/site/vector/doc.geojson", parcels());
    session
        .source
        .stage_failed("/project/site/ortho/tilejson.json", "404 Not Found");
    session.load(vec![iteration(
        "site",
        "2024-05-01T09:00:00Z",
        None,
        Some("site/vector"),
        Some("site/ortho"),
    )]);
    session.frame(&[]);

    assert_eq!(session.workspace.layers().loaded_kinds(), vec![LayerKind::Vector]);
    assert_eq!(session.workspace.layers().failures.len(), 1);
    let published = session.workspace.drain_events();
    assert!(published.contains(&WorkspaceEvent::LayerLoaded {
        kind: LayerKind::Vector
    }));
    assert!(published.iter().any(|event| matches!(
        event,
        WorkspaceEvent::LayerFailed {
            kind: LayerKind::Raster,
            ..
        }
    )));

    let (target, _) = session.scene.flights()[0];
    let CameraTarget::Bounds(bounds) = target else {
        panic!("expected bounds target, got {target:?}");
    };
    assert_eq!((bounds.min_y, bounds.max_y), (-30.0, 30.0));
}

#[test]
fn newest_iteration_opens_in_three_d() {
    let mut session = Session::mounted();
    session.load(vec![
        iteration("old", "2023-11-20T00:00:00Z", None, Some("old/v"), None),
        iteration("new", "2024-06-02T00:00:00Z", Some("new/mesh"), Some("new/v"), None),
    ]);

    assert_eq!(session.workspace.selected_iteration().unwrap().id, "new");
    assert_eq!(session.workspace.active_view(), Some(ActiveView::ThreeD));
    let state = session.workspace.view_state();
    assert!(state.three_d_enabled && state.two_d_enabled);
    assert_eq!(
        session.source.requested_paths(),
        vec!["/project/new/mesh/tileset.json"]
    );
}

#[test]
fn bundled_iteration_list_loads() {
    let iterations = Iteration::list_from_json(include_str!("../assets/iterations.json")).unwrap();
    assert!(!iterations[0].has_mesh());

    let mut session = Session::mounted();
    session.load(iterations);

    assert_eq!(session.workspace.selected_iteration().unwrap().id, "102");
    assert_eq!(
        session.source.requested_paths(),
        vec!["/project/site-a/2024-06/mesh/tileset.json"]
    );
}
