use crate::engine::scene::adapter::SceneAdapter;
use crate::engine::scene::entity::{EntityHandle, EntitySpec, Geometry, ScreenPoint};
use crate::geometry::{WorldPoint, distance, format_distance, midpoint};
use bevy::prelude::*;
use constants::render_settings::{
    MARKER_COLOUR, MARKER_PIXEL_SIZE, MEASURE_LABEL_COLOUR, MEASURE_LABEL_FONT_SIZE,
    MEASURE_LABEL_PIXEL_OFFSET, MEASURE_LINE_COLOUR, MEASURE_LINE_WIDTH, MEASURE_PREVIEW_WIDTH,
};

/// A completed two-point measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: u64,
    pub start: WorldPoint,
    pub end: WorldPoint,
    pub distance: f64,
    pub label: String,
}

impl Measurement {
    pub fn new(id: u64, start: WorldPoint, end: WorldPoint) -> Self {
        let metres = distance(start, end);
        Self {
            id,
            start,
            end,
            distance: metres,
            label: format_distance(metres),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "start": self.start.to_array(),
            "end": self.end.to_array(),
            "distance": self.distance,
            "label": self.label,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MeasureState {
    /// Waiting for the first point.
    Collecting0,
    /// First point placed and marked.
    Collecting1 {
        start: WorldPoint,
        marker: EntityHandle,
    },
}

/// What a pointer event did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureStep {
    Started(WorldPoint),
    Updated { start: WorldPoint, current: WorldPoint },
    Completed { start: WorldPoint, end: WorldPoint },
    /// Nothing under the pointer, or nothing to do in this state.
    Ignored,
}

/// Two clicks measure a straight-line distance; the session then waits for the next pair.
#[derive(Debug)]
pub struct MeasurementSession {
    state: MeasureState,
    preview_line: Option<EntityHandle>,
    /// Markers, line and label of the last completed measurement.
    finalized: Vec<EntityHandle>,
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSession {
    pub fn new() -> Self {
        Self {
            state: MeasureState::Collecting0,
            preview_line: None,
            finalized: Vec::new(),
        }
    }

    /// Points placed towards the measurement in progress.
    pub fn committed_points(&self) -> Vec<WorldPoint> {
        match self.state {
            MeasureState::Collecting0 => Vec::new(),
            MeasureState::Collecting1 { start, .. } => vec![start],
        }
    }

    pub fn has_preview(&self) -> bool {
        self.preview_line.is_some()
    }

    pub fn primary(&mut self, scene: &mut dyn SceneAdapter, point: ScreenPoint) -> MeasureStep {
        let Some(position) = scene.project_to_world(point) else {
            return MeasureStep::Ignored;
        };

        match self.state {
            MeasureState::Collecting0 => {
                self.clear_finalized(scene);
                let marker = scene.add_entity(marker_at(position));
                self.state = MeasureState::Collecting1 {
                    start: position,
                    marker,
                };
                MeasureStep::Started(position)
            }
            MeasureState::Collecting1 { start, marker } => {
                if let Some(preview) = self.preview_line.take() {
                    scene.remove_entity(preview);
                }

                let end_marker = scene.add_entity(marker_at(position));
                let line = scene.add_entity(EntitySpec::Polyline {
                    positions: vec![start, position],
                    colour: MEASURE_LINE_COLOUR,
                    width: MEASURE_LINE_WIDTH,
                });
                let label = scene.add_entity(EntitySpec::Label {
                    position: midpoint(start, position),
                    text: format_distance(distance(start, position)),
                    colour: MEASURE_LABEL_COLOUR,
                    font_size: MEASURE_LABEL_FONT_SIZE,
                    pixel_offset: Vec2::from_array(MEASURE_LABEL_PIXEL_OFFSET),
                });

                self.finalized = vec![marker, end_marker, line, label];
                self.state = MeasureState::Collecting0;
                MeasureStep::Completed {
                    start,
                    end: position,
                }
            }
        }
    }

    /// Redraw the rubber-band segment from the first point to the cursor.
    pub fn pointer_move(&mut self, scene: &mut dyn SceneAdapter, point: ScreenPoint) -> MeasureStep {
        let MeasureState::Collecting1 { start, .. } = self.state else {
            return MeasureStep::Ignored;
        };
        let Some(current) = scene.project_to_world(point) else {
            return MeasureStep::Ignored;
        };

        let positions = vec![start, current];
        match self.preview_line {
            Some(preview) => scene.set_geometry(preview, Geometry::Polyline(positions)),
            None => {
                self.preview_line = Some(scene.add_entity(EntitySpec::Polyline {
                    positions,
                    colour: MEASURE_LINE_COLOUR,
                    width: MEASURE_PREVIEW_WIDTH,
                }));
            }
        }

        MeasureStep::Updated { start, current }
    }

    /// Remove the last completed measurement's visuals.
    pub fn clear_finalized(&mut self, scene: &mut dyn SceneAdapter) {
        for handle in self.finalized.drain(..) {
            scene.remove_entity(handle);
        }
    }

    /// Remove everything the session put in the scene and wait for a first point again.
    pub fn teardown(&mut self, scene: &mut dyn SceneAdapter) {
        if let MeasureState::Collecting1 { marker, .. } = self.state {
            scene.remove_entity(marker);
        }
        if let Some(preview) = self.preview_line.take() {
            scene.remove_entity(preview);
        }
        self.clear_finalized(scene);
        self.state = MeasureState::Collecting0;
    }
}

fn marker_at(position: WorldPoint) -> EntitySpec {
    EntitySpec::Marker {
        position,
        colour: MARKER_COLOUR,
        pixel_size: MARKER_PIXEL_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scene::adapter::SceneContainer;
    use crate::engine::scene::entity::EntityKind;
    use crate::engine::scene::recording::RecordingScene;

    fn live_scene() -> RecordingScene {
        let mut scene = RecordingScene::default();
        scene.create(&SceneContainer::new("test"));
        scene
    }

    #[test]
    fn two_clicks_render_one_labelled_segment() {
        let mut scene = live_scene();
        let mut session = MeasurementSession::new();

        assert_eq!(
            session.primary(&mut scene, Vec2::new(0.0, 0.0)),
            MeasureStep::Started(WorldPoint::ZERO)
        );
        assert_eq!(scene.count(EntityKind::Marker), 1);

        let step = session.primary(&mut scene, Vec2::new(3.0, 4.0));
        assert_eq!(
            step,
            MeasureStep::Completed {
                start: WorldPoint::ZERO,
                end: WorldPoint::new(3.0, 4.0, 0.0)
            }
        );
        assert_eq!(scene.count(EntityKind::Marker), 2);
        assert_eq!(scene.count(EntityKind::Line), 1);
        assert_eq!(scene.label_texts(), vec!["5.00 meters".to_string()]);
        assert!(session.committed_points().is_empty());

        let label = scene.handles_of(EntityKind::Label)[0];
        assert_eq!(
            scene.entity(label).unwrap().geometry,
            Some(Geometry::Point(WorldPoint::new(1.5, 2.0, 0.0)))
        );
    }

    #[test]
    fn moves_replace_a_single_preview() {
        let mut scene = live_scene();
        let mut session = MeasurementSession::new();

        assert_eq!(
            session.pointer_move(&mut scene, Vec2::new(5.0, 5.0)),
            MeasureStep::Ignored
        );
        assert!(!session.has_preview());

        session.primary(&mut scene, Vec2::new(0.0, 0.0));
        session.pointer_move(&mut scene, Vec2::new(1.0, 0.0));
        session.pointer_move(&mut scene, Vec2::new(2.0, 0.0));
        session.pointer_move(&mut scene, Vec2::new(7.0, 0.0));

        let lines = scene.handles_of(EntityKind::Line);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            scene.entity(lines[0]).unwrap().geometry,
            Some(Geometry::Polyline(vec![
                WorldPoint::ZERO,
                WorldPoint::new(7.0, 0.0, 0.0)
            ]))
        );

        // Completing swaps the preview for the finalised segment.
        session.primary(&mut scene, Vec2::new(7.0, 0.0));
        assert_eq!(scene.count(EntityKind::Line), 1);
        assert!(!session.has_preview());
    }

    #[test]
    fn click_over_sky_is_ignored() {
        let mut scene = live_scene();
        scene.script_sky(Vec2::new(9.0, 9.0));
        let mut session = MeasurementSession::new();

        assert_eq!(
            session.primary(&mut scene, Vec2::new(9.0, 9.0)),
            MeasureStep::Ignored
        );
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn new_pair_clears_previous_result() {
        let mut scene = live_scene();
        let mut session = MeasurementSession::new();
        session.primary(&mut scene, Vec2::new(0.0, 0.0));
        session.primary(&mut scene, Vec2::new(1.0, 0.0));

        session.primary(&mut scene, Vec2::new(10.0, 0.0));
        assert_eq!(scene.count(EntityKind::Marker), 1);
        assert_eq!(scene.count(EntityKind::Label), 0);
    }

    #[test]
    fn teardown_leaves_nothing_behind() {
        let mut scene = live_scene();
        let mut session = MeasurementSession::new();
        session.primary(&mut scene, Vec2::new(0.0, 0.0));
        session.primary(&mut scene, Vec2::new(1.0, 0.0));
        session.primary(&mut scene, Vec2::new(2.0, 0.0));
        session.pointer_move(&mut scene, Vec2::new(3.0, 0.0));

        session.teardown(&mut scene);
        assert_eq!(scene.entity_count(), 0);
        assert!(session.committed_points().is_empty());
    }

    #[test]
    fn record_carries_formatted_distance() {
        let measurement = Measurement::new(
            7,
            WorldPoint::new(1.0, 1.0, 0.0),
            WorldPoint::new(1.0, 1.0, 2.5),
        );
        assert_eq!(measurement.label, "2.50 meters");
        assert_eq!(measurement.to_json()["id"], 7);
    }
}
