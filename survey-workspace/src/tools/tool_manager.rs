use crate::engine::scene::adapter::SceneAdapter;
use crate::error::WorkspaceError;
use crate::geometry::WorldPoint;
use crate::tools::draw::{DrawSession, DrawStep, FinalizedShape, ShapeKind};
use crate::tools::measure::{MeasureStep, Measurement, MeasurementSession};
use crate::tools::picking::{PickedFeatureInfo, PickingTool};
use crate::tools::pointer::{PointerConsumer, PointerEvent, PointerRouter};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    #[default]
    None,
    Measure,
    #[serde(rename = "line")]
    DrawLine,
    #[serde(rename = "polygon")]
    DrawPolygon,
}

impl InteractionMode {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "measure" | "distance" => Some(Self::Measure),
            "line" | "drawline" | "draw_line" => Some(Self::DrawLine),
            "polygon" | "drawpolygon" | "draw_polygon" => Some(Self::DrawPolygon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Measure => "measure",
            Self::DrawLine => "line",
            Self::DrawPolygon => "polygon",
        }
    }

    /// Who receives pointer input while this mode is active.
    pub fn pointer_consumer(&self) -> PointerConsumer {
        match self {
            Self::None => PointerConsumer::Picking,
            Self::Measure => PointerConsumer::Measure,
            Self::DrawLine | Self::DrawPolygon => PointerConsumer::Draw,
        }
    }

    fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            Self::DrawLine => Some(ShapeKind::Line),
            Self::DrawPolygon => Some(ShapeKind::Polygon),
            Self::None | Self::Measure => None,
        }
    }
}

/// The session owned by whichever consumer holds the pointer.
#[derive(Debug)]
pub enum ToolSession {
    Picking,
    Measure(MeasurementSession),
    Draw(DrawSession),
}

impl ToolSession {
    fn for_mode(mode: InteractionMode) -> Self {
        match (mode, mode.shape_kind()) {
            (InteractionMode::Measure, _) => Self::Measure(MeasurementSession::new()),
            (_, Some(kind)) => Self::Draw(DrawSession::new(kind)),
            _ => Self::Picking,
        }
    }

    /// Points clicked but not yet turned into a result.
    pub fn uncommitted_points(&self) -> usize {
        match self {
            Self::Picking => 0,
            Self::Measure(session) => session.committed_points().len(),
            Self::Draw(session) => session.committed_vertices().len(),
        }
    }
}

/// Results of one pointer event, for the orchestrator to record and publish.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    FeaturePicked(Option<PickedFeatureInfo>),
    MeasurementStarted(WorldPoint),
    MeasurementUpdated { start: WorldPoint, current: WorldPoint },
    MeasurementCompleted(Measurement),
    ShapeFinalized(FinalizedShape),
}

/// Owns the interaction mode and switches between tools transactionally: the outgoing
/// session is torn down and its pointer subscription released before the incoming one
/// subscribes and starts empty.
#[derive(Debug)]
pub struct ToolManager {
    mode: InteractionMode,
    router: PointerRouter,
    picking: PickingTool,
    session: Option<ToolSession>,
    next_measurement_id: u64,
    next_shape_id: u64,
}

impl ToolManager {
    pub fn new(picking: PickingTool) -> Self {
        Self {
            mode: InteractionMode::None,
            router: PointerRouter::default(),
            picking,
            session: None,
            next_measurement_id: 0,
            next_shape_id: 0,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn session(&self) -> Option<&ToolSession> {
        self.session.as_ref()
    }

    pub fn active_consumer(&self) -> Option<PointerConsumer> {
        self.router.active()
    }

    pub fn picking(&self) -> &PickingTool {
        &self.picking
    }

    pub fn picking_mut(&mut self) -> &mut PickingTool {
        &mut self.picking
    }

    /// Switch modes. Returns `false` when `mode` is already active.
    pub fn activate(
        &mut self,
        mode: InteractionMode,
        scene: &mut dyn SceneAdapter,
    ) -> Result<bool, WorkspaceError> {
        if mode == self.mode && self.session.is_some() {
            return Ok(false);
        }

        self.exit(scene);
        self.enter(mode)?;
        info!("Interaction mode: {}", mode.as_str());
        Ok(true)
    }

    /// Tear down the live session ahead of a scene being destroyed. The mode is kept so
    /// [`ToolManager::resume`] can re-enter it on the next scene.
    pub fn teardown(&mut self, scene: &mut dyn SceneAdapter) {
        self.exit(scene);
        self.picking.forget();
    }

    /// Choose the mode to enter on the next [`ToolManager::resume`], while no scene is up.
    pub fn defer(&mut self, mode: InteractionMode) {
        if self.session.is_none() {
            self.mode = mode;
        }
    }

    pub fn resume(&mut self) -> Result<(), WorkspaceError> {
        if self.session.is_none() {
            self.enter(self.mode)?;
        }
        Ok(())
    }

    /// Remove visuals of completed measurements and shapes, keeping any capture in progress.
    pub fn clear_finalized_visuals(&mut self, scene: &mut dyn SceneAdapter) {
        match &mut self.session {
            Some(ToolSession::Measure(session)) => session.clear_finalized(scene),
            Some(ToolSession::Draw(session)) => session.clear_finalized(scene),
            Some(ToolSession::Picking) | None => {}
        }
    }

    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        scene: &mut dyn SceneAdapter,
    ) -> Vec<ToolOutcome> {
        let mut outcomes = Vec::new();
        let Some(session) = &mut self.session else {
            return outcomes;
        };

        match session {
            ToolSession::Picking => {
                if let PointerEvent::Primary(point) = event {
                    let info = self.picking.pick(scene, point).cloned();
                    outcomes.push(ToolOutcome::FeaturePicked(info));
                }
            }
            ToolSession::Measure(measure) => {
                let step = match event {
                    PointerEvent::Primary(point) => measure.primary(scene, point),
                    PointerEvent::Move(point) => measure.pointer_move(scene, point),
                    PointerEvent::Secondary(_) => MeasureStep::Ignored,
                };
                match step {
                    MeasureStep::Started(start) => {
                        outcomes.push(ToolOutcome::MeasurementStarted(start));
                    }
                    MeasureStep::Updated { start, current } => {
                        outcomes.push(ToolOutcome::MeasurementUpdated { start, current });
                    }
                    MeasureStep::Completed { start, end } => {
                        self.next_measurement_id += 1;
                        let measurement = Measurement::new(self.next_measurement_id, start, end);
                        info!("Measured {}", measurement.label);
                        outcomes.push(ToolOutcome::MeasurementCompleted(measurement));
                    }
                    MeasureStep::Ignored => {}
                }
            }
            ToolSession::Draw(draw) => {
                let step = match event {
                    PointerEvent::Primary(point) => draw.primary(scene, point),
                    PointerEvent::Move(point) => draw.pointer_move(scene, point),
                    PointerEvent::Secondary(_) => draw.finalize(scene),
                };
                match step {
                    DrawStep::Finalized(vertices) => {
                        self.next_shape_id += 1;
                        let shape = FinalizedShape {
                            id: self.next_shape_id,
                            kind: draw.kind(),
                            vertices,
                        };
                        info!("Finalized {:?} with {} vertices", shape.kind, shape.vertices.len());
                        outcomes.push(ToolOutcome::ShapeFinalized(shape));
                    }
                    DrawStep::Discarded => debug!("Discarded shape with too few vertices"),
                    _ => {}
                }
            }
        }

        outcomes
    }

    fn exit(&mut self, scene: &mut dyn SceneAdapter) {
        let Some(session) = self.session.take() else {
            return;
        };
        match session {
            ToolSession::Picking => {}
            ToolSession::Measure(mut measure) => measure.teardown(scene),
            ToolSession::Draw(mut draw) => draw.teardown(scene),
        }
        self.router.release(self.mode.pointer_consumer());
    }

    fn enter(&mut self, mode: InteractionMode) -> Result<(), WorkspaceError> {
        self.router.subscribe(mode.pointer_consumer())?;
        self.mode = mode;
        self.session = Some(ToolSession::for_mode(mode));
        Ok(())
    }
}
