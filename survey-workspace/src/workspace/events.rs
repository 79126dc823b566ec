use crate::engine::assets::iteration::Iteration;
use crate::engine::loading::layer_resolver::VectorStyle;
use crate::engine::loading::resource_source::LayerKind;
use crate::geometry::{WorldPoint, distance, format_distance};
use crate::tools::draw::FinalizedShape;
use crate::tools::measure::Measurement;
use crate::tools::picking::PickedFeatureInfo;
use crate::tools::tool_manager::InteractionMode;
use crate::workspace::view::{ActiveView, ViewState};
use bevy::prelude::*;
use serde_json::{Value, json};

/// Something the host page should hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceEvent {
    InteractionModeChanged(InteractionMode),
    FeaturePicked(Option<PickedFeatureInfo>),
    MeasurementStarted(WorldPoint),
    /// Live distance while the second point follows the pointer.
    MeasurementUpdated { start: WorldPoint, current: WorldPoint },
    MeasurementCompleted(Measurement),
    ShapeFinalized(FinalizedShape),
    IterationSelected { id: String, revision: String },
    ViewChanged(ViewState),
    LayerLoaded { kind: LayerKind },
    LayerFailed { kind: LayerKind, reason: String },
    LayersSettled { iteration_id: String, loaded: Vec<LayerKind> },
    /// A queued command could not be applied.
    CommandRejected { reason: String },
}

impl WorkspaceEvent {
    /// Notification name on the RPC channel.
    pub fn method(&self) -> &'static str {
        match self {
            Self::InteractionModeChanged(_) => "interaction_mode_changed",
            Self::FeaturePicked(_) => "feature_picked",
            Self::MeasurementStarted(_) => "measure_started",
            Self::MeasurementUpdated { .. } => "measure_updated",
            Self::MeasurementCompleted(_) => "measure_completed",
            Self::ShapeFinalized(_) => "shape_finalized",
            Self::IterationSelected { .. } => "iteration_selected",
            Self::ViewChanged(_) => "view_changed",
            Self::LayerLoaded { .. } => "layer_loaded",
            Self::LayerFailed { .. } => "layer_failed",
            Self::LayersSettled { .. } => "layers_settled",
            Self::CommandRejected { .. } => "command_rejected",
        }
    }

    pub fn params(&self) -> Value {
        match self {
            Self::InteractionModeChanged(mode) => json!({ "mode": mode }),
            Self::FeaturePicked(info) => json!({ "feature": info }),
            Self::MeasurementStarted(start) => json!({ "start": start.to_array() }),
            Self::MeasurementUpdated { start, current } => {
                let metres = distance(*start, *current);
                json!({
                    "start": start.to_array(),
                    "current": current.to_array(),
                    "distance": metres,
                    "label": format_distance(metres),
                })
            }
            Self::MeasurementCompleted(measurement) => measurement.to_json(),
            Self::ShapeFinalized(shape) => shape.to_json(),
            Self::IterationSelected { id, revision } => json!({ "id": id, "revision": revision }),
            Self::ViewChanged(state) => json!(state),
            Self::LayerLoaded { kind } => json!({ "kind": kind }),
            Self::LayerFailed { kind, reason } => json!({ "kind": kind, "reason": reason }),
            Self::LayersSettled {
                iteration_id,
                loaded,
            } => json!({ "iteration_id": iteration_id, "loaded": loaded }),
            Self::CommandRejected { reason } => json!({ "reason": reason }),
        }
    }
}

/// Host and keyboard requests that change workspace state, applied once per frame before
/// pointer input.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum WorkspaceCommand {
    SetInteractionMode(InteractionMode),
    LoadIterations(Vec<Iteration>),
    SelectIteration(String),
    SetActiveView(ActiveView),
    ClearAnnotations,
    SetVectorStyle(VectorStyle),
    SetVectorVisible(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_measurement_reports_distance() {
        let event = WorkspaceEvent::MeasurementUpdated {
            start: WorldPoint::ZERO,
            current: WorldPoint::new(6.0, 8.0, 0.0),
        };
        assert_eq!(event.method(), "measure_updated");
        assert_eq!(event.params()["label"], "10.00 meters");
    }

    #[test]
    fn empty_pick_serialises_as_null() {
        let event = WorkspaceEvent::FeaturePicked(None);
        assert_eq!(event.params(), json!({ "feature": null }));
    }

    #[test]
    fn view_state_is_flat_json() {
        let event = WorkspaceEvent::ViewChanged(ViewState {
            active: Some(ActiveView::ThreeD),
            three_d_enabled: true,
            two_d_enabled: false,
        });
        assert_eq!(
            event.params(),
            json!({ "active": "3d", "three_d_enabled": true, "two_d_enabled": false })
        );
    }
}
