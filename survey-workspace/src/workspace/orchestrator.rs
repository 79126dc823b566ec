//! The workspace session: one mounted scene, the iteration on show, the layers loaded for
//! it and the interaction tools working over it.
//!
//! The orchestrator is the only owner of the scene for the lifetime of a mount. Every
//! operation that touches the scene takes it by reference, so the same code drives the
//! Bevy scene in the app and a [`RecordingScene`](crate::engine::scene::recording) in tests.

use crate::engine::assets::iteration::Iteration;
use crate::engine::core::config::WorkspaceConfig;
use crate::engine::loading::layer_resolver::{
    LayerResolver, LoadResult, PendingResolve, ResolveEvent, ResourceEndpoints,
    VectorPresentation, VectorStyle,
};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::loading::resource_source::ResourceSource;
use crate::engine::scene::adapter::{SceneAdapter, SceneContainer};
use crate::engine::scene::mount::SceneMount;
use crate::error::WorkspaceError;
use crate::tools::draw::FinalizedShape;
use crate::tools::measure::Measurement;
use crate::tools::picking::{PickedFeatureInfo, PickingTool};
use crate::tools::pointer::{PointerEvent, PointerQueue};
use crate::tools::tool_manager::{InteractionMode, ToolManager, ToolOutcome};
use crate::workspace::annotations::AnnotationLog;
use crate::workspace::events::{WorkspaceCommand, WorkspaceEvent};
use crate::workspace::view::{ActiveView, ViewState, default_view, select_latest, view_available};
use bevy::prelude::*;

/// Host callback for the attribute panel, called with `None` when the selection clears.
pub type FeaturePickedCallback = Box<dyn FnMut(Option<&PickedFeatureInfo>) + Send + Sync>;

pub struct Workspace {
    config: WorkspaceConfig,
    resolver: LayerResolver,
    presentation: VectorPresentation,
    mount: SceneMount,
    iterations: Vec<Iteration>,
    selected: Option<usize>,
    view: Option<ActiveView>,
    /// Layers of the last load that settled.
    layers: LoadResult,
    pending: Option<PendingResolve>,
    tools: ToolManager,
    pointer: PointerQueue,
    annotations: AnnotationLog,
    outbox: Vec<WorkspaceEvent>,
    feature_picked: Option<FeaturePickedCallback>,
}

impl Workspace {
    pub fn new(config: WorkspaceConfig) -> Result<Self, WorkspaceError> {
        let style = VectorStyle::from_config(&config)?;
        let resolver = LayerResolver::new(ResourceEndpoints::from_config(&config));

        Ok(Self {
            config,
            resolver,
            presentation: VectorPresentation {
                style,
                visible: true,
            },
            mount: SceneMount::default(),
            iterations: Vec::new(),
            selected: None,
            view: None,
            layers: LoadResult::default(),
            pending: None,
            tools: ToolManager::new(PickingTool::new(style.highlight())),
            pointer: PointerQueue::default(),
            annotations: AnnotationLog::default(),
            outbox: Vec::new(),
            feature_picked: None,
        })
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_mounted()
    }

    /// Create the scene in `container` and load the selected iteration into it.
    pub fn mount(
        &mut self,
        container: SceneContainer,
        scene: &mut dyn SceneAdapter,
        source: &mut dyn ResourceSource,
    ) -> Result<(), WorkspaceError> {
        self.mount.mount(container, scene)?;
        self.tools.resume()?;
        self.start_resolve(source);
        Ok(())
    }

    /// Tear down tools and pending loads, then destroy the scene.
    pub fn unmount(&mut self, scene: &mut dyn SceneAdapter, source: &mut dyn ResourceSource) {
        if !self.mount.is_mounted() {
            return;
        }
        self.release_scene(scene, source);
        self.mount.unmount(scene);
    }

    fn remount(
        &mut self,
        scene: &mut dyn SceneAdapter,
        source: &mut dyn ResourceSource,
    ) -> Result<(), WorkspaceError> {
        if !self.mount.is_mounted() {
            return Ok(());
        }
        self.release_scene(scene, source);
        self.mount.remount(scene)?;
        self.tools.resume()?;
        self.start_resolve(source);
        Ok(())
    }

    fn release_scene(&mut self, scene: &mut dyn SceneAdapter, source: &mut dyn ResourceSource) {
        let had_selection = self.tools.picking().picked().is_some();
        self.tools.teardown(scene);
        if had_selection {
            self.notify_feature_picked(None);
        }
        if let Some(pending) = self.pending.take() {
            pending.cancel(source);
        }
        self.layers = LoadResult::default();
        self.pointer.clear();
    }

    fn start_resolve(&mut self, source: &mut dyn ResourceSource) {
        let (Some(iteration), Some(view)) = (self.selected_iteration(), self.view) else {
            return;
        };
        if !self.mount.is_mounted() {
            return;
        }
        let pending = self
            .resolver
            .resolve(self.mount.token(), iteration, view, source);
        self.pending = Some(pending);
    }

    /// Replace the iteration list and show the most recently modified entry.
    pub fn load_iterations(
        &mut self,
        iterations: Vec<Iteration>,
        scene: &mut dyn SceneAdapter,
        source: &mut dyn ResourceSource,
    ) -> Result<(), WorkspaceError> {
        info!("Loaded {} iterations", iterations.len());
        self.iterations = iterations;
        let latest = select_latest(&self.iterations);
        self.show_iteration(latest, scene, source)
    }

    /// Show another iteration. Its view is chosen afresh; a manual view choice does not
    /// carry over.
    pub fn select_iteration(
        &mut self,
        id: &str,
        scene: &mut dyn SceneAdapter,
        source: &mut dyn ResourceSource,
    ) -> Result<(), WorkspaceError> {
        let index = self
            .iterations
            .iter()
            .position(|iteration| iteration.id == id)
            .ok_or_else(|| WorkspaceError::UnknownIteration(id.to_string()))?;
        self.show_iteration(Some(index), scene, source)
    }

    fn show_iteration(
        &mut self,
        index: Option<usize>,
        scene: &mut dyn SceneAdapter,
        source: &mut dyn ResourceSource,
    ) -> Result<(), WorkspaceError> {
        self.selected = index;
        self.view = self.selected_iteration().and_then(default_view);

        if let Some(iteration) = self.selected_iteration() {
            info!(
                "Selected iteration {} (revision {}), view {}",
                iteration.id,
                iteration.revision,
                self.view.map_or("none", |view| view.as_str())
            );
            let event = WorkspaceEvent::IterationSelected {
                id: iteration.id.clone(),
                revision: iteration.revision.clone(),
            };
            self.outbox.push(event);
        }
        self.outbox.push(WorkspaceEvent::ViewChanged(self.view_state()));

        self.remount(scene, source)
    }

    /// Switch between the 3D and 2D presentation of the selected iteration.
    pub fn set_active_view(
        &mut self,
        view: ActiveView,
        scene: &mut dyn SceneAdapter,
        source: &mut dyn ResourceSource,
    ) -> Result<(), WorkspaceError> {
        let iteration = self
            .selected_iteration()
            .ok_or(WorkspaceError::NoIterationSelected)?;
        if !view_available(iteration, view) {
            return Err(WorkspaceError::ViewUnavailable(view));
        }
        if self.view == Some(view) {
            return Ok(());
        }

        info!("Switching to {} view", view);
        self.view = Some(view);
        self.outbox.push(WorkspaceEvent::ViewChanged(self.view_state()));
        self.remount(scene, source)
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::for_iteration(self.selected_iteration(), self.view)
    }

    pub fn active_view(&self) -> Option<ActiveView> {
        self.view
    }

    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }

    pub fn selected_iteration(&self) -> Option<&Iteration> {
        self.selected.and_then(|index| self.iterations.get(index))
    }

    /// Switch tools. Input queued before the switch still goes to the outgoing tool, so
    /// the incoming one starts empty.
    pub fn set_interaction_mode(
        &mut self,
        mode: InteractionMode,
        scene: &mut dyn SceneAdapter,
    ) -> Result<(), WorkspaceError> {
        let changed = if self.mount.is_mounted() {
            self.deliver_pointer(scene);
            self.tools.activate(mode, scene)?
        } else {
            let changed = self.tools.mode() != mode;
            self.tools.defer(mode);
            changed
        };

        if changed {
            self.outbox.push(WorkspaceEvent::InteractionModeChanged(mode));
        }
        Ok(())
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.tools.mode()
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    /// Queue pointer input for the next [`Workspace::tick`].
    pub fn push_pointer(&mut self, event: PointerEvent) {
        self.pointer.push(event);
    }

    /// Deliver queued pointer input to the active tool, then apply any layers that have
    /// arrived.
    pub fn tick(&mut self, scene: &mut dyn SceneAdapter, source: &mut dyn ResourceSource) {
        if !self.mount.is_mounted() {
            self.pointer.clear();
            return;
        }

        self.deliver_pointer(scene);
        self.poll_layers(scene, source);
    }

    fn deliver_pointer(&mut self, scene: &mut dyn SceneAdapter) {
        let events: Vec<PointerEvent> = self.pointer.drain().collect();
        for event in events {
            for outcome in self.tools.handle_pointer(event, scene) {
                self.record(outcome);
            }
        }
    }

    fn record(&mut self, outcome: ToolOutcome) {
        match outcome {
            ToolOutcome::FeaturePicked(info) => self.notify_feature_picked(info),
            ToolOutcome::MeasurementStarted(start) => {
                self.outbox.push(WorkspaceEvent::MeasurementStarted(start));
            }
            ToolOutcome::MeasurementUpdated { start, current } => {
                self.outbox
                    .push(WorkspaceEvent::MeasurementUpdated { start, current });
            }
            ToolOutcome::MeasurementCompleted(measurement) => {
                self.annotations.record_measurement(measurement.clone());
                self.outbox
                    .push(WorkspaceEvent::MeasurementCompleted(measurement));
            }
            ToolOutcome::ShapeFinalized(shape) => {
                self.annotations.record_shape(shape.clone());
                self.outbox.push(WorkspaceEvent::ShapeFinalized(shape));
            }
        }
    }

    fn notify_feature_picked(&mut self, info: Option<PickedFeatureInfo>) {
        if let Some(callback) = &mut self.feature_picked {
            callback(info.as_ref());
        }
        self.outbox.push(WorkspaceEvent::FeaturePicked(info));
    }

    fn poll_layers(&mut self, scene: &mut dyn SceneAdapter, source: &mut dyn ResourceSource) {
        let Some(pending) = &mut self.pending else {
            return;
        };

        let events = pending.poll(
            &self.mount,
            source,
            scene,
            &self.presentation,
            self.config.fly_duration_secs,
        );
        for event in events {
            let event = match event {
                ResolveEvent::Loaded(kind) => WorkspaceEvent::LayerLoaded { kind },
                ResolveEvent::Failed(error) => WorkspaceEvent::LayerFailed {
                    kind: error.kind(),
                    reason: error.to_string(),
                },
                ResolveEvent::Settled(loaded) => WorkspaceEvent::LayersSettled {
                    iteration_id: pending.iteration_id().to_string(),
                    loaded,
                },
            };
            self.outbox.push(event);
        }

        if pending.is_settled() {
            let token = pending.token();
            if let Some(pending) = self.pending.take() {
                let result = pending.cancel(source);
                if self.mount.is_live(token) {
                    self.layers = result;
                }
            }
        }
    }

    /// Layers in the scene, including any that landed while others are still loading.
    pub fn layers(&self) -> &LoadResult {
        self.pending
            .as_ref()
            .map_or(&self.layers, |pending| pending.result())
    }

    pub fn loading_progress(&self) -> Option<&LoadingProgress> {
        self.pending.as_ref().map(|pending| pending.progress())
    }

    pub fn vector_presentation(&self) -> VectorPresentation {
        self.presentation
    }

    /// Recolour every loaded vector feature. The highlighted feature keeps the highlight
    /// and returns to the new style when deselected.
    pub fn set_vector_style(&mut self, style: VectorStyle, scene: &mut dyn SceneAdapter) {
        self.presentation.style = style;
        if !self.mount.is_mounted() {
            self.tools.picking_mut().forget();
            return;
        }

        let fill = style.fill();
        let features = self.layers().vector_features().to_vec();
        for handle in features {
            if !self.tools.picking_mut().replace_original_material(handle, fill) {
                scene.set_material(handle, fill);
            }
        }
        self.tools
            .picking_mut()
            .set_highlight_material(scene, style.highlight());
    }

    pub fn set_vector_visible(&mut self, visible: bool, scene: &mut dyn SceneAdapter) {
        self.presentation.visible = visible;
        if !self.mount.is_mounted() {
            return;
        }

        let features = self.layers().vector_features().to_vec();
        for handle in &features {
            scene.set_visible(*handle, visible);
        }

        let highlighted_feature = self
            .tools
            .picking()
            .highlight()
            .is_some_and(|highlight| features.contains(&highlight.entity));
        if !visible && highlighted_feature {
            self.tools.picking_mut().clear(scene);
            self.notify_feature_picked(None);
        }
    }

    pub fn picked_feature(&self) -> Option<&PickedFeatureInfo> {
        self.tools.picking().picked()
    }

    pub fn finalized_shapes(&self) -> &[FinalizedShape] {
        self.annotations.finalized_shapes()
    }

    pub fn last_measurement(&self) -> Option<&Measurement> {
        self.annotations.last_measurement()
    }

    /// Forget recorded results and remove any of their visuals still on screen.
    pub fn clear_annotations(&mut self, scene: &mut dyn SceneAdapter) {
        self.annotations.clear();
        if self.mount.is_mounted() {
            self.tools.clear_finalized_visuals(scene);
        }
    }

    pub fn on_feature_picked(&mut self, callback: FeaturePickedCallback) {
        self.feature_picked = Some(callback);
    }

    pub fn drain_events(&mut self) -> Vec<WorkspaceEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Apply a queued command. Nobody is waiting on the result, so a failure is logged
    /// and published as `command_rejected`.
    pub fn apply_command(
        &mut self,
        command: WorkspaceCommand,
        scene: &mut dyn SceneAdapter,
        source: &mut dyn ResourceSource,
    ) {
        if let Err(error) = self.dispatch(command, scene, source) {
            warn!("Rejected workspace command: {}", error);
            self.outbox.push(WorkspaceEvent::CommandRejected {
                reason: error.to_string(),
            });
        }
    }

    fn dispatch(
        &mut self,
        command: WorkspaceCommand,
        scene: &mut dyn SceneAdapter,
        source: &mut dyn ResourceSource,
    ) -> Result<(), WorkspaceError> {
        match command {
            WorkspaceCommand::SetInteractionMode(mode) => self.set_interaction_mode(mode, scene),
            WorkspaceCommand::LoadIterations(iterations) => {
                self.load_iterations(iterations, scene, source)
            }
            WorkspaceCommand::SelectIteration(id) => self.select_iteration(&id, scene, source),
            WorkspaceCommand::SetActiveView(view) => self.set_active_view(view, scene, source),
            WorkspaceCommand::ClearAnnotations => {
                self.clear_annotations(scene);
                Ok(())
            }
            WorkspaceCommand::SetVectorStyle(style) => {
                self.set_vector_style(style, scene);
                Ok(())
            }
            WorkspaceCommand::SetVectorVisible(visible) => {
                self.set_vector_visible(visible, scene);
                Ok(())
            }
        }
    }
}
