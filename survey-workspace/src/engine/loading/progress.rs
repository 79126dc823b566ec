use crate::engine::loading::resource_source::LayerKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerLoadState {
    Requested,
    Loaded,
    Failed,
}

/// Load state of each layer requested for the current iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadingProgress {
    layers: Vec<(LayerKind, LayerLoadState)>,
}

impl LoadingProgress {
    pub fn mark(&mut self, kind: LayerKind, state: LayerLoadState) {
        match self.layers.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, slot)) => *slot = state,
            None => self.layers.push((kind, state)),
        }
    }

    pub fn state(&self, kind: LayerKind) -> Option<LayerLoadState> {
        self.layers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, state)| *state)
    }

    /// No layer is still waiting on its document.
    pub fn is_settled(&self) -> bool {
        self.layers
            .iter()
            .all(|(_, state)| *state != LayerLoadState::Requested)
    }

    pub fn loaded_kinds(&self) -> Vec<LayerKind> {
        self.layers
            .iter()
            .filter(|(_, state)| *state == LayerLoadState::Loaded)
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .layers
            .iter()
            .map(|(kind, state)| (kind.to_string(), serde_json::json!(state)))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_once_nothing_is_requested() {
        let mut progress = LoadingProgress::default();
        assert!(progress.is_settled());

        progress.mark(LayerKind::Vector, LayerLoadState::Requested);
        progress.mark(LayerKind::Raster, LayerLoadState::Requested);
        progress.mark(LayerKind::Vector, LayerLoadState::Loaded);
        assert!(!progress.is_settled());

        assert_eq!(progress.state(LayerKind::Raster), Some(LayerLoadState::Requested));
        assert_eq!(progress.state(LayerKind::Mesh), None);

        progress.mark(LayerKind::Raster, LayerLoadState::Failed);
        assert!(progress.is_settled());
        assert_eq!(progress.loaded_kinds(), vec![LayerKind::Vector]);
        assert_eq!(
            progress.to_json(),
            serde_json::json!({"vector": "loaded", "raster": "failed"})
        );
    }
}
