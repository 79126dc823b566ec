use crate::engine::loading::resource_source::LayerKind;
use crate::tools::pointer::PointerConsumer;
use crate::workspace::view::ActiveView;
use thiserror::Error;

/// Failures surfaced by workspace operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkspaceError {
    #[error("a scene is already mounted in `{0}`")]
    SceneAlreadyMounted(String),

    #[error("no scene is mounted")]
    SceneNotMounted,

    #[error("unknown iteration `{0}`")]
    UnknownIteration(String),

    #[error("no iteration is selected")]
    NoIterationSelected,

    #[error("the {0} view is not available for the selected iteration")]
    ViewUnavailable(ActiveView),

    #[error("{requested:?} cannot take pointer input while {active:?} holds it")]
    PointerSubscriptionConflict {
        active: PointerConsumer,
        requested: PointerConsumer,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Why a single layer of an iteration could not be shown.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayerLoadError {
    #[error("failed to load {kind} layer from {path}: {reason}")]
    Fetch {
        kind: LayerKind,
        path: String,
        reason: String,
    },

    #[error("{path} has no usable bounding volume")]
    UnsupportedBoundingVolume { path: String },

    #[error("{kind} document at {path} has nothing to show")]
    EmptyDocument { kind: LayerKind, path: String },
}

impl LayerLoadError {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Fetch { kind, .. } | Self::EmptyDocument { kind, .. } => *kind,
            Self::UnsupportedBoundingVolume { .. } => LayerKind::Mesh,
        }
    }
}
