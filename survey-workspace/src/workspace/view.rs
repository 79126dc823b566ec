use crate::engine::assets::iteration::Iteration;
use crate::engine::loading::resource_source::LayerKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which presentation of an iteration is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActiveView {
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "2d")]
    TwoD,
}

impl ActiveView {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "3d" | "three_d" => Some(Self::ThreeD),
            "2d" | "two_d" => Some(Self::TwoD),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeD => "3d",
            Self::TwoD => "2d",
        }
    }

    /// Layers the view loads, in request order.
    pub fn layer_kinds(&self) -> &'static [LayerKind] {
        match self {
            Self::ThreeD => &[LayerKind::Mesh],
            Self::TwoD => &[LayerKind::Vector, LayerKind::Raster],
        }
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mesh first, then vector or raster, otherwise nothing to show.
pub fn default_view(iteration: &Iteration) -> Option<ActiveView> {
    if iteration.has_mesh() {
        Some(ActiveView::ThreeD)
    } else if iteration.has_vector() || iteration.has_raster() {
        Some(ActiveView::TwoD)
    } else {
        None
    }
}

pub fn view_available(iteration: &Iteration, view: ActiveView) -> bool {
    match view {
        ActiveView::ThreeD => iteration.has_mesh(),
        ActiveView::TwoD => iteration.has_vector() || iteration.has_raster(),
    }
}

/// Index of the most recently modified iteration; the earlier entry wins a tie.
pub fn select_latest(iterations: &[Iteration]) -> Option<usize> {
    iterations
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, &Iteration)>, (index, candidate)| match best {
            Some((_, current)) if current.modified_time >= candidate.modified_time => best,
            _ => Some((index, candidate)),
        })
        .map(|(index, _)| index)
}

/// What the view toggle should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub active: Option<ActiveView>,
    pub three_d_enabled: bool,
    pub two_d_enabled: bool,
}

impl ViewState {
    pub fn for_iteration(iteration: Option<&Iteration>, active: Option<ActiveView>) -> Self {
        Self {
            active,
            three_d_enabled: iteration.is_some_and(|it| view_available(it, ActiveView::ThreeD)),
            two_d_enabled: iteration.is_some_and(|it| view_available(it, ActiveView::TwoD)),
        }
    }
}
