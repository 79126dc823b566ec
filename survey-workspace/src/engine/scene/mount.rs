use crate::engine::scene::adapter::{SceneAdapter, SceneContainer};
use crate::error::WorkspaceError;
use bevy::prelude::*;

/// Identifies one scene lifetime. Async completions carry the token they were started
/// with and are discarded once it no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LivenessToken {
    generation: u64,
}

/// Tracks the single scene bound to a container.
#[derive(Debug, Default)]
pub struct SceneMount {
    container: Option<SceneContainer>,
    generation: u64,
}

impl SceneMount {
    pub fn mount(
        &mut self,
        container: SceneContainer,
        scene: &mut dyn SceneAdapter,
    ) -> Result<LivenessToken, WorkspaceError> {
        if let Some(existing) = &self.container {
            return Err(WorkspaceError::SceneAlreadyMounted(existing.id.clone()));
        }

        scene.create(&container);
        self.generation += 1;
        info!("Scene mounted in {} (generation {})", container.id, self.generation);
        self.container = Some(container);
        Ok(self.token())
    }

    /// Destroys the scene. Every token issued so far stops being live.
    pub fn unmount(&mut self, scene: &mut dyn SceneAdapter) -> Option<SceneContainer> {
        let container = self.container.take()?;
        scene.destroy();
        self.generation += 1;
        info!("Scene unmounted from {}", container.id);
        Some(container)
    }

    /// Destroys and recreates the scene in the same container.
    pub fn remount(&mut self, scene: &mut dyn SceneAdapter) -> Result<LivenessToken, WorkspaceError> {
        let container = self.unmount(scene).ok_or(WorkspaceError::SceneNotMounted)?;
        self.mount(container, scene)
    }

    pub fn is_mounted(&self) -> bool {
        self.container.is_some()
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            generation: self.generation,
        }
    }

    pub fn is_live(&self, token: LivenessToken) -> bool {
        self.container.is_some() && token.generation == self.generation
    }
}
