//! Scene: a named, ordered list of device actions run as one command.
//!
//! Scenes are defined once from configuration and never change at runtime.
//! The order of [`Scene::actions`] is the order in which they are executed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::{ValidationError, VoxHomeError};

/// One step of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneAction {
    /// Target device name (matched case-insensitively).
    pub device: String,
    pub command: Command,
}

impl SceneAction {
    #[must_use]
    pub fn new(device: impl Into<String>, command: Command) -> Self {
        Self {
            device: device.into(),
            command,
        }
    }
}

impl std::fmt::Display for SceneAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.device, self.command)
    }
}

/// A named sequence of device actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub actions: Vec<SceneAction>,
}

impl Scene {
    /// Create a builder for constructing a [`Scene`].
    #[must_use]
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`VoxHomeError::Validation`] when:
    /// - `name` is blank ([`ValidationError::EmptyName`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    /// - an action targets a blank device name ([`ValidationError::EmptyName`])
    pub fn validate(&self) -> Result<(), VoxHomeError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        if self.actions.iter().any(|a| a.device.trim().is_empty()) {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Scene`].
#[derive(Debug, Default)]
pub struct SceneBuilder {
    name: Option<String>,
    actions: Vec<SceneAction>,
}

impl SceneBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append an action; actions run in the order they were added.
    #[must_use]
    pub fn action(mut self, device: impl Into<String>, command: Command) -> Self {
        self.actions.push(SceneAction::new(device, command));
        self
    }

    /// Consume the builder, validate, and return a [`Scene`].
    ///
    /// # Errors
    ///
    /// Returns [`VoxHomeError::Validation`] if the name is missing or there
    /// are no actions.
    pub fn build(self) -> Result<Scene, VoxHomeError> {
        let scene = Scene {
            name: self.name.unwrap_or_default(),
            actions: self.actions,
        };
        scene.validate()?;
        Ok(scene)
    }
}

/// Immutable set of scenes, looked up case-insensitively by name.
#[derive(Debug, Clone, Default)]
pub struct SceneCatalog {
    scenes: HashMap<String, Scene>,
}

impl SceneCatalog {
    /// Build a catalog from validated scenes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateScene`] when two scenes share a
    /// name (ignoring case), or any validation error of an individual scene.
    pub fn new(scenes: impl IntoIterator<Item = Scene>) -> Result<Self, VoxHomeError> {
        let mut map = HashMap::new();
        for scene in scenes {
            scene.validate()?;
            let key = scene_key(&scene.name);
            if map.contains_key(&key) {
                return Err(ValidationError::DuplicateScene(scene.name).into());
            }
            map.insert(key, scene);
        }
        Ok(Self { scenes: map })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(&scene_key(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scenes.values().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

fn scene_key(name: &str) -> String {
    name.trim().to_lowercase()
}
