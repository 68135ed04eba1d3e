//! Scene engine: replays a scene's actions through the device controller.
//!
//! Actions run strictly one after another, in the order the scene lists
//! them. A failing action is recorded and the engine moves on to the next
//! one, so the caller always gets one outcome per action.

use std::sync::Arc;

use voxhome_domain::scene::{SceneAction, SceneCatalog};

use crate::controller::{ControlError, DeviceController};
use crate::ports::{Ack, ProtocolAdapter};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene {0:?} not found")]
    SceneNotFound(String),
}

/// Result of one scene action.
#[derive(Debug)]
pub struct ActionOutcome {
    pub action: SceneAction,
    pub result: Result<Ack, ControlError>,
}

/// Per-action results of one scene run, in execution order.
#[derive(Debug)]
pub struct SceneReport {
    pub scene: String,
    pub outcomes: Vec<ActionOutcome>,
}

impl SceneReport {
    /// `true` when every action succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// The actions that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&SceneAction, &ControlError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (&o.action, err)))
    }
}

/// Runs scenes from an immutable catalog.
pub struct SceneEngine<P: ProtocolAdapter> {
    catalog: SceneCatalog,
    controller: Arc<DeviceController<P>>,
}

impl<P: ProtocolAdapter> SceneEngine<P> {
    pub fn new(catalog: SceneCatalog, controller: Arc<DeviceController<P>>) -> Self {
        Self {
            catalog,
            controller,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    /// Run every action of the named scene, best effort.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::SceneNotFound`] when no scene has this name; no
    /// device is contacted. Individual action failures are not errors, they
    /// are reported in the returned [`SceneReport`].
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, scene_name: &str) -> Result<SceneReport, SceneError> {
        let Some(scene) = self.catalog.get(scene_name) else {
            tracing::info!(scene = scene_name, "scene not found");
            return Err(SceneError::SceneNotFound(scene_name.to_string()));
        };

        let mut outcomes = Vec::with_capacity(scene.actions.len());
        for action in &scene.actions {
            let result = self
                .controller
                .execute(&action.device, action.command)
                .await;
            if let Err(err) = &result {
                tracing::warn!(scene = %scene.name, %action, %err, "scene action failed, continuing");
            }
            outcomes.push(ActionOutcome {
                action: action.clone(),
                result,
            });
        }

        let report = SceneReport {
            scene: scene.name.clone(),
            outcomes,
        };
        tracing::info!(
            scene = %report.scene,
            actions = report.outcomes.len(),
            failed = report.failures().count(),
            "scene executed"
        );
        Ok(report)
    }
}
