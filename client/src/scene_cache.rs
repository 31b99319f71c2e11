use std::collections::HashMap;

use plaza_shared::{SceneId, SceneModel, SceneVersion};

/// Scene models received from the server, by scene id
#[derive(Default)]
pub struct SceneCache {
    scenes: HashMap<SceneId, SceneModel>,
}

impl SceneCache {
    pub fn new() -> Self {
        Self {
            scenes: HashMap::new(),
        }
    }

    /// Version of the cached model, or 0 if the scene was never received
    pub fn version(&self, scene_id: &SceneId) -> SceneVersion {
        self.scenes
            .get(scene_id)
            .map(|model| model.version)
            .unwrap_or(0)
    }

    pub fn get(&self, scene_id: &SceneId) -> Option<&SceneModel> {
        self.scenes.get(scene_id)
    }

    /// Keeps the newer of the cached and the given model
    pub fn insert(&mut self, model: SceneModel) {
        if self.version(&model.scene_id) > model.version {
            return;
        }
        self.scenes.insert(model.scene_id, model);
    }

    pub fn remove(&mut self, scene_id: &SceneId) -> Option<SceneModel> {
        self.scenes.remove(scene_id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
