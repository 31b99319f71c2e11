use std::fmt;

use plaza_shared::{SceneId, SceneModel, ZoneId, ZoneSummary};

use crate::LoadError;

/// Cache key, namespaced by what is being resolved
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum ResolutionKey {
    Zone(ZoneId),
    Scene(SceneId),
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionKey::Zone(zone_id) => write!(f, "zone:{}", zone_id),
            ResolutionKey::Scene(scene_id) => write!(f, "scene:{}", scene_id),
        }
    }
}

/// A resolved zone or scene payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bundle {
    Zone(ZoneSummary),
    Scene(SceneModel),
}

impl Bundle {
    pub fn into_zone(self) -> Result<ZoneSummary, LoadError> {
        match self {
            Bundle::Zone(summary) => Ok(summary),
            Bundle::Scene(_) => Err(LoadError::WrongKind { expected: "zone" }),
        }
    }

    pub fn into_scene(self) -> Result<SceneModel, LoadError> {
        match self {
            Bundle::Scene(model) => Ok(model),
            Bundle::Zone(_) => Err(LoadError::WrongKind { expected: "scene" }),
        }
    }
}
