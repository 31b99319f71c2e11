use plaza_shared::{EntityId, MoveTarget, SceneVersion};

use crate::router::ResponseListener;

/// A body's request to move to a scene of a zone, along with the listener
/// its terminal reply goes to
pub struct MoveRequest {
    pub entity: EntityId,
    pub target: MoveTarget,
    /// Version of the target scene the caller already holds
    pub scene_version: SceneVersion,
    pub listener: ResponseListener,
}
