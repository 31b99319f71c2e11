use crate::{InvocationResponse, OccupantDelta, PlaceId, SceneId, ZoneId};

/// Everything the server pushes down a session's transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Terminal reply to a request the session made
    Response(InvocationResponse),
    /// A change to the occupant collection of a place the session occupies
    /// (or just left)
    Occupants {
        place_id: PlaceId,
        delta: OccupantDelta,
    },
    /// The server evicted the session's body; the client should issue its
    /// own move request to the given zone and scene
    ForcedMove { zone_id: ZoneId, scene_id: SceneId },
}
