use plaza_shared::{ZoneId, ZoneSummary};

use crate::world::Body;

/// Application hooks consulted when bodies move into a zone
pub trait ZonePolicy {
    /// Gives the zone a chance to refuse entry. Returning a reason vetoes the
    /// move; the reason becomes the code of the caller's fault.
    fn ratify_body_entry(&self, body: &Body, zone: &ZoneSummary) -> Option<String>;

    /// Called after a body has successfully moved into a scene of the zone
    fn body_did_enter_zone(&mut self, _body: &Body, _zone_id: ZoneId) {}
}

/// Lets everyone in
#[derive(Default)]
pub struct OpenZonePolicy;

impl ZonePolicy for OpenZonePolicy {
    fn ratify_body_entry(&self, _body: &Body, _zone: &ZoneSummary) -> Option<String> {
        None
    }
}
