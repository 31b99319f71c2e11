use std::collections::HashMap;

use log::debug;

use plaza_shared::{ZoneId, ZoneSummary};

use crate::{
    world::Body,
    zone::{OpenZonePolicy, ZonePolicy},
};

/// Looks up the policy responsible for each zone, falling back to a default
/// for zones without one of their own
pub struct ZoneRegistry {
    default_policy: Box<dyn ZonePolicy>,
    policies: HashMap<ZoneId, Box<dyn ZonePolicy>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::with_default(OpenZonePolicy)
    }

    pub fn with_default<P: ZonePolicy + 'static>(policy: P) -> Self {
        Self {
            default_policy: Box::new(policy),
            policies: HashMap::new(),
        }
    }

    pub fn set_policy<P: ZonePolicy + 'static>(&mut self, zone_id: ZoneId, policy: P) {
        debug!("Zone policy set [zone={}]", zone_id);
        self.policies.insert(zone_id, Box::new(policy));
    }

    pub fn clear_policy(&mut self, zone_id: &ZoneId) {
        self.policies.remove(zone_id);
    }

    pub fn has_policy(&self, zone_id: &ZoneId) -> bool {
        self.policies.contains_key(zone_id)
    }

    pub fn ratify_body_entry(&self, body: &Body, zone: &ZoneSummary) -> Option<String> {
        self.policy(&zone.zone_id).ratify_body_entry(body, zone)
    }

    pub fn body_did_enter_zone(&mut self, body: &Body, zone_id: ZoneId) {
        match self.policies.get_mut(&zone_id) {
            Some(policy) => policy.body_did_enter_zone(body, zone_id),
            None => self.default_policy.body_did_enter_zone(body, zone_id),
        }
    }

    fn policy(&self, zone_id: &ZoneId) -> &dyn ZonePolicy {
        self.policies
            .get(zone_id)
            .map(|policy| policy.as_ref())
            .unwrap_or(self.default_policy.as_ref())
    }
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}
