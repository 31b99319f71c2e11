use log::trace;

use plaza_shared::{Identity, OccupantDelta, OccupantInfo, OccupantSet, PlaceId, OCCUPANTS};

use crate::MembershipObserver;

/// Whether `me` is among `occupants`. Always computed from the whole set.
pub fn is_member(occupants: &OccupantSet, me: &Identity) -> bool {
    occupants.identities().any(|identity| identity == me)
}

/// Mirrors the occupant collection of the place the local participant is
/// in, and tells observers when the participant's own membership flips.
///
/// Membership is re-derived from the full mirrored set after every delta,
/// so a delta that was missed or arrived out of order cannot leave the
/// answer permanently wrong.
pub struct MembershipTracker {
    collection: String,
    me: Identity,
    place: Option<PlaceId>,
    occupants: OccupantSet,
    member: bool,
    observers: Vec<Box<dyn MembershipObserver>>,
}

impl MembershipTracker {
    pub fn new(me: Identity) -> Self {
        Self::for_collection(me, OCCUPANTS)
    }

    /// Tracks a differently named occupant collection
    pub fn for_collection(me: Identity, collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            me,
            place: None,
            occupants: OccupantSet::new(),
            member: false,
            observers: Vec::new(),
        }
    }

    /// Observers are called in the order they were added
    pub fn add_observer(&mut self, observer: Box<dyn MembershipObserver>) {
        self.observers.push(observer);
    }

    pub fn place(&self) -> Option<PlaceId> {
        self.place
    }

    pub fn occupants(&self) -> &OccupantSet {
        &self.occupants
    }

    pub fn is_member(&self) -> bool {
        self.member
    }

    /// Starts mirroring `place_id` from a full snapshot. Returns the new
    /// membership if it flipped.
    pub fn reset(&mut self, place_id: PlaceId, snapshot: &[OccupantInfo]) -> Option<bool> {
        self.place = Some(place_id);
        self.occupants = OccupantSet::from_infos(snapshot.iter().cloned());
        self.reconcile()
    }

    /// Applies a delta of the mirrored collection. Deltas for other places
    /// or other collections are ignored. Returns the new membership if it
    /// flipped.
    pub fn apply(&mut self, place_id: PlaceId, delta: &OccupantDelta) -> Option<bool> {
        if self.place != Some(place_id) || delta.collection != self.collection {
            trace!(
                "Ignoring delta [place={}, collection={}]",
                place_id,
                delta.collection
            );
            return None;
        }
        self.occupants.apply(&delta.delta);
        self.reconcile()
    }

    fn reconcile(&mut self) -> Option<bool> {
        let member = is_member(&self.occupants, &self.me);
        if member == self.member {
            return None;
        }
        self.member = member;
        if let Some(place_id) = self.place {
            for observer in self.observers.iter_mut() {
                observer.membership_changed(place_id, member);
            }
        }
        Some(member)
    }
}
