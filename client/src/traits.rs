use plaza_shared::{Fault, GroupId, InvocationRequest, MoveReply, MoveTarget, PlaceId};

/// Hands requests to whatever carries them to the server
pub trait RequestSender {
    fn send_request(&mut self, request: InvocationRequest) -> Result<(), Fault>;
}

/// Cluster feed subscriptions
pub trait GroupSubscriber {
    fn subscribe(&mut self, group: GroupId);
    fn unsubscribe(&mut self, group: GroupId);
}

/// Told how a requested transition ended
pub trait TransitionObserver {
    fn transition_succeeded(&mut self, target: &MoveTarget, reply: &MoveReply);
    fn transition_failed(&mut self, target: &MoveTarget, fault: &Fault);
}

/// Told when the local participant joins or leaves the occupants of a place
pub trait MembershipObserver {
    fn membership_changed(&mut self, place_id: PlaceId, member: bool);
}
