use std::{cell::Cell, rc::Rc};

use log::debug;

use plaza_shared::{
    Fault, Identity, InvocationResponse, Reply, RequestId, ServerMessage,
};

use crate::Outbox;

/// Replies to one invocation request. Replying consumes the listener, so a
/// handler can send at most one terminal reply; asynchronous handlers keep
/// the listener until their work completes.
pub struct ResponseListener {
    request_id: RequestId,
    caller: Identity,
    outbox: Rc<dyn Outbox>,
    replied: Rc<Cell<bool>>,
}

impl ResponseListener {
    pub(crate) fn new(
        request_id: RequestId,
        caller: Identity,
        outbox: Rc<dyn Outbox>,
        replied: Rc<Cell<bool>>,
    ) -> Self {
        Self {
            request_id,
            caller,
            outbox,
            replied,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn caller(&self) -> &Identity {
        &self.caller
    }

    pub fn succeed(self, reply: Reply) {
        self.reply(Ok(reply));
    }

    pub fn fail(self, fault: Fault) {
        self.reply(Err(fault));
    }

    pub fn reply(self, result: Result<Reply, Fault>) {
        self.replied.set(true);
        let message = ServerMessage::Response(InvocationResponse {
            request_id: self.request_id,
            result,
        });
        // the caller may have disconnected since asking; a lost reply is
        // not an error for the request itself
        if let Err(error) = self.outbox.deliver(&self.caller, message) {
            debug!(
                "Dropping reply to request {} [caller={}, error={}]",
                self.request_id, self.caller, error
            );
        }
    }
}
