use std::collections::HashMap;

use plaza_shared::{Arguments, Fault, Identity, MethodId, ServiceId};

use crate::router::ResponseListener;

/// A method handler. Synchronous handlers reply through the listener before
/// returning; asynchronous handlers stash it and reply later. Returning an
/// error without having replied makes the router reply with that fault.
pub type Handler<C> = Box<dyn Fn(&mut C, &Identity, &Arguments, ResponseListener) -> Result<(), Fault>>;

/// Routing table of method id to handler for one service. A table may
/// delegate methods it does not handle to a parent table, so services can
/// layer on top of one another.
pub struct ServiceTable<C> {
    name: &'static str,
    handlers: HashMap<MethodId, Handler<C>>,
    parent: Option<Box<ServiceTable<C>>>,
}

impl<C> ServiceTable<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: HashMap::new(),
            parent: None,
        }
    }

    /// Methods this table has no handler for are tried on `parent`
    pub fn with_parent(mut self, parent: ServiceTable<C>) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn on<F>(mut self, method: MethodId, handler: F) -> Self
    where
        F: Fn(&mut C, &Identity, &Arguments, ResponseListener) -> Result<(), Fault> + 'static,
    {
        self.handlers.insert(method, Box::new(handler));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if this table or one it delegates to handles `method`
    pub fn handles(&self, method: &MethodId) -> bool {
        self.handlers.contains_key(method)
            || self
                .parent
                .as_ref()
                .map(|parent| parent.handles(method))
                .unwrap_or(false)
    }

    pub(crate) fn dispatch(
        &self,
        context: &mut C,
        service: ServiceId,
        caller: &Identity,
        args: &Arguments,
        method: MethodId,
        listener: ResponseListener,
    ) -> Result<(), Fault> {
        if let Some(handler) = self.handlers.get(&method) {
            return handler(context, caller, args, listener);
        }
        match &self.parent {
            Some(parent) => parent.dispatch(context, service, caller, args, method, listener),
            None => Err(Fault::UnknownMethod { service, method }),
        }
    }
}
