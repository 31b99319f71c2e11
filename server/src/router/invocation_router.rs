use std::{cell::Cell, collections::HashMap, rc::Rc};

use log::{trace, warn};

use plaza_shared::{Arguments, Fault, Identity, InvocationRequest, ServiceId};

use crate::{
    router::{ResponseListener, ServiceTable},
    Outbox,
};

/// Routes decoded invocation requests to the service table registered for
/// their service id. Never blocks: handlers either reply immediately or
/// hold on to their listener and reply later.
pub struct InvocationRouter<C> {
    services: HashMap<ServiceId, ServiceTable<C>>,
    outbox: Rc<dyn Outbox>,
}

impl<C> InvocationRouter<C> {
    pub fn new(outbox: Rc<dyn Outbox>) -> Self {
        Self {
            services: HashMap::new(),
            outbox,
        }
    }

    /// Registers a service table, replacing any table previously registered
    /// under the same id
    pub fn register(&mut self, service: ServiceId, table: ServiceTable<C>) {
        if let Some(previous) = self.services.insert(service, table) {
            warn!(
                "Replaced service table [service={}, previous={}]",
                service,
                previous.name()
            );
        }
    }

    pub fn has_service(&self, service: &ServiceId) -> bool {
        self.services.contains_key(service)
    }

    /// Dispatch a request on behalf of `caller`. Every outcome, including
    /// routing misses, reaches the caller as a response to the request.
    pub fn dispatch(&self, context: &mut C, caller: &Identity, request: InvocationRequest) {
        let InvocationRequest {
            request_id,
            service_id,
            method_id,
            args,
        } = request;

        trace!(
            "Dispatching request {} [caller={}, service={}, method={}]",
            request_id,
            caller,
            service_id,
            method_id
        );

        let replied = Rc::new(Cell::new(false));
        let listener = ResponseListener::new(
            request_id,
            caller.clone(),
            self.outbox.clone(),
            replied.clone(),
        );

        let result = match self.services.get(&service_id) {
            Some(table) => {
                let args = Arguments::new(method_id, args);
                table.dispatch(context, service_id, caller, &args, method_id, listener)
            }
            None => Err(Fault::UnknownService {
                service: service_id,
            }),
        };

        let Err(fault) = result else {
            return;
        };

        if replied.get() {
            warn!(
                "Handler failed after replying [request={}, fault={}]",
                request_id, fault
            );
            return;
        }

        warn!(
            "Request failed [caller={}, request={}, code={}, fault={}]",
            caller,
            request_id,
            fault.code(),
            fault
        );
        ResponseListener::new(request_id, caller.clone(), self.outbox.clone(), replied).fail(fault);
    }
}
