/// Routing of invocation requests: misses become faults, tables delegate
/// to their parents, and every request gets exactly one terminal reply.
use std::{cell::RefCell, rc::Rc};

use plaza_server::{InvocationRouter, Outbox, ResponseListener, SendError, ServiceTable};
use plaza_shared::{
    Argument, Fault, Identity, InvocationRequest, InvocationResponse, MethodId, Reply, RequestId,
    ServerMessage, ServiceId,
};

const ECHO: ServiceId = ServiceId(10);
const BASE: ServiceId = ServiceId(11);
const SAY: MethodId = MethodId(1);
const LATER: MethodId = MethodId(2);
const BROKEN: MethodId = MethodId(3);
const PING: MethodId = MethodId(9);

#[derive(Default)]
struct CapturedOutbox {
    delivered: RefCell<Vec<(Identity, ServerMessage)>>,
}

impl CapturedOutbox {
    fn responses(&self) -> Vec<InvocationResponse> {
        self.delivered
            .borrow()
            .iter()
            .filter_map(|(_, message)| match message {
                ServerMessage::Response(response) => Some(response.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Outbox for CapturedOutbox {
    fn deliver(&self, identity: &Identity, message: ServerMessage) -> Result<(), SendError> {
        self.delivered
            .borrow_mut()
            .push((identity.clone(), message));
        Ok(())
    }
}

#[derive(Default)]
struct Context {
    parked: Vec<ResponseListener>,
    said: Vec<String>,
}

fn base_table() -> ServiceTable<Context> {
    ServiceTable::new("base").on(PING, |_ctx, _caller, _args, listener| {
        listener.succeed(Reply::Values(vec![Argument::Str("pong".to_string())]));
        Ok(())
    })
}

fn echo_table() -> ServiceTable<Context> {
    ServiceTable::new("echo")
        .with_parent(base_table())
        .on(SAY, |ctx: &mut Context, _caller, args, listener| {
            let text = args.str(0)?.to_string();
            ctx.said.push(text.clone());
            listener.succeed(Reply::Values(vec![Argument::Str(text)]));
            Ok(())
        })
        .on(LATER, |ctx: &mut Context, _caller, _args, listener| {
            ctx.parked.push(listener);
            Ok(())
        })
        .on(BROKEN, |_ctx, _caller, _args, listener| {
            listener.fail(Fault::Internal("first".to_string()));
            Err(Fault::Internal("second".to_string()))
        })
}

fn router() -> (InvocationRouter<Context>, Rc<CapturedOutbox>) {
    let outbox = Rc::new(CapturedOutbox::default());
    let mut router = InvocationRouter::new(outbox.clone());
    router.register(ECHO, echo_table());
    router.register(BASE, base_table());
    (router, outbox)
}

fn request(id: u64, service: ServiceId, method: MethodId, args: Vec<Argument>) -> InvocationRequest {
    InvocationRequest {
        request_id: RequestId(id),
        service_id: service,
        method_id: method,
        args,
    }
}

#[test]
fn synchronous_handler_replies_once() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (router, outbox) = router();
    let mut ctx = Context::default();
    let alice = Identity::new("alice");

    router.dispatch(
        &mut ctx,
        &alice,
        request(1, ECHO, SAY, vec![Argument::Str("hello".to_string())]),
    );

    assert_eq!(ctx.said, vec!["hello".to_string()]);
    let responses = outbox.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].request_id, RequestId(1));
    assert_eq!(
        responses[0].result,
        Ok(Reply::Values(vec![Argument::Str("hello".to_string())]))
    );
    assert_eq!(outbox.delivered.borrow()[0].0, alice);
}

#[test]
fn unknown_service_and_method_are_faults() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (router, outbox) = router();
    let mut ctx = Context::default();
    let alice = Identity::new("alice");

    router.dispatch(&mut ctx, &alice, request(1, ServiceId(99), SAY, vec![]));
    router.dispatch(&mut ctx, &alice, request(2, BASE, SAY, vec![]));

    let responses = outbox.responses();
    assert_eq!(
        responses[0].result,
        Err(Fault::UnknownService {
            service: ServiceId(99)
        })
    );
    assert_eq!(
        responses[1].result,
        Err(Fault::UnknownMethod {
            service: BASE,
            method: SAY
        })
    );
    assert_eq!(responses[1].result.as_ref().map_err(Fault::code), Err("m.unknown_method"));
}

#[test]
fn unhandled_methods_fall_through_to_parent() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (router, outbox) = router();
    let mut ctx = Context::default();

    assert!(echo_table().handles(&PING));
    assert!(!base_table().handles(&SAY));

    router.dispatch(&mut ctx, &Identity::new("alice"), request(5, ECHO, PING, vec![]));

    assert_eq!(
        outbox.responses()[0].result,
        Ok(Reply::Values(vec![Argument::Str("pong".to_string())]))
    );
}

#[test]
fn asynchronous_handler_replies_later() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (router, outbox) = router();
    let mut ctx = Context::default();

    router.dispatch(&mut ctx, &Identity::new("alice"), request(7, ECHO, LATER, vec![]));
    assert!(outbox.responses().is_empty(), "router never blocks on a reply");

    let listener = ctx.parked.pop().expect("listener was kept");
    assert_eq!(listener.request_id(), RequestId(7));
    assert_eq!(listener.caller(), &Identity::new("alice"));
    listener.succeed(Reply::Ack);

    let responses = outbox.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].result, Ok(Reply::Ack));
}

#[test]
fn malformed_arguments_are_reported() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (router, outbox) = router();
    let mut ctx = Context::default();

    router.dispatch(
        &mut ctx,
        &Identity::new("alice"),
        request(3, ECHO, SAY, vec![Argument::U32(4)]),
    );

    assert!(ctx.said.is_empty());
    let responses = outbox.responses();
    assert_eq!(responses.len(), 1);
    assert!(matches!(
        responses[0].result,
        Err(Fault::InvalidArguments { method: SAY, .. })
    ));
}

#[test]
fn error_after_reply_does_not_reply_twice() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (router, outbox) = router();
    let mut ctx = Context::default();

    router.dispatch(&mut ctx, &Identity::new("alice"), request(4, ECHO, BROKEN, vec![]));

    let responses = outbox.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(
        responses[0].result,
        Err(Fault::Internal("first".to_string()))
    );
}
