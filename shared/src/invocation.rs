use crate::{Fault, MethodId, RequestId, ServiceId};
use crate::zone::MoveReply;

/// A single value in an invocation's argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Bool(bool),
    U32(u32),
    U64(u64),
    Str(String),
}

impl Argument {
    fn kind(&self) -> &'static str {
        match self {
            Argument::Bool(_) => "bool",
            Argument::U32(_) => "u32",
            Argument::U64(_) => "u64",
            Argument::Str(_) => "str",
        }
    }
}

/// A request from a client to invoke `method_id` on `service_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub request_id: RequestId,
    pub service_id: ServiceId,
    pub method_id: MethodId,
    pub args: Vec<Argument>,
}

/// The terminal reply to an [`InvocationRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResponse {
    pub request_id: RequestId,
    pub result: Result<Reply, Fault>,
}

/// Successful result payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain acknowledgement with nothing attached
    Ack,
    /// A completed place transition
    Moved(MoveReply),
    /// Generic result values for game-specific services
    Values(Vec<Argument>),
}

/// Typed, checked view over an argument list. Accessors report mismatches
/// as [`Fault::InvalidArguments`] for the method being invoked.
pub struct Arguments {
    method: MethodId,
    values: Vec<Argument>,
}

impl Arguments {
    pub fn new(method: MethodId, values: Vec<Argument>) -> Self {
        Self { method, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn bool(&self, index: usize) -> Result<bool, Fault> {
        match self.get(index)? {
            Argument::Bool(value) => Ok(*value),
            other => Err(self.mismatch(index, "bool", other)),
        }
    }

    pub fn u32(&self, index: usize) -> Result<u32, Fault> {
        match self.get(index)? {
            Argument::U32(value) => Ok(*value),
            other => Err(self.mismatch(index, "u32", other)),
        }
    }

    pub fn u64(&self, index: usize) -> Result<u64, Fault> {
        match self.get(index)? {
            Argument::U64(value) => Ok(*value),
            other => Err(self.mismatch(index, "u64", other)),
        }
    }

    pub fn str(&self, index: usize) -> Result<&str, Fault> {
        match self.get(index)? {
            Argument::Str(value) => Ok(value),
            other => Err(self.mismatch(index, "str", other)),
        }
    }

    fn get(&self, index: usize) -> Result<&Argument, Fault> {
        self.values.get(index).ok_or_else(|| Fault::InvalidArguments {
            method: self.method,
            reason: format!(
                "missing argument {} (got {} arguments)",
                index,
                self.values.len()
            ),
        })
    }

    fn mismatch(&self, index: usize, expected: &str, found: &Argument) -> Fault {
        Fault::InvalidArguments {
            method: self.method,
            reason: format!(
                "argument {} should be {} but was {}",
                index,
                expected,
                found.kind()
            ),
        }
    }
}
