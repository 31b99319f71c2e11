use smol::channel::{Receiver, TryRecvError};

use crate::LoadError;

enum ResolutionState<P> {
    Settled(Option<Result<P, LoadError>>),
    Waiting(Receiver<Result<P, LoadError>>),
}

/// The eventual outcome of resolving one key. Poll it with [`try_take`]
/// from a game loop, or `.await` it with [`wait`].
///
/// [`try_take`]: Resolution::try_take
/// [`wait`]: Resolution::wait
pub struct Resolution<P> {
    state: ResolutionState<P>,
}

impl<P> Resolution<P> {
    pub(crate) fn settled(result: Result<P, LoadError>) -> Self {
        Self {
            state: ResolutionState::Settled(Some(result)),
        }
    }

    pub(crate) fn waiting(receiver: Receiver<Result<P, LoadError>>) -> Self {
        Self {
            state: ResolutionState::Waiting(receiver),
        }
    }

    /// Takes the outcome if it has arrived. Returns `None` while the load
    /// is still in flight, and after the outcome has been taken.
    pub fn try_take(&mut self) -> Option<Result<P, LoadError>> {
        let outcome = match &mut self.state {
            ResolutionState::Settled(slot) => return slot.take(),
            ResolutionState::Waiting(receiver) => match receiver.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => Err(LoadError::Abandoned),
            },
        };
        self.state = ResolutionState::Settled(None);
        Some(outcome)
    }

    /// Waits for the outcome
    pub async fn wait(self) -> Result<P, LoadError> {
        match self.state {
            ResolutionState::Settled(Some(outcome)) => outcome,
            ResolutionState::Settled(None) => Err(LoadError::Abandoned),
            ResolutionState::Waiting(receiver) => {
                receiver.recv().await.unwrap_or(Err(LoadError::Abandoned))
            }
        }
    }
}
