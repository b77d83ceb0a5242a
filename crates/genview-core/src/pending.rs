//! Non-blocking handles for work running off the frame thread

use std::sync::mpsc::{self, TryRecvError};

/// The worker side of a request went away without delivering a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request channel closed before a result was delivered")]
pub struct ChannelClosed;

/// A non-blocking handle to an in-flight async request.
/// Call `try_recv()` each frame to check for results without blocking the frame loop.
/// A request resolves once; drop the handle after it yields a result.
pub struct PendingRequest<T, E> {
    receiver: mpsc::Receiver<Result<T, E>>,
}

/// The sending half handed to whatever completes a `PendingRequest`.
pub struct Responder<T, E> {
    sender: mpsc::Sender<Result<T, E>>,
}

impl<T, E> PendingRequest<T, E> {
    /// Create a linked responder/request pair.
    pub fn channel() -> (Responder<T, E>, Self) {
        let (sender, receiver) = mpsc::channel();
        (Responder { sender }, Self { receiver })
    }

    /// A request that is already resolved.
    pub fn ready(result: Result<T, E>) -> Self {
        let (responder, request) = Self::channel();
        responder.send(result);
        request
    }
}

impl<T, E: From<ChannelClosed>> PendingRequest<T, E> {
    /// Non-blocking check for the result. Returns `None` if still pending.
    pub fn try_recv(&self) -> Option<Result<T, E>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ChannelClosed.into())),
        }
    }

    /// Blocking wait for the result. Only use outside the frame loop.
    pub fn wait(self) -> Result<T, E> {
        self.receiver.recv().map_err(|_| E::from(ChannelClosed))?
    }
}

impl<T, E> Responder<T, E> {
    /// Deliver the result. Returns `false` if the request was already dropped.
    pub fn send(self, result: Result<T, E>) -> bool {
        self.sender.send(result).is_ok()
    }
}
