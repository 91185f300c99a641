//! Streaming handle for a running session.

use crate::agent::outcome::{SessionEvent, SessionOutcome};
use crate::types::SessionId;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::watch;

/// Requests cancellation of a session.
///
/// Cloneable, so a signal handler can hold one while the handle is consumed.
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub(crate) fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Stops the session before its next completion round trip.
    ///
    /// An in-flight completion request is abandoned; a running tool call is
    /// allowed to finish and its result is recorded.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// A running session: a stream of [`SessionEvent`]s plus cancellation.
///
/// The stream ends after [`SessionEvent::Finished`]. Dropping the handle and
/// every [`Canceller`] cloned from it cancels the session.
pub struct SessionHandle {
    session_id: SessionId,
    canceller: Canceller,
    events: Pin<Box<dyn Stream<Item = SessionEvent> + Send>>,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: SessionId,
        canceller: Canceller,
        events: Pin<Box<dyn Stream<Item = SessionEvent> + Send>>,
    ) -> Self {
        Self {
            session_id,
            canceller,
            events,
        }
    }

    /// Returns the session's ID.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Returns a cloneable canceller for this session.
    #[must_use]
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// Drains the stream and returns the outcome.
    ///
    /// Returns `None` only if the session task died without finishing.
    pub async fn outcome(mut self) -> Option<SessionOutcome> {
        while let Some(event) = self.events.next().await {
            if let SessionEvent::Finished(outcome) = event {
                return Some(*outcome);
            }
        }
        None
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("cancelled", &self.canceller.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Stream for SessionHandle {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canceller_flips_flag_and_notifies() {
        let (canceller, rx) = Canceller::new();
        assert!(!canceller.is_cancelled());
        canceller.clone().cancel();
        assert!(canceller.is_cancelled());
        assert!(*rx.borrow());
    }
}
