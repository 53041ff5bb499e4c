use std::{
    marker::PhantomData,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll},
};

use futures::{
    stream::{AbortHandle, Abortable},
    Stream,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::services::ollama::{
    models::{base::Completion, errors::ClientError},
    registry::{RequestRegistry, StreamTicket},
};

pub type ValueStream = Pin<Box<dyn Stream<Item = Result<Value, ClientError>> + Send + 'static>>;

/// Lifecycle of an [`AbortableStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created, never polled.
    Idle,
    Streaming,
    /// An item carried the completion signal.
    Completed,
    /// The server sent an error, a line did not match the expected shape,
    /// the transport failed, or the body ended without completion.
    Errored,
    Aborted,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Completed | StreamState::Errored | StreamState::Aborted)
    }
}

/// A streamed response that can be cancelled from the outside.
///
/// Yields one `T` per line of the response. The stream ends after the item
/// whose [`Completion::is_done`] is true. An `error` line, a body that ends
/// without completion, and an abort each surface as one final `Err`.
pub struct AbortableStream<T> {
    id: Uuid,
    inner: Abortable<ValueStream>,
    handle: AbortHandle,
    registry: Option<Arc<RequestRegistry>>,
    state: StreamState,
    /// Set when the stream was aborted and the caller has not seen `Err(Aborted)` yet.
    abort_unreported: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T> AbortableStream<T> {
    pub(crate) fn new(
        ticket: StreamTicket,
        inner: ValueStream,
        registry: Arc<RequestRegistry>,
    ) -> Self {
        let StreamTicket { id, handle, registration } = ticket;
        Self {
            id,
            inner: Abortable::new(inner, registration),
            handle,
            registry: Some(registry),
            state: StreamState::Idle,
            abort_unreported: false,
            _item: PhantomData,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state. A stream cancelled through the client or a cloned
    /// handle reports `Aborted` right away, before it is polled again.
    pub fn state(&self) -> StreamState {
        if !self.state.is_terminal() && self.handle.is_aborted() {
            return StreamState::Aborted;
        }
        self.state
    }

    /// Cancels this stream only. The next poll yields [`ClientError::Aborted`].
    pub fn abort(&mut self) {
        self.handle.abort();
        self.mark_aborted();
    }

    /// A handle that can abort this stream while it is being polled elsewhere.
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.clone()
    }

    fn finish(&mut self, state: StreamState) {
        debug!(id = %self.id, ?state, "stream finished");
        self.state = state;
        self.release();
    }

    fn mark_aborted(&mut self) {
        if !self.state.is_terminal() {
            self.finish(StreamState::Aborted);
            self.abort_unreported = true;
        }
    }

    fn release(&mut self) {
        if let Some(registry) = self.registry.take() {
            registry.remove(&self.id);
        }
    }
}

impl<T> AbortableStream<T>
where
    T: DeserializeOwned + Completion,
{
    fn accept(&mut self, value: Value) -> Result<T, ClientError> {
        if let Some(error) = value.get("error") {
            let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            self.finish(StreamState::Errored);
            return Err(ClientError::Stream(message));
        }

        match serde_json::from_value::<T>(value) {
            Ok(item) => {
                if item.is_done() {
                    self.finish(StreamState::Completed);
                }
                Ok(item)
            }
            Err(e) => {
                self.finish(StreamState::Errored);
                Err(ClientError::Serialization(e.to_string()))
            }
        }
    }
}

impl<T> Stream for AbortableStream<T>
where
    T: DeserializeOwned + Completion,
{
    type Item = Result<T, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.handle.is_aborted() {
            this.mark_aborted();
        }
        if this.abort_unreported {
            this.abort_unreported = false;
            return Poll::Ready(Some(Err(ClientError::Aborted)));
        }
        if this.state.is_terminal() {
            return Poll::Ready(None);
        }
        this.state = StreamState::Streaming;

        let next = ready!(Pin::new(&mut this.inner).poll_next(cx));
        let item = match next {
            Some(Ok(value)) => this.accept(value),
            Some(Err(e)) => {
                this.finish(StreamState::Errored);
                Err(e)
            }
            None if this.handle.is_aborted() => {
                this.finish(StreamState::Aborted);
                Err(ClientError::Aborted)
            }
            None => {
                this.finish(StreamState::Errored);
                Err(ClientError::IncompleteStream)
            }
        };
        Poll::Ready(Some(item))
    }
}

impl<T> Drop for AbortableStream<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> std::fmt::Debug for AbortableStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortableStream")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
