use std::sync::mpsc::Sender;

/// One-way delivery of notifications out of a pacing thread.
pub trait EventSink<E>: Send {
    /// Returns `false` when nobody is listening anymore.
    fn deliver(&self, event: E) -> bool;
}

impl<E, M> EventSink<E> for Sender<M>
where
    M: From<E> + Send,
{
    fn deliver(&self, event: E) -> bool {
        self.send(M::from(event)).is_ok()
    }
}
